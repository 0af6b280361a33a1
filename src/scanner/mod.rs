pub mod chunker;
pub mod conductor;
pub mod dictionary;
pub mod discovery;
pub mod resolver;
pub mod syntax;
pub mod tagger;
pub mod tokenizer;

pub use chunker::{Chunk, ChunkKind, ChunkResult, ChunkStats, Chunker};
pub use conductor::{Conductor, ScanResult};
pub use dictionary::{DictionaryEntry, DictionaryMatch, DictionaryMatcher};
pub use discovery::{CandidateState, DiscoveredCandidate, DiscoveryEngine};
pub use resolver::{Gender, NarrativeContext, NarrativeState, ResolveVia, ResolvedRef, Resolver};
pub use syntax::{SyntaxMatch, SyntaxMatchKind, SyntaxScanner};
pub use tagger::{Tagger, TaggedToken, POS};
pub use tokenizer::{TextRange, Token, Tokenizer};
