//! Greedy left-to-right phrase chunker. Patterns are tried in a fixed
//! priority order at each token position: PrepPhrase, VerbPhrase,
//! NounPhrase, AdjPhrase, Clause. The first pattern that matches wins;
//! if none match, the cursor advances by one token.

use super::tagger::{Tagger, TaggedToken, POS};
use super::tokenizer::{TextRange, Tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    NounPhrase,
    VerbPhrase,
    PrepPhrase,
    AdjPhrase,
    Clause,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::NounPhrase => "NP",
            ChunkKind::VerbPhrase => "VP",
            ChunkKind::PrepPhrase => "PP",
            ChunkKind::AdjPhrase => "ADJP",
            ChunkKind::Clause => "CLAUSE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub kind: ChunkKind,
    pub range: TextRange,
    pub head: TextRange,
    pub modifiers: Vec<TextRange>,
}

impl Chunk {
    pub fn head_text<'a>(&self, source: &'a str) -> &'a str {
        self.head.slice(source)
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.range.slice(source)
    }
}

#[derive(Debug, Default, Clone)]
pub struct ChunkStats {
    pub noun_phrases: usize,
    pub verb_phrases: usize,
    pub prep_phrases: usize,
    pub adj_phrases: usize,
    pub clauses: usize,
    pub token_count: usize,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk], token_count: usize) -> Self {
        let mut stats = ChunkStats {
            token_count,
            ..Default::default()
        };
        for c in chunks {
            match c.kind {
                ChunkKind::NounPhrase => stats.noun_phrases += 1,
                ChunkKind::VerbPhrase => stats.verb_phrases += 1,
                ChunkKind::PrepPhrase => stats.prep_phrases += 1,
                ChunkKind::AdjPhrase => stats.adj_phrases += 1,
                ChunkKind::Clause => stats.clauses += 1,
            }
        }
        stats
    }
}

pub struct ChunkResult {
    pub chunks: Vec<Chunk>,
    pub tokens: Vec<TaggedToken>,
}

pub struct Chunker {
    tagger: Tagger,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    pub fn new() -> Self {
        Self {
            tagger: Tagger::new(),
        }
    }

    pub fn chunk(&self, text: &str) -> ChunkResult {
        let raw = Tokenizer::tokenize(text);
        let tagged = self.tagger.tag(&raw);
        let chunks = find_chunks(&tagged);
        ChunkResult {
            chunks,
            tokens: tagged,
        }
    }
}

fn find_chunks(tokens: &[TaggedToken]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].pos == POS::Punctuation {
            i += 1;
            continue;
        }
        if let Some((chunk, consumed)) = try_prep_phrase(tokens, i) {
            chunks.push(chunk);
            i += consumed;
            continue;
        }
        if let Some((chunk, consumed)) = try_verb_phrase(tokens, i) {
            chunks.push(chunk);
            i += consumed;
            continue;
        }
        if let Some((chunk, consumed)) = try_noun_phrase(tokens, i) {
            chunks.push(chunk);
            i += consumed;
            continue;
        }
        if let Some((chunk, consumed)) = try_adj_phrase(tokens, i) {
            chunks.push(chunk);
            i += consumed;
            continue;
        }
        if let Some((chunk, consumed)) = try_clause(tokens, i) {
            chunks.push(chunk);
            i += consumed;
            continue;
        }
        i += 1;
    }
    chunks
}

fn try_noun_phrase(tokens: &[TaggedToken], start: usize) -> Option<(Chunk, usize)> {
    let mut i = start;
    let mut modifiers = Vec::new();

    if i < tokens.len() && tokens[i].pos == POS::Determiner {
        modifiers.push(tokens[i].range);
        i += 1;
    }
    while i < tokens.len() && tokens[i].pos == POS::Adjective {
        modifiers.push(tokens[i].range);
        i += 1;
    }

    let nominal_start = i;
    while i < tokens.len() && tokens[i].pos.is_nominal() {
        i += 1;
    }
    if i == nominal_start {
        return None;
    }

    let head = tokens[i - 1].range;
    let range = TextRange::new(tokens[start].range.start, tokens[i - 1].range.end);
    Some((
        Chunk {
            kind: ChunkKind::NounPhrase,
            range,
            head,
            modifiers,
        },
        i - start,
    ))
}

fn try_verb_phrase(tokens: &[TaggedToken], start: usize) -> Option<(Chunk, usize)> {
    let mut i = start;
    let mut modifiers = Vec::new();

    if i < tokens.len() && matches!(tokens[i].pos, POS::Auxiliary | POS::Modal) {
        modifiers.push(tokens[i].range);
        i += 1;
    }
    while i < tokens.len() && tokens[i].pos == POS::Adverb {
        modifiers.push(tokens[i].range);
        i += 1;
    }

    if i >= tokens.len() || tokens[i].pos != POS::Verb {
        return None;
    }
    let head = tokens[i].range;
    i += 1;

    while i < tokens.len() && tokens[i].pos == POS::Adverb {
        modifiers.push(tokens[i].range);
        i += 1;
    }

    let range = TextRange::new(tokens[start].range.start, tokens[i - 1].range.end);
    Some((
        Chunk {
            kind: ChunkKind::VerbPhrase,
            range,
            head,
            modifiers,
        },
        i - start,
    ))
}

fn try_prep_phrase(tokens: &[TaggedToken], start: usize) -> Option<(Chunk, usize)> {
    if tokens.get(start).map(|t| t.pos) != Some(POS::Preposition) {
        return None;
    }
    let head = tokens[start].range;
    let (np, np_len) = try_noun_phrase(tokens, start + 1)?;
    let mut modifiers = vec![np.head];
    modifiers.extend(np.modifiers);
    let range = TextRange::new(head.start, np.range.end);
    Some((
        Chunk {
            kind: ChunkKind::PrepPhrase,
            range,
            head,
            modifiers,
        },
        1 + np_len,
    ))
}

fn try_adj_phrase(tokens: &[TaggedToken], start: usize) -> Option<(Chunk, usize)> {
    let mut i = start;
    let mut modifiers = Vec::new();

    while i < tokens.len() && tokens[i].pos == POS::Adverb {
        modifiers.push(tokens[i].range);
        i += 1;
    }
    if modifiers.is_empty() {
        return None;
    }
    if i >= tokens.len() || tokens[i].pos != POS::Adjective {
        return None;
    }
    let head = tokens[i].range;
    i += 1;

    let range = TextRange::new(tokens[start].range.start, head.end);
    Some((
        Chunk {
            kind: ChunkKind::AdjPhrase,
            range,
            head,
            modifiers,
        },
        i - start,
    ))
}

/// A relative clause: `RelativePronoun VP NP?`. The head is the VP's
/// head; modifiers begin with the relative pronoun itself, followed by
/// the VP's own modifiers and then the trailing NP's, if present.
fn try_clause(tokens: &[TaggedToken], start: usize) -> Option<(Chunk, usize)> {
    if tokens.get(start).map(|t| t.pos) != Some(POS::RelativePronoun) {
        return None;
    }
    let rel = tokens[start].range;
    let (vp, vp_len) = try_verb_phrase(tokens, start + 1)?;
    let mut consumed = 1 + vp_len;
    let mut modifiers = vec![rel];
    modifiers.extend(vp.modifiers.clone());

    let mut end = vp.range.end;
    if let Some((np, np_len)) = try_noun_phrase(tokens, start + consumed) {
        end = np.range.end;
        modifiers.push(np.head);
        modifiers.extend(np.modifiers);
        consumed += np_len;
    }

    let range = TextRange::new(rel.start, end);
    Some((
        Chunk {
            kind: ChunkKind::Clause,
            range,
            head: vp.head,
            modifiers,
        },
        consumed,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_simple_noun_phrase() {
        let chunker = Chunker::new();
        let result = chunker.chunk("the quick fox");
        assert!(result.chunks.iter().any(|c| c.kind == ChunkKind::NounPhrase));
    }

    #[test]
    fn chunks_prep_phrase_around_noun_phrase() {
        let chunker = Chunker::new();
        let text = "in the forest";
        let result = chunker.chunk(text);
        let pp = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::PrepPhrase)
            .expect("expected a prep phrase");
        assert_eq!(pp.head_text(text), "in");
    }

    #[test]
    fn adj_phrase_requires_leading_intensifier() {
        let chunker = Chunker::new();
        // A lone adverb with no following adjective never forms an AdjPhrase.
        let result = chunker.chunk("slowly");
        assert!(!result.chunks.iter().any(|c| c.kind == ChunkKind::AdjPhrase));
    }

    #[test]
    fn adj_phrase_with_intensifier_emitted() {
        let chunker = Chunker::new();
        let result = chunker.chunk("extremely careless");
        assert!(result.chunks.iter().any(|c| c.kind == ChunkKind::AdjPhrase));
    }

    #[test]
    fn verb_phrase_chunked_when_not_absorbed_by_noun_phrase() {
        let chunker = Chunker::new();
        let text = "dogs barking";
        let result = chunker.chunk(text);
        assert!(result.chunks.iter().any(|c| c.kind == ChunkKind::VerbPhrase));
    }

    #[test]
    fn clause_matches_relative_pronoun_then_verb_phrase() {
        let chunker = Chunker::new();
        let text = "who left quickly";
        let result = chunker.chunk(text);
        let clause = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Clause)
            .expect("expected a clause");
        assert_eq!(clause.head_text(text), "left");
    }

    #[test]
    fn clause_includes_trailing_noun_phrase_when_present() {
        let chunker = Chunker::new();
        let text = "who saw the fox";
        let result = chunker.chunk(text);
        let clause = result
            .chunks
            .iter()
            .find(|c| c.kind == ChunkKind::Clause)
            .expect("expected a clause");
        assert_eq!(clause.text(text), "who saw the fox");
    }

    #[test]
    fn chunk_stats_count_kinds() {
        let chunker = Chunker::new();
        let result = chunker.chunk("the dog runs in the park");
        let stats = ChunkStats::from_chunks(&result.chunks, result.tokens.len());
        assert!(stats.noun_phrases + stats.verb_phrases + stats.prep_phrases + stats.clauses > 0);
    }
}
