pub mod concept;
pub mod cst;
pub mod projector;

pub use concept::{ConceptEdge, ConceptGraph, ConceptNode, EdgeKind};
pub use cst::{build_cst, ScanLanguage, SyntaxKind};
pub use projector::{project_concepts, QuadPlus};
