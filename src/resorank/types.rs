//! Postings-list data shapes for the hybrid lexical index: per-field
//! term frequencies, per-document field lengths, and corpus document
//! frequency, the same bookkeeping the teacher's BM25F scorer tracks,
//! simplified to the token-overlap-plus-boosts formula the component
//! design settles on for the scored ranking itself.

use std::collections::HashMap;

pub type FieldId = u8;

pub const FIELD_TITLE: FieldId = 0;
pub const FIELD_BODY: FieldId = 1;

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub body: String,
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldLength {
    pub token_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentEntry {
    pub field_lengths: HashMap<FieldId, FieldLength>,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub doc_id: String,
    pub score: f32,
    pub normalized_score: f32,
}

/// Inverted index: term → field → doc_id → term frequency.
#[derive(Default)]
pub struct ResoRankIndex {
    pub postings: HashMap<String, HashMap<FieldId, HashMap<String, u32>>>,
    pub documents: HashMap<String, DocumentEntry>,
    pub vectors: HashMap<String, Vec<f32>>,
    pub doc_count: u32,
}

impl ResoRankIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_document(&mut self, doc: &Document) {
        let is_new = !self.documents.contains_key(&doc.id);
        let mut entry = DocumentEntry::default();

        for (field, text) in [(FIELD_TITLE, &doc.title), (FIELD_BODY, &doc.body)] {
            let tokens = crate::scanner::tokenizer::Tokenizer::tokenize(text);
            entry.field_lengths.insert(
                field,
                FieldLength {
                    token_count: tokens.len() as u32,
                },
            );
            let mut counts: HashMap<String, u32> = HashMap::new();
            for t in &tokens {
                *counts.entry(t.text.to_lowercase()).or_insert(0) += 1;
            }
            for (term, tf) in counts {
                self.postings
                    .entry(term)
                    .or_default()
                    .entry(field)
                    .or_default()
                    .insert(doc.id.clone(), tf);
            }
        }

        if let Some(vector) = &doc.vector {
            self.vectors.insert(doc.id.clone(), vector.clone());
        }

        self.documents.insert(doc.id.clone(), entry);
        if is_new {
            self.doc_count += 1;
        }
    }

    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.postings
            .get(term)
            .map(|fields| {
                fields
                    .values()
                    .flat_map(|docs| docs.keys())
                    .collect::<std::collections::HashSet<_>>()
                    .len() as u32
            })
            .unwrap_or(0)
    }

    pub fn term_frequency(&self, term: &str, field: FieldId, doc_id: &str) -> u32 {
        self.postings
            .get(term)
            .and_then(|fields| fields.get(&field))
            .and_then(|docs| docs.get(doc_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn field_length(&self, doc_id: &str, field: FieldId) -> u32 {
        self.documents
            .get(doc_id)
            .and_then(|e| e.field_lengths.get(&field))
            .map(|l| l.token_count)
            .unwrap_or(0)
    }

    pub fn candidate_documents(&self, query_terms: &[String]) -> std::collections::HashSet<String> {
        let mut docs = std::collections::HashSet::new();
        for term in query_terms {
            if let Some(fields) = self.postings.get(&term.to_lowercase()) {
                for field_docs in fields.values() {
                    docs.extend(field_docs.keys().cloned());
                }
            }
        }
        docs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_a_document_populates_postings() {
        let mut idx = ResoRankIndex::new();
        idx.index_document(&Document {
            id: "d1".into(),
            title: "Paris Travel".into(),
            body: "Paris is lovely".into(),
            vector: None,
        });
        assert_eq!(idx.term_frequency("paris", FIELD_TITLE, "d1"), 1);
        assert_eq!(idx.term_frequency("paris", FIELD_BODY, "d1"), 1);
        assert_eq!(idx.doc_frequency("paris"), 1);
    }

    #[test]
    fn field_length_tracks_token_count() {
        let mut idx = ResoRankIndex::new();
        idx.index_document(&Document {
            id: "d1".into(),
            title: String::new(),
            body: "one two three".into(),
            vector: None,
        });
        assert_eq!(idx.field_length("d1", FIELD_BODY), 3);
    }

    #[test]
    fn reindexing_same_id_does_not_double_count_documents() {
        let mut idx = ResoRankIndex::new();
        let doc = Document {
            id: "d1".into(),
            title: "A".into(),
            body: "B".into(),
            vector: None,
        };
        idx.index_document(&doc);
        idx.index_document(&doc);
        assert_eq!(idx.doc_count, 1);
    }
}
