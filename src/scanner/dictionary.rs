//! Aho-Corasick multi-pattern matcher over a hydrated entity
//! dictionary, including alias forms. Overlapping matches are
//! resolved by a leftmost-longest policy: sort by start ascending,
//! length descending, then greedily keep matches that don't overlap
//! an already-kept one.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use super::tokenizer::TextRange;

#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    pub id: String,
    pub label: String,
    pub kind: String,
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryMatch {
    pub entity_id: String,
    pub entity_label: String,
    pub entity_kind: String,
    pub matched_text: String,
    pub range: TextRange,
    pub is_alias_match: bool,
}

struct PatternMeta {
    entity_id: String,
    entity_label: String,
    entity_kind: String,
    is_alias: bool,
}

#[derive(Default)]
pub struct DictionaryMatcher {
    entries: Vec<DictionaryEntry>,
    automaton: Option<AhoCorasick>,
    metas: Vec<PatternMeta>,
}

impl DictionaryMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate(&mut self, entries: Vec<DictionaryEntry>) {
        self.entries = entries;
        self.build();
    }

    pub fn add_entry(&mut self, entry: DictionaryEntry) {
        self.entries.push(entry);
        self.build();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.automaton = None;
        self.metas.clear();
    }

    pub fn pattern_count(&self) -> usize {
        self.metas.len()
    }

    fn build(&mut self) {
        let mut patterns: Vec<String> = Vec::new();
        let mut metas = Vec::new();

        for entry in &self.entries {
            patterns.push(entry.label.to_lowercase());
            metas.push(PatternMeta {
                entity_id: entry.id.clone(),
                entity_label: entry.label.clone(),
                entity_kind: entry.kind.clone(),
                is_alias: false,
            });
            for alias in &entry.aliases {
                patterns.push(alias.to_lowercase());
                metas.push(PatternMeta {
                    entity_id: entry.id.clone(),
                    entity_label: entry.label.clone(),
                    entity_kind: entry.kind.clone(),
                    is_alias: true,
                });
            }
        }

        if patterns.is_empty() {
            self.automaton = None;
            self.metas = Vec::new();
            return;
        }

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .expect("pattern set is always well-formed byte strings");

        self.automaton = Some(automaton);
        self.metas = metas;
    }

    /// `true` when `text` is itself a registered label or alias (used
    /// to suppress discovery candidates that duplicate a known entity).
    pub fn contains_label(&self, text: &str) -> bool {
        let Some(automaton) = &self.automaton else {
            return false;
        };
        let lower = text.to_lowercase();
        automaton
            .find_iter(&lower)
            .any(|m| m.start() == 0 && m.end() == lower.len())
    }

    pub fn find_mentions(&self, text: &str) -> Vec<DictionaryMatch> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        let lower = text.to_lowercase();

        let mut raw: Vec<DictionaryMatch> = automaton
            .find_iter(&lower)
            .map(|m| {
                let meta = &self.metas[m.pattern().as_usize()];
                DictionaryMatch {
                    entity_id: meta.entity_id.clone(),
                    entity_label: meta.entity_label.clone(),
                    entity_kind: meta.entity_kind.clone(),
                    matched_text: text[m.start()..m.end()].to_string(),
                    range: TextRange::new(m.start(), m.end()),
                    is_alias_match: meta.is_alias,
                }
            })
            .collect();

        dedupe_overlapping(&mut raw);
        raw
    }
}

fn dedupe_overlapping(matches: &mut Vec<DictionaryMatch>) {
    matches.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| b.range.len().cmp(&a.range.len()))
    });

    let mut kept: Vec<DictionaryMatch> = Vec::with_capacity(matches.len());
    for m in matches.drain(..) {
        if kept.iter().any(|k: &DictionaryMatch| k.range.overlaps(m.range)) {
            continue;
        }
        kept.push(m);
    }
    *matches = kept;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, label: &str, kind: &str, aliases: &[&str]) -> DictionaryEntry {
        DictionaryEntry {
            id: id.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn hydrate_and_find_simple_entity() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        let found = matcher.find_mentions("I love New York in spring");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity_id, "e1");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        let found = matcher.find_mentions("i love new york");
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn alias_match_sets_flag() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York City", "place", &["NYC"])]);
        let found = matcher.find_mentions("flying to NYC tomorrow");
        assert_eq!(found.len(), 1);
        assert!(found[0].is_alias_match);
    }

    #[test]
    fn overlap_dedup_keeps_longest_leftmost() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![
            entity("e1", "New York", "place", &[]),
            entity("e2", "York", "place", &[]),
        ]);
        let found = matcher.find_mentions("I love New York");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].entity_id, "e1");
    }

    #[test]
    fn empty_text_yields_no_matches() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        assert!(matcher.find_mentions("").is_empty());
    }

    #[test]
    fn no_match_yields_empty() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        assert!(matcher.find_mentions("nothing here").is_empty());
    }

    #[test]
    fn incremental_add_picks_up_new_entity() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        matcher.add_entry(entity("e2", "Boston", "place", &[]));
        let found = matcher.find_mentions("New York and Boston");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn clear_removes_all_patterns() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York", "place", &[])]);
        matcher.clear();
        assert_eq!(matcher.pattern_count(), 0);
        assert!(matcher.find_mentions("New York").is_empty());
    }

    #[test]
    fn multiple_distinct_entities_all_found() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![
            entity("e1", "Alice", "person", &[]),
            entity("e2", "Wonderland", "place", &[]),
        ]);
        let found = matcher.find_mentions("Alice went to Wonderland");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn contains_label_matches_whole_text_label_or_alias() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York City", "place", &["NYC"])]);
        assert!(matcher.contains_label("New York City"));
        assert!(matcher.contains_label("NYC"));
        assert!(matcher.contains_label("new york city"));
        assert!(!matcher.contains_label("New York"));
        assert!(!matcher.contains_label("I love New York City"));
    }

    #[test]
    fn pattern_count_includes_aliases() {
        let mut matcher = DictionaryMatcher::new();
        matcher.hydrate(vec![entity("e1", "New York City", "place", &["NYC", "The Big Apple"])]);
        assert_eq!(matcher.pattern_count(), 3);
    }
}
