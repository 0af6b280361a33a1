//! Pronoun and alias resolution against a bounded-recency narrative
//! context: the last `max_history` mentioned entities, most recent
//! first, searched for the first one whose gender is compatible with
//! the pronoun in hand.

use std::collections::{HashMap, VecDeque};

use super::tokenizer::TextRange;

pub type EntityId = String;

/// How a `ResolvedRef` was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveVia {
    Literal,
    Alias,
    Pronoun,
    Fuzzy,
}

/// A span of text the Resolver tied to a registered entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRef {
    pub range: TextRange,
    pub entity_id: EntityId,
    pub confidence: f32,
    pub via: ResolveVia,
}

/// A snapshot of the narrative context after a scan: the recency stack
/// of entity ids, most-recent-first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeState {
    pub active_entities: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    Neutral,
    Plural,
    #[default]
    Unknown,
}

#[derive(Debug, Clone)]
pub struct EntityMetadata {
    pub id: EntityId,
    pub name: String,
    pub gender: Gender,
    pub aliases: Vec<String>,
    pub kind: String,
}

const PRONOUNS: &[&str] = &[
    "he", "him", "his", "she", "her", "hers", "it", "its", "they", "them", "their",
];

fn is_pronoun(word: &str) -> bool {
    PRONOUNS.contains(&word.to_lowercase().as_str())
}

fn infer_pronoun_gender(word: &str) -> Gender {
    match word.to_lowercase().as_str() {
        "he" | "him" | "his" => Gender::Male,
        "she" | "her" | "hers" => Gender::Female,
        "it" | "its" => Gender::Neutral,
        "they" | "them" | "their" => Gender::Plural,
        _ => Gender::Unknown,
    }
}

/// `true` when an entity of `entity_gender` can be referred to by a
/// pronoun of `pronoun_gender`: exact matches always work, `Unknown`
/// on either side matches anything, and `they/them/their` (Plural)
/// matches an entity recorded as Plural or Neutral.
fn genders_compatible(entity_gender: Gender, pronoun_gender: Gender) -> bool {
    match (entity_gender, pronoun_gender) {
        (a, b) if a == b => true,
        (_, Gender::Unknown) => true,
        (Gender::Unknown, _) => true,
        (Gender::Neutral, Gender::Plural) => true,
        _ => false,
    }
}

pub struct NarrativeContext {
    history: VecDeque<EntityId>,
    registry: HashMap<EntityId, EntityMetadata>,
    max_history: usize,
}

impl Default for NarrativeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl NarrativeContext {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
            registry: HashMap::new(),
            max_history: 10,
        }
    }

    pub fn register(&mut self, entity: EntityMetadata) {
        self.registry.insert(entity.id.clone(), entity);
    }

    pub fn push_mention(&mut self, entity_id: &EntityId) {
        if let Some(pos) = self.history.iter().position(|e| e == entity_id) {
            self.history.remove(pos);
        }
        self.history.push_front(entity_id.clone());
        while self.history.len() > self.max_history {
            self.history.pop_back();
        }
    }

    pub fn find_most_recent(&self, gender: Gender) -> Option<&EntityId> {
        self.history.iter().find(|id| {
            self.registry
                .get(*id)
                .map(|meta| genders_compatible(meta.gender, gender))
                .unwrap_or(false)
        })
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&EntityId> {
        let lower = name.to_lowercase();
        self.registry.values().find_map(|meta| {
            if meta.name.to_lowercase() == lower
                || meta.aliases.iter().any(|a| a.to_lowercase() == lower)
            {
                Some(&meta.id)
            } else {
                None
            }
        })
    }

    /// The recency stack, most-recent-first, for `ScanResult.narrativeState`.
    pub fn active_entities(&self) -> Vec<EntityId> {
        self.history.iter().cloned().collect()
    }
}

pub struct Resolver {
    context: NarrativeContext,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            context: NarrativeContext::new(),
        }
    }

    pub fn register_entity(&mut self, id: &str, name: &str, gender: Gender, aliases: &[&str]) {
        self.context.register(EntityMetadata {
            id: id.to_string(),
            name: name.to_string(),
            gender,
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            kind: String::new(),
        });
    }

    pub fn observe_mention(&mut self, entity_id: &str) {
        self.context.push_mention(&entity_id.to_string());
    }

    pub fn context(&self) -> &NarrativeContext {
        &self.context
    }

    /// Direct name/alias lookup, skipping the pronoun branch `resolve`
    /// takes — used by the Conductor to map an explicit Entity/Triple
    /// mention's label back to a registered id before pushing it.
    pub fn lookup_by_name(&self, name: &str) -> Option<EntityId> {
        self.context.lookup_by_name(name).cloned()
    }

    /// Resolves `text` to an entity id: a closed-class pronoun resolves
    /// against the narrative history's gender-compatible recency stack;
    /// anything else is looked up directly by name or alias.
    pub fn resolve(&self, text: &str) -> Option<String> {
        if is_pronoun(text) {
            let gender = infer_pronoun_gender(text);
            return self.context.find_most_recent(gender).cloned();
        }
        self.context.lookup_by_name(text).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_simple_pronoun_to_most_recent_match() {
        let mut r = Resolver::new();
        r.register_entity("e1", "Alice", Gender::Female, &[]);
        r.observe_mention("e1");
        assert_eq!(r.resolve("she"), Some("e1".to_string()));
    }

    #[test]
    fn gender_switch_reorders_to_correct_entity() {
        let mut r = Resolver::new();
        r.register_entity("e1", "Alice", Gender::Female, &[]);
        r.register_entity("e2", "Bob", Gender::Male, &[]);
        r.observe_mention("e1");
        r.observe_mention("e2");
        assert_eq!(r.resolve("she"), Some("e1".to_string()));
        assert_eq!(r.resolve("he"), Some("e2".to_string()));
    }

    #[test]
    fn resolves_alias_including_multiword() {
        let mut r = Resolver::new();
        r.register_entity("e1", "Gandalf", Gender::Male, &["The Wizard"]);
        assert_eq!(r.resolve("The Wizard"), Some("e1".to_string()));
    }

    #[test]
    fn plural_pronoun_does_not_match_gendered_entity() {
        let mut r = Resolver::new();
        r.register_entity("e1", "Alice", Gender::Female, &[]);
        r.observe_mention("e1");
        assert_eq!(r.resolve("they"), None);
    }

    #[test]
    fn plural_pronoun_matches_neutral_or_plural_entity() {
        let mut r = Resolver::new();
        r.register_entity("e1", "the committee", Gender::Plural, &[]);
        r.observe_mention("e1");
        assert_eq!(r.resolve("they"), Some("e1".to_string()));
    }

    #[test]
    fn neutral_pronoun_it_matches_unknown_or_neutral() {
        let mut r = Resolver::new();
        r.register_entity("e1", "the box", Gender::Neutral, &[]);
        r.observe_mention("e1");
        assert_eq!(r.resolve("it"), Some("e1".to_string()));
    }

    #[test]
    fn repeated_mention_moves_entity_to_front_without_duplicating() {
        let mut ctx = NarrativeContext::new();
        ctx.register(EntityMetadata {
            id: "e1".into(),
            name: "Alice".into(),
            gender: Gender::Female,
            aliases: vec![],
            kind: String::new(),
        });
        ctx.push_mention(&"e1".to_string());
        ctx.push_mention(&"e1".to_string());
        assert_eq!(ctx.history.len(), 1);
    }

    #[test]
    fn history_evicts_beyond_max_size() {
        let mut ctx = NarrativeContext::new();
        for i in 0..15 {
            let id = format!("e{i}");
            ctx.register(EntityMetadata {
                id: id.clone(),
                name: id.clone(),
                gender: Gender::Unknown,
                aliases: vec![],
                kind: String::new(),
            });
            ctx.push_mention(&id);
        }
        assert_eq!(ctx.history.len(), 10);
        assert!(ctx.history.contains(&"e14".to_string()));
        assert!(!ctx.history.contains(&"e0".to_string()));
    }
}
