//! Two-phase part-of-speech tagger: a closed-class lexicon lookup,
//! falling back to suffix/capitalization heuristics for anything the
//! lexicon doesn't cover.

use std::collections::HashMap;

use super::tokenizer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum POS {
    Noun,
    Pronoun,
    ProperNoun,
    Verb,
    Auxiliary,
    Modal,
    Adjective,
    Adverb,
    Determiner,
    Preposition,
    Conjunction,
    RelativePronoun,
    Punctuation,
    Other,
}

impl POS {
    pub fn is_nominal(&self) -> bool {
        matches!(self, POS::Noun | POS::Pronoun | POS::ProperNoun)
    }

    pub fn is_verbal(&self) -> bool {
        matches!(self, POS::Verb | POS::Auxiliary | POS::Modal)
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, POS::Adjective | POS::Adverb)
    }
}

#[derive(Debug, Clone)]
pub struct TaggedToken {
    pub text: String,
    pub pos: POS,
    pub range: super::tokenizer::TextRange,
}

pub struct Tagger {
    lexicon: HashMap<&'static str, POS>,
}

impl Default for Tagger {
    fn default() -> Self {
        Self::new()
    }
}

impl Tagger {
    pub fn new() -> Self {
        Self {
            lexicon: build_default_lexicon(),
        }
    }

    pub fn tag(&self, tokens: &[Token]) -> Vec<TaggedToken> {
        tokens
            .iter()
            .map(|t| TaggedToken {
                text: t.text.clone(),
                pos: self.lookup_pos(&t.text),
                range: t.range,
            })
            .collect()
    }

    pub fn lookup_pos(&self, word: &str) -> POS {
        let lower = word.to_lowercase();
        if let Some(pos) = self.lexicon.get(lower.as_str()) {
            return *pos;
        }
        infer_pos(word)
    }
}

/// Suffix/capitalization heuristic cascade, tried in priority order
/// when the closed-class lexicon has no entry for `word`.
pub fn infer_pos(word: &str) -> POS {
    let mut chars = word.chars();
    if word.chars().count() == 1 {
        if let Some(c) = chars.next() {
            if c.is_ascii_punctuation() {
                return POS::Punctuation;
            }
        }
    }

    if word
        .chars()
        .next()
        .map(|c| c.is_uppercase())
        .unwrap_or(false)
    {
        return POS::ProperNoun;
    }

    let lower = word.to_lowercase();
    if lower.ends_with("ly") {
        return POS::Adverb;
    }
    if lower.ends_with("ing") || lower.ends_with("ed") || lower.ends_with("en") {
        return POS::Verb;
    }
    if lower.ends_with("ness")
        || lower.ends_with("tion")
        || lower.ends_with("ment")
        || lower.ends_with("ity")
        || lower.ends_with("er")
        || lower.ends_with("or")
    {
        return POS::Noun;
    }
    if lower.ends_with("ful")
        || lower.ends_with("less")
        || lower.ends_with("ous")
        || lower.ends_with("ive")
        || lower.ends_with("able")
        || lower.ends_with("ible")
    {
        return POS::Adjective;
    }

    POS::Noun
}

fn build_default_lexicon() -> HashMap<&'static str, POS> {
    let mut m = HashMap::new();
    for w in ["he", "him", "his", "she", "her", "hers", "it", "its", "they", "them", "their"] {
        m.insert(w, POS::Pronoun);
    }
    for w in ["who", "whom", "whose", "which", "that"] {
        m.insert(w, POS::RelativePronoun);
    }
    for w in ["is", "am", "are", "was", "were", "be", "been", "being", "has", "have", "had", "do", "does", "did"] {
        m.insert(w, POS::Auxiliary);
    }
    for w in ["can", "could", "may", "might", "must", "shall", "should", "will", "would"] {
        m.insert(w, POS::Modal);
    }
    for w in ["a", "an", "the", "this", "that", "these", "those", "my", "your", "our"] {
        m.insert(w, POS::Determiner);
    }
    for w in [
        "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
        "during", "before", "after", "above", "below", "to", "from", "up", "down", "over", "under",
    ] {
        m.insert(w, POS::Preposition);
    }
    for w in ["and", "or", "but", "nor", "so", "yet", "because", "although", "while", "if"] {
        m.insert(w, POS::Conjunction);
    }
    for w in [
        "see", "saw", "seen", "go", "went", "gone", "say", "said", "get", "got", "make", "made",
        "know", "knew", "think", "thought", "take", "took", "come", "came", "want", "give", "gave",
        "find", "found", "tell", "told", "ask", "asked", "work", "worked", "call", "called", "try",
        "tried", "leave", "left", "return", "returned", "appear", "appeared", "meet", "met",
    ] {
        m.insert(w, POS::Verb);
    }
    for w in [
        "time", "person", "year", "way", "day", "thing", "man", "woman", "child", "world", "life",
        "hand", "part", "place", "case", "week", "company", "system", "group", "number", "fox",
    ] {
        m.insert(w, POS::Noun);
    }
    for w in [
        "good", "new", "first", "last", "long", "great", "little", "own", "other", "old", "right",
        "big", "high", "different", "small", "large", "careless",
    ] {
        m.insert(w, POS::Adjective);
    }
    for w in [
        "not", "also", "very", "often", "always", "really", "still", "just", "now", "then", "here",
        "there", "too", "quickly", "never",
    ] {
        m.insert(w, POS::Adverb);
    }
    m
}
