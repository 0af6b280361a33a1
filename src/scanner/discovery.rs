//! Unsupervised entity-candidate surfacing: watches for capitalized
//! word runs recurring across scans and promotes the ones that look
//! like genuine named entities (frequent and reliably capitalized)
//! into candidates a caller can choose to hydrate into the
//! dictionary.

use std::collections::HashMap;

use crate::config::DiscoveryConfig;
use crate::scanner::tagger::{TaggedToken, POS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateState {
    Watching,
    Promoted,
}

#[derive(Debug, Clone)]
pub struct DiscoveredCandidate {
    pub text: String,
    pub frequency: u32,
    pub capitalized_count: u32,
    pub state: CandidateState,
    pub cooccurrences: HashMap<String, u32>,
}

impl DiscoveredCandidate {
    fn capitalization_ratio(&self) -> f32 {
        if self.frequency == 0 {
            return 0.0;
        }
        self.capitalized_count as f32 / self.frequency as f32
    }
}

pub struct DiscoveryEngine {
    config: DiscoveryConfig,
    candidates: HashMap<String, DiscoveredCandidate>,
}

impl DiscoveryEngine {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self {
            config,
            candidates: HashMap::new(),
        }
    }

    /// Surfaces candidates from one tagged pass: maximal runs of
    /// `ProperNoun` tokens become candidate spans, counted and
    /// cross-referenced within `cooccurrence_window` tokens of one
    /// another.
    pub fn observe(&mut self, tokens: &[TaggedToken]) {
        let spans = proper_noun_runs(tokens);
        let cooccurrence_window = self.config.cooccurrence_window;
        for (i, span) in spans.iter().enumerate() {
            self.record(span, true);
            for other in spans
                .iter()
                .skip(i + 1)
                .take_while(|o| o.token_index - span.token_index <= cooccurrence_window)
            {
                self.link(&span.text, &other.text);
            }
        }
    }

    fn record(&mut self, span: &ProperNounSpan, capitalized: bool) {
        let entry = self
            .candidates
            .entry(span.text.clone())
            .or_insert_with(|| DiscoveredCandidate {
                text: span.text.clone(),
                frequency: 0,
                capitalized_count: 0,
                state: CandidateState::Watching,
                cooccurrences: HashMap::new(),
            });
        entry.frequency += 1;
        if capitalized {
            entry.capitalized_count += 1;
        }

        entry.state = if entry.frequency >= self.config.promote_min_frequency
            && entry.capitalization_ratio() >= self.config.promote_min_capitalization_ratio
        {
            CandidateState::Promoted
        } else {
            CandidateState::Watching
        };
    }

    fn link(&mut self, a: &str, b: &str) {
        if a == b {
            return;
        }
        if let Some(entry) = self.candidates.get_mut(a) {
            *entry.cooccurrences.entry(b.to_string()).or_insert(0) += 1;
        }
        if let Some(entry) = self.candidates.get_mut(b) {
            *entry.cooccurrences.entry(a.to_string()).or_insert(0) += 1;
        }
    }

    /// Only candidates that have actually crossed `watch_min_frequency`
    /// are surfaced — below that, a candidate is tracked internally but
    /// not yet reported.
    pub fn watching(&self) -> Vec<&DiscoveredCandidate> {
        self.candidates
            .values()
            .filter(|c| c.state == CandidateState::Watching && c.frequency >= self.config.watch_min_frequency)
            .collect()
    }

    pub fn promoted(&self) -> Vec<&DiscoveredCandidate> {
        self.candidates
            .values()
            .filter(|c| c.state == CandidateState::Promoted)
            .collect()
    }

    pub fn candidate(&self, text: &str) -> Option<&DiscoveredCandidate> {
        self.candidates.get(text)
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

struct ProperNounSpan {
    text: String,
    token_index: usize,
}

fn proper_noun_runs(tokens: &[TaggedToken]) -> Vec<ProperNounSpan> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].pos != POS::ProperNoun {
            i += 1;
            continue;
        }
        let run_start = i;
        let mut words = vec![tokens[i].text.clone()];
        i += 1;
        while i < tokens.len() && tokens[i].pos == POS::ProperNoun {
            words.push(tokens[i].text.clone());
            i += 1;
        }
        spans.push(ProperNounSpan {
            text: words.join(" "),
            token_index: run_start,
        });
    }
    spans
}
