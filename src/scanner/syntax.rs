//! Regex-free, single forward pass over the source bytes looking for
//! the fixed trigger set `{'[', '<', '#', '@'}`. No regex engine is
//! ever constructed at runtime: every construct below is recognized by
//! direct byte/char comparison as the cursor advances left to right.
//!
//! Malformed constructs (an unterminated `[[`, a `[` with no closing
//! `]` before end of input) are skipped without aborting the scan —
//! the cursor simply advances past the unmatched trigger and
//! continues looking for the next one.

use std::collections::HashMap;

use super::tokenizer::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxMatchKind {
    Wikilink,
    Backlink,
    Entity,
    Triple,
    InlineRelation,
    Tag,
    Mention,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxMatch {
    pub kind: SyntaxMatchKind,
    pub range: TextRange,
    pub content: String,
    pub captures: HashMap<String, String>,
}

pub struct SyntaxScanner;

impl SyntaxScanner {
    pub fn scan(text: &str) -> Vec<SyntaxMatch> {
        let bytes = text.as_bytes();
        let mut matches = Vec::new();
        let mut i = 0usize;

        while i < bytes.len() {
            match bytes[i] {
                b'[' => {
                    if let Some((m, next)) = scan_bracket(text, i) {
                        matches.push(m);
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                b'<' => {
                    if let Some((m, next)) = scan_backlink(text, i) {
                        matches.push(m);
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                b'#' => {
                    if preceded_by_ampersand(bytes, i) {
                        i += 1;
                        continue;
                    }
                    if let Some((m, next)) = scan_tag(text, i) {
                        matches.push(m);
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                b'@' => {
                    if let Some((m, next)) = scan_mention(text, i) {
                        matches.push(m);
                        i = next;
                    } else {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }

        matches
    }
}

fn preceded_by_ampersand(bytes: &[u8], pos: usize) -> bool {
    pos > 0 && bytes[pos - 1] == b'&'
}

/// `[[Target]]` or `[[Target|Label]]`, else a single-bracket Entity
/// (`[#Kind:Label]`, `[@Label]`, `[!Label]`, `[Kind:Label|Subtype]`, or
/// a plain `[Label]`), an InlineRelation (`[Kind:Label@Predicate]`), or
/// an Entity chained into a Triple via `-[predicate]->[Object]`.
fn scan_bracket(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(start + 1) == Some(&b'[') {
        return scan_wikilink(text, start);
    }
    scan_entity_or_triple(text, start)
}

fn scan_wikilink(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let bytes = text.as_bytes();
    let body_start = start + 2;
    let close = find_byte_pair(bytes, body_start, b']', b']')?;
    let body = &text[body_start..close];
    let (target, label) = match body.find('|') {
        Some(pipe) => (&body[..pipe], Some(body[pipe + 1..].to_string())),
        None => (body, None),
    };
    let end = close + 2;
    let mut captures = HashMap::new();
    captures.insert("target".to_string(), target.to_string());
    if let Some(label) = label {
        captures.insert("label".to_string(), label);
    }
    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Wikilink,
            range: TextRange::new(start, end),
            content: body.to_string(),
            captures,
        },
        end,
    ))
}

/// `<<Target>>` backlink, the angle-bracket dual of a wikilink.
fn scan_backlink(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let bytes = text.as_bytes();
    if bytes.get(start + 1) != Some(&b'<') {
        return None;
    }
    let body_start = start + 2;
    let close = find_byte_pair(bytes, body_start, b'>', b'>')?;
    let body = &text[body_start..close];
    let end = close + 2;
    let mut captures = HashMap::new();
    captures.insert("target".to_string(), body.to_string());
    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Backlink,
            range: TextRange::new(start, end),
            content: body.to_string(),
            captures,
        },
        end,
    ))
}

fn scan_entity_or_triple(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let bytes = text.as_bytes();
    let mut cursor = start + 1;
    let sigil = match bytes.get(cursor) {
        Some(b @ (b'#' | b'@' | b'!')) => {
            cursor += 1;
            Some(*b as char)
        }
        _ => None,
    };
    let body_start = cursor;
    let close = find_byte(bytes, body_start, b']')?;
    let body = &text[body_start..close];
    if body.is_empty() {
        return None;
    }

    let (kind_tag, rest) = match body.find(':') {
        Some(colon) => (Some(body[..colon].to_string()), &body[colon + 1..]),
        None => (None, body),
    };

    let mut captures = HashMap::new();
    if let Some(sigil) = sigil {
        captures.insert("sigil".to_string(), sigil.to_string());
    }
    if let Some(kind_tag) = &kind_tag {
        captures.insert("kind".to_string(), kind_tag.clone());
    }

    let entity_end = close + 1;

    // `[Kind:Label@Predicate]` — a single-bracket InlineRelation.
    if let Some(at) = rest.find('@') {
        let label = rest[..at].to_string();
        let predicate = rest[at + 1..].to_string();
        captures.insert("label".to_string(), label);
        captures.insert("predicate".to_string(), predicate);
        return Some((
            SyntaxMatch {
                kind: SyntaxMatchKind::InlineRelation,
                range: TextRange::new(start, entity_end),
                content: body.to_string(),
                captures,
            },
            entity_end,
        ));
    }

    // A second `|`/`:` separator after the kind splits label from subtype.
    let (label, subtype) = match rest.find(['|', ':']) {
        Some(sep) => (rest[..sep].to_string(), Some(rest[sep + 1..].to_string())),
        None => (rest.to_string(), None),
    };
    captures.insert("label".to_string(), label);
    if let Some(subtype) = subtype {
        captures.insert("subtype".to_string(), subtype);
    }

    // Look for a trailing `-[predicate]->[Object]` to promote this into a Triple.
    if let Some((triple, next)) = try_extend_to_triple(text, start, entity_end, &captures) {
        return Some((triple, next));
    }

    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Entity,
            range: TextRange::new(start, entity_end),
            content: body.to_string(),
            captures,
        },
        entity_end,
    ))
}

fn try_extend_to_triple(
    text: &str,
    subject_start: usize,
    subject_end: usize,
    subject_captures: &HashMap<String, String>,
) -> Option<(SyntaxMatch, usize)> {
    let bytes = text.as_bytes();
    let dash_start = skip_spaces(bytes, subject_end);
    if bytes.get(dash_start..dash_start + 2) != Some(b"-[") {
        return None;
    }
    let pred_start = dash_start + 2;
    let pred_close = find_byte(bytes, pred_start, b']')?;
    if bytes.get(pred_close + 1..pred_close + 3) != Some(b"->") {
        return None;
    }
    let object_start = skip_spaces(bytes, pred_close + 3);
    if bytes.get(object_start) != Some(&b'[') {
        return None;
    }
    let (object_match, object_end) = scan_entity_or_triple(text, object_start)?;

    let predicate = &text[pred_start..pred_close];

    let mut captures = HashMap::new();
    captures.insert(
        "subject".to_string(),
        subject_captures
            .get("label")
            .cloned()
            .unwrap_or_default(),
    );
    captures.insert("predicate".to_string(), predicate.to_string());
    captures.insert(
        "object".to_string(),
        object_match.captures.get("label").cloned().unwrap_or_default(),
    );

    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Triple,
            range: TextRange::new(subject_start, object_end),
            content: text[subject_start..object_end].to_string(),
            captures,
        },
        object_end,
    ))
}

/// `#tag-name/path`, guarded so an HTML entity like `&#39;` never matches.
fn scan_tag(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let body_start = start + 1;
    let mut end = body_start;
    for (offset, c) in text[body_start..].char_indices() {
        if c.is_alphanumeric() || c == '-' || c == '_' || c == '/' {
            end = body_start + offset + c.len_utf8();
        } else {
            break;
        }
    }
    if end == body_start {
        return None;
    }
    let tag = &text[body_start..end];
    let mut captures = HashMap::new();
    captures.insert("tag".to_string(), tag.to_string());
    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Tag,
            range: TextRange::new(start, end),
            content: tag.to_string(),
            captures,
        },
        end,
    ))
}

/// `@handle-name`
fn scan_mention(text: &str, start: usize) -> Option<(SyntaxMatch, usize)> {
    let body_start = start + 1;
    let mut end = body_start;
    for (offset, c) in text[body_start..].char_indices() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            end = body_start + offset + c.len_utf8();
        } else {
            break;
        }
    }
    if end == body_start {
        return None;
    }
    let handle = &text[body_start..end];
    let mut captures = HashMap::new();
    captures.insert("handle".to_string(), handle.to_string());
    Some((
        SyntaxMatch {
            kind: SyntaxMatchKind::Mention,
            range: TextRange::new(start, end),
            content: handle.to_string(),
            captures,
        },
        end,
    ))
}

/// Advances past a run of plain ASCII spaces, the only whitespace the
/// `[S] -[P]-> [O]` triple syntax tolerates between its three brackets.
fn skip_spaces(bytes: &[u8], from: usize) -> usize {
    let mut i = from;
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    i
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|p| from + p)
}

fn find_byte_pair(bytes: &[u8], from: usize, a: u8, b: u8) -> Option<usize> {
    let mut i = from;
    while i + 1 < bytes.len() {
        if bytes[i] == a && bytes[i + 1] == b {
            return Some(i);
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_simple_wikilink() {
        let matches = SyntaxScanner::scan("see [[Paris]] for details");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, SyntaxMatchKind::Wikilink);
        assert_eq!(matches[0].captures["target"], "Paris");
    }

    #[test]
    fn matches_wikilink_with_label() {
        let matches = SyntaxScanner::scan("[[Paris|the capital]]");
        assert_eq!(matches[0].captures["target"], "Paris");
        assert_eq!(matches[0].captures["label"], "the capital");
    }

    #[test]
    fn matches_backlink() {
        let matches = SyntaxScanner::scan("<<Paris>>");
        assert_eq!(matches[0].kind, SyntaxMatchKind::Backlink);
        assert_eq!(matches[0].captures["target"], "Paris");
    }

    #[test]
    fn matches_entity_with_sigil_and_kind() {
        let matches = SyntaxScanner::scan("[#person:Alice] went home");
        assert_eq!(matches[0].kind, SyntaxMatchKind::Entity);
        assert_eq!(matches[0].captures["sigil"], "#");
        assert_eq!(matches[0].captures["kind"], "person");
        assert_eq!(matches[0].captures["label"], "Alice");
    }

    #[test]
    fn matches_triple_with_spaced_kind_labels() {
        let matches = SyntaxScanner::scan("[CHARACTER:Luffy] -[DEFEATED]-> [CHARACTER:Kaido]");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, SyntaxMatchKind::Triple);
        assert_eq!(matches[0].captures["subject"], "Luffy");
        assert_eq!(matches[0].captures["predicate"], "DEFEATED");
        assert_eq!(matches[0].captures["object"], "Kaido");
    }

    #[test]
    fn matches_triple_from_plain_brackets() {
        let matches = SyntaxScanner::scan("[Alice]-[knows]->[Bob]");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, SyntaxMatchKind::Triple);
        assert_eq!(matches[0].captures["subject"], "Alice");
        assert_eq!(matches[0].captures["predicate"], "knows");
        assert_eq!(matches[0].captures["object"], "Bob");
    }

    #[test]
    fn matches_inline_relation_with_at_separator() {
        let matches = SyntaxScanner::scan("[CHARACTER:Luffy@DEFEATED] Kaido");
        assert_eq!(matches[0].kind, SyntaxMatchKind::InlineRelation);
        assert_eq!(matches[0].captures["kind"], "CHARACTER");
        assert_eq!(matches[0].captures["label"], "Luffy");
        assert_eq!(matches[0].captures["predicate"], "DEFEATED");
    }

    #[test]
    fn matches_entity_subtype_after_second_separator() {
        let matches = SyntaxScanner::scan("[CHARACTER:Luffy|Pirate] arrived");
        assert_eq!(matches[0].kind, SyntaxMatchKind::Entity);
        assert_eq!(matches[0].captures["label"], "Luffy");
        assert_eq!(matches[0].captures["subtype"], "Pirate");
    }

    #[test]
    fn matches_tag() {
        let matches = SyntaxScanner::scan("a #project-note here");
        assert_eq!(matches[0].kind, SyntaxMatchKind::Tag);
        assert_eq!(matches[0].captures["tag"], "project-note");
    }

    #[test]
    fn html_entity_guard_rejects_amp_hash() {
        let matches = SyntaxScanner::scan("that&#39;s fine");
        assert!(matches.iter().all(|m| m.kind != SyntaxMatchKind::Tag));
    }

    #[test]
    fn matches_mention() {
        let matches = SyntaxScanner::scan("ping @alice-w please");
        assert_eq!(matches[0].kind, SyntaxMatchKind::Mention);
        assert_eq!(matches[0].captures["handle"], "alice-w");
    }

    #[test]
    fn unterminated_wikilink_does_not_abort_scan() {
        let matches = SyntaxScanner::scan("broken [[Paris and then #tag");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].kind, SyntaxMatchKind::Tag);
    }
}
