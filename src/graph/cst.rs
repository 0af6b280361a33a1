//! Builds a lossless Concrete Syntax Tree out of raw text plus the
//! scan events (chunks and syntax matches) located within it, using
//! `rowan`'s green/red tree. The zipper guarantees the tree's leaves
//! cover `[0, len(text))` without gaps or overlaps: syntax matches take
//! precedence over chunks wherever their ranges overlap.

use rowan::{GreenNode, GreenNodeBuilder, Language};

use crate::scanner::chunker::Chunk;
use crate::scanner::syntax::SyntaxMatch;
use crate::scanner::tokenizer::TextRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    Document = 0,
    Paragraph,
    Sentence,
    ChunkSpan,
    SyntaxSpan,
    Word,
    Whitespace,
    Punctuation,
    __Last,
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScanLanguage {}

impl Language for ScanLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> SyntaxKind {
        assert!(raw.0 < SyntaxKind::__Last as u16);
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: SyntaxKind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// One flattened, precedence-ordered scan event to zip into the tree.
struct Span {
    range: TextRange,
    kind: SyntaxKind,
    /// Syntax matches sort before chunks on a tied start so they win ties.
    priority: u8,
}

pub fn build_cst(text: &str, chunks: &[Chunk], syntax: &[SyntaxMatch]) -> GreenNode {
    let mut spans: Vec<Span> = Vec::new();
    for m in syntax {
        spans.push(Span {
            range: m.range,
            kind: SyntaxKind::SyntaxSpan,
            priority: 0,
        });
    }
    for c in chunks {
        spans.push(Span {
            range: c.range,
            kind: SyntaxKind::ChunkSpan,
            priority: 1,
        });
    }
    // Longest-first, syntax-before-chunk on a tied start; drop any span
    // a higher-priority span already covers.
    spans.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| a.priority.cmp(&b.priority))
            .then_with(|| b.range.end.cmp(&a.range.end))
    });
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if kept.iter().any(|k| k.range.overlaps(span.range)) {
            continue;
        }
        kept.push(span);
    }

    let mut builder = GreenNodeBuilder::new();
    builder.start_node(SyntaxKind::Document.into());

    let paragraphs = detect_paragraphs(text);
    for (p_start, p_end) in paragraphs {
        builder.start_node(SyntaxKind::Paragraph.into());
        let sentences = detect_sentences(&text[p_start..p_end]);
        if sentences.is_empty() {
            zip_range(&mut builder, text, p_start, p_end, &kept);
        } else {
            for (s_start, s_end) in sentences {
                builder.start_node(SyntaxKind::Sentence.into());
                zip_range(&mut builder, text, p_start + s_start, p_start + s_end, &kept);
                builder.finish_node();
            }
        }
        builder.finish_node();
    }

    builder.finish_node();
    builder.finish()
}

fn zip_range(builder: &mut GreenNodeBuilder, text: &str, start: usize, end: usize, spans: &[Span]) {
    let mut cursor = start;
    for span in spans {
        if span.range.start < cursor || span.range.end > end {
            continue;
        }
        if span.range.start > cursor {
            tokenize_range(builder, &text[cursor..span.range.start]);
        }
        builder.start_node(span.kind.into());
        builder.token(SyntaxKind::Word.into(), span.range.slice(text));
        builder.finish_node();
        cursor = span.range.end;
    }
    if cursor < end {
        tokenize_range(builder, &text[cursor..end]);
    }
}

fn tokenize_range(builder: &mut GreenNodeBuilder, text: &str) {
    let mut rest = text;
    while !rest.is_empty() {
        let (len, kind) = lex_next_token(rest);
        builder.token(kind.into(), &rest[..len]);
        rest = &rest[len..];
    }
}

fn is_contraction_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

fn is_punctuation_char(c: char) -> bool {
    !is_contraction_apostrophe(c) && (c.is_ascii_punctuation() || matches!(c,
        '\u{2018}' | '\u{2019}' | '\u{201C}' | '\u{201D}' | '\u{2014}' | '\u{2013}' |
        '\u{2026}' | '\u{00AB}' | '\u{00BB}'))
}

fn lex_next_token(text: &str) -> (usize, SyntaxKind) {
    let mut chars = text.char_indices();
    let (_, first) = chars.next().expect("non-empty");

    if first.is_whitespace() {
        let mut end = first.len_utf8();
        for (pos, c) in chars {
            if c.is_whitespace() {
                end = pos + c.len_utf8();
            } else {
                break;
            }
        }
        return (end, SyntaxKind::Whitespace);
    }

    if is_punctuation_char(first) {
        return (first.len_utf8(), SyntaxKind::Punctuation);
    }

    let mut end = first.len_utf8();
    for (pos, c) in chars {
        if c.is_whitespace() || (is_punctuation_char(c) && !is_contraction_apostrophe(c)) {
            break;
        }
        end = pos + c.len_utf8();
    }
    (end, SyntaxKind::Word)
}

const ABBREVIATIONS: &[&str] = &[
    "dr", "mr", "mrs", "ms", "prof", "rev", "sr", "jr", "vs", "etc", "i.e", "e.g", "cf",
    "inc", "ltd", "corp", "st", "ave", "blvd", "rd", "mt", "ft",
];

fn is_abbreviation(text: &str, period_offset: usize) -> bool {
    let before = &text[..period_offset];
    let word_start = before
        .rfind(|c: char| c.is_whitespace())
        .map(|p| p + 1)
        .unwrap_or(0);
    let word = &before[word_start..];
    if word.chars().count() == 1 && word.chars().next().map(|c| c.is_uppercase()).unwrap_or(false) {
        return true;
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Paragraph boundaries: a run of two or more newlines splits
/// paragraphs; `\r\n` is treated as a single newline. Falls back to
/// one whole-text paragraph when no break is found.
fn detect_paragraphs(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut paragraphs = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'\n' {
            let mut j = i + 1;
            let mut newline_count = 1;
            while j < bytes.len() {
                if bytes[j] == b'\n' {
                    newline_count += 1;
                    j += 1;
                } else if bytes[j] == b'\r' && bytes.get(j + 1) == Some(&b'\n') {
                    j += 2;
                } else {
                    break;
                }
            }
            if newline_count >= 2 {
                let end = trim_end(text, start, i);
                if end > start {
                    paragraphs.push((start, end));
                }
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    let end = trim_end(text, start, text.len());
    if end > start {
        paragraphs.push((start, end));
    }
    if paragraphs.is_empty() {
        paragraphs.push((0, text.len()));
    }
    paragraphs
}

fn trim_end(text: &str, start: usize, end: usize) -> usize {
    text[start..end]
        .trim_end()
        .len()
        + start
}

/// Sentence boundaries within `text`: a `.`/`!`/`?`/`…` ends a sentence
/// unless it's an abbreviation period, and only if the next
/// non-whitespace character looks like the start of a new sentence
/// (uppercase, a quote, or end of input).
fn detect_sentences(text: &str) -> Vec<(usize, usize)> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let char_positions: Vec<(usize, char)> = text.char_indices().collect();

    for (i, &(pos, c)) in char_positions.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?' | '\u{2026}') {
            continue;
        }
        if c == '.' && is_abbreviation(text, pos) {
            continue;
        }
        let end = pos + c.len_utf8();
        let next_nonspace = char_positions[i + 1..]
            .iter()
            .find(|(_, c)| !c.is_whitespace());
        let confirmed = match next_nonspace {
            None => true,
            Some((_, nc)) => nc.is_uppercase() || matches!(nc, '"' | '\u{201C}' | '\''),
        };
        if confirmed {
            sentences.push((start, end));
            start = end;
        }
    }
    if start < text.len() && !text[start..].trim().is_empty() {
        sentences.push((start, text.len()));
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use rowan::SyntaxNode;

    #[test]
    fn paragraphs_split_on_blank_line() {
        let p = detect_paragraphs("First para.\n\nSecond para.");
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn single_newline_does_not_split_paragraph() {
        let p = detect_paragraphs("line one\nline two");
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn sentence_detection_respects_abbreviations() {
        let s = detect_sentences("Dr. Smith arrived. He left.");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn zipper_covers_whole_text_without_gaps() {
        let text = "Alice met Bob in Paris.";
        let green = build_cst(text, &[], &[]);
        let root: SyntaxNode<ScanLanguage> = SyntaxNode::new_root(green);
        assert_eq!(root.text().to_string(), text);
    }

    #[test]
    fn syntax_span_wins_overlap_with_chunk() {
        let text = "[[Paris]]";
        let syntax_matches = crate::scanner::syntax::SyntaxScanner::scan(text);
        let chunks = crate::scanner::chunker::Chunker::new().chunk(text).chunks;
        let green = build_cst(text, &chunks, &syntax_matches);
        let root: SyntaxNode<ScanLanguage> = SyntaxNode::new_root(green);
        let has_syntax_span = root
            .descendants()
            .any(|n| n.kind() == SyntaxKind::SyntaxSpan);
        assert!(has_syntax_span);
        assert_eq!(root.text().to_string(), text);
    }
}
