//! Byte-offset tokenizer: splits text into word and punctuation tokens.
//!
//! A word run is alphanumeric, apostrophe, or hyphen characters; every
//! other non-whitespace character is its own single-character
//! punctuation token. Iteration is by Unicode scalar value, so the
//! range end for a multi-byte punctuation character is the next
//! code-point boundary, never a mid-character byte offset.

/// Half-open byte range `[start, end)` into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "TextRange start must not exceed end");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn contains(&self, other: TextRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub range: TextRange,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '-'
}

pub struct Tokenizer;

impl Tokenizer {
    /// Splits `text` into word and punctuation tokens, skipping whitespace.
    /// Word tokens are maximal runs of `is_word_char`; every other
    /// non-whitespace scalar value is emitted as its own single-character
    /// punctuation token.
    pub fn tokenize(text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut chars = text.char_indices().peekable();

        while let Some(&(start, c)) = chars.peek() {
            if c.is_whitespace() {
                chars.next();
                continue;
            }

            if is_word_char(c) {
                let mut end = start + c.len_utf8();
                chars.next();
                while let Some(&(pos, next_c)) = chars.peek() {
                    if is_word_char(next_c) {
                        end = pos + next_c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let range = TextRange::new(start, end);
                tokens.push(Token {
                    text: range.slice(text).to_string(),
                    range,
                });
            } else {
                let end = start + c.len_utf8();
                chars.next();
                let range = TextRange::new(start, end);
                tokens.push(Token {
                    text: range.slice(text).to_string(),
                    range,
                });
            }
        }

        tokens
    }
}
