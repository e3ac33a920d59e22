//! Word and sentence-boundary tokenization.
//!
//! Applies only to text the metadata matcher has not claimed. One
//! left-to-right, Unicode-aware pass recognizes two token classes in source
//! order: word spans (letters, digits, marks, connectors, plus the
//! typographic apostrophe) and single sentence-terminating punctuation
//! marks. Terminators mark sentence *boundaries*, not spans - consumers
//! reconstruct sentence extents from consecutive boundary positions.

use unicode_xid::UnicodeXID;

/// Token classes, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A span of word characters.
    Word,
    /// A single sentence-terminating punctuation character.
    Boundary,
}

/// A token slice with its byte offset within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token within the scanned node.
    pub offset: usize,
}

/// Characters that terminate a sentence.
#[inline]
pub fn is_terminator(c: char) -> bool {
    matches!(c, '.' | ';' | ':' | '?' | '!')
}

/// Word characters: `XID_Continue` (letters, digits, marks, connectors)
/// plus the typographic apostrophe U+2019.
#[inline]
pub fn is_word_char(c: char) -> bool {
    c == '\u{2019}' || c.is_xid_continue()
}

/// Iterator over the tokens of one text node.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

/// Tokenize a text node.
pub fn tokens(text: &str) -> Tokens<'_> {
    Tokens { text, pos: 0 }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let base = self.pos;
        let mut chars = self.text[base..].char_indices();
        while let Some((i, c)) = chars.next() {
            let at = base + i;
            if is_terminator(c) {
                self.pos = at + c.len_utf8();
                return Some(Token {
                    kind: TokenKind::Boundary,
                    text: &self.text[at..self.pos],
                    offset: at,
                });
            }
            if is_word_char(c) {
                let mut end = at + c.len_utf8();
                for (j, next) in chars.by_ref() {
                    if !is_word_char(next) {
                        break;
                    }
                    end = base + j + next.len_utf8();
                }
                // The char that ended the span is rescanned next call; it
                // may itself be a terminator.
                self.pos = end;
                return Some(Token {
                    kind: TokenKind::Word,
                    text: &self.text[at..end],
                    offset: at,
                });
            }
        }
        self.pos = self.text.len();
        None
    }
}
