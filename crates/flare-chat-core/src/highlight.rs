//! Syntax tokenizer for code blocks in chat messages
//!
//! The scanner walks the source left to right and tries a fixed, ordered rule
//! table at the cursor. The first rule that matches wins (not the longest
//! match), so comments and strings shadow everything that could appear inside
//! them. When no rule matches, a single character is emitted as
//! [`TokenKind::Default`]. Concatenating the text of every token always gives
//! back the input.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Classification of a highlighted span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    String,
    Keyword,
    FunctionName,
    Number,
    Punctuation,
    Default,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::String => "string",
            TokenKind::Keyword => "keyword",
            TokenKind::FunctionName => "function",
            TokenKind::Number => "number",
            TokenKind::Punctuation => "punctuation",
            TokenKind::Default => "default",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, contiguous slice of the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str) -> Self {
        Self { kind, text }
    }
}

const KEYWORDS: &[&str] = &[
    "const", "let", "var", "import", "from", "export", "if", "else", "return", "function",
    "class", "extends", "new", "try", "catch", "finally", "async", "await",
];

struct Rule {
    kind: TokenKind,
    /// Anchored at the cursor. Group 1 is the token text.
    pattern: Regex,
    /// Rule may only fire when the cursor is not in the middle of a word.
    word_start: bool,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |kind, pattern: &str, word_start| Rule {
            kind,
            // Patterns are compile-time constants.
            pattern: Regex::new(pattern).expect("highlight rule pattern"),
            word_start,
        };

        vec![
            rule(
                TokenKind::Comment,
                r"^(//[^\r\n\x{2028}\x{2029}]*|/\*[\s\S]*?\*/)",
                false,
            ),
            rule(
                TokenKind::String,
                r#"^('(?:\\[^\r\n\x{2028}\x{2029}]|[^'\\])*'|"(?:\\[^\r\n\x{2028}\x{2029}]|[^"\\])*")"#,
                false,
            ),
            rule(
                TokenKind::Keyword,
                format!(r"^({})(?-u:\b)", KEYWORDS.join("|")).as_str(),
                true,
            ),
            rule(
                TokenKind::FunctionName,
                r"^([A-Za-z_$][A-Za-z0-9_$]*)\s*\(",
                false,
            ),
            rule(
                TokenKind::Number,
                r"^(0x[0-9a-fA-F]+|[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?)(?-u:\b)",
                false,
            ),
            rule(TokenKind::Punctuation, r"^([{}\[\](),.;:?])", false),
        ]
    })
}

/// Word characters in the ASCII sense, matching `(?-u:\b)` in the rules.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Iterator over the tokens of a source string.
pub struct Tokens<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn match_rule(&self, rest: &'a str) -> Option<Token<'a>> {
        let mid_word = self.source[..self.pos]
            .chars()
            .next_back()
            .is_some_and(is_word_char);

        rules()
            .iter()
            .filter(|rule| !(rule.word_start && mid_word))
            .find_map(|rule| {
                let caps = rule.pattern.captures(rest)?;
                let text = caps.get(1)?.as_str();
                // Every rule consumes at least one character; guard anyway so
                // the scanner can never stall.
                (!text.is_empty()).then(|| Token::new(rule.kind, text))
            })
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.source[self.pos..];
        let first = rest.chars().next()?;

        let token = self
            .match_rule(rest)
            .unwrap_or_else(|| Token::new(TokenKind::Default, &rest[..first.len_utf8()]));

        self.pos += token.text.len();
        Some(token)
    }
}

/// Split `source` into highlighted tokens.
///
/// Never fails: input no rule recognizes (including unterminated strings and
/// comments) comes back as one `Default` token per character.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Tokens::new(source).collect()
}
