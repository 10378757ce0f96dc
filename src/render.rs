use colored::*;
use flare_chat_core::{segments, tokenize, Role, Segment, Token, TokenKind, Turn};

/// Color a token the way the web client's code blocks did.
pub fn paint(token: &Token) -> ColoredString {
    match token.kind {
        TokenKind::Keyword => token.text.truecolor(192, 132, 252),
        TokenKind::String => token.text.truecolor(74, 222, 128),
        TokenKind::FunctionName => token.text.truecolor(96, 165, 250),
        TokenKind::Number => token.text.truecolor(251, 146, 60),
        TokenKind::Comment => token.text.truecolor(115, 115, 115),
        TokenKind::Punctuation => token.text.truecolor(212, 212, 212),
        TokenKind::Default => token.text.truecolor(229, 229, 229),
    }
}

pub fn highlight(code: &str) -> String {
    tokenize(code)
        .iter()
        .map(|token| paint(token).to_string())
        .collect()
}

fn render_code_block(language: &str, code: &str) -> String {
    let header = format!("── {} ", language.to_uppercase());
    format!(
        "{}\n{}\n{}\n",
        header.dimmed(),
        highlight(code),
        "──".dimmed()
    )
}

/// Render one turn for the terminal. Assistant replies get their fenced code
/// blocks highlighted in place.
pub fn render_turn(turn: &Turn) -> String {
    match turn.role {
        Role::User => format!("{} {}", "You:".bold().white(), turn.content),
        Role::Assistant | Role::System => {
            let mut out = format!("{}\n", "Flarista:".bold().magenta());
            for segment in segments(&turn.content) {
                match segment {
                    Segment::Text(text) => out.push_str(text),
                    Segment::Code(block) => {
                        out.push_str(&render_code_block(&block.language, &block.code))
                    }
                }
            }
            out
        }
    }
}
