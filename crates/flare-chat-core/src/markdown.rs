//! Fenced code block extraction from assistant replies

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::highlight::{tokenize, Token};

/// A fenced code block with a language tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: String,
    pub code: String,
    /// Byte range of the whole fenced block (fences included) in the message.
    pub span: Range<usize>,
}

impl CodeBlock {
    pub fn tokens(&self) -> Vec<Token<'_>> {
        tokenize(&self.code)
    }
}

/// A message split into plain text and highlightable code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Code(CodeBlock),
}

/// Collect the fenced code blocks of a markdown message.
///
/// Only blocks that name a language are returned; untagged fences and
/// indented blocks stay plain text. One trailing newline is trimmed from each
/// block.
pub fn code_blocks(markdown: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<CodeBlock> = None;

    for (event, range) in Parser::new_ext(markdown, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                let language = info.split_whitespace().next().unwrap_or_default();
                if !language.is_empty() {
                    current = Some(CodeBlock {
                        language: language.to_string(),
                        code: String::new(),
                        span: range,
                    });
                }
            }
            Event::Text(text) => {
                if let Some(block) = current.as_mut() {
                    block.code.push_str(&text);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(mut block) = current.take() {
                    if block.code.ends_with('\n') {
                        block.code.pop();
                    }
                    blocks.push(block);
                }
            }
            _ => {}
        }
    }

    blocks
}

/// Split a message into text runs and tagged code blocks, in order.
pub fn segments(markdown: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for block in code_blocks(markdown) {
        if block.span.start > cursor {
            segments.push(Segment::Text(&markdown[cursor..block.span.start]));
        }
        cursor = block.span.end;
        segments.push(Segment::Code(block));
    }
    if cursor < markdown.len() {
        segments.push(Segment::Text(&markdown[cursor..]));
    }

    segments
}
