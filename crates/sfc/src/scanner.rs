//! Markup scanning shared by block splitting and template parsing.
//! It only understands tags, attributes and comments. Everything else
//! is left for the caller to slice out of the source.

use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, Position, SourceLocation};

pub struct Cursor<'a> {
    source: &'a str,
    pos: Position,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: Position::default(),
        }
    }
    pub fn source(&self) -> &'a str {
        self.source
    }
    pub fn offset(&self) -> usize {
        self.pos.offset
    }
    pub fn position(&self) -> Position {
        self.pos.clone()
    }
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos.offset..]
    }
    pub fn is_eof(&self) -> bool {
        self.pos.offset >= self.source.len()
    }
    pub fn starts_with(&self, s: &str) -> bool {
        self.rest().starts_with(s)
    }
    /// Advances `n` bytes. `n` must land on a char boundary.
    pub fn advance(&mut self, n: usize) {
        let end = (self.pos.offset + n).min(self.source.len());
        let skipped = &self.source[self.pos.offset..end];
        self.pos.advance(skipped);
    }
    pub fn advance_to(&mut self, offset: usize) {
        if offset > self.pos.offset {
            self.advance(offset - self.pos.offset);
        }
    }
    pub fn skip_whitespace(&mut self) {
        let n = self.rest().len() - self.rest().trim_start().len();
        self.advance(n);
    }
    pub fn location_from(&self, start: Position) -> SourceLocation {
        SourceLocation {
            start,
            end: self.position(),
        }
    }
    fn error_here(&self, kind: ErrorKind, start: Position) -> CompilationError {
        CompilationError::new(kind).with_location(self.location_from(start))
    }
}

#[derive(Debug, Clone)]
pub struct RawAttr<'a> {
    pub name: &'a str,
    pub value: Option<&'a str>,
    pub loc: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct RawTag<'a> {
    pub name: &'a str,
    pub attrs: Vec<RawAttr<'a>>,
    pub self_closing: bool,
    pub loc: SourceLocation,
}

pub fn is_tag_start(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<') && chars.next().map_or(false, |c| c.is_ascii_alphabetic())
}

pub fn is_end_tag_start(rest: &str) -> bool {
    rest.starts_with("</") && rest[2..].starts_with(|c: char| c.is_ascii_alphabetic())
}

fn is_name_end(c: char) -> bool {
    c.is_ascii_whitespace() || c == '/' || c == '>'
}

/// Skips `<!-- ... -->`. The cursor must be at `<!--`.
pub fn skip_comment(cursor: &mut Cursor) -> Result<(), CompilationError> {
    debug_assert!(cursor.starts_with("<!--"));
    let start = cursor.position();
    match cursor.rest()[4..].find("-->") {
        Some(i) => {
            cursor.advance(4 + i + 3);
            Ok(())
        }
        None => {
            cursor.advance(cursor.rest().len());
            Err(cursor.error_here(ErrorKind::EofInComment, start))
        }
    }
}

/// Scans `<name attr=value ...>` or the self-closing form.
/// The cursor must be at the `<`.
pub fn scan_start_tag<'a>(cursor: &mut Cursor<'a>) -> Result<RawTag<'a>, CompilationError> {
    debug_assert!(is_tag_start(cursor.rest()));
    let start = cursor.position();
    cursor.advance(1);
    let rest = cursor.rest();
    let name_len = rest.find(is_name_end).unwrap_or(rest.len());
    let name = &rest[..name_len];
    cursor.advance(name_len);
    let mut attrs: Vec<RawAttr<'a>> = vec![];
    loop {
        cursor.skip_whitespace();
        if cursor.is_eof() {
            return Err(cursor.error_here(ErrorKind::EofInTag, start));
        }
        if cursor.starts_with("/>") {
            cursor.advance(2);
            return Ok(RawTag {
                name,
                attrs,
                self_closing: true,
                loc: cursor.location_from(start),
            });
        }
        if cursor.starts_with(">") {
            cursor.advance(1);
            return Ok(RawTag {
                name,
                attrs,
                self_closing: false,
                loc: cursor.location_from(start),
            });
        }
        if cursor.starts_with("/") {
            cursor.advance(1);
            continue;
        }
        let attr = scan_attr(cursor)?;
        if attrs.iter().any(|a| a.name == attr.name) {
            return Err(CompilationError::new(ErrorKind::DuplicateAttribute)
                .with_location(attr.loc)
                .with_additional_message(format!(" ({})", attr.name)));
        }
        attrs.push(attr);
    }
}

fn scan_attr<'a>(cursor: &mut Cursor<'a>) -> Result<RawAttr<'a>, CompilationError> {
    let start = cursor.position();
    let rest = cursor.rest();
    // the first char may be `=`, which is kept as part of the name
    let name_len = rest
        .char_indices()
        .skip(1)
        .find(|&(_, c)| is_name_end(c) || c == '=')
        .map_or(rest.len(), |(i, _)| i);
    let name = &rest[..name_len];
    cursor.advance(name_len);
    let before_eq = cursor.position();
    cursor.skip_whitespace();
    if !cursor.starts_with("=") {
        // bare attribute
        let loc = SourceLocation {
            start,
            end: before_eq,
        };
        return Ok(RawAttr {
            name,
            value: None,
            loc,
        });
    }
    cursor.advance(1);
    cursor.skip_whitespace();
    let rest = cursor.rest();
    let value = match rest.chars().next() {
        None => return Err(cursor.error_here(ErrorKind::EofInTag, start)),
        Some('>') => return Err(cursor.error_here(ErrorKind::MissingAttributeValue, start)),
        Some(q @ ('"' | '\'')) => {
            let Some(end) = rest[1..].find(q) else {
                cursor.advance(rest.len());
                return Err(cursor.error_here(ErrorKind::EofInTag, start));
            };
            cursor.advance(end + 2);
            &rest[1..end + 1]
        }
        Some(_) => {
            let end = rest
                .find(|c: char| c.is_ascii_whitespace() || c == '>')
                .unwrap_or(rest.len());
            cursor.advance(end);
            &rest[..end]
        }
    };
    Ok(RawAttr {
        name,
        value: Some(value),
        loc: cursor.location_from(start),
    })
}

/// Scans `</name>` and returns the tag name. The cursor must be at `</`.
pub fn scan_end_tag<'a>(cursor: &mut Cursor<'a>) -> Result<&'a str, CompilationError> {
    let start = cursor.position();
    cursor.advance(2);
    let rest = cursor.rest();
    let name_len = rest.find(is_name_end).unwrap_or(rest.len());
    let name = &rest[..name_len];
    match rest.find('>') {
        Some(i) => {
            cursor.advance(i + 1);
            Ok(name)
        }
        None => {
            cursor.advance(rest.len());
            Err(cursor.error_here(ErrorKind::EofInTag, start))
        }
    }
}
