#[cfg(feature = "serde")]
use serde::Serialize;
use std::fmt;
use std::ops::Range;

#[derive(PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Position {
    /// the 0-indexed byte offset in the source str
    pub offset: usize,
    /// the 1-indexed line number in the source code
    pub line: usize,
    /// the 1-indexed column number in the source code
    pub column: usize,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Position {
    /// Moves the position over `text`, which must be the source slice
    /// starting at the current offset.
    pub fn advance(&mut self, text: &str) {
        for c in text.chars() {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    pub fn from_offset(source: &str, offset: usize) -> Self {
        let mut pos = Self::default();
        let end = floor_char_boundary(source, offset);
        pos.advance(&source[..end]);
        pos
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[derive(Default, PartialEq, Eq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub fn from_range(source: &str, range: Range<usize>) -> Self {
        Self {
            start: Position::from_offset(source, range.start),
            end: Position::from_offset(source, range.end),
        }
    }
}

impl From<SourceLocation> for Range<usize> {
    fn from(location: SourceLocation) -> Self {
        location.start.offset..location.end.offset
    }
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum CompilationErrorKind {
    // markup errors shared by block splitting and template parsing
    DuplicateAttribute,
    EofInComment,
    EofInTag,
    InvalidEndTag,
    MissingAttributeValue,
    MissingEndTag,

    // SFC block errors
    DuplicateTemplate,
    DuplicateScript,
    DuplicateScriptSetup,
    ScriptSetupSrc,

    // script errors
    MissingScript,
    ScriptLangMismatch,
    ScriptSetupExport,
    ScriptSyntax,

    // template errors
    MissingInterpolationEnd,
    NoRootElement,
    MultipleRoot,
    VForOnRoot,
    VIfNoExpression,
    VElseNoAdjacentIf,
    VForNoExpression,
    VForMalformedExpression,
    VBindNoExpression,
    VOnNoExpression,

    // template or style preprocessor
    UnsupportedPreprocessor,

    // style errors
    StyleSyntax,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CompilationError {
    pub kind: CompilationErrorKind,
    pub additional_message: Option<String>,
    pub location: SourceLocation,
}

impl CompilationError {
    pub fn new(kind: CompilationErrorKind) -> Self {
        Self {
            kind,
            additional_message: None,
            location: Default::default(),
        }
    }
    pub fn with_location(mut self, loc: SourceLocation) -> Self {
        self.location = loc;
        self
    }
    pub fn with_additional_message(mut self, msg: String) -> Self {
        self.additional_message = Some(msg);
        self
    }

    pub fn msg(&self) -> &'static str {
        msg(&self.kind)
    }
}

#[cold]
#[inline(never)]
fn msg(kind: &CompilationErrorKind) -> &'static str {
    use CompilationErrorKind::*;
    match *kind {
        DuplicateAttribute => "Duplicate attribute.",
        EofInComment => "Unexpected EOF in comment.",
        EofInTag => "Unexpected EOF in tag.",
        InvalidEndTag => "Invalid end tag.",
        MissingAttributeValue => "Attribute value was expected.",
        MissingEndTag => "Element is missing end tag.",

        DuplicateTemplate => "Single file component can contain only one <template> element.",
        DuplicateScript => "Single file component can contain only one <script> element.",
        DuplicateScriptSetup =>
            "Single file component can contain only one <script setup> element.",
        ScriptSetupSrc =>
            r#"<script setup> cannot use the "src" attribute because its syntax will be ambiguous outside of the component."#,

        MissingScript => "Single file component has neither <script> nor <script setup>.",
        ScriptLangMismatch => "<script> and <script setup> must have the same language type.",
        ScriptSetupExport => "<script setup> cannot contain ES module exports.",
        ScriptSyntax => "Invalid script syntax: ",

        MissingInterpolationEnd => "Interpolation end sign was not found.",
        NoRootElement => "Component template requires a root element, rather than just text.",
        MultipleRoot =>
            "Component template should contain exactly one root element. If you are using v-if on multiple elements, use v-else-if to chain them instead.",
        VForOnRoot =>
            "Cannot use v-for on stateful component root element because it renders multiple elements.",
        VIfNoExpression => "v-if/v-else-if is missing expression.",
        VElseNoAdjacentIf => "v-else/v-else-if has no adjacent v-if.",
        VForNoExpression => "v-for is missing expression.",
        VForMalformedExpression => "v-for has invalid expression.",
        VBindNoExpression => "v-bind is missing expression.",
        VOnNoExpression => "v-on is missing expression.",
        UnsupportedPreprocessor => "Preprocessor is not supported: ",

        StyleSyntax => "Invalid CSS: ",
    }
}

impl fmt::Display for CompilationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(additional) = &self.additional_message {
            write!(f, "{}{}", self.msg(), additional)
        } else {
            write!(f, "{}", self.msg())
        }
    }
}

impl std::error::Error for CompilationError {}

/// Non-fatal hint produced by the template compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CompilerTip {
    pub message: String,
    pub location: SourceLocation,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_position_from_offset() {
        let src = "ab\ncd\né";
        let pos = Position::from_offset(src, 4);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
        // offset inside a multibyte char is floored
        let pos = Position::from_offset(src, 7);
        assert_eq!(pos.line, 3);
        assert_eq!(pos.column, 1);
    }

    #[test]
    fn test_error_display() {
        let err = CompilationError::new(CompilationErrorKind::UnsupportedPreprocessor)
            .with_additional_message("pug".into());
        assert_eq!(err.to_string(), "Preprocessor is not supported: pug");
    }
}
