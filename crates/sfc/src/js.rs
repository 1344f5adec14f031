//! Shared plumbing over the oxc parser: source types, parse errors as
//! offsets, binding pattern names and span based text edits.

use oxc_allocator::Allocator;
use oxc_ast::ast::{BindingPattern, BindingPatternKind, Expression, ModuleExportName, Program};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::{GetSpan, SourceType, Span};
use std::ops::Range;

/// First error of a failed parse, relative to the parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    fn from_diagnostics(errors: &[oxc_diagnostics::OxcDiagnostic]) -> Self {
        let first = errors.first();
        Self {
            offset: first
                .and_then(|e| e.labels.as_ref())
                .and_then(|labels| labels.first())
                .map_or(0, |label| label.offset()),
            message: first.map_or_else(|| "unknown error".into(), |e| e.message.to_string()),
        }
    }
}

/// Source type of a script block by its `lang`.
pub fn source_type(lang: Option<&str>) -> SourceType {
    match lang {
        Some("ts") => SourceType::ts(),
        Some("tsx") => SourceType::tsx(),
        Some("jsx") => SourceType::jsx(),
        _ => SourceType::mjs(),
    }
}

pub fn parse_program<'a>(
    alloc: &'a Allocator,
    src: &'a str,
    source_type: SourceType,
) -> Result<Program<'a>, SyntaxError> {
    let ret = Parser::new(alloc, src, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(SyntaxError::from_diagnostics(&ret.errors));
    }
    Ok(ret.program)
}

/// Parses a module whose language is unknown: TypeScript first, then
/// TSX for markup.
pub fn parse_any<'a>(alloc: &'a Allocator, src: &'a str) -> Result<Program<'a>, SyntaxError> {
    parse_program(alloc, src, SourceType::ts())
        .or_else(|first| parse_program(alloc, src, SourceType::tsx()).map_err(|_| first))
}

/// Parses `src` as one expression spanning all of it.
pub fn parse_expression<'a>(alloc: &'a Allocator, src: &'a str) -> Option<Expression<'a>> {
    let expr = Parser::new(alloc, src, SourceType::mjs()).parse_expression().ok()?;
    // the parser stops after the expression
    src[expr.span().end as usize..].trim().is_empty().then_some(expr)
}

/// Parses template code: a single expression, or statements with bare
/// `return`s for inline handlers.
pub enum TemplateCode<'a> {
    Expression(Expression<'a>),
    Statements(Program<'a>),
}

pub fn parse_template_code<'a>(alloc: &'a Allocator, src: &'a str) -> Option<TemplateCode<'a>> {
    if let Some(expr) = parse_expression(alloc, src) {
        return Some(TemplateCode::Expression(expr));
    }
    let ret = Parser::new(alloc, src, SourceType::mjs())
        .with_options(ParseOptions {
            allow_return_outside_function: true,
            ..ParseOptions::default()
        })
        .parse();
    (ret.errors.is_empty() && !ret.panicked).then(|| TemplateCode::Statements(ret.program))
}

/// Names bound by a declaration or parameter pattern, in source order.
pub fn binding_names<'a>(pattern: &BindingPattern<'a>, names: &mut Vec<&'a str>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(id) => names.push(id.name.as_str()),
        BindingPatternKind::ObjectPattern(obj) => {
            for prop in obj.properties.iter() {
                binding_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                binding_names(elem, names);
            }
            if let Some(rest) = &arr.rest {
                binding_names(&rest.argument, names);
            }
        }
        BindingPatternKind::AssignmentPattern(assign) => binding_names(&assign.left, names),
    }
}

pub fn export_name<'a>(name: &ModuleExportName<'a>) -> &'a str {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.as_str(),
        ModuleExportName::IdentifierReference(id) => id.name.as_str(),
        ModuleExportName::StringLiteral(s) => s.value.as_str(),
    }
}

pub fn range(span: Span) -> Range<usize> {
    span.start as usize..span.end as usize
}

/// Text replacements over one source. Ranges must not overlap, inserts
/// at the same offset keep their order.
#[derive(Default)]
pub struct Edits {
    edits: Vec<(Range<usize>, String)>,
}

impl Edits {
    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.push((range, text.into()));
    }

    pub fn insert(&mut self, offset: usize, text: impl Into<String>) {
        self.replace(offset..offset, text);
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn apply(mut self, src: &str) -> String {
        self.edits.sort_by_key(|(r, _)| r.start);
        let mut out = String::with_capacity(src.len() + 16 * self.edits.len());
        let mut last = 0;
        for (range, text) in self.edits {
            if range.start < last {
                continue;
            }
            out.push_str(&src[last..range.start]);
            out.push_str(&text);
            last = range.end;
        }
        out.push_str(&src[last..]);
        out
    }
}
