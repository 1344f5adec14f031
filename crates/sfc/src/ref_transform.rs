//! Reactivity sugar: `let n = $ref(0)` declares a ref whose later reads
//! become `n.value`, `$$(n)` hands out the ref itself.
//!
//! Scoping is file wide: a declared ref name is rewritten everywhere it is
//! read, shadowing declarations are not tracked.

use crate::error::{CompilationError, CompilationErrorKind, SourceLocation};
use crate::js::{parse_any, range, Edits};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, CallExpression, Expression, IdentifierReference, ObjectProperty,
    TSTypeAnnotation, TSTypeParameterInstantiation, VariableDeclarator,
};
use oxc_ast::{visit::walk, Visit};
use oxc_span::GetSpan;

const REF_MACROS: &[(&str, &str)] = &[
    ("$ref", "ref"),
    ("$computed", "computed"),
    ("$shallowRef", "shallowRef"),
    ("$customRef", "customRef"),
    ("$toRef", "toRef"),
];

const IMPORT_SOURCE: &str = "vue";

/// Runtime helper of a declaration macro, empty for `$()`.
fn macro_helper(callee: &Expression) -> Option<&'static str> {
    let Expression::Identifier(id) = callee else {
        return None;
    };
    match id.name.as_str() {
        "$" => Some(""),
        name => REF_MACROS.iter().find(|(m, _)| *m == name).map(|(_, h)| *h),
    }
}

fn is_escape(callee: &Expression) -> bool {
    matches!(callee, Expression::Identifier(id) if id.name.as_str() == "$$")
}

#[derive(Default)]
struct MacroFinder {
    found: bool,
}

impl<'a> Visit<'a> for MacroFinder {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        self.found |= is_escape(&it.callee) || macro_helper(&it.callee).is_some();
        walk::walk_call_expression(self, it);
    }
}

/// Whether `src` uses any reactivity sugar macro.
pub fn should_transform_ref(src: &str) -> bool {
    if !src.contains('$') {
        return false;
    }
    let alloc = Allocator::default();
    let Ok(program) = parse_any(&alloc, src) else {
        return false;
    };
    let mut finder = MacroFinder::default();
    finder.visit_program(&program);
    finder.found
}

/// First pass: ref declarations and their macro callees.
#[derive(Default)]
struct Declarations<'a> {
    refs: Vec<&'a str>,
    helpers: Vec<&'static str>,
    edits: Edits,
}

impl<'a> Visit<'a> for Declarations<'a> {
    fn visit_variable_declarator(&mut self, it: &VariableDeclarator<'a>) {
        if let (BindingPatternKind::BindingIdentifier(id), Some(Expression::CallExpression(call))) =
            (&it.id.kind, &it.init)
        {
            if let Some(helper) = macro_helper(&call.callee) {
                self.refs.push(id.name.as_str());
                let replacement = if helper.is_empty() {
                    String::new()
                } else {
                    if !self.helpers.contains(&helper) {
                        self.helpers.push(helper);
                    }
                    format!("_{}", helper)
                };
                self.edits.replace(range(call.callee.span()), replacement);
            }
        }
        walk::walk_variable_declarator(self, it);
    }
}

/// Second pass: `.value` on every read of a ref, `$$()` unwrapped.
struct Reads<'r, 'a> {
    refs: &'r [&'a str],
    edits: &'r mut Edits,
}

impl<'r, 'a> Visit<'a> for Reads<'r, 'a> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if self.refs.contains(&it.name.as_str()) {
            self.edits.insert(it.span.end as usize, ".value");
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        match &it.value {
            Expression::Identifier(id) if it.shorthand && self.refs.contains(&id.name.as_str()) => {
                self.edits.insert(id.span.end as usize, format!(": {}.value", id.name.as_str()));
            }
            _ => walk::walk_object_property(self, it),
        }
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if is_escape(&it.callee) {
            // the ref itself, not its value
            self.edits.replace(range(it.callee.span()), "");
            return;
        }
        walk::walk_call_expression(self, it);
    }

    fn visit_ts_type_annotation(&mut self, _: &TSTypeAnnotation<'a>) {}
    fn visit_ts_type_parameter_instantiation(&mut self, _: &TSTypeParameterInstantiation<'a>) {}
}

pub fn transform_ref(src: &str) -> Result<String, CompilationError> {
    let alloc = Allocator::default();
    let program = parse_any(&alloc, src).map_err(|e| {
        CompilationError::new(CompilationErrorKind::ScriptSyntax)
            .with_location(SourceLocation::from_range(src, e.offset..e.offset))
            .with_additional_message(e.message)
    })?;
    let mut declarations = Declarations::default();
    declarations.visit_program(&program);
    let Declarations {
        refs,
        helpers,
        mut edits,
    } = declarations;
    Reads {
        refs: &refs,
        edits: &mut edits,
    }
    .visit_program(&program);

    let mut out = String::with_capacity(src.len() + 64);
    if !helpers.is_empty() {
        let specifiers: Vec<String> = helpers.iter().map(|h| format!("{} as _{}", h, h)).collect();
        out.push_str(&format!(
            "import {{ {} }} from '{}'\n",
            specifiers.join(", "),
            IMPORT_SOURCE
        ));
    }
    out.push_str(&edits.apply(src));
    Ok(out)
}
