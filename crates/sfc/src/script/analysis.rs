//! Binding queries over a parsed options API component: the default
//! export object and the keys its options declare.

use super::{BindingMetadata, BindingTypes};
use oxc_ast::ast::{
    ArrayExpressionElement, Expression, ObjectExpression, ObjectPropertyKind, Program, Statement,
};

/// The object literal of `export default {}`,
/// `export default defineComponent({})` or `export default Vue.extend({})`.
pub fn default_export_object<'p, 'a>(program: &'p Program<'a>) -> Option<&'p ObjectExpression<'a>> {
    program.body.iter().find_map(|stmt| match stmt {
        Statement::ExportDefaultDeclaration(decl) => {
            options_object(decl.declaration.as_expression()?)
        }
        _ => None,
    })
}

fn options_object<'p, 'a>(expr: &'p Expression<'a>) -> Option<&'p ObjectExpression<'a>> {
    match expr.get_inner_expression() {
        Expression::ObjectExpression(obj) => Some(obj),
        Expression::CallExpression(call) => {
            match call.arguments.first()?.as_expression()?.get_inner_expression() {
                Expression::ObjectExpression(obj) => Some(obj),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Static keys of an object literal, computed and spread entries skipped.
pub fn object_keys<'a>(obj: &ObjectExpression<'a>) -> Vec<String> {
    obj.properties
        .iter()
        .filter_map(|p| match p {
            ObjectPropertyKind::ObjectProperty(p) if !p.computed => {
                p.key.static_name().map(|n| n.into_owned())
            }
            _ => None,
        })
        .collect()
}

/// Keys of an array of string literals or of an object literal.
pub fn declared_keys(value: &Expression) -> Vec<String> {
    match value.get_inner_expression() {
        Expression::ArrayExpression(arr) => arr
            .elements
            .iter()
            .filter_map(|e| match e {
                ArrayExpressionElement::StringLiteral(s) => Some(s.value.to_string()),
                _ => None,
            })
            .collect(),
        Expression::ObjectExpression(obj) => object_keys(obj),
        _ => vec![],
    }
}

/// Keys of the object literal returned by a `data`/`setup` function.
fn returned_keys(value: &Expression) -> Vec<String> {
    let (statements, expression_body) = match value.get_inner_expression() {
        Expression::FunctionExpression(f) => match &f.body {
            Some(body) => (&body.statements, false),
            None => return vec![],
        },
        Expression::ArrowFunctionExpression(arrow) => (&arrow.body.statements, arrow.expression),
        _ => return vec![],
    };
    let returned = statements.iter().rev().find_map(|stmt| match stmt {
        Statement::ReturnStatement(ret) if !expression_body => ret.argument.as_ref(),
        Statement::ExpressionStatement(expr) if expression_body => Some(&expr.expression),
        _ => None,
    });
    match returned.map(Expression::get_inner_expression) {
        Some(Expression::ObjectExpression(obj)) => object_keys(obj),
        _ => vec![],
    }
}

/// Binding metadata of an options API component.
pub fn analyze_script_bindings(program: &Program) -> BindingMetadata {
    let mut bindings = BindingMetadata::default();
    let Some(options) = default_export_object(program) else {
        return bindings;
    };
    for prop in options.properties.iter() {
        let ObjectPropertyKind::ObjectProperty(prop) = prop else {
            continue;
        };
        let Some(name) = prop.key.static_name() else {
            continue;
        };
        let (keys, ty) = match name.as_ref() {
            "props" => (declared_keys(&prop.value), BindingTypes::Props),
            "inject" | "computed" | "methods" => (declared_keys(&prop.value), BindingTypes::Options),
            "data" => (returned_keys(&prop.value), BindingTypes::Data),
            "setup" => (returned_keys(&prop.value), BindingTypes::SetupMaybeRef),
            _ => continue,
        };
        for key in keys {
            bindings.insert(key, ty);
        }
    }
    bindings
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::js::parse_program;
    use oxc_allocator::Allocator;
    use oxc_span::SourceType;

    fn analyze(src: &str) -> BindingMetadata {
        let alloc = Allocator::default();
        let program = parse_program(&alloc, src, SourceType::ts()).unwrap();
        analyze_script_bindings(&program)
    }

    #[test]
    fn test_analyze_script_bindings() {
        let bindings = analyze(
            r#"
export default {
  props: ['foo', 'bar'],
  inject: { baz: 'baz' },
  data() { return { msg: 'hi', count: 0 } },
  computed: { double() { return 2 } },
  methods: { async run() {}, stop: () => {} },
  setup: () => ({ state: 1 }),
}"#,
        );
        assert_eq!(bindings.get("foo"), Some(&BindingTypes::Props));
        assert_eq!(bindings.get("bar"), Some(&BindingTypes::Props));
        assert_eq!(bindings.get("baz"), Some(&BindingTypes::Options));
        assert_eq!(bindings.get("msg"), Some(&BindingTypes::Data));
        assert_eq!(bindings.get("count"), Some(&BindingTypes::Data));
        assert_eq!(bindings.get("double"), Some(&BindingTypes::Options));
        assert_eq!(bindings.get("run"), Some(&BindingTypes::Options));
        assert_eq!(bindings.get("stop"), Some(&BindingTypes::Options));
        assert_eq!(bindings.get("state"), Some(&BindingTypes::SetupMaybeRef));
        assert_eq!(bindings.len(), 9);
    }

    #[test]
    fn test_wrapped_options() {
        let bindings = analyze(
            "import Vue from 'vue'\nexport default Vue.extend({ props: { title: String }, data: function () { const n = 1; return { n } } })",
        );
        assert_eq!(bindings.get("title"), Some(&BindingTypes::Props));
        assert_eq!(bindings.get("n"), Some(&BindingTypes::Data));
        let bindings = analyze("export default defineComponent({ methods: { [key]: f, ...more, go() {} } } as any)");
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("go"), Some(&BindingTypes::Options));
    }

    #[test]
    fn test_no_default_export() {
        assert!(analyze("export const a = { props: ['x'] }").is_empty());
    }
}
