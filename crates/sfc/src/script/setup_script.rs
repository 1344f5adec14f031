use super::analysis::{analyze_script_bindings, declared_keys};
use super::{parse_block, BindingMetadata, BindingTypes, SfcScriptCompileOptions};
use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, SourceLocation};
use crate::js::{binding_names, range, Edits};
use crate::rewrite_default::rewrite_default;
use crate::{SfcBlock, SfcDescriptor, SfcScriptBlock};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, AwaitExpression, BindingPatternKind, CallExpression, Declaration,
    Expression, ForOfStatement, Function, ImportDeclarationSpecifier, Statement, TSLiteral,
    TSSignature, TSType, VariableDeclaration, VariableDeclarationKind,
};
use oxc_ast::{visit::walk, Visit};
use oxc_span::GetSpan;
use oxc_syntax::scope::ScopeFlags;
use std::fmt::Write;

const DEFAULT_VAR: &str = "__default__";
const DEFINE_PROPS: &str = "defineProps";
const DEFINE_EMITS: &str = "defineEmits";

#[derive(Default)]
struct MacroDecls {
    props: Option<String>,
    emits: Option<String>,
}

/// Setup body under construction.
struct Setup<'s> {
    source: &'s str,
    bindings: BindingMetadata,
    returned: Vec<&'s str>,
    macros: MacroDecls,
}

pub fn compile_setup(
    sfc: &SfcDescriptor,
    script: Option<&SfcScriptBlock>,
    setup: &SfcScriptBlock,
    options: &SfcScriptCompileOptions,
) -> Result<SfcScriptBlock, CompilationError> {
    if let Some(script) = script {
        if script.lang != setup.lang {
            return Err(CompilationError::new(ErrorKind::ScriptLangMismatch)
                .with_location(setup.loc.clone()));
        }
    }
    let alloc = Allocator::default();
    let mut code = String::new();
    let mut bindings = BindingMetadata::default();
    if let Some(script) = script {
        let program = parse_block(&alloc, sfc, script)?;
        bindings.extend(analyze_script_bindings(&program));
        code.push_str(&rewrite_default(&script.content, DEFAULT_VAR));
        code.push('\n');
    }

    let source = setup.content.as_str();
    let program = parse_block(&alloc, sfc, setup)?;
    let mut state = Setup {
        source,
        bindings,
        returned: vec![],
        macros: MacroDecls::default(),
    };
    let mut hoisted = String::new();
    let mut body = String::new();
    let mut has_await = false;
    for stmt in program.body.iter() {
        let text = &source[range(stmt.span())];
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let ty = if decl.source.value.ends_with(".vue") {
                    BindingTypes::SetupConst
                } else {
                    BindingTypes::SetupMaybeRef
                };
                for spec in decl.specifiers.iter().flatten() {
                    let (local, is_type) = match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => {
                            (&s.local, s.import_kind.is_type())
                        }
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => (&s.local, false),
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => (&s.local, false),
                    };
                    if !is_type && !decl.import_kind.is_type() {
                        state.declare(local.name.as_str(), ty);
                    }
                }
                writeln!(hoisted, "{}", text).ok();
            }
            Statement::ExportNamedDeclaration(decl) if is_type_export(decl) => {
                writeln!(hoisted, "{}", text).ok();
            }
            Statement::ExportNamedDeclaration(_)
            | Statement::ExportDefaultDeclaration(_)
            | Statement::ExportAllDeclaration(_) => {
                let offset = setup.loc.start.offset + stmt.span().start as usize;
                let loc = SourceLocation::from_range(&sfc.source, offset..offset);
                return Err(CompilationError::new(ErrorKind::ScriptSetupExport).with_location(loc));
            }
            _ => {
                has_await |= has_top_level_await(stmt);
                if let Some(rewritten) = state.process_statement(stmt) {
                    body.push_str(&rewritten);
                    body.push('\n');
                }
            }
        }
    }

    let Setup {
        bindings,
        returned,
        macros,
        ..
    } = state;
    code.push_str(&hoisted);
    code.push('\n');
    if script.is_some() {
        write!(code, "export default /*#__PURE__*/Object.assign({}, {{\n", DEFAULT_VAR).ok();
    } else {
        code.push_str("export default {\n");
    }
    if let Some(props) = &macros.props {
        writeln!(code, "  props: {},", props).ok();
    }
    if let Some(emits) = &macros.emits {
        writeln!(code, "  emits: {},", emits).ok();
    }
    let async_kw = if has_await { "async " } else { "" };
    writeln!(code, "  {}setup(__props, __ctx) {{", async_kw).ok();
    code.push_str(&body);
    let returned = returned.join(", ");
    if options.is_prod {
        writeln!(code, "return {{ {} }}", returned).ok();
    } else {
        writeln!(code, "const __returned__ = {{ {} }}", returned).ok();
        code.push_str("Object.defineProperty(__returned__, '__isScriptSetup', { enumerable: false, value: true })\n");
        code.push_str("return __returned__\n");
    }
    code.push_str("}\n\n");
    code.push_str(if script.is_some() { "})\n" } else { "}\n" });

    let mut block = setup.block.clone();
    block.content = code;
    block.map = None;
    block.attrs = merged_attrs(script.map(|s| &s.block), &setup.block);
    Ok(SfcScriptBlock {
        setup: true,
        bindings: Some(bindings),
        block,
    })
}

fn is_type_export(decl: &oxc_ast::ast::ExportNamedDeclaration) -> bool {
    decl.export_kind.is_type()
        || matches!(
            decl.declaration,
            Some(Declaration::TSTypeAliasDeclaration(_) | Declaration::TSInterfaceDeclaration(_))
        )
}

fn merged_attrs(script: Option<&SfcBlock>, setup: &SfcBlock) -> crate::BlockAttrs {
    let mut attrs = script.map(|s| s.attrs.clone()).unwrap_or_default();
    for (name, value) in setup.attrs.iter() {
        attrs.insert(name, value.clone());
    }
    attrs
}

/// Finds `await` outside of nested functions.
#[derive(Default)]
struct AwaitFinder {
    found: bool,
}

impl<'a> Visit<'a> for AwaitFinder {
    fn visit_await_expression(&mut self, _: &AwaitExpression<'a>) {
        self.found = true;
    }
    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.found |= it.r#await;
        walk::walk_for_of_statement(self, it);
    }
    fn visit_function(&mut self, _: &Function<'a>, _: ScopeFlags) {}
    fn visit_arrow_function_expression(&mut self, _: &ArrowFunctionExpression<'a>) {}
}

fn has_top_level_await(stmt: &Statement) -> bool {
    let mut finder = AwaitFinder::default();
    finder.visit_statement(stmt);
    finder.found
}

/// `defineProps(...)` or `defineEmits(...)`.
fn macro_call<'p, 'a>(expr: &'p Expression<'a>) -> Option<(&'static str, &'p CallExpression<'a>)> {
    let Expression::CallExpression(call) = expr.get_inner_expression() else {
        return None;
    };
    let Expression::Identifier(callee) = &call.callee else {
        return None;
    };
    match callee.name.as_str() {
        DEFINE_PROPS => Some((DEFINE_PROPS, call)),
        DEFINE_EMITS => Some((DEFINE_EMITS, call)),
        _ => None,
    }
}

/// Whether a const initializer never holds a ref.
fn is_const_init(init: &Expression) -> bool {
    match init.get_inner_expression() {
        Expression::FunctionExpression(_)
        | Expression::ArrowFunctionExpression(_)
        | Expression::ClassExpression(_)
        | Expression::StringLiteral(_)
        | Expression::NumericLiteral(_)
        | Expression::BigIntLiteral(_)
        | Expression::BooleanLiteral(_)
        | Expression::NullLiteral(_) => true,
        Expression::TemplateLiteral(t) => t.expressions.is_empty(),
        Expression::CallExpression(call) => {
            matches!(&call.callee, Expression::Identifier(id) if id.name.as_str() == "reactive")
        }
        _ => false,
    }
}

impl<'s> Setup<'s> {
    fn declare(&mut self, name: &'s str, ty: BindingTypes) {
        self.bindings.insert(name.to_string(), ty);
        self.returned.push(name);
    }

    /// Registers the bindings a statement declares and rewrites compiler
    /// macros. Returns `None` for statements that are dropped.
    fn process_statement(&mut self, stmt: &Statement<'s>) -> Option<String> {
        let span = stmt.span();
        let text = &self.source[range(span)];
        match stmt {
            Statement::ExpressionStatement(expr) => {
                if let Some((name, call)) = macro_call(&expr.expression) {
                    // bare `defineProps()` statement
                    self.register_macro(name, call);
                    return None;
                }
            }
            Statement::VariableDeclaration(decl) => {
                if decl.declare {
                    return None;
                }
                let mut edits = Edits::default();
                self.process_declaration(decl, span.start as usize, &mut edits);
                return Some(edits.apply(text));
            }
            Statement::FunctionDeclaration(f) => {
                if f.declare {
                    return None;
                }
                if let Some(id) = &f.id {
                    self.declare(id.name.as_str(), BindingTypes::SetupConst);
                }
            }
            Statement::ClassDeclaration(class) => {
                if class.declare {
                    return None;
                }
                if let Some(id) = &class.id {
                    self.declare(id.name.as_str(), BindingTypes::SetupConst);
                }
            }
            Statement::TSEnumDeclaration(e) => {
                if e.declare {
                    return None;
                }
                self.declare(e.id.name.as_str(), BindingTypes::SetupConst);
            }
            Statement::TSModuleDeclaration(m) if m.declare => return None,
            _ => {}
        }
        Some(text.to_string())
    }

    /// Edits are relative to `base`, the start of the statement.
    fn process_declaration(&mut self, decl: &VariableDeclaration<'s>, base: usize, edits: &mut Edits) {
        let is_const = decl.kind == VariableDeclarationKind::Const;
        for declarator in decl.declarations.iter() {
            let mut names = vec![];
            binding_names(&declarator.id, &mut names);
            let init = declarator.init.as_ref();
            let ty = if let Some((name, call)) = init.and_then(macro_call) {
                self.register_macro(name, call);
                let with = if name == DEFINE_PROPS { "__props" } else { "__ctx.emit" };
                let call = range(call.span);
                edits.replace(call.start - base..call.end - base, with);
                BindingTypes::SetupConst
            } else if !is_const {
                BindingTypes::SetupLet
            } else if matches!(declarator.id.kind, BindingPatternKind::BindingIdentifier(_))
                && init.map_or(false, is_const_init)
            {
                BindingTypes::SetupConst
            } else {
                BindingTypes::SetupMaybeRef
            };
            for name in names {
                self.declare(name, ty);
            }
        }
    }

    fn register_macro(&mut self, name: &str, call: &CallExpression<'s>) {
        let runtime_args = match (call.arguments.first(), call.arguments.last()) {
            (Some(first), Some(last)) => {
                Some(self.source[first.span().start as usize..last.span().end as usize].to_string())
            }
            _ => None,
        };
        let type_arg = call.type_parameters.as_ref().and_then(|t| t.params.first());
        if name == DEFINE_PROPS {
            let keys = match (type_arg, call.arguments.first().and_then(|a| a.as_expression())) {
                (Some(ty), _) => type_keys(ty),
                (None, Some(runtime)) => declared_keys(runtime),
                (None, None) => vec![],
            };
            for key in &keys {
                self.bindings.insert(key.clone(), BindingTypes::Props);
            }
            self.macros.props = match (runtime_args, type_arg) {
                (Some(runtime), _) => Some(runtime),
                (None, Some(_)) => {
                    let fields: Vec<_> = keys.iter().map(|k| format!("{}: null", k)).collect();
                    Some(format!("{{ {} }}", fields.join(", ")))
                }
                (None, None) => None,
            };
        } else {
            self.macros.emits = match (runtime_args, type_arg) {
                (Some(runtime), _) => Some(runtime),
                (None, Some(ty)) => Some(format!("[{}]", self.emitted_events(ty).join(", "))),
                (None, None) => None,
            };
        }
    }

    /// Event literals of `{ (e: 'a'): void }` or `{ a: [] }`, as written.
    fn emitted_events(&self, ty: &TSType<'s>) -> Vec<String> {
        let TSType::TSTypeLiteral(lit) = ty else {
            return vec![];
        };
        let mut events = vec![];
        for member in lit.members.iter() {
            match member {
                TSSignature::TSCallSignatureDeclaration(sig) => {
                    let annotation = sig
                        .params
                        .items
                        .first()
                        .and_then(|p| p.pattern.type_annotation.as_ref());
                    if let Some(annotation) = annotation {
                        collect_string_literals(&annotation.type_annotation, self.source, &mut events);
                    }
                }
                TSSignature::TSPropertySignature(prop) => {
                    if let Some(key) = prop.key.static_name() {
                        events.push(format!("'{}'", key));
                    }
                }
                _ => {}
            }
        }
        events
    }
}

fn collect_string_literals(ty: &TSType, source: &str, out: &mut Vec<String>) {
    match ty {
        TSType::TSLiteralType(lit) => {
            if let TSLiteral::StringLiteral(s) = &lit.literal {
                out.push(source[range(s.span)].to_string());
            }
        }
        TSType::TSUnionType(union) => {
            for ty in union.types.iter() {
                collect_string_literals(ty, source, out);
            }
        }
        _ => {}
    }
}

/// Property names of a type literal.
fn type_keys(ty: &TSType) -> Vec<String> {
    let TSType::TSTypeLiteral(lit) = ty else {
        return vec![];
    };
    lit.members
        .iter()
        .filter_map(|m| match m {
            TSSignature::TSPropertySignature(prop) => prop.key.static_name().map(|n| n.into_owned()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::super::test::parse;
    use super::*;
    use crate::compile_script;

    #[test]
    fn test_setup_only() {
        let sfc = parse(
            r#"<script setup>
import { ref } from 'vue'
import Foo from './Foo.vue'
const props = defineProps(['msg'])
const emit = defineEmits(['change'])
const count = ref(0)
let n = 1
function inc() { count.value++ }
</script>"#,
        );
        let options = SfcScriptCompileOptions {
            is_prod: true,
            ..Default::default()
        };
        let script = compile_script(&sfc, &options).unwrap();
        assert!(script.setup);
        insta::assert_snapshot!(script.content.trim_end(), @r###"
        import { ref } from 'vue'
        import Foo from './Foo.vue'

        export default {
          props: ['msg'],
          emits: ['change'],
          setup(__props, __ctx) {
        const props = __props
        const emit = __ctx.emit
        const count = ref(0)
        let n = 1
        function inc() { count.value++ }
        return { ref, Foo, props, emit, count, n, inc }
        }

        }
        "###);
        let bindings = script.bindings.unwrap();
        assert_eq!(bindings["msg"], BindingTypes::Props);
        assert_eq!(bindings["Foo"], BindingTypes::SetupConst);
        assert_eq!(bindings["count"], BindingTypes::SetupMaybeRef);
        assert_eq!(bindings["n"], BindingTypes::SetupLet);
        assert_eq!(bindings["inc"], BindingTypes::SetupConst);
    }

    #[test]
    fn test_merge_with_normal_script() {
        let sfc = parse(
            "<script>\nexport default { name: 'Comp' }\n</script>\n<script setup>\nconst a = 1\n</script>",
        );
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert!(script.content.contains("const __default__ = { name: 'Comp' }"));
        assert!(script
            .content
            .contains("export default /*#__PURE__*/Object.assign(__default__, {"));
        assert!(script.content.contains("const __returned__ = { a }"));
        assert_eq!(script.bindings.unwrap()["a"], BindingTypes::SetupConst);
    }

    #[test]
    fn test_setup_errors() {
        let sfc = parse("<script lang=\"ts\">export default {}</script><script setup>let a</script>");
        let err = compile_script(&sfc, &Default::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ScriptLangMismatch);
        let sfc = parse("<script setup>\nexport const a = 1\n</script>");
        let err = compile_script(&sfc, &Default::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ScriptSetupExport);
        assert_eq!(err.location.start.line, 2);
    }

    #[test]
    fn test_top_level_await() {
        let sfc = parse(
            "<script setup>\nconst data = await load()\nconst later = async () => { await load() }\n</script>",
        );
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert!(script.content.contains("  async setup(__props, __ctx) {"));
        let sfc = parse("<script setup>\nconst later = async () => { await load() }\n</script>");
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert!(script.content.contains("  setup(__props, __ctx) {"));
        assert!(!script.content.contains("async setup"));
    }

    #[test]
    fn test_binding_kinds() {
        let sfc = parse(
            "<script setup lang=\"ts\">\nimport type { Foo } from './types'\nconst { a, b: [c] } = useThing()\nconst s = reactive({})\nconst t = `x`\nenum Dir { Up }\ndeclare const g: number\n</script>",
        );
        let script = compile_script(&sfc, &Default::default()).unwrap();
        let bindings = script.bindings.as_ref().unwrap();
        assert!(!bindings.contains_key("Foo"));
        assert_eq!(bindings["a"], BindingTypes::SetupMaybeRef);
        assert_eq!(bindings["c"], BindingTypes::SetupMaybeRef);
        assert_eq!(bindings["s"], BindingTypes::SetupConst);
        assert_eq!(bindings["t"], BindingTypes::SetupConst);
        assert_eq!(bindings["Dir"], BindingTypes::SetupConst);
        assert!(!bindings.contains_key("g"));
        assert!(!script.content.contains("declare const g"));
    }

    #[test]
    fn test_syntax_error_is_located() {
        let sfc = parse("<script setup>\nconst a = (1\n</script>");
        let err = compile_script(&sfc, &Default::default()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ScriptSyntax);
        assert_eq!(err.location.start.line, 3);
    }

    #[test]
    fn test_type_based_macros() {
        let sfc = parse(
            "<script setup lang=\"ts\">\nconst props = defineProps<{ msg: string; n?: number }>()\ndefineEmits<{ (e: 'go'): void }>()\n</script>",
        );
        let options = SfcScriptCompileOptions {
            is_prod: true,
            ..Default::default()
        };
        let script = compile_script(&sfc, &options).unwrap();
        assert!(script.content.contains("props: { msg: null, n: null },"));
        assert!(script.content.contains("emits: ['go'],"));
        assert!(script.content.contains("const props = __props\n"));
        assert_eq!(script.bindings.unwrap()["n"], BindingTypes::Props);
    }
}
