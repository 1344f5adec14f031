use crate::js::{export_name, parse_any, range};
use oxc_allocator::Allocator;
use oxc_ast::ast::{ExportDefaultDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration, Statement};
use oxc_span::GetSpan;

const IMPORTED_DEFAULT: &str = "__VUE_DEFAULT__";

/// Rewrites the default export of `input` into `const <as_var> = ...`.
/// A module without default export gets `const <as_var> = {}` appended.
pub fn rewrite_default(input: &str, as_var: &str) -> String {
    let alloc = Allocator::default();
    let Ok(program) = parse_any(&alloc, input) else {
        return rewrite_textually(input, as_var);
    };
    for stmt in program.body.iter() {
        match stmt {
            Statement::ExportDefaultDeclaration(decl) => {
                return rewrite_export_default(input, decl, as_var);
            }
            Statement::ExportNamedDeclaration(decl) => {
                if let Some(rewritten) = rewrite_named_default(input, decl, as_var) {
                    return rewritten;
                }
            }
            _ => {}
        }
    }
    format!("{}\nconst {} = {{}}", input, as_var)
}

fn rewrite_export_default(input: &str, decl: &ExportDefaultDeclaration, as_var: &str) -> String {
    let export_start = decl.span.start as usize;
    if let ExportDefaultDeclarationKind::ClassDeclaration(class) = &decl.declaration {
        if let Some(id) = &class.id {
            return format!(
                "{}{}\nconst {} = {}",
                &input[..export_start],
                &input[class.span.start as usize..],
                as_var,
                id.name
            );
        }
    }
    // `export` and `default` may be split by comments
    let declaration_start = decl.declaration.span().start as usize;
    let default_end = input[export_start..declaration_start]
        .find("default")
        .map_or(declaration_start, |i| export_start + i + "default".len());
    format!(
        "{}const {} ={}",
        &input[..export_start],
        as_var,
        &input[default_end..]
    )
}

/// Handles `export { a as default }` and `export { default } from 'x'`.
fn rewrite_named_default(input: &str, decl: &ExportNamedDeclaration, as_var: &str) -> Option<String> {
    let specs = &decl.specifiers;
    let pos = specs.iter().position(|s| export_name(&s.exported) == "default")?;
    let spec = &specs[pos];
    let local = export_name(&spec.local);
    // drop the specifier with one adjacent comma
    let cut = if pos + 1 < specs.len() {
        spec.span.start as usize..specs[pos + 1].span.start as usize
    } else if pos > 0 {
        specs[pos - 1].span.end as usize..spec.span.end as usize
    } else {
        range(spec.span)
    };
    let mut out = String::with_capacity(input.len() + 64);
    let value = match &decl.source {
        Some(src) => {
            out.push_str(&format!(
                "import {{ {} as {} }} from {}\n",
                local,
                IMPORTED_DEFAULT,
                &input[range(src.span)]
            ));
            IMPORTED_DEFAULT
        }
        None => local,
    };
    out.push_str(&input[..cut.start]);
    out.push_str(&input[cut.end..]);
    out.push_str(&format!("\nconst {} = {}", as_var, value));
    Some(out)
}

fn rewrite_textually(input: &str, as_var: &str) -> String {
    match input.find("export default") {
        Some(idx) => format!(
            "{}const {} ={}",
            &input[..idx],
            as_var,
            &input[idx + "export default".len()..]
        ),
        None => format!("{}\nconst {} = {{}}", input, as_var),
    }
}
