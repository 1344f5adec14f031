use crate::error::{PluginError, Result};
use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};
use std::path::Path;

fn transpile_error(filename: &str, errors: impl IntoIterator<Item = impl ToString>) -> PluginError {
    let message = errors
        .into_iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    PluginError::Transpile {
        file: filename.to_string(),
        message,
    }
}

/// Strips TypeScript syntax from a whole module.
pub fn strip_types(code: &str, filename: &str) -> Result<String> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, code, SourceType::ts()).parse();
    if !ret.errors.is_empty() {
        return Err(transpile_error(filename, ret.errors));
    }
    let mut program = ret.program;

    let semantic = SemanticBuilder::new().build(&program);
    if !semantic.errors.is_empty() {
        return Err(transpile_error(filename, semantic.errors));
    }
    let (symbols, scopes) = semantic.semantic.into_symbol_table_and_scope_tree();

    let options = TransformOptions::default();
    let ret = Transformer::new(&allocator, Path::new(filename), &options)
        .build_with_symbols_and_scopes(symbols, scopes, &mut program);
    if !ret.errors.is_empty() {
        return Err(transpile_error(filename, ret.errors));
    }
    Ok(Codegen::new().build(&program).code)
}
