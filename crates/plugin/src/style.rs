use crate::compiler::SfcCompiler;
use crate::context::PluginContext;
use crate::error::{Diagnostic, PluginError, Result};
use crate::options::ResolvedOptions;
use crate::util::strip_query;
use crate::TransformResult;
use sfc::{RawSourceMap, SfcDescriptor, SfcStyleCompileOptions};

/// Compiles the style block `index` of `descriptor` from `code`, the
/// loaded block content. `id` is the requested module id. Compile errors
/// are reported to the host and yield no module.
pub async fn transform_style<C: SfcCompiler + ?Sized>(
    compiler: &C,
    ctx: &dyn PluginContext,
    options: &ResolvedOptions,
    code: &str,
    descriptor: &SfcDescriptor,
    index: usize,
    id: &str,
) -> Result<Option<TransformResult>> {
    let block = descriptor
        .styles
        .get(index)
        .ok_or_else(|| PluginError::InvalidRequest {
            id: id.to_string(),
            reason: "style index out of range",
        })?;
    let scope_id = format!("data-v-{}", descriptor.id);
    let result = compiler
        .compile_style(SfcStyleCompileOptions {
            source: code,
            filename: &descriptor.filename,
            id: &scope_id,
            scoped: block.scoped,
            trim: options.style.trim,
            source_map: options.css_dev_sourcemap,
            in_map: if block.src.is_none() { block.map.clone() } else { None },
            preprocess_lang: None,
        })
        .await;
    if !result.errors.is_empty() {
        // external content has no place in the component file
        let base = block.src.is_none().then_some(&block.loc.start);
        let file = if base.is_some() { descriptor.filename.as_str() } else { strip_query(id) };
        for error in &result.errors {
            ctx.error(Diagnostic::from_compilation_error(file, error, base));
        }
        return Ok(None);
    }
    Ok(Some(TransformResult {
        code: result.code,
        map: result.map.unwrap_or_else(RawSourceMap::empty),
        meta: None,
    }))
}
