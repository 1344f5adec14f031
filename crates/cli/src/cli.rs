use plugin::{PluginError, PluginContext, Target, TransformResult, VuePlugin};
use sfc::RawSourceMap;

/// One module to compile.
pub struct CompileRequest<'a> {
    /// absolute path of the component
    pub filename: &'a str,
    pub source: &'a str,
    /// query of a virtual submodule, `vue&type=style&index=0&lang.css`
    pub query: Option<&'a str>,
    pub target: Target,
}

/// Compiles the main module of the component, then the requested
/// submodule if any. `None` when the plugin leaves the file alone.
pub async fn compile(
    plugin: &VuePlugin,
    ctx: &dyn PluginContext,
    request: &CompileRequest<'_>,
) -> Result<Option<TransformResult>, PluginError> {
    let main = plugin
        .transform(ctx, request.source, request.filename, request.target)
        .await?;
    let Some(query) = request.query else {
        return Ok(main);
    };
    let id = format!("{}?{}", request.filename, query.trim_start_matches('?'));
    let loaded = plugin
        .load(&id, request.target)?
        .ok_or_else(|| PluginError::InvalidRequest {
            id: id.clone(),
            reason: "no block matches the query",
        })?;
    let transformed = plugin
        .transform(ctx, &loaded.code, &id, request.target)
        .await?;
    // scripts and custom blocks are served as loaded
    Ok(Some(transformed.unwrap_or(TransformResult {
        code: loaded.code,
        map: loaded.map.unwrap_or_else(RawSourceMap::empty),
        meta: None,
    })))
}

/// The cached descriptor of `filename` as YAML.
pub fn describe(plugin: &VuePlugin, filename: &str) -> anyhow::Result<String> {
    let descriptor = plugin.descriptors().get_descriptor(filename)?;
    Ok(serde_yaml::to_string(&*descriptor)?)
}
