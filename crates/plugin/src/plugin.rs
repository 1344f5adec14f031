use crate::compiler::{BuiltinCompiler, SfcCompiler};
use crate::context::PluginContext;
use crate::descriptor_cache::DescriptorCache;
use crate::error::{PluginError, Result};
use crate::options::{DevServer, Filter, HostConfig, Options, ResolvedOptions, Target};
use crate::query::parse_vue_request;
use crate::runtime::helper_code;
use crate::script::{resolve_script, ScriptCache};
use crate::style::transform_style;
use crate::template::TemplateCompiler;
use crate::{LoadResult, TransformResult};
use sfc::{BlockKind, RawSourceMap, SfcDescriptor};
use std::sync::Arc;
use tracing::debug;

pub const PLUGIN_NAME: &str = "vite:vue2";

/// Build plugin compiling `.vue` files. One instance lives as long as the
/// build session and owns every cache.
pub struct VuePlugin<C = BuiltinCompiler> {
    pub(crate) compiler: C,
    pub(crate) options: ResolvedOptions,
    pub(crate) filter: Filter,
    pub(crate) ref_filter: Option<Filter>,
    pub(crate) descriptors: DescriptorCache,
    pub(crate) scripts: ScriptCache,
}

impl VuePlugin<BuiltinCompiler> {
    pub fn new(options: Options) -> Result<Self> {
        Self::with_compiler(options, BuiltinCompiler)
    }
}

impl<C: SfcCompiler> VuePlugin<C> {
    pub fn with_compiler(options: Options, compiler: C) -> Result<Self> {
        Ok(Self {
            filter: Filter::from_options(&options)?,
            ref_filter: Filter::for_ref_transform(&options.reactivity_transform)?,
            options: ResolvedOptions::new(&options),
            compiler,
            descriptors: DescriptorCache::default(),
            scripts: ScriptCache::default(),
        })
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    pub fn descriptors(&self) -> &DescriptorCache {
        &self.descriptors
    }

    pub fn scripts(&self) -> &ScriptCache {
        &self.scripts
    }

    pub fn config_resolved(&mut self, config: &HostConfig) {
        self.options.apply_host_config(config);
    }

    pub fn configure_server(&mut self, server: DevServer) {
        self.options.dev_server = Some(server);
    }

    pub(crate) fn templates(&self) -> TemplateCompiler<'_, C> {
        TemplateCompiler {
            compiler: &self.compiler,
            scripts: &self.scripts,
            options: &self.options,
        }
    }

    /// Parses and installs `source`. The scripts compiled for a replaced
    /// descriptor are dropped.
    pub(crate) fn install_descriptor(&self, filename: &str, source: &str) -> Result<Arc<SfcDescriptor>> {
        let before = self.descriptors.get_descriptor(filename).ok();
        let descriptor = self
            .descriptors
            .create_or_update_descriptor(filename, source, &self.compiler, &self.options)
            .map_err(|errors| PluginError::Parse {
                file: filename.to_string(),
                diagnostics: errors
                    .iter()
                    .map(|e| crate::Diagnostic::from_compilation_error(filename, e, None))
                    .collect(),
            })?;
        if let Some(before) = before.filter(|b| !Arc::ptr_eq(b, &descriptor)) {
            self.scripts.forget(&before);
        }
        Ok(descriptor)
    }

    /// Claims helper ids and block requests.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        if helper_code(id).is_some() || parse_vue_request(id).1.vue {
            return Some(id.to_string());
        }
        None
    }

    /// Serves helper modules and the content of block requests.
    pub fn load(&self, id: &str, target: Target) -> Result<Option<LoadResult>> {
        if let Some(code) = helper_code(id) {
            return Ok(Some(LoadResult {
                code: code.to_string(),
                map: None,
            }));
        }
        let (filename, query) = parse_vue_request(id);
        if !query.vue {
            return Ok(None);
        }
        if query.src.is_some() {
            let code = std::fs::read_to_string(filename).map_err(|source| PluginError::Io {
                path: filename.to_string(),
                source,
            })?;
            return Ok(Some(LoadResult { code, map: None }));
        }
        let descriptor = self.descriptors.get_descriptor(filename)?;
        let block = match (&query.kind, query.index) {
            (Some(BlockKind::Script), _) => {
                resolve_script(&self.scripts, &self.compiler, &descriptor, &self.options, target)?
                    .map(|s| s.block.clone())
            }
            (Some(BlockKind::Template), _) => descriptor.template.clone(),
            (Some(BlockKind::Style), Some(index)) => descriptor.styles.get(index).map(|s| s.block.clone()),
            (Some(BlockKind::Style), None) => {
                return Err(PluginError::InvalidRequest {
                    id: id.to_string(),
                    reason: "style request without index",
                })
            }
            (_, Some(index)) => descriptor.custom_blocks.get(index).cloned(),
            (_, None) => None,
        };
        Ok(block.map(|b| LoadResult {
            code: b.content,
            map: b.map,
        }))
    }

    /// Compiles a module. `code` is the loaded content of `id`.
    pub async fn transform(
        &self,
        ctx: &dyn PluginContext,
        code: &str,
        id: &str,
        target: Target,
    ) -> Result<Option<TransformResult>> {
        let (filename, query) = parse_vue_request(id);
        if query.raw {
            return Ok(None);
        }
        if !query.vue && !self.filter.matches(filename) {
            return self.transform_ref(code, filename);
        }
        if !query.vue {
            return self.transform_main(ctx, code, filename, target).await.map(Some);
        }
        let descriptor = if query.src.is_some() {
            self.descriptors.get_src_descriptor(filename, &query)?
        } else {
            self.descriptors.get_descriptor(filename)?
        };
        match query.kind {
            Some(BlockKind::Template) => {
                let rebase = query.src.is_none();
                let code = self
                    .templates()
                    .compile_as_module(ctx, code, &descriptor, target, rebase)?;
                Ok(Some(TransformResult {
                    code,
                    map: RawSourceMap::empty(),
                    meta: None,
                }))
            }
            Some(BlockKind::Style) => {
                let index = query.index.ok_or_else(|| PluginError::InvalidRequest {
                    id: id.to_string(),
                    reason: "style request without index",
                })?;
                transform_style(&self.compiler, ctx, &self.options, code, &descriptor, index, id).await
            }
            _ => Ok(None),
        }
    }

    fn transform_ref(&self, code: &str, filename: &str) -> Result<Option<TransformResult>> {
        let Some(filter) = &self.ref_filter else {
            return Ok(None);
        };
        if !filter.matches(filename) || !self.compiler.should_transform_ref(code) {
            return Ok(None);
        }
        debug!(file = %filename, "reactivity transform");
        let code = self.compiler.transform_ref(code).map_err(|e| {
            PluginError::Compile(crate::Diagnostic::from_compilation_error(filename, &e, None))
        })?;
        Ok(Some(TransformResult {
            code,
            map: RawSourceMap::empty(),
            meta: None,
        }))
    }
}
