//! Bundler plugin for Vue 2 single file components.
//!
//! A `.vue` file becomes a main module which imports its blocks back as
//! virtual sub-requests (`App.vue?vue&type=style&index=0&lang.css`). The
//! host drives the plugin through [`VuePlugin::resolve_id`],
//! [`VuePlugin::load`], [`VuePlugin::transform`] and
//! [`VuePlugin::handle_hot_update`].

mod compiler;
mod context;
mod descriptor_cache;
mod error;
mod hmr;
mod options;
mod plugin;
mod query;
mod runtime;
mod script;
mod style;
mod template;
mod transform_main;
mod transpile;
mod util;

use serde::Serialize;
use sfc::RawSourceMap;

pub use compiler::{BuiltinCompiler, SfcCompiler};
pub use context::PluginContext;
pub use descriptor_cache::DescriptorCache;
pub use error::{Diagnostic, PluginError, Result};
pub use hmr::{is_only_template_changed, HotUpdateContext, ModuleNode};
pub use options::{
    Command, DevServer, Filter, HostConfig, Options, Patterns, ReactivityTransform,
    ResolvedOptions, StyleOptions, Target, TemplateOptions, WhitespaceOption,
};
pub use plugin::{VuePlugin, PLUGIN_NAME};
pub use query::{parse_vue_request, SrcQuery, VueQuery};
pub use runtime::{HMR_RUNTIME_ID, NORMALIZER_ID};
pub use script::ScriptCache;
pub use transpile::strip_types;
pub use util::descriptor_id;

/// Module produced by [`VuePlugin::transform`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformResult {
    pub code: String,
    pub map: RawSourceMap,
    pub meta: Option<ModuleMeta>,
}

/// Extra module information handed back to the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModuleMeta {
    /// script language of the component, `js` by default
    pub lang: String,
}

/// Module content served by [`VuePlugin::load`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadResult {
    pub code: String,
    pub map: Option<RawSourceMap>,
}
