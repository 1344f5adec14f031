use async_trait::async_trait;
use futures::executor::block_on;
use parking_lot::Mutex;
use path_clean::PathClean;
use vue2_sfc_plugin::{
    Command, DevServer, Diagnostic, HostConfig, Options, PluginContext, Target, TransformResult,
    VuePlugin,
};
use std::io;
use std::path::{Path, PathBuf};

pub const ROOT: &str = "/project";
pub const APP: &str = "/project/src/App.vue";

/// Records what the plugin reports. Imports resolve relative to the
/// importer, `missing*` sources fail.
#[derive(Default)]
pub struct TestContext {
    pub errors: Mutex<Vec<Diagnostic>>,
    pub warnings: Mutex<Vec<Diagnostic>>,
}

#[async_trait]
impl PluginContext for TestContext {
    async fn resolve(&self, source: &str, importer: &str) -> io::Result<Option<String>> {
        if source.starts_with("missing") {
            return Err(io::Error::new(io::ErrorKind::NotFound, source.to_string()));
        }
        let dir = Path::new(importer).parent().unwrap_or(Path::new("/"));
        Ok(Some(dir.join(source).clean().to_string_lossy().into_owned()))
    }
    fn error(&self, diagnostic: Diagnostic) {
        self.errors.lock().push(diagnostic);
    }
    fn warn(&self, diagnostic: Diagnostic) {
        self.warnings.lock().push(diagnostic);
    }
}

fn host_config(command: Command) -> HostConfig {
    HostConfig {
        root: PathBuf::from(ROOT),
        is_production: false,
        command,
        build_sourcemap: false,
        css_dev_sourcemap: false,
    }
}

/// A plugin behind a dev server with HMR.
pub fn dev_plugin() -> VuePlugin {
    let mut plugin = build_plugin(Options::default());
    plugin.config_resolved(&host_config(Command::Serve));
    plugin.configure_server(DevServer { hmr: true });
    plugin
}

/// A plugin running a development build, no server.
pub fn build_plugin(mut options: Options) -> VuePlugin {
    options.is_production = Some(false);
    let mut plugin = VuePlugin::new(options).unwrap();
    plugin.config_resolved(&host_config(Command::Build));
    plugin
}

pub fn transform(plugin: &VuePlugin, ctx: &TestContext, code: &str, id: &str) -> TransformResult {
    transform_for(plugin, ctx, code, id, Target::Client)
}

pub fn transform_for(
    plugin: &VuePlugin,
    ctx: &TestContext,
    code: &str,
    id: &str,
    target: Target,
) -> TransformResult {
    block_on(plugin.transform(ctx, code, id, target))
        .unwrap()
        .unwrap()
}

/// Loads a block request, then transforms it.
pub fn load_and_transform(plugin: &VuePlugin, ctx: &TestContext, id: &str) -> TransformResult {
    let loaded = plugin.load(id, Target::Client).unwrap().unwrap();
    transform(plugin, ctx, &loaded.code, id)
}
