use anyhow::Result;
use clap::Parser;
use codespan_reporting::diagnostic::Severity;
use futures::executor::block_on;
use plugin::{Command, DevServer, HostConfig, Target, VuePlugin};
use tracing::warn;

use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

use vue2_sfc_cli::cli::{compile, describe, CompileRequest};
use vue2_sfc_cli::{absolute_path, init_logging, load_options, FsContext, PrettyReporter};

/// Compiles one Vue 2 single file component into a JavaScript module.
#[derive(Parser)]
#[command(
    version,
    author = "Herrington Darkholme <2883231+HerringtonDarkholme@users.noreply.github.com>"
)]
struct Opts {
    /// The component to compile. Stdin will be compiled as App.vue if no file is provided.
    input_file_name: Option<String>,

    /// YAML file with plugin options.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root, descriptor ids are derived from paths relative to it.
    #[arg(long)]
    root: Option<PathBuf>,

    /// Compile for server rendering.
    #[arg(long)]
    ssr: bool,

    #[arg(long)]
    production: bool,

    /// Emit hot module replacement code as a dev server would.
    #[arg(long)]
    hmr: bool,

    /// Compile a block submodule instead, e.g. `vue&type=style&index=0&lang.css`.
    #[arg(short, long)]
    query: Option<String>,

    /// Print the parsed descriptor before the module.
    #[arg(long)]
    dump_descriptor: bool,
}

fn main() -> Result<()> {
    init_logging();
    let opts: Opts = Opts::parse();
    let (name, source) = if let Some(file_name) = opts.input_file_name {
        let ab_path = absolute_path(file_name)?;
        let source = std::fs::read_to_string(&ab_path)?;
        (ab_path.to_string_lossy().into_owned(), source)
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        let name = env::current_dir()?.join("App.vue");
        (name.to_string_lossy().into_owned(), s)
    };

    let mut options = load_options(opts.config.as_deref())?;
    if opts.production {
        options.is_production = Some(true);
    }
    let mut plugin = VuePlugin::new(options)?;
    let root = match opts.root {
        Some(root) => absolute_path(root)?,
        None => env::current_dir()?,
    };
    let is_production = plugin.options().is_production;
    plugin.config_resolved(&HostConfig {
        root,
        is_production,
        command: if opts.hmr { Command::Serve } else { Command::Build },
        build_sourcemap: true,
        css_dev_sourcemap: false,
    });
    if opts.hmr {
        plugin.configure_server(DevServer { hmr: true });
    }

    let ctx = FsContext::default();
    let request = CompileRequest {
        filename: &name,
        source: &source,
        query: opts.query.as_deref(),
        target: if opts.ssr { Target::Server } else { Target::Client },
    };
    let result = block_on(compile(&plugin, &ctx, &request));

    let reporter = PrettyReporter::new(&name, &source);
    reporter.emit_all(&ctx.take_warnings(), Severity::Warning)?;
    reporter.emit_all(&ctx.take_errors(), Severity::Error)?;
    let result = match result {
        Ok(result) => result,
        Err(err) => {
            reporter.emit_all(&err.diagnostics(), Severity::Error)?;
            return Err(err.into());
        }
    };

    if opts.dump_descriptor {
        println!(r#"============ Descriptor ==========="#);
        println!("{}", describe(&plugin, &name)?);
        println!(r#"========= End of Descriptor ======="#);
    }
    match result {
        Some(module) => println!("{}", module.code),
        None => {
            warn!(file = %name, "not a component, printed unchanged");
            print!("{}", source);
        }
    }
    Ok(())
}
