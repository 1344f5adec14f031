mod asset_url;
mod codegen;
mod parser;

pub use asset_url::{url_to_require, AssetUrlOptions};
pub use parser::Whitespace;

use crate::error::{CompilationError, CompilationErrorKind, CompilerTip};
use crate::BindingMetadata;
use codegen::CodeGenerator;

const EMPTY_RENDER: &str = "var render = function () {}\nvar staticRenderFns = []\n";

pub struct SfcTemplateCompileOptions<'a> {
    pub source: &'a str,
    pub filename: &'a str,
    pub is_production: bool,
    /// Server rendering output. Vue 2 templates share the client render code.
    pub optimize_ssr: bool,
    /// Bindings exposed by the compiled script.
    pub bindings: Option<&'a BindingMetadata>,
    /// Configure what tags/attributes to transform into asset url
    /// requests, or disable the transform altogether with `None`.
    pub transform_asset_urls: Option<AssetUrlOptions>,
    pub preprocess_lang: Option<&'a str>,
    pub is_functional: bool,
    pub whitespace: Whitespace,
}

impl<'a> SfcTemplateCompileOptions<'a> {
    pub fn new(source: &'a str, filename: &'a str) -> Self {
        Self {
            source,
            filename,
            is_production: false,
            optimize_ssr: false,
            bindings: None,
            transform_asset_urls: Some(AssetUrlOptions::default()),
            preprocess_lang: None,
            is_functional: false,
            whitespace: Whitespace::Condense,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SfcTemplateCompileResults {
    pub code: String,
    pub source: String,
    pub tips: Vec<CompilerTip>,
    /// Positions are relative to the template content.
    pub errors: Vec<CompilationError>,
}

pub fn compile_template(options: SfcTemplateCompileOptions) -> SfcTemplateCompileResults {
    if let Some(lang) = options.preprocess_lang.filter(|l| *l != "html") {
        return SfcTemplateCompileResults {
            code: EMPTY_RENDER.into(),
            source: options.source.into(),
            tips: vec![],
            errors: vec![CompilationError::new(CompilationErrorKind::UnsupportedPreprocessor)
                .with_additional_message(lang.to_string())],
        };
    }
    let (nodes, mut errors) = parser::parse_template(options.source, options.whitespace);
    let mut generator = CodeGenerator::new(
        options.bindings,
        options.transform_asset_urls.as_ref(),
        options.is_functional,
    );
    let body = generator.generate(&nodes);
    errors.append(&mut generator.errors);

    let (params, prologue) = if options.is_functional {
        ("_c,_vm", "")
    } else if generator.uses_setup {
        ("", "var _vm=this,_c=_vm._self._c,_setup=_vm._self._setupProxy;")
    } else {
        ("", "var _vm=this,_c=_vm._self._c;")
    };
    let mut code = format!(
        "var render = function render({}){{{}return {}}}\nvar staticRenderFns = []\n",
        params, prologue, body
    );
    if !options.is_production {
        code.push_str("render._withStripped = true\n");
    }
    SfcTemplateCompileResults {
        code,
        source: options.source.into(),
        tips: generator.tips,
        errors,
    }
}
