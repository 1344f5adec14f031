use async_trait::async_trait;
use sfc::{
    CompilationError, SfcDescriptor, SfcParseOptions, SfcParseResult, SfcScriptBlock,
    SfcScriptCompileOptions, SfcStyleCompileOptions, SfcStyleCompileResults,
    SfcTemplateCompileOptions, SfcTemplateCompileResults,
};

/// The SFC compiler the plugin drives. Block parsing and code generation
/// live behind this seam so hosts can bring their own compiler.
#[async_trait]
pub trait SfcCompiler: Send + Sync {
    fn parse(&self, source: &str, options: SfcParseOptions) -> SfcParseResult;

    /// Merges `<script>` and `<script setup>` into one block.
    fn compile_script(
        &self,
        descriptor: &SfcDescriptor,
        options: &SfcScriptCompileOptions,
    ) -> Result<SfcScriptBlock, CompilationError>;

    fn compile_template(&self, options: SfcTemplateCompileOptions<'_>) -> SfcTemplateCompileResults;

    async fn compile_style(&self, options: SfcStyleCompileOptions<'_>) -> SfcStyleCompileResults;

    /// Rewrites the default export of `code` into `const <as_var> =`.
    fn rewrite_default(&self, code: &str, as_var: &str) -> String;

    fn should_transform_ref(&self, code: &str) -> bool;

    fn transform_ref(&self, code: &str) -> Result<String, CompilationError>;
}

/// The compiler of the `vue2-sfc-compiler` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinCompiler;

#[async_trait]
impl SfcCompiler for BuiltinCompiler {
    fn parse(&self, source: &str, options: SfcParseOptions) -> SfcParseResult {
        sfc::parse_sfc(source, options)
    }

    fn compile_script(
        &self,
        descriptor: &SfcDescriptor,
        options: &SfcScriptCompileOptions,
    ) -> Result<SfcScriptBlock, CompilationError> {
        sfc::compile_script(descriptor, options)
    }

    fn compile_template(&self, options: SfcTemplateCompileOptions<'_>) -> SfcTemplateCompileResults {
        sfc::compile_template(options)
    }

    async fn compile_style(&self, options: SfcStyleCompileOptions<'_>) -> SfcStyleCompileResults {
        sfc::compile_style(options)
    }

    fn rewrite_default(&self, code: &str, as_var: &str) -> String {
        sfc::rewrite_default(code, as_var)
    }

    fn should_transform_ref(&self, code: &str) -> bool {
        sfc::should_transform_ref(code)
    }

    fn transform_ref(&self, code: &str) -> Result<String, CompilationError> {
        sfc::transform_ref(code)
    }
}
