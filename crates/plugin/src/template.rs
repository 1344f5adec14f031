use crate::compiler::SfcCompiler;
use crate::context::PluginContext;
use crate::error::{Diagnostic, Result};
use crate::options::{ResolvedOptions, Target, WhitespaceOption};
use crate::runtime::HMR_RUNTIME_ID;
use crate::script::{resolve_script, ScriptCache};
use crate::util::hash_str;
use rustc_hash::FxHashMap;
use sfc::{json_string, AssetUrlOptions, SfcDescriptor, SfcTemplateCompileOptions, Whitespace};
use std::fmt::Write;
use std::sync::Arc;

pub(crate) struct TemplateCompiler<'a, C: ?Sized> {
    pub compiler: &'a C,
    pub scripts: &'a ScriptCache,
    pub options: &'a ResolvedOptions,
}

impl<'a, C: SfcCompiler + ?Sized> TemplateCompiler<'a, C> {
    /// Compiles `code` as the template of `descriptor`. Errors and tips go
    /// to the host, the render code is returned regardless. `rebase` maps
    /// positions into the component file.
    pub fn compile(
        &self,
        ctx: &dyn PluginContext,
        code: &str,
        descriptor: &Arc<SfcDescriptor>,
        target: Target,
        rebase: bool,
    ) -> Result<String> {
        let Some(block) = &descriptor.template else {
            return Ok(String::new());
        };
        let script = resolve_script(self.scripts, self.compiler, descriptor, self.options, target)?;
        let filename = &descriptor.filename;
        let transform_asset_urls = self.options.template.transform_asset_urls.then(|| AssetUrlOptions {
            include_absolute: true,
            ..Default::default()
        });
        let result = self.compiler.compile_template(SfcTemplateCompileOptions {
            source: code,
            filename,
            is_production: self.options.is_production,
            optimize_ssr: target.is_ssr(),
            bindings: script.as_ref().and_then(|s| s.bindings.as_ref()),
            transform_asset_urls,
            preprocess_lang: block.lang.as_deref(),
            is_functional: descriptor.is_functional(),
            whitespace: match self.options.template.whitespace {
                WhitespaceOption::Condense => Whitespace::Condense,
                WhitespaceOption::Preserve => Whitespace::Preserve,
            },
        });
        let base = rebase.then_some(&block.loc.start);
        for error in &result.errors {
            ctx.error(Diagnostic::from_compilation_error(filename, error, base));
        }
        for tip in &result.tips {
            ctx.warn(Diagnostic::located(filename, tip.message.clone(), &tip.location, base));
        }
        Ok(transform_require_to_import(&result.code))
    }

    /// Render functions inlined in the main module, renamed to
    /// `_sfc_render` and `_sfc_staticRenderFns`.
    pub fn compile_in_main(
        &self,
        ctx: &dyn PluginContext,
        descriptor: &Arc<SfcDescriptor>,
        target: Target,
    ) -> Result<String> {
        let content = descriptor
            .template
            .as_ref()
            .map_or("", |t| t.content.as_str());
        let code = self.compile(ctx, content, descriptor, target, true)?;
        Ok(code
            .replacen("var render =", "var _sfc_render =", 1)
            .replacen("var staticRenderFns =", "var _sfc_staticRenderFns =", 1)
            .replacen("render._withStripped", "_sfc_render._withStripped", 1))
    }

    /// A standalone template module for preprocessed or external templates.
    pub fn compile_as_module(
        &self,
        ctx: &dyn PluginContext,
        code: &str,
        descriptor: &Arc<SfcDescriptor>,
        target: Target,
        rebase: bool,
    ) -> Result<String> {
        let mut out = self.compile(ctx, code, descriptor, target, rebase)?;
        if self.options.hmr_enabled(target) {
            let _ = write!(
                out,
                "\nimport __VUE_HMR_RUNTIME__ from {}\nimport.meta.hot.accept(({{ render }}) => {{\n  __VUE_HMR_RUNTIME__.rerender({}, render)\n}})",
                json_string(HMR_RUNTIME_ID),
                json_string(&descriptor.id)
            );
        }
        out.push_str("\nexport { render, staticRenderFns }");
        Ok(out)
    }
}

/// Length of a quoted literal at the start of `s`, quotes included.
fn quoted_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let quote = *bytes.first().filter(|q| **q == b'"' || **q == b'\'')?;
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return (i > 1).then_some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Hoists `require("x")` calls into static imports. Identical literals
/// share one import binding.
pub fn transform_require_to_import(code: &str) -> String {
    const CALL: &str = "require(";
    let mut imports: FxHashMap<&str, String> = FxHashMap::default();
    let mut hoisted = String::new();
    let mut body = String::with_capacity(code.len());
    let mut last = 0;
    let mut search = 0;
    while let Some(found) = code[search..].find(CALL) {
        let start = search + found;
        search = start + CALL.len();
        let boundary = code[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'));
        if !boundary {
            continue;
        }
        let literal_start = start + CALL.len();
        let Some(len) = quoted_len(&code[literal_start..]) else {
            continue;
        };
        let literal_end = literal_start + len;
        if !code[literal_end..].starts_with(')') {
            continue;
        }
        let literal = &code[literal_start..literal_end];
        let name = imports.entry(literal).or_insert_with(|| {
            let name = format!("__$_require_{}__", hash_str(literal));
            let _ = writeln!(hoisted, "import {} from {}", name, literal);
            name
        });
        body.push_str(&code[last..start]);
        body.push_str(name);
        last = literal_end + 1;
        search = last;
    }
    body.push_str(&code[last..]);
    hoisted + &body
}
