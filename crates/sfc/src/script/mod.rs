mod analysis;
mod setup_script;

use crate::error::{CompilationError, CompilationErrorKind, SourceLocation};
use crate::js::{self, SyntaxError};
use crate::{SfcBlock, SfcDescriptor, SfcScriptBlock};
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use rustc_hash::FxHashMap;
#[cfg(feature = "serde")]
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum BindingTypes {
    /// returned from data()
    Data,
    /// declared as a prop
    Props,
    /// a computed, method or injected property
    Options,
    /// a const binding in <script setup> that never needs unwrapping
    SetupConst,
    /// a let binding in <script setup>, may be reassigned
    SetupLet,
    /// a binding that may or may not be a ref
    SetupMaybeRef,
}

impl BindingTypes {
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::SetupConst | Self::SetupLet | Self::SetupMaybeRef)
    }
}

pub type BindingMetadata = FxHashMap<String, BindingTypes>;

pub struct SfcScriptCompileOptions {
    /// Scope ID of the component.
    pub id: String,
    /// Production mode. Drops dev only metadata from setup() output.
    pub is_prod: bool,
    /// Keep the block source map on an unmodified <script>.
    pub source_map: bool,
}

impl Default for SfcScriptCompileOptions {
    fn default() -> Self {
        Self {
            id: String::new(),
            is_prod: false,
            source_map: true,
        }
    }
}

/// Compiles the <script> and <script setup> blocks of `sfc` into one
/// script block and collects its template bindings.
pub fn compile_script(
    sfc: &SfcDescriptor,
    options: &SfcScriptCompileOptions,
) -> Result<SfcScriptBlock, CompilationError> {
    match (&sfc.script, &sfc.script_setup) {
        (None, None) => Err(CompilationError::new(CompilationErrorKind::MissingScript)),
        (Some(script), None) => compile_normal_script(sfc, script, options),
        (script, Some(setup)) => setup_script::compile_setup(sfc, script.as_ref(), setup, options),
    }
}

fn compile_normal_script(
    sfc: &SfcDescriptor,
    script: &SfcScriptBlock,
    options: &SfcScriptCompileOptions,
) -> Result<SfcScriptBlock, CompilationError> {
    let mut compiled = script.clone();
    if !options.source_map {
        compiled.block.map = None;
    }
    if script.src.is_some() {
        return Ok(compiled);
    }
    let alloc = Allocator::default();
    let program = parse_block(&alloc, sfc, script)?;
    compiled.bindings = Some(analysis::analyze_script_bindings(&program));
    Ok(compiled)
}

fn parse_block<'a>(
    alloc: &'a Allocator,
    sfc: &SfcDescriptor,
    script: &'a SfcScriptBlock,
) -> Result<Program<'a>, CompilationError> {
    js::parse_program(alloc, &script.content, js::source_type(script.lang.as_deref()))
        .map_err(|e| to_compilation_error(sfc, script, e))
}

/// Rebases a block relative syntax error onto the whole file.
fn to_compilation_error(sfc: &SfcDescriptor, block: &SfcBlock, e: SyntaxError) -> CompilationError {
    let offset = block.loc.start.offset + e.offset;
    let loc = SourceLocation::from_range(&sfc.source, offset..offset);
    CompilationError::new(CompilationErrorKind::ScriptSyntax)
        .with_location(loc)
        .with_additional_message(e.message)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{parse_sfc, SfcParseOptions};

    pub fn parse(src: &str) -> SfcDescriptor {
        let res = parse_sfc(src, SfcParseOptions::default());
        assert!(res.errors.is_empty());
        res.descriptor
    }

    #[test]
    fn test_normal_script_bindings() {
        let sfc = parse("<script>export default { data() { return { msg: 'hi' } } }</script>");
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert_eq!(script.content, sfc.script.as_ref().unwrap().content);
        let bindings = script.bindings.unwrap();
        assert_eq!(bindings.get("msg"), Some(&BindingTypes::Data));
    }

    #[test]
    fn test_missing_script() {
        let sfc = parse("<template><div/></template>");
        let err = compile_script(&sfc, &Default::default()).unwrap_err();
        assert_eq!(err.kind, CompilationErrorKind::MissingScript);
    }

    #[test]
    fn test_error_position() {
        let sfc = parse("<template><div/></template>\n<script>\nexport default {\n  a: [1, 2}\n</script>");
        let err = compile_script(&sfc, &Default::default()).unwrap_err();
        assert_eq!(err.kind, CompilationErrorKind::ScriptSyntax);
        assert_eq!(err.location.start.line, 4);
        assert_eq!(err.location.start.column, 11);
        assert!(err.to_string().starts_with("Invalid script syntax: "));
    }

    #[test]
    fn test_regex_literal_in_method() {
        let sfc = parse(r"<script>export default { methods: { f(x) { if (x) /\)/.test(x) } } }</script>");
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert_eq!(script.bindings.unwrap().get("f"), Some(&BindingTypes::Options));
    }

    #[test]
    fn test_jsx_script() {
        let sfc = parse("<script lang=\"jsx\">export default { props: ['a'], render() { return <p>{this.a}</p> } }</script>");
        let script = compile_script(&sfc, &Default::default()).unwrap();
        assert_eq!(script.bindings.unwrap().get("a"), Some(&BindingTypes::Props));
    }
}
