pub mod error;
mod js;
mod parse_sfc;
mod ref_transform;
mod rewrite_default;
mod scanner;
mod script;
pub mod source_map;
mod style;
mod template;
mod util;

// API
pub use parse_sfc::parse_sfc;
pub use ref_transform::{should_transform_ref, transform_ref};
pub use rewrite_default::rewrite_default;
pub use script::compile_script;
pub use style::compile_style;
pub use template::{compile_template, url_to_require};

// Structs
pub use parse_sfc::{
    AttrValue, BlockAttrs, BlockKind, PadOption, SfcBlock, SfcDescriptor, SfcParseOptions,
    SfcParseResult, SfcScriptBlock, SfcStyleBlock,
};
pub use script::{BindingMetadata, BindingTypes, SfcScriptCompileOptions};
pub use style::{SfcStyleCompileOptions, SfcStyleCompileResults};
pub use template::{
    AssetUrlOptions, SfcTemplateCompileOptions, SfcTemplateCompileResults, Whitespace,
};

pub use error::{CompilationError, CompilationErrorKind, CompilerTip, Position, SourceLocation};
pub use source_map::RawSourceMap;
pub use util::json_string;
