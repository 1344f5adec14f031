mod scoped;

use crate::error::{CompilationError, CompilationErrorKind as ErrorKind, Position, SourceLocation};
use crate::source_map::{generate_block_map, RawSourceMap};
use lightningcss::error::Error;
use lightningcss::stylesheet::{ParserFlags, ParserOptions, StyleSheet};
use std::fmt::Display;

pub struct SfcStyleCompileOptions<'a> {
    pub source: &'a str,
    pub filename: &'a str,
    /// Scope attribute, e.g. `data-v-7ba5bd90`.
    pub id: &'a str,
    pub scoped: bool,
    /// Strip trailing whitespace from the output.
    pub trim: bool,
    pub source_map: bool,
    /// Map of `source` into its SFC file, passed through to the result.
    pub in_map: Option<RawSourceMap>,
    pub preprocess_lang: Option<&'a str>,
}

impl<'a> SfcStyleCompileOptions<'a> {
    pub fn new(source: &'a str, filename: &'a str, id: &'a str) -> Self {
        Self {
            source,
            filename,
            id,
            scoped: false,
            trim: true,
            source_map: false,
            in_map: None,
            preprocess_lang: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SfcStyleCompileResults {
    pub code: String,
    /// Only unscoped styles keep their map, scoped ones are reprinted.
    pub map: Option<RawSourceMap>,
    /// Positions are relative to the style content.
    pub errors: Vec<CompilationError>,
}

pub fn compile_style(options: SfcStyleCompileOptions) -> SfcStyleCompileResults {
    let source = options.source;
    if let Some(lang) = options.preprocess_lang.filter(|l| *l != "css") {
        return SfcStyleCompileResults {
            code: source.into(),
            map: None,
            errors: vec![CompilationError::new(ErrorKind::UnsupportedPreprocessor)
                .with_additional_message(lang.to_string())],
        };
    }
    let compiled = if options.scoped {
        scoped::scope_stylesheet(source, options.filename, options.id)
    } else {
        // plain styles are served as written
        parse_stylesheet(source, options.filename).map(|_| source.to_string())
    };
    let (mut code, errors) = match compiled {
        Ok(code) => (code, vec![]),
        Err(error) => (source.to_string(), vec![error]),
    };
    if options.trim {
        code.truncate(code.trim_end().len());
        code.push('\n');
    }
    let map = if options.source_map && !options.scoped {
        options
            .in_map
            .or_else(|| Some(generate_block_map(options.filename, source, source, &Position::default())))
    } else {
        None
    };
    SfcStyleCompileResults { code, map, errors }
}

fn parse_stylesheet<'i>(
    source: &'i str,
    filename: &str,
) -> Result<StyleSheet<'i>, CompilationError> {
    let options = ParserOptions {
        filename: filename.to_string(),
        // `>>>` and `/deep/`
        flags: ParserFlags::DEEP_SELECTOR_COMBINATOR,
        ..ParserOptions::default()
    };
    StyleSheet::parse(source, options).map_err(|e| syntax_error(source, e))
}

/// Locates a parser or printer error in `source`. Lines are 0-based and
/// columns 1-based.
fn syntax_error<T: Display>(source: &str, error: Error<T>) -> CompilationError {
    let err = CompilationError::new(ErrorKind::StyleSyntax).with_additional_message(error.kind.to_string());
    let Some(loc) = error.loc else {
        return err;
    };
    let line_start: usize = source
        .split_inclusive('\n')
        .take(loc.line as usize)
        .map(str::len)
        .sum();
    let offset = line_start + (loc.column as usize).saturating_sub(1);
    err.with_location(SourceLocation::from_range(source, offset..offset + 1))
}

#[cfg(test)]
mod test {
    use super::*;

    fn scoped(src: &str) -> SfcStyleCompileResults {
        let mut options = SfcStyleCompileOptions::new(src, "A.vue", "data-v-x");
        options.scoped = true;
        options.trim = false;
        compile_style(options)
    }

    #[test]
    fn test_scoped_rules() {
        let res = scoped(".a { color: red }\n.b .c:hover, d > e { x: y }\n@media (max-width: 1px) { .f { x: y } }");
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert!(res.code.starts_with(".a[data-v-x] {\n"));
        assert!(res.code.contains(".b .c[data-v-x]:hover, d > e[data-v-x] {"));
        assert!(res.code.contains("  .f[data-v-x] {"));
        assert!(res.map.is_none());
    }

    #[test]
    fn test_keyframes() {
        let res = scoped(
            ".a { animation: fade 1s; animation-name: fade, other }\n@keyframes fade { from { opacity: 0 } 50% { opacity: .5 } }",
        );
        assert!(res.errors.is_empty(), "{:?}", res.errors);
        assert!(res.code.contains("@keyframes fade-x {"));
        assert!(res.code.contains("animation-name: fade-x, other;"));
        let animation = res.code.lines().find(|l| l.trim_start().starts_with("animation:")).unwrap();
        assert!(animation.contains("fade-x"));
        // names without keyframes stay
        let res = scoped(".a { animation-name: fade }");
        assert!(res.code.contains("animation-name: fade;"));
    }

    #[test]
    fn test_not_scoped() {
        let res = compile_style(SfcStyleCompileOptions::new(".a { color: red }\n\n", "A.vue", "data-v-x"));
        assert_eq!(res.code, ".a { color: red }\n");
        assert!(res.map.is_none());
        assert!(res.errors.is_empty());
    }

    #[test]
    fn test_source_map() {
        let mut options = SfcStyleCompileOptions::new(".a {}\n.b {}", "A.vue", "data-v-x");
        options.source_map = true;
        let map = compile_style(options).map.unwrap();
        assert_eq!(map.mappings, "AAAA;AACA");
    }

    #[test]
    fn test_errors() {
        let res = scoped(".a { color: red }\n.b..c {}");
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].kind, ErrorKind::StyleSyntax);
        assert_eq!(res.errors[0].location.start.line, 2);
        assert!(res.errors[0].to_string().starts_with("Invalid CSS: "));
        // the source is passed through
        assert_eq!(res.code, ".a { color: red }\n.b..c {}");

        // unscoped styles are checked too
        let res = compile_style(SfcStyleCompileOptions::new("\n\n.a:: {}", "A.vue", "data-v-x"));
        assert_eq!(res.errors[0].kind, ErrorKind::StyleSyntax);
        assert_eq!(res.errors[0].location.start.line, 3);
    }

    #[test]
    fn test_preprocessor() {
        let mut options = SfcStyleCompileOptions::new("$a: 1", "A.vue", "data-v-x");
        options.preprocess_lang = Some("scss");
        let res = compile_style(options);
        assert_eq!(res.errors[0].kind, ErrorKind::UnsupportedPreprocessor);
    }
}
