//! Virtual module ids: `<file>?vue&type=style&index=0&lang.css` addresses
//! one block of a component.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sfc::{AttrValue, BlockAttrs, BlockKind};
use std::fmt::Write;

/// Characters `encodeURIComponent` escapes.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Query names owned by the codec. Block attributes with these names are
/// not passed through.
const RESERVED: &[&str] = &["id", "index", "src", "type", "lang", "module", "scoped"];

/// Where the content of an external `src` block lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SrcQuery {
    /// `src=true`
    Plain,
    /// `src=<id>`: scoped content, owned by the component with this id
    Owner(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VueQuery {
    pub vue: bool,
    pub kind: Option<BlockKind>,
    pub index: Option<usize>,
    pub src: Option<SrcQuery>,
    /// descriptor id of the owner when scoping applies
    pub scoped: Option<String>,
    /// effective language, encoded as `lang.<lang>`
    pub lang: Option<String>,
    /// serve the file literally
    pub raw: bool,
    /// passthrough block attributes
    pub attrs: Vec<(String, AttrValue)>,
}

fn encode(s: &str) -> impl std::fmt::Display + '_ {
    utf8_percent_encode(s, COMPONENT)
}

fn decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

impl VueQuery {
    pub fn block(kind: BlockKind) -> Self {
        Self {
            vue: true,
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Copies the non reserved attributes of a block and resolves its
    /// language. `force_fallback` ignores the declared `lang`.
    pub fn with_attrs(mut self, attrs: &BlockAttrs, lang_fallback: &str, force_fallback: bool) -> Self {
        self.attrs = attrs
            .iter()
            .filter(|(name, _)| !RESERVED.contains(name))
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let declared = attrs.get("lang").map(|v| v.as_str().unwrap_or_default());
        self.lang = Some(match declared {
            Some(lang) if !force_fallback => lang.to_string(),
            _ => lang_fallback.to_string(),
        });
        self
    }

    /// Canonical query string, starting with `?`.
    pub fn encode(&self) -> String {
        let mut out = String::new();
        if self.vue {
            out.push_str("&vue");
        }
        if let Some(kind) = &self.kind {
            let _ = write!(out, "&type={}", encode(kind.as_str()));
        }
        if let Some(index) = self.index {
            let _ = write!(out, "&index={}", index);
        }
        match &self.src {
            Some(SrcQuery::Plain) => out.push_str("&src=true"),
            Some(SrcQuery::Owner(id)) => {
                let _ = write!(out, "&src={}", encode(id));
            }
            None => {}
        }
        if let Some(id) = &self.scoped {
            let _ = write!(out, "&scoped={}", encode(id));
        }
        for (name, value) in &self.attrs {
            let _ = match value {
                AttrValue::True => write!(out, "&{}", encode(name)),
                AttrValue::Str(v) => write!(out, "&{}={}", encode(name), encode(v)),
            };
        }
        if let Some(lang) = &self.lang {
            let _ = write!(out, "&lang.{}", encode(lang));
        }
        if !out.is_empty() {
            out.replace_range(..1, "?");
        }
        out
    }

    fn set(&mut self, name: &str, value: Option<String>) {
        match name {
            "vue" => self.vue = true,
            "raw" => self.raw = true,
            "type" => self.kind = value.map(|v| BlockKind::from_tag(&v)),
            "index" => self.index = value.and_then(|v| v.parse().ok()),
            "src" => {
                self.src = Some(match value {
                    Some(id) if !id.is_empty() && id != "true" => SrcQuery::Owner(id),
                    _ => SrcQuery::Plain,
                })
            }
            "scoped" => self.scoped = value.filter(|v| !v.is_empty()),
            "lang" => self.lang = value,
            _ => match name.strip_prefix("lang.") {
                Some(lang) => self.lang = Some(lang.to_string()),
                None if RESERVED.contains(&name) => {}
                None => self.attrs.push((
                    name.to_string(),
                    value.map_or(AttrValue::True, AttrValue::Str),
                )),
            },
        }
    }
}

/// Splits a module id into its file name and decoded query.
pub fn parse_vue_request(id: &str) -> (&str, VueQuery) {
    let (filename, raw_query) = id.split_once('?').unwrap_or((id, ""));
    let mut query = VueQuery::default();
    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = match pair.split_once('=') {
            Some((n, v)) => (decode(n), Some(decode(v))),
            None => (decode(pair), None),
        };
        query.set(&name, value);
    }
    (filename, query)
}

/// The CSS modules variant of a style request: `lang.css` becomes
/// `lang.module.css`.
pub fn css_module_request(request: &str) -> String {
    match request.rfind('.') {
        Some(dot)
            if dot + 1 < request.len()
                && request[dot + 1..]
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_') =>
        {
            format!("{}.module{}", &request[..dot], &request[dot..])
        }
        _ => request.to_string(),
    }
}
