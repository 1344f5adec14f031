use crate::util::json_string;
use rustc_hash::FxHashMap;

/// Which element attributes hold asset urls that should become module
/// requests.
#[derive(Debug, Clone)]
pub struct AssetUrlOptions {
    pub tags: FxHashMap<&'static str, Vec<&'static str>>,
    /// Also transform absolute urls such as `/img/logo.png`.
    pub include_absolute: bool,
}

impl Default for AssetUrlOptions {
    fn default() -> Self {
        let mut tags = FxHashMap::default();
        tags.insert("video", vec!["src", "poster"]);
        tags.insert("source", vec!["src"]);
        tags.insert("img", vec!["src"]);
        tags.insert("image", vec!["xlink:href", "href"]);
        tags.insert("use", vec!["xlink:href", "href"]);
        Self {
            tags,
            include_absolute: false,
        }
    }
}

impl AssetUrlOptions {
    pub fn matches(&self, tag: &str, attr: &str) -> bool {
        self.tags
            .get(tag)
            .map_or(false, |attrs| attrs.contains(&attr))
    }
}

/// `require("...")` for relative, aliased and module urls.
pub fn url_to_require(url: &str, include_absolute: bool) -> Option<String> {
    let url = url.trim();
    let first = url.chars().next()?;
    if first == '.' || first == '@' || (include_absolute && first == '/') {
        return Some(format!("require({})", json_string(url)));
    }
    if first == '~' {
        let request = url[1..].strip_prefix('/').unwrap_or(&url[1..]);
        return Some(format!("require({})", json_string(request)));
    }
    None
}
