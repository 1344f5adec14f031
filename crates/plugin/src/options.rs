use crate::error::Result;
use regex::RegexSet;
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_INCLUDE: &str = r"\.vue$";
const REF_TRANSFORM_INCLUDE: &str = r"\.(j|t)sx?$";
const REF_TRANSFORM_EXCLUDE: &str = "node_modules";

/// Build target of a compile request. Script output differs between them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Client,
    Server,
}

impl Target {
    pub fn is_ssr(self) -> bool {
        self == Self::Server
    }
}

/// One pattern or a list of them.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Patterns {
    One(String),
    Many(Vec<String>),
}

impl Patterns {
    fn as_slice(&self) -> &[String] {
        match self {
            Self::One(p) => std::slice::from_ref(p),
            Self::Many(ps) => ps,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReactivityTransform {
    /// `true` covers all script files outside `node_modules`
    Enabled(bool),
    Include(Patterns),
}

impl Default for ReactivityTransform {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WhitespaceOption {
    #[default]
    Condense,
    Preserve,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemplateOptions {
    pub whitespace: WhitespaceOption,
    /// Turn asset urls into imports.
    pub transform_asset_urls: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            whitespace: WhitespaceOption::Condense,
            transform_asset_urls: true,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleOptions {
    /// Strip trailing whitespace from compiled CSS.
    pub trim: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self { trim: true }
    }
}

/// User facing plugin options.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub include: Option<Patterns>,
    pub exclude: Option<Patterns>,
    /// Overrides the host's production flag.
    pub is_production: Option<bool>,
    pub template: TemplateOptions,
    pub style: StyleOptions,
    pub reactivity_transform: ReactivityTransform,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DevServer {
    pub hmr: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Serve,
    Build,
}

/// What the host knows once its configuration is final.
#[derive(Clone, Debug)]
pub struct HostConfig {
    pub root: PathBuf,
    pub is_production: bool,
    pub command: Command,
    /// sourcemap setting of a build
    pub build_sourcemap: bool,
    pub css_dev_sourcemap: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedOptions {
    pub root: PathBuf,
    pub is_production: bool,
    pub source_map: bool,
    pub css_dev_sourcemap: bool,
    pub dev_server: Option<DevServer>,
    pub dev_tools_enabled: bool,
    pub template: TemplateOptions,
    pub style: StyleOptions,
}

impl ResolvedOptions {
    pub fn new(options: &Options) -> Self {
        let is_production = options
            .is_production
            .unwrap_or_else(|| std::env::var("NODE_ENV").map_or(false, |env| env == "production"));
        Self {
            root: std::env::current_dir().unwrap_or_default(),
            is_production,
            source_map: true,
            css_dev_sourcemap: false,
            dev_server: None,
            dev_tools_enabled: !is_production,
            template: options.template.clone(),
            style: options.style.clone(),
        }
    }

    pub fn apply_host_config(&mut self, config: &HostConfig) {
        self.root = config.root.clone();
        self.is_production = config.is_production;
        self.source_map = match config.command {
            Command::Build => config.build_sourcemap,
            Command::Serve => true,
        };
        self.css_dev_sourcemap = config.css_dev_sourcemap;
        self.dev_tools_enabled = !config.is_production;
    }

    /// HMR code is emitted for client modules served in development.
    pub fn hmr_enabled(&self, target: Target) -> bool {
        matches!(self.dev_server, Some(DevServer { hmr: true }))
            && !target.is_ssr()
            && !self.is_production
    }
}

/// Include/exclude matcher over module file names. An empty include list
/// matches everything.
#[derive(Clone, Debug)]
pub struct Filter {
    include: RegexSet,
    exclude: RegexSet,
}

impl Filter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: RegexSet::new(include)?,
            exclude: RegexSet::new(exclude)?,
        })
    }

    pub fn from_options(options: &Options) -> Result<Self> {
        let include = match &options.include {
            Some(p) => p.as_slice().to_vec(),
            None => vec![DEFAULT_INCLUDE.to_string()],
        };
        let exclude = options
            .exclude
            .as_ref()
            .map_or(vec![], |p| p.as_slice().to_vec());
        Self::new(&include, &exclude)
    }

    /// `None` when the reactivity transform is off.
    pub fn for_ref_transform(option: &ReactivityTransform) -> Result<Option<Self>> {
        match option {
            ReactivityTransform::Enabled(false) => Ok(None),
            ReactivityTransform::Enabled(true) => Self::new(
                &[REF_TRANSFORM_INCLUDE.to_string()],
                &[REF_TRANSFORM_EXCLUDE.to_string()],
            )
            .map(Some),
            ReactivityTransform::Include(patterns) => Self::new(patterns.as_slice(), &[]).map(Some),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        if self.exclude.is_match(id) {
            return false;
        }
        self.include.is_empty() || self.include.is_match(id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::PluginError;

    #[test]
    fn test_default_filter() {
        let filter = Filter::from_options(&Options::default()).unwrap();
        assert!(filter.matches("/src/App.vue"));
        assert!(!filter.matches("/src/main.ts"));
        assert!(!filter.matches("/src/App.vue.ts"));
    }

    #[test]
    fn test_exclude_wins() {
        let options = Options {
            include: Some(Patterns::Many(vec![r"\.vue$".into(), r"\.md$".into()])),
            exclude: Some(Patterns::One("node_modules".into())),
            ..Default::default()
        };
        let filter = Filter::from_options(&options).unwrap();
        assert!(filter.matches("/docs/a.md"));
        assert!(!filter.matches("/node_modules/x/A.vue"));
    }

    #[test]
    fn test_ref_transform_filter() {
        assert!(Filter::for_ref_transform(&ReactivityTransform::Enabled(false))
            .unwrap()
            .is_none());
        let filter = Filter::for_ref_transform(&ReactivityTransform::Enabled(true))
            .unwrap()
            .unwrap();
        assert!(filter.matches("/src/use.ts"));
        assert!(filter.matches("/src/View.jsx"));
        assert!(!filter.matches("/node_modules/a/index.js"));
        assert!(!filter.matches("/src/App.vue"));
    }

    #[test]
    fn test_bad_pattern() {
        let res = Filter::new(&["(".into()], &[]);
        assert!(matches!(res, Err(PluginError::Pattern(_))));
    }

    #[test]
    fn test_host_config() {
        let mut resolved = ResolvedOptions::new(&Options {
            is_production: Some(false),
            ..Default::default()
        });
        resolved.apply_host_config(&HostConfig {
            root: "/proj".into(),
            is_production: true,
            command: Command::Build,
            build_sourcemap: false,
            css_dev_sourcemap: true,
        });
        assert!(resolved.is_production);
        assert!(!resolved.source_map);
        assert!(!resolved.dev_tools_enabled);
        resolved.dev_server = Some(DevServer { hmr: true });
        assert!(!resolved.hmr_enabled(Target::Client));
        resolved.is_production = false;
        assert!(resolved.hmr_enabled(Target::Client));
        assert!(!resolved.hmr_enabled(Target::Server));
    }
}
