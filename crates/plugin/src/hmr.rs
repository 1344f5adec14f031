use crate::compiler::SfcCompiler;
use crate::error::Result;
use crate::options::Target;
use crate::plugin::VuePlugin;
use crate::util::{extension, strip_query};
use sfc::{SfcBlock, SfcDescriptor};
use std::ops::Deref;
use tracing::debug;

const CSS_LANGS: &[&str] = &["css", "less", "sass", "scss", "styl", "stylus", "pcss", "postcss", "sss"];

/// A node of the host's module graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleNode {
    pub url: String,
    /// urls of the modules importing this one
    pub importers: Vec<String>,
}

impl ModuleNode {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            importers: vec![],
        }
    }
}

pub struct HotUpdateContext<'a> {
    pub file: &'a str,
    /// new content of `file`
    pub content: &'a str,
    /// modules of `file` in the graph
    pub modules: &'a [ModuleNode],
}

pub fn is_equal_block(a: Option<&SfcBlock>, b: Option<&SfcBlock>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            if a.src.is_some() && a.src == b.src {
                return true;
            }
            a.content == b.content && a.attrs == b.attrs
        }
        _ => false,
    }
}

fn block<T: Deref<Target = SfcBlock>>(b: &Option<T>) -> Option<&SfcBlock> {
    b.as_ref().map(|b| b.deref())
}

fn has_script_changed(prev: &SfcDescriptor, next: &SfcDescriptor) -> bool {
    !is_equal_block(block(&prev.script), block(&next.script))
        || !is_equal_block(block(&prev.script_setup), block(&next.script_setup))
}

fn all_equal<'a>(
    a: impl ExactSizeIterator<Item = &'a SfcBlock>,
    b: impl ExactSizeIterator<Item = &'a SfcBlock>,
) -> bool {
    a.len() == b.len() && a.zip(b).all(|(a, b)| is_equal_block(Some(a), Some(b)))
}

/// Whether `next` differs from `prev` in its template alone, so the
/// running instances can keep their state and only swap render functions.
/// Both versions need a template, gaining or losing one swaps the
/// normalizer arguments and needs a reload.
pub fn is_only_template_changed(prev: &SfcDescriptor, next: &SfcDescriptor) -> bool {
    prev.template.is_some()
        && next.template.is_some()
        && !has_script_changed(prev, next)
        && all_equal(
            prev.styles.iter().map(|s| &s.block),
            next.styles.iter().map(|s| &s.block),
        )
        && all_equal(prev.custom_blocks.iter(), next.custom_blocks.iter())
}

fn is_css_request(url: &str) -> bool {
    extension(strip_query(url)).map_or(false, |ext| CSS_LANGS.contains(&ext))
}

/// Insertion ordered set of module urls.
#[derive(Default)]
struct Affected(Vec<String>);

impl Affected {
    fn add(&mut self, module: Option<&ModuleNode>) {
        if let Some(m) = module {
            self.add_url(&m.url);
        }
    }
    fn add_url(&mut self, url: &str) {
        if !self.contains(url) {
            self.0.push(url.to_string());
        }
    }
    fn contains(&self, url: &str) -> bool {
        self.0.iter().any(|u| u == url)
    }
}

impl<C: SfcCompiler> VuePlugin<C> {
    /// Installs the edited content of `ctx.file` and picks the modules the
    /// host must reload. `None` when the file is not a compiled component.
    pub fn handle_hot_update(&self, ctx: HotUpdateContext) -> Result<Option<Vec<String>>> {
        if !self.filter.matches(ctx.file) {
            return Ok(None);
        }
        let Ok(prev) = self.descriptors.get_descriptor(ctx.file) else {
            return Ok(None);
        };
        let prev_script = self.scripts.get(&prev, Target::Client);
        let next = self.install_descriptor(ctx.file, ctx.content)?;
        let modules = ctx.modules;

        let mut affected = Affected::default();
        let main_module = modules
            .iter()
            .find(|m| !m.url.contains("type=") || m.url.contains("type=script"));
        let template_module = modules.iter().find(|m| m.url.contains("type=template"));

        let script_changed = has_script_changed(&prev, &next);
        if script_changed {
            let lang = [next.script_setup.as_ref(), next.script.as_ref()]
                .into_iter()
                .flatten()
                .find(|s| s.lang.is_some() && s.src.is_none())
                .and_then(|s| s.lang.as_deref());
            let script_module = lang.and_then(|lang| {
                let suffix = format!("&lang.{}", lang);
                modules
                    .iter()
                    .find(|m| m.url.contains("type=script") && m.url.ends_with(&suffix))
            });
            affected.add(script_module.or(main_module));
        }

        let mut need_rerender = false;
        if !is_equal_block(prev.template.as_ref(), next.template.as_ref()) {
            // the script is the same, reuse what was compiled for it
            if let Some(script) = prev_script.filter(|_| !script_changed) {
                self.scripts.set(&next, script, Target::Client);
            }
            affected.add(template_module);
            need_rerender = true;
        }

        let mut did_update_style = false;
        let prev_styles = &prev.styles;
        let next_styles = &next.styles;
        if prev_styles.iter().any(|s| s.scoped) != next_styles.iter().any(|s| s.scoped) {
            affected.add(template_module);
            affected.add(main_module);
        }
        for (i, style) in next_styles.iter().enumerate() {
            let prev_style = prev_styles.get(i).map(|s| &s.block);
            if is_equal_block(prev_style, Some(&style.block)) {
                continue;
            }
            did_update_style = true;
            let needle = format!("type=style&index={}", i);
            let ext = format!(".{}", style.lang.as_deref().unwrap_or("css"));
            match modules
                .iter()
                .find(|m| m.url.contains(&needle) && m.url.ends_with(&ext))
            {
                Some(m) => {
                    affected.add(Some(m));
                    if m.url.contains("&inline") {
                        affected.add(main_module);
                    }
                }
                None => affected.add(main_module),
            }
        }
        if prev_styles.len() > next_styles.len() {
            affected.add(main_module);
        }

        let prev_customs = &prev.custom_blocks;
        let next_customs = &next.custom_blocks;
        if prev_customs.len() != next_customs.len() {
            affected.add(main_module);
        } else {
            for (i, (p, n)) in prev_customs.iter().zip(next_customs.iter()).enumerate() {
                if is_equal_block(Some(p), Some(n)) {
                    continue;
                }
                let needle = format!("type={}&index={}", p.kind.as_str(), i);
                let module = modules.iter().find(|m| m.url.contains(&needle));
                affected.add(module.or(main_module));
            }
        }

        if need_rerender {
            match (template_module, main_module) {
                (None, _) => affected.add(main_module),
                (Some(_), Some(main)) if !affected.contains(&main.url) => {
                    for importer in main.importers.iter().filter(|u| is_css_request(u)) {
                        affected.add_url(importer);
                    }
                }
                _ => {}
            }
        }
        debug!(
            file = %ctx.file,
            template = need_rerender,
            style = did_update_style,
            modules = ?affected.0,
            "hot update"
        );
        Ok(Some(affected.0))
    }
}
