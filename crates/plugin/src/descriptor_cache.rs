use crate::compiler::SfcCompiler;
use crate::error::{PluginError, Result};
use crate::options::ResolvedOptions;
use crate::query::VueQuery;
use crate::util::descriptor_id;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use sfc::{CompilationError, PadOption, SfcDescriptor, SfcParseOptions};
use std::sync::Arc;
use tracing::{debug, trace};

struct Entry {
    current: Arc<SfcDescriptor>,
    previous: Option<Arc<SfcDescriptor>>,
}

/// Parsed components by file name. Each entry holds the installed
/// descriptor and the one it replaced. Descriptors are never mutated, a
/// new parse replaces the entry in one step.
#[derive(Default)]
pub struct DescriptorCache {
    entries: RwLock<FxHashMap<String, Entry>>,
    /// external block file and owner id when scoped
    src_links: RwLock<FxHashMap<(String, Option<String>), Arc<SfcDescriptor>>>,
}

impl DescriptorCache {
    pub fn get_descriptor(&self, filename: &str) -> Result<Arc<SfcDescriptor>> {
        self.entries
            .read()
            .get(filename)
            .map(|e| e.current.clone())
            .ok_or_else(|| PluginError::DescriptorNotFound(filename.to_string()))
    }

    pub fn get_previous_descriptor(&self, filename: &str) -> Option<Arc<SfcDescriptor>> {
        self.entries
            .read()
            .get(filename)
            .and_then(|e| e.previous.clone())
    }

    /// Parses `source` and installs the result, moving the installed
    /// descriptor to `previous`. A failed parse leaves the entry untouched.
    /// Source identical to the installed descriptor returns it as is.
    pub fn create_or_update_descriptor<C: SfcCompiler + ?Sized>(
        &self,
        filename: &str,
        source: &str,
        compiler: &C,
        options: &ResolvedOptions,
    ) -> std::result::Result<Arc<SfcDescriptor>, Vec<CompilationError>> {
        if let Some(entry) = self.entries.read().get(filename) {
            if entry.current.source == source {
                return Ok(entry.current.clone());
            }
        }
        let result = compiler.parse(
            source,
            SfcParseOptions {
                filename: filename.to_string(),
                source_map: options.source_map,
                pad: PadOption::NoPad,
                ignore_empty: true,
            },
        );
        if !result.errors.is_empty() {
            return Err(result.errors);
        }
        let mut descriptor = result.descriptor;
        descriptor.id = descriptor_id(&options.root, filename);
        let descriptor = Arc::new(descriptor);

        let mut entries = self.entries.write();
        let previous = entries.remove(filename).map(|e| e.current);
        debug!(
            file = %filename,
            id = %descriptor.id,
            replaced = previous.is_some(),
            "descriptor installed"
        );
        entries.insert(
            filename.to_string(),
            Entry {
                current: descriptor.clone(),
                previous,
            },
        );
        Ok(descriptor)
    }

    /// Links an external block file to the component that owns it.
    pub fn set_src_descriptor(&self, path: &str, owner: Arc<SfcDescriptor>, scoped: bool) {
        let key = (path.to_string(), scoped.then(|| owner.id.clone()));
        trace!(src = %path, owner = %owner.filename, scoped, "src linked");
        self.src_links.write().insert(key, owner);
    }

    pub fn get_src_descriptor(&self, path: &str, query: &VueQuery) -> Result<Arc<SfcDescriptor>> {
        let key = (path.to_string(), query.scoped.clone());
        self.src_links
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| PluginError::SrcDescriptorNotFound(path.to_string()))
    }
}
