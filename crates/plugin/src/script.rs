use crate::compiler::SfcCompiler;
use crate::error::{Diagnostic, PluginError, Result};
use crate::options::{ResolvedOptions, Target};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use sfc::{SfcDescriptor, SfcScriptBlock, SfcScriptCompileOptions};
use std::sync::{Arc, Weak};
use tracing::trace;

/// Compiled scripts per descriptor and target. Entries are keyed by
/// descriptor identity and die with their descriptor.
#[derive(Default)]
pub struct ScriptCache {
    entries: Mutex<FxHashMap<(usize, Target), (Weak<SfcDescriptor>, Arc<SfcScriptBlock>)>>,
}

fn key(descriptor: &Arc<SfcDescriptor>, target: Target) -> (usize, Target) {
    (Arc::as_ptr(descriptor) as usize, target)
}

impl ScriptCache {
    pub fn get(&self, descriptor: &Arc<SfcDescriptor>, target: Target) -> Option<Arc<SfcScriptBlock>> {
        let entries = self.entries.lock();
        let (owner, script) = entries.get(&key(descriptor, target))?;
        // a dead owner's address may be taken by a new descriptor
        Weak::ptr_eq(owner, &Arc::downgrade(descriptor)).then(|| script.clone())
    }

    pub fn set(&self, descriptor: &Arc<SfcDescriptor>, script: Arc<SfcScriptBlock>, target: Target) {
        let mut entries = self.entries.lock();
        entries.retain(|_, (owner, _)| owner.strong_count() > 0);
        entries.insert(key(descriptor, target), (Arc::downgrade(descriptor), script));
    }

    /// Drops the entries of both targets.
    pub fn forget(&self, descriptor: &Arc<SfcDescriptor>) {
        let mut entries = self.entries.lock();
        entries.remove(&key(descriptor, Target::Client));
        entries.remove(&key(descriptor, Target::Server));
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The compiled script of `descriptor` for `target`, `None` for components
/// without any script. Compiles once per descriptor and target.
pub fn resolve_script<C: SfcCompiler + ?Sized>(
    cache: &ScriptCache,
    compiler: &C,
    descriptor: &Arc<SfcDescriptor>,
    options: &ResolvedOptions,
    target: Target,
) -> Result<Option<Arc<SfcScriptBlock>>> {
    if descriptor.script.is_none() && descriptor.script_setup.is_none() {
        return Ok(None);
    }
    if let Some(cached) = cache.get(descriptor, target) {
        trace!(file = %descriptor.filename, ?target, "resolved script cache hit");
        return Ok(Some(cached));
    }
    trace!(file = %descriptor.filename, ?target, "resolved script cache miss");
    let compiled = compiler
        .compile_script(
            descriptor,
            &SfcScriptCompileOptions {
                id: descriptor.id.clone(),
                is_prod: options.is_production,
                source_map: options.source_map,
            },
        )
        .map_err(|e| {
            PluginError::Compile(Diagnostic::from_compilation_error(&descriptor.filename, &e, None))
        })?;
    let compiled = Arc::new(compiled);
    cache.set(descriptor, compiled.clone(), target);
    Ok(Some(compiled))
}
