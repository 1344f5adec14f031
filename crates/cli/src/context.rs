use std::{fs, io, path::Path};

use async_trait::async_trait;
use parking_lot::Mutex;
use path_clean::PathClean;
use plugin::{Diagnostic, PluginContext};
use tracing::trace;

/// Host context resolving relative imports on the file system. Reported
/// diagnostics are kept until the driver renders them.
#[derive(Default)]
pub struct FsContext {
    errors: Mutex<Vec<Diagnostic>>,
    warnings: Mutex<Vec<Diagnostic>>,
}

impl FsContext {
    pub fn take_errors(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.errors.lock())
    }
    pub fn take_warnings(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.warnings.lock())
    }
}

#[async_trait]
impl PluginContext for FsContext {
    async fn resolve(&self, source: &str, importer: &str) -> io::Result<Option<String>> {
        // bare specifiers belong to the bundler's resolver
        if !source.starts_with('.') && !source.starts_with('/') {
            return Ok(None);
        }
        let dir = Path::new(importer).parent().unwrap_or(Path::new(""));
        let path = dir.join(source).clean();
        fs::metadata(&path)?;
        trace!(source, resolved = %path.display(), "resolved");
        Ok(Some(path.to_string_lossy().into_owned()))
    }

    fn error(&self, diagnostic: Diagnostic) {
        self.errors.lock().push(diagnostic);
    }

    fn warn(&self, diagnostic: Diagnostic) {
        self.warnings.lock().push(diagnostic);
    }
}
