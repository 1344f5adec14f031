use crate::error::Diagnostic;
use async_trait::async_trait;
use std::io;

/// Services the host build tool offers while a module is transformed.
#[async_trait]
pub trait PluginContext: Send + Sync {
    /// Resolves an import `source` as seen from `importer`. `Ok(None)` means
    /// no resolver claimed it.
    async fn resolve(&self, source: &str, importer: &str) -> io::Result<Option<String>>;

    /// Reports an error. Emission of the current module continues.
    fn error(&self, diagnostic: Diagnostic);

    fn warn(&self, diagnostic: Diagnostic);
}
