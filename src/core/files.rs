//! File store contract for generated documents and uploaded media

use crate::core::error::EstateResult;
use async_trait::async_trait;

/// Byte storage addressed by relative paths.
///
/// Paths returned by [`save`](FileStore::save) are the only handles callers
/// keep; they are stored on records (e.g. `pdfPath`) and later passed back to
/// [`read`](FileStore::read) and [`delete`](FileStore::delete).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` and return the stored path.
    ///
    /// `suggested_name` may contain a directory prefix (`documents/x.pdf`).
    /// An existing file is never overwritten; a suffix is added instead.
    async fn save(&self, bytes: &[u8], suggested_name: &str) -> EstateResult<String>;

    /// Read a stored file
    async fn read(&self, path: &str) -> EstateResult<Vec<u8>>;

    /// Remove a stored file. Idempotent: `Ok(false)` when already gone.
    async fn delete(&self, path: &str) -> EstateResult<bool>;
}
