//! Per-job scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::MediaResult;

/// Uniquely named scratch directory for one job.
///
/// The directory and everything in it is removed when the workspace is
/// closed or dropped, whichever comes first.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh `job-*` directory under `base`, creating `base` if needed.
    pub async fn create(base: impl AsRef<Path>) -> MediaResult<Self> {
        let base = base.as_ref();
        tokio::fs::create_dir_all(base).await?;

        let dir = tempfile::Builder::new().prefix("job-").tempdir_in(base)?;
        debug!(path = %dir.path().display(), "Created job workspace");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove the workspace, logging instead of failing if removal errors.
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "Removed job workspace"),
            Err(e) => warn!(path = %path.display(), "Failed to remove job workspace: {}", e),
        }
    }
}
