use std::{
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, warn};

/// Throwaway files used as upload payloads.
///
/// Files live in the run's download directory and are recorded in creation
/// order so teardown can remove them.
#[derive(Debug)]
pub struct Fixtures {
    dir: PathBuf,
    created: Mutex<Vec<PathBuf>>,
}

impl Fixtures {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = std::path::absolute(dir.as_ref())?;
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            created: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `content` to `filename` inside the fixture directory and
    /// returns the absolute path. An existing file of the same name is
    /// overwritten and registered again.
    pub fn create_test_file(&self, filename: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.dir.join(filename);
        std::fs::write(&path, content)?;
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.clone());
        debug!("Created fixture {}", path.display());
        Ok(path)
    }

    pub fn created(&self) -> Vec<PathBuf> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Removes every created file, then the directory itself. Failures are
    /// logged and otherwise ignored.
    pub fn cleanup(&self) {
        let created = std::mem::take(
            &mut *self
                .created
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for path in created {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Could not remove fixture {}: {err}", path.display());
                }
            }
        }
        if let Err(err) = std::fs::remove_dir_all(&self.dir) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("Could not remove {}: {err}", self.dir.display());
            }
        }
    }
}
