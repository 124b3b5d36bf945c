//! File-backed container store: one `<index>.block` file per container.

use std::io::Write;
use std::path::{Path, PathBuf};

use sealedger_core::{Container, SealPolicy};

use crate::error::{Result, StoreError};
use crate::traits::ContainerStore;

/// File extension for persisted containers.
pub const CONTAINER_EXTENSION: &str = "block";

/// Stores each container as `<dir>/<index>.block`.
#[derive(Debug, Clone)]
pub struct FsContainerStore {
    dir: PathBuf,
}

impl FsContainerStore {
    /// Open a container directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding container `index`.
    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir.join(format!("{index}.{CONTAINER_EXTENSION}"))
    }
}

impl ContainerStore for FsContainerStore {
    fn save(&self, container: &Container) -> Result<()> {
        let path = self.path_for(container.index());
        write_atomic(&path, container.to_text().as_bytes())?;
        tracing::debug!(
            index = container.index(),
            records = container.len(),
            path = %path.display(),
            "container persisted"
        );
        Ok(())
    }

    fn load(&self, index: u64, policy: SealPolicy) -> Result<Option<Container>> {
        let path = self.path_for(index);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let container = Container::from_text(&text, policy)?;
        if container.index() != index {
            return Err(StoreError::IndexMismatch {
                expected: index,
                found: container.index(),
            });
        }
        Ok(Some(container))
    }
}

/// Write via a sibling temp file and rename, so readers never see a torn file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)?;
    Ok(())
}
