//! Staging area for rendered frames
//!
//! Each job gets a private temporary directory holding its numbered PNG
//! frames until the encoder has consumed them. The directory and its
//! contents are removed when the staging area is dropped, whichever way the
//! job ends.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

const STAGING_PREFIX: &str = "lissajous_frames";

pub struct StagingArea {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl StagingArea {
    /// Creates a new staging directory under `root`
    pub fn create(root: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(root)?;
        let path = dir.path().to_path_buf();

        debug!("Created staging directory {}", path.display());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the frame with the given index
    pub fn frame_path(&self, index: u32) -> PathBuf {
        self.path.join(frame_file_name(index))
    }

    /// Writes an encoded frame to its numbered file
    pub async fn write_frame(&self, index: u32, png: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.frame_path(index), png).await
    }

    /// printf-style input pattern matching every staged frame
    pub fn input_pattern(&self) -> PathBuf {
        self.path.join("frame_%05d.png")
    }

    /// Removes the directory now, reporting failures
    pub fn close(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(
                    "Failed to remove staging directory {}: {}",
                    path.display(),
                    e
                );
            }
        }
    }
}

fn frame_file_name(index: u32) -> String {
    format!("frame_{:05}.png", index)
}
