use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::timestamps::Timestamp;

const VIDEO_FILE_NAME: &str = "video.mp4";

pub fn get_root_work_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("framenotes")
}

/// Directory holding the temporary artifacts of a run. Names are fixed, so
/// two runs sharing a workspace overwrite each other's files.
#[derive(Debug, Clone)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    pub fn video_path(&self) -> PathBuf {
        self.dir.join(VIDEO_FILE_NAME)
    }

    pub fn frame_path(&self, timestamp: &Timestamp) -> PathBuf {
        self.dir.join(timestamp.frame_file_name())
    }

    /// Files in the workspace that look like run artifacts.
    pub fn leftover_artifacts(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut found: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
                    return false;
                };
                name == VIDEO_FILE_NAME || (name.starts_with("frame_") && name.ends_with(".jpg"))
            })
            .collect();
        found.sort();
        found
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Video,
    Frame,
}

/// A file owned by the current run. Dropping it deletes the file, so every
/// exit path of the run cleans up; `remove` does the same explicitly.
#[derive(Debug)]
pub struct TempArtifact {
    kind: ArtifactKind,
    path: PathBuf,
    armed: bool,
}

impl TempArtifact {
    pub fn new(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            armed: true,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn remove(mut self) -> io::Result<()> {
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(kind = ?self.kind, path = %self.path.display(), "artifact removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(kind = ?self.kind, path = %self.path.display(), "artifact dropped"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove artifact"),
        }
    }
}

/// Best-effort removal of a file that may or may not exist.
pub(crate) async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove partial file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropping_an_artifact_deletes_its_file() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let path = workspace.video_path();
        std::fs::write(&path, b"video").unwrap();

        {
            let _artifact = TempArtifact::new(ArtifactKind::Video, &path);
        }

        assert!(!path.exists());
        assert!(workspace.leftover_artifacts().is_empty());
    }

    #[tokio::test]
    async fn explicit_remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let artifact = TempArtifact::new(
            ArtifactKind::Frame,
            workspace.frame_path(&Timestamp::new(1, 30)),
        );

        artifact.remove().await.unwrap();
    }

    #[test]
    fn leftovers_match_artifact_names_only() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        std::fs::write(workspace.video_path(), b"v").unwrap();
        std::fs::write(workspace.frame_path(&Timestamp::new(0, 10)), b"f").unwrap();
        std::fs::write(dir.path().join("notes.md"), b"n").unwrap();

        let leftovers = workspace.leftover_artifacts();
        assert_eq!(
            leftovers,
            vec![dir.path().join("frame_0_10.jpg"), dir.path().join("video.mp4")]
        );
    }
}
