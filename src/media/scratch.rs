use anyhow::{Context, Result};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScratchKind {
    Video,
    Audio,
    Merged,
}

impl ScratchKind {
    const ALL: [ScratchKind; 3] = [ScratchKind::Video, ScratchKind::Audio, ScratchKind::Merged];

    pub fn tag(self) -> &'static str {
        match self {
            ScratchKind::Video => "video",
            ScratchKind::Audio => "audio",
            ScratchKind::Merged => "merged",
        }
    }
}

impl fmt::Display for ScratchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Directory that holds per-request scratch artifacts.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create scratch directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names a fresh artifact. The file itself is created by whoever writes to it.
    pub fn allocate(&self, kind: ScratchKind, ext: &str) -> ScratchFile {
        let name = format!("{}-{}.{}", kind.tag(), Uuid::new_v4().simple(), ext);
        let path = self.root.join(name);
        debug!("Allocated scratch file {}", path.display());
        ScratchFile { path, kind }
    }

    /// Removes artifacts untouched for at least `older_than`, left behind by a previous
    /// run. Younger files may belong to another instance sharing the directory.
    /// Returns how many were removed.
    pub fn sweep(&self, older_than: Duration) -> Result<usize> {
        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to read {}", self.root.display()))?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let ours = ScratchKind::ALL
                .iter()
                .any(|kind| name.starts_with(&format!("{}-", kind.tag())));
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !ours || !is_file {
                continue;
            }

            let age = entry
                .metadata()
                .and_then(|metadata| metadata.modified())
                .ok()
                .and_then(|modified| modified.elapsed().ok());
            if !matches!(age, Some(age) if age >= older_than) {
                debug!("Keeping recent scratch file {}", name);
                continue;
            }

            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!("Failed to remove stale scratch file {}: {}", name, e),
            }
        }

        if removed > 0 {
            info!("Removed {} stale scratch files from {}", removed, self.root.display());
        }
        Ok(removed)
    }
}

/// Owned scratch path. The file is removed when this guard is dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    kind: ScratchKind,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ScratchKind {
        self.kind
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.bin", self.kind))
    }

    /// `<kind>-<uuid>.`, shared by the artifact and anything a tool writes beside it
    /// (pre-conversion source streams, `.part`, `.ytdl`).
    fn sibling_prefix(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|stem| format!("{}.", stem.to_string_lossy()))
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed scratch file {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove scratch file {}: {}", path.display(), e),
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        remove_quietly(&self.path);

        let (Some(dir), Some(prefix)) = (self.path.parent(), self.sibling_prefix()) else {
            return;
        };
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to scan {} for leftovers: {}", dir.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                remove_quietly(&entry.path());
            }
        }
    }
}
