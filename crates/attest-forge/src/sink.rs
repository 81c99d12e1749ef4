//! Output sinks for forge artifacts
//!
//! The forge never touches the filesystem directly; it hands named byte
//! buffers to an [`ArtifactSink`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the canonical manifest.
pub const MANIFEST_FILE: &str = "manifest.json";

/// File name of the signature bundle.
pub const BUNDLE_FILE: &str = "bundle.json";

/// Destination for named artifacts.
pub trait ArtifactSink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes artifacts as files under a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

impl ArtifactSink for DirectorySink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, bytes)?;
        log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    artifacts: BTreeMap<String, Vec<u8>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.artifacts.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }
}

impl ArtifactSink for MemorySink {
    fn write_artifact(&mut self, name: &str, bytes: &[u8]) -> io::Result<()> {
        self.artifacts.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
