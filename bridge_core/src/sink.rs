//! Where the response and snapshot artifacts go.
//!
//! Both artifacts are whole-document overwrites: every write replaces the
//! previous contents rather than appending to them.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bridge_runtime::{Response, Snapshot};
use serde::Serialize;
use thiserror::Error;

use crate::config::BridgeConfig;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to serialize {artifact}: {source}")]
    Serialize {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Unavailable(String),
}

pub trait ArtifactSink {
    /// Replace the response artifact with `responses`.
    fn write_responses(&mut self, responses: &[Response]) -> Result<(), SinkError>;

    /// Replace the snapshot artifact.
    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

/// JSON files on disk, replaced atomically through a temporary sibling.
#[derive(Debug, Clone)]
pub struct FileSink {
    responses_path: PathBuf,
    snapshot_path: PathBuf,
}

impl FileSink {
    pub fn new(responses_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            responses_path: responses_path.into(),
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.responses_path(), config.snapshot_path())
    }

    pub fn responses_path(&self) -> &Path {
        &self.responses_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    artifact: &'static str,
    value: &T,
) -> Result<(), SinkError> {
    let bytes =
        serde_json::to_vec(value).map_err(|source| SinkError::Serialize { artifact, source })?;
    let write_err = |source: io::Error| SinkError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, bytes).map_err(write_err)?;
    fs::rename(&staging, path).map_err(write_err)
}

impl ArtifactSink for FileSink {
    fn write_responses(&mut self, responses: &[Response]) -> Result<(), SinkError> {
        write_json(&self.responses_path, "responses", responses)
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        write_json(&self.snapshot_path, "snapshot", snapshot)
    }
}

/// Keeps every write in memory. Used by tests and embedders that read the
/// artifacts directly instead of from disk.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    response_writes: Vec<Vec<Response>>,
    snapshots: Vec<Snapshot>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails and nothing is recorded.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn response_writes(&self) -> &[Vec<Response>] {
        &self.response_writes
    }

    /// Contents of the response artifact as of the latest write.
    pub fn last_responses(&self) -> Option<&[Response]> {
        self.response_writes.last().map(Vec::as_slice)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    fn check(&self) -> Result<(), SinkError> {
        if self.failing {
            Err(SinkError::Unavailable("memory sink set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

impl ArtifactSink for MemorySink {
    fn write_responses(&mut self, responses: &[Response]) -> Result<(), SinkError> {
        self.check()?;
        self.response_writes.push(responses.to_vec());
        Ok(())
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self.check()?;
        self.snapshots.push(snapshot.clone());
        Ok(())
    }
}
