//! Versioned JSON envelopes for persisted sampler state.

use super::manager::{CheckpointError, CheckpointResult};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Current snapshot format version.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Envelope wrapped around every persisted sampler state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotEnvelope<T> {
    /// Format version of the envelope.
    pub format_version: u32,
    /// Sampler kind that produced the state.
    pub kind: String,
    /// Time the snapshot was written.
    pub saved_at: DateTime<Utc>,
    /// Sampler state.
    pub state: T,
}

/// Writes `state` to `path` inside a [`SnapshotEnvelope`].
///
/// The document is written to a sibling temporary file and renamed into
/// place, so a crash never leaves a truncated snapshot at `path`.
///
/// # Errors
///
/// [`CheckpointError::Io`] or [`CheckpointError::Serialisation`] on failure.
pub fn write_snapshot<T: Serialize>(path: &Path, kind: &str, state: &T) -> CheckpointResult<()> {
    let envelope = SnapshotEnvelope {
        format_version: SNAPSHOT_FORMAT_VERSION,
        kind: kind.to_string(),
        saved_at: Utc::now(),
        state,
    };

    let tmp = temporary_path(path);
    let io_err = |source: std::io::Error| CheckpointError::Io {
        path: tmp.clone(),
        source,
    };

    let file = File::create(&tmp).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &envelope).map_err(|source| {
        CheckpointError::Serialisation {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    fs::rename(&tmp, path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a [`SnapshotEnvelope`] written by [`write_snapshot`].
///
/// # Errors
///
/// - [`CheckpointError::MissingFile`] if `path` does not exist
/// - [`CheckpointError::UnsupportedVersion`] for a different format version
/// - [`CheckpointError::Incompatible`] if the snapshot was written by another sampler kind
pub fn read_snapshot<T: DeserializeOwned>(
    path: &Path,
    kind: &str,
) -> CheckpointResult<SnapshotEnvelope<T>> {
    if !path.exists() {
        return Err(CheckpointError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let envelope: SnapshotEnvelope<T> = serde_json::from_reader(BufReader::new(file))
        .map_err(|source| CheckpointError::Serialisation {
            path: path.to_path_buf(),
            source,
        })?;

    if envelope.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(CheckpointError::UnsupportedVersion {
            found: envelope.format_version,
            expected: SNAPSHOT_FORMAT_VERSION,
        });
    }
    if envelope.kind != kind {
        return Err(CheckpointError::Incompatible {
            message: format!(
                "snapshot was written by '{}', expected '{}'",
                envelope.kind, kind
            ),
        });
    }
    Ok(envelope)
}

/// Envelope fields of a snapshot, without the sampler state.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SnapshotHeader {
    /// Format version of the envelope.
    pub format_version: u32,
    /// Sampler kind that produced the state.
    pub kind: String,
    /// Time the snapshot was written.
    pub saved_at: DateTime<Utc>,
}

/// Reads only the envelope fields of a snapshot of any kind or version.
///
/// # Errors
///
/// [`CheckpointError::MissingFile`], [`CheckpointError::Io`] or
/// [`CheckpointError::Serialisation`].
pub fn read_snapshot_header(path: &Path) -> CheckpointResult<SnapshotHeader> {
    if !path.exists() {
        return Err(CheckpointError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CheckpointError::Serialisation {
        path: path.to_path_buf(),
        source,
    })
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
