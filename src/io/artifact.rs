//! Reading and writing artifacts on disk.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::explainability::TreeExplainer;

use super::native::{ArtifactKind, decode_artifact, encode_artifact};
use super::payload::ExplainerPayload;
use super::SerializationError;

fn io_error(path: &Path, source: std::io::Error) -> SerializationError {
    SerializationError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Serialize `payload` and write it atomically.
///
/// Bytes go to a temporary file in the target directory, which is then
/// renamed over `path`. An interrupted write leaves no artifact behind.
pub fn write_artifact<T: Serialize>(
    path: &Path,
    kind: ArtifactKind,
    n_features: u32,
    payload: &T,
) -> Result<(), SerializationError> {
    let encoded = postcard::to_allocvec(payload).map_err(SerializationError::Encoding)?;
    let bytes = encode_artifact(kind, n_features, &encoded)?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_error(path, e))?;
    tmp.write_all(&bytes).map_err(|e| io_error(path, e))?;
    tmp.as_file().sync_all().map_err(|e| io_error(path, e))?;
    tmp.persist(path).map_err(|e| io_error(path, e.error))?;

    tracing::debug!(path = %path.display(), ?kind, bytes = bytes.len(), "wrote artifact");
    Ok(())
}

/// Read and verify an artifact of the expected kind.
pub fn read_artifact<T: DeserializeOwned>(path: &Path, kind: ArtifactKind) -> Result<T, SerializationError> {
    let bytes = fs::read(path).map_err(|e| io_error(path, e))?;
    let (_, payload) = decode_artifact(&bytes, kind)?;
    postcard::from_bytes(payload).map_err(SerializationError::Decoding)
}

/// Persist an explainer (forest, feature names, base value).
pub fn save_explainer(explainer: &TreeExplainer, path: impl AsRef<Path>) -> Result<(), SerializationError> {
    let payload = ExplainerPayload::from(explainer);
    write_artifact(
        path.as_ref(),
        ArtifactKind::Explainer,
        explainer.n_features() as u32,
        &payload,
    )
}

/// Load an explainer saved by [`save_explainer`].
pub fn load_explainer(path: impl AsRef<Path>) -> Result<TreeExplainer, SerializationError> {
    let payload: ExplainerPayload = read_artifact(path.as_ref(), ArtifactKind::Explainer)?;
    TreeExplainer::try_from(payload)
}
