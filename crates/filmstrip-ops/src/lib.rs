//! Operational helpers: logging, in-memory trace library, artifact output.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use filmstrip_types::{
    config::OpsConfig,
    export::ExportArtifact,
    trace::{TraceFile, TraceSummary},
    FilmstripError, Result,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| ops_error(format!("failed to create log filter: {err}")))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ops_error(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Reads a trace file from disk and extracts its screenshots.
pub async fn load_trace_file(path: impl AsRef<Path>) -> Result<TraceFile> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| ops_error(format!("unable to read trace {}: {err}", path.display())))?;
    let trace = filmstrip_trace::extract_from_str(&contents)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(TraceFile::new(name, contents.len() as u64, trace))
}

/// Listing entry for a loaded trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceListing {
    pub id: Uuid,
    pub name: String,
    pub size_bytes: u64,
    pub uploaded_at: chrono::DateTime<chrono::Utc>,
    pub summary: TraceSummary,
}

impl From<&TraceFile> for TraceListing {
    fn from(file: &TraceFile) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            uploaded_at: file.uploaded_at,
            summary: file.trace.summary(),
        }
    }
}

/// Loaded traces for the current session. Nothing is persisted.
#[derive(Clone, Default)]
pub struct TraceLibrary {
    files: Arc<Mutex<Vec<Arc<TraceFile>>>>,
}

impl TraceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, file: TraceFile) -> Uuid {
        let id = file.id;
        info!(
            "Added trace {} ({} screenshots)",
            file.name, file.trace.frame_count
        );
        self.files.lock().await.push(Arc::new(file));
        id
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<TraceFile>> {
        let mut files = self.files.lock().await;
        let position = files.iter().position(|file| file.id == id)?;
        Some(files.remove(position))
    }

    pub async fn clear(&self) {
        self.files.lock().await.clear();
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<TraceFile>> {
        self.files
            .lock()
            .await
            .iter()
            .find(|file| file.id == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.files.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.lock().await.is_empty()
    }

    pub async fn list(&self) -> Vec<TraceListing> {
        self.files
            .lock()
            .await
            .iter()
            .map(|file| TraceListing::from(file.as_ref()))
            .collect()
    }
}

pub fn ensure_output_dir(path: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = path.as_ref().to_path_buf();
    std::fs::create_dir_all(&dir)
        .map_err(|err| ops_error(format!("failed to create output dir: {err}")))?;
    info!("Output directory ready at {:?}", dir);
    Ok(dir)
}

/// Saves an artifact under `dir` using its suggested file name.
pub async fn write_artifact(dir: impl AsRef<Path>, artifact: &ExportArtifact) -> Result<PathBuf> {
    let dir = ensure_output_dir(dir)?;
    let path = dir.join(&artifact.file_name);
    tokio::fs::write(&path, &artifact.bytes)
        .await
        .map_err(|err| ops_error(format!("failed to write {}: {err}", path.display())))?;
    info!(
        "Wrote {} ({}, {} bytes)",
        path.display(),
        artifact.mime_type(),
        artifact.bytes.len()
    );
    Ok(path)
}

pub fn ops_error(message: impl Into<String>) -> FilmstripError {
    FilmstripError::Ops(message.into())
}
