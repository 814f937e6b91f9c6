//! Pipeline orchestration
//!
//! A [`Pipeline`] owns a shared [`Schema`] and decodes single files or the
//! regular files of a directory with it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use flat_codec::{ConverterRegistry, Schema};
use flat_ir::Record;
use flat_schema::SchemaLoader;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{AcceptancePolicy, Error, Result};

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// What to do with inputs that fail to decode
    pub acceptance_policy: AcceptancePolicy,
    /// Maximum file size in bytes
    pub max_file_size: u64,
    /// Files decoded at the same time by [`Pipeline::decode_dir`]
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            acceptance_policy: AcceptancePolicy::default(),
            max_file_size: 100 * 1024 * 1024, // 100MB
            concurrency: 4,
        }
    }
}

/// Decoded content of one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileResult {
    /// File path
    #[serde(rename = "file")]
    pub path: PathBuf,
    /// Decoded record, or `{"error": ...}` when decoding failed silently
    pub content: Record,
    /// Whether decoding succeeded
    #[serde(skip)]
    pub success: bool,
    /// Processing duration
    #[serde(skip)]
    pub duration: Duration,
}

impl FileResult {
    /// Error message of a silently failed decode
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        if self.success {
            return None;
        }
        self.content.value("error").and_then(|v| v.as_str())
    }
}

/// Result of decoding a directory
#[derive(Debug)]
pub struct PipelineBatchResult {
    /// Results for individual files, sorted by path
    pub file_results: Vec<FileResult>,
    /// Total files processed
    pub total_files: usize,
    /// Successful files
    pub successful_files: usize,
    /// Failed files
    pub failed_files: usize,
    /// Total processing time
    pub total_duration: Duration,
}

/// Decodes files with one shared schema
#[derive(Debug, Clone)]
pub struct Pipeline {
    schema: Arc<Schema>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    #[must_use]
    pub fn new(schema: Arc<Schema>, config: PipelineConfig) -> Self {
        Self { schema, config }
    }

    /// Create a pipeline with default configuration
    #[must_use]
    pub fn with_defaults(schema: Arc<Schema>) -> Self {
        Self::new(schema, PipelineConfig::default())
    }

    /// Load a schema description file and build a pipeline around it
    ///
    /// # Errors
    ///
    /// Returns [`Error::Codec`] if the description cannot be loaded or does
    /// not form a valid schema.
    pub fn from_schema_file(
        path: impl AsRef<Path>,
        converters: Arc<ConverterRegistry>,
        config: PipelineConfig,
    ) -> Result<Self> {
        let description = SchemaLoader::new().load_from_file(path.as_ref())?;
        let schema = Schema::new(&description, converters)?;
        Ok(Self::new(Arc::new(schema), config))
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode a buffer under the configured policy
    ///
    /// # Errors
    ///
    /// With [`AcceptancePolicy::FailAll`], returns [`Error::Decode`] naming
    /// `source` when decoding fails.
    pub fn decode_bytes(&self, content: &[u8], source: &Path) -> Result<FileResult> {
        let start = Instant::now();
        let (content, success) = match self.schema.decode(content) {
            Ok(record) => (record, true),
            Err(e) if self.config.acceptance_policy.is_silent() => {
                warn!(path = %source.display(), error = %e, "Decode failed, keeping error record");
                (Record::new().with("error", e.to_string()), false)
            }
            Err(e) => return Err(Error::decode(source.display().to_string(), e)),
        };

        Ok(FileResult {
            path: source.to_path_buf(),
            content,
            success,
            duration: start.elapsed(),
        })
    }

    /// Read and decode one file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read,
    /// [`Error::Pipeline`] if it is larger than the configured maximum, and
    /// the errors of [`Pipeline::decode_bytes`].
    pub fn decode_file(&self, path: impl AsRef<Path>) -> Result<FileResult> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let metadata =
            std::fs::metadata(path).map_err(|e| Error::io("stat", &path_str, e.to_string()))?;
        if !metadata.is_file() {
            return Err(Error::pipeline("read", &path_str, "not a regular file"));
        }
        if metadata.len() > self.config.max_file_size {
            return Err(Error::pipeline(
                "read",
                &path_str,
                format!(
                    "file too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    self.config.max_file_size
                ),
            ));
        }

        let content = std::fs::read(path).map_err(|e| Error::io("read", &path_str, e.to_string()))?;
        debug!(path = %path_str, bytes = content.len(), "Read input file");
        self.decode_bytes(&content, path)
    }

    /// Decode every regular file directly inside `dir`, in path order.
    ///
    /// Files are decoded concurrently on the blocking pool. Under
    /// [`AcceptancePolicy::AcceptAll`] a file that cannot be read or decoded
    /// yields an error record; under [`AcceptancePolicy::FailAll`] the first
    /// failing file, in path order, fails the call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be listed, and file
    /// errors as described above.
    pub async fn decode_dir(&self, dir: impl AsRef<Path>) -> Result<PipelineBatchResult> {
        let start = Instant::now();
        let dir = dir.as_ref();
        let dir_str = dir.display().to_string();

        let files = list_files(dir).await?;
        info!(dir = %dir_str, files = files.len(), "Decoding directory");

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks = JoinSet::new();
        for (index, path) in files.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::pipeline("decode_dir", &dir_str, e.to_string()))?;
            let pipeline = self.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                let result = pipeline.decode_file(&path);
                (index, path, result)
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            outcomes.push(joined.map_err(|e| Error::pipeline("decode_dir", &dir_str, e.to_string()))?);
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut file_results = Vec::with_capacity(outcomes.len());
        for (_, path, outcome) in outcomes {
            match outcome {
                Ok(result) => file_results.push(result),
                Err(e) if self.config.acceptance_policy.is_silent() => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                    file_results.push(FileResult {
                        path,
                        content: Record::new().with("error", e.to_string()),
                        success: false,
                        duration: Duration::ZERO,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let successful_files = file_results.iter().filter(|r| r.success).count();
        let total_files = file_results.len();
        info!(
            dir = %dir_str,
            total = total_files,
            failed = total_files - successful_files,
            "Directory decoded"
        );

        Ok(PipelineBatchResult {
            file_results,
            total_files,
            successful_files,
            failed_files: total_files - successful_files,
            total_duration: start.elapsed(),
        })
    }
}

/// Regular files directly inside `dir`, sorted by path
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir_str = dir.display().to_string();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Error::io("read_dir", &dir_str, e.to_string()))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Error::io("read_dir", &dir_str, e.to_string()))?
    {
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| Error::io("stat", entry.path().display().to_string(), e.to_string()))?;
        if file_type.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flat_schema::{ElementDescription, SchemaDescription, SegmentDescription};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn schema() -> Arc<Schema> {
        let description = SchemaDescription::new("tags")
            .with_method("first-1")
            .add_segment(
                SegmentDescription::new("Header")
                    .required(true)
                    .add_element(ElementDescription::new("Tag", 1).with_default("H"))
                    .add_element(ElementDescription::new("Site", 4)),
            );
        Arc::new(Schema::with_builtins(&description).unwrap())
    }

    fn silent() -> PipelineConfig {
        PipelineConfig {
            acceptance_policy: AcceptancePolicy::AcceptAll,
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"H9999\n").unwrap();

        let result = Pipeline::with_defaults(schema()).decode_file(file.path()).unwrap();
        assert!(result.success);
        assert_eq!(result.path, file.path());
        assert!(result.error().is_none());
        assert_eq!(
            result.content.lookup_value("Header/Site").unwrap().as_str(),
            Some("9999")
        );
    }

    #[test]
    fn test_decode_failure_policies() {
        let source = Path::new("bad.edi");

        let strict = Pipeline::with_defaults(schema());
        assert!(matches!(
            strict.decode_bytes(b"X\n", source),
            Err(Error::Decode { .. })
        ));

        let lenient = Pipeline::new(schema(), silent());
        let result = lenient.decode_bytes(b"X\n", source).unwrap();
        assert!(!result.success);
        assert_eq!(result.error(), Some("Missing required segments: Header"));
    }

    #[test]
    fn test_file_too_large() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"H9999\n").unwrap();

        let config = PipelineConfig {
            max_file_size: 2,
            ..Default::default()
        };
        let result = Pipeline::new(schema(), config).decode_file(file.path());
        assert!(matches!(result, Err(Error::Pipeline { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = Pipeline::with_defaults(schema()).decode_file("/path/that/does/not/exist.edi");
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[tokio::test]
    async fn test_decode_dir_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.edi"), "H0002\n").unwrap();
        std::fs::write(dir.path().join("a.edi"), "H0001\n").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.edi"), "H0003\n").unwrap();

        let batch = Pipeline::with_defaults(schema()).decode_dir(dir.path()).await.unwrap();
        assert_eq!(batch.total_files, 2);
        assert_eq!(batch.successful_files, 2);

        let sites: Vec<_> = batch
            .file_results
            .iter()
            .map(|r| r.content.lookup_value("Header/Site").unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(sites, vec!["0001", "0002"]);
    }

    #[tokio::test]
    async fn test_decode_dir_policies() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.edi"), "H0001\n").unwrap();
        std::fs::write(dir.path().join("b.edi"), "junk\n").unwrap();

        let strict = Pipeline::with_defaults(schema()).decode_dir(dir.path()).await;
        assert!(matches!(strict, Err(Error::Decode { .. })));

        let batch = Pipeline::new(schema(), silent())
            .decode_dir(dir.path())
            .await
            .unwrap();
        assert_eq!(batch.successful_files, 1);
        assert_eq!(batch.failed_files, 1);
        assert!(batch.file_results[1].error().is_some());
    }

    #[tokio::test]
    async fn test_decode_missing_dir() {
        let result = Pipeline::with_defaults(schema())
            .decode_dir("/path/that/does/not/exist")
            .await;
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
