//! Index definitions stored as JSON files.

use async_trait::async_trait;
use encoding_rs::Encoding;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::DefinitionConfig;
use crate::errors::RepositoryError;
use crate::interfaces::IndexDefinitionRepository;

/// Reads `<name>.json` or `<name>-<type>.json` from one directory.
pub struct FileDefinitionRepository {
    directory: PathBuf,
    encoding: &'static Encoding,
}

impl FileDefinitionRepository {
    /// Create a repository for the configured directory and charset.
    ///
    /// # Returns
    ///
    /// * `Ok(FileDefinitionRepository)` - A repository ready to load definitions
    /// * `Err(RepositoryError)` - If the charset label is unknown
    pub fn new(config: &DefinitionConfig) -> Result<Self, RepositoryError> {
        let encoding = Encoding::for_label(config.charset.trim().as_bytes()).ok_or_else(|| {
            RepositoryError::encoding(format!("Unknown charset: {}", config.charset))
        })?;

        Ok(Self {
            directory: config.path.clone(),
            encoding,
        })
    }

    /// File name holding the definition for `name` and `index_type`.
    pub fn file_name(name: &str, index_type: Option<&str>) -> String {
        match index_type.filter(|t| !t.is_empty()) {
            Some(index_type) => format!("{}-{}.json", name, index_type),
            None => format!("{}.json", name),
        }
    }
}

fn is_plain_name(segment: &str) -> bool {
    !segment.is_empty() && segment != ".." && !segment.contains(['/', '\\'])
}

#[async_trait]
impl IndexDefinitionRepository for FileDefinitionRepository {
    async fn load(
        &self,
        name: &str,
        index_type: Option<&str>,
    ) -> Result<Option<Value>, RepositoryError> {
        if !is_plain_name(name) || !index_type.map_or(true, |t| t.is_empty() || is_plain_name(t)) {
            warn!(name = %name, index_type = ?index_type, "Rejected definition name");
            return Ok(None);
        }

        let path = self.directory.join(Self::file_name(name, index_type));
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Definition file not found");
                return Ok(None);
            }
            Err(e) => return Err(RepositoryError::io(format!("{}: {}", path.display(), e))),
        };

        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            return Err(RepositoryError::encoding(format!(
                "{}: invalid {} content",
                path.display(),
                self.encoding.name()
            )));
        }

        let value = serde_json::from_str(&text)
            .map_err(|e| RepositoryError::serialization(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Loaded index definition");
        Ok(Some(value))
    }
}
