//! Configuration file support for litscout.
//!
//! # Configuration File Format
//!
//! ```toml
//! [search]
//! max_results = 20
//!
//! [http]
//! timeout_secs = 30
//! connect_timeout_secs = 10
//! user_agent = "litscout/0.1.0"
//!
//! [sources]
//! enabled = "pubmed,arxiv"
//! disabled = ""
//!
//! [sources.pubmed]
//! esearch_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi"
//! efetch_url = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi"
//! api_key = "your-ncbi-key"
//! email = "you@example.org"
//!
//! [sources.arxiv]
//! query_url = "http://export.arxiv.org/api/query"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 5000
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::Path;

use super::Config;

/// Render a configuration as TOML
pub fn render_config(config: &Config) -> Result<String, ConfigFileError> {
    toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))
}

/// Write a configuration to a TOML file, creating parent directories.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn save_config(config: &Config, path: &Path, force: bool) -> Result<(), ConfigFileError> {
    if path.exists() && !force {
        return Err(ConfigFileError::Exists(path.display().to_string()));
    }

    let content = render_config(config)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Config file already exists: {0} (use --force to overwrite)")]
    Exists(String),
}
