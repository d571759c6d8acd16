//! Session configuration.
//!
//! One `Config` resolves to one data directory and one store handle. All
//! operations take the resolved session explicitly; there is no hidden
//! process-wide state, so tests can run several independent stores side by
//! side.

use crate::data::ProjectInfo;
use crate::error::{Result, WnError};
use crate::parse::ParserStrategy;
use directories_next::ProjectDirs;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Subdirectory name within the user's data directory.
pub const WN_SUBDIR: &str = "wn-rs";

/// Default bound on a single download transfer.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Process-wide settings consumed by the parser, pipeline and store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root data directory. `None` resolves the platform default via
    /// `ProjectDirs`.
    pub data_dir: Option<PathBuf>,
    /// Optional explicit database file, overriding `<data_dir>/wn.db`.
    pub db_path: Option<PathBuf>,
    /// Parser strategy for ingestion. `Auto` picks by file size.
    pub parser: ParserStrategy,
    /// Reject documents using relation types outside the closed vocabulary.
    pub strict_parse: bool,
    /// Abort a download that exceeds this bound.
    pub download_timeout: Duration,
    /// Additional downloadable projects, consulted after the built-in index.
    pub extra_projects: Vec<ProjectInfo>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            db_path: None,
            parser: ParserStrategy::Auto,
            strict_parse: false,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            extra_projects: Vec::new(),
        }
    }
}

impl Config {
    /// Resolves the root data directory, creating it if needed.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => ProjectDirs::from("org", "WnRs", WN_SUBDIR)
                .ok_or(WnError::DataDirNotFound)?
                .data_dir()
                .to_path_buf(),
        };
        fs::create_dir_all(&dir)
            .map_err(|e| WnError::Config(format!("cannot create data dir {:?}: {}", dir, e)))?;
        Ok(dir)
    }

    /// The durable store file.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(self.data_dir()?.join("wn.db")),
        }
    }

    /// Download cache, keyed by project-version.
    pub fn download_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir()?.join("downloads");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Scratch area for archive extraction.
    pub fn scratch_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir()?.join("tmp");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Per-lexicon source documents retained after ingestion for export
    /// tooling.
    pub fn sources_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir()?.join("sources");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn layout_under_explicit_data_dir() {
        let tmp = tempdir().unwrap();
        let config = Config {
            data_dir: Some(tmp.path().to_path_buf()),
            ..Config::default()
        };
        assert_eq!(config.db_path().unwrap(), tmp.path().join("wn.db"));
        assert!(config.download_dir().unwrap().is_dir());
        assert!(config.scratch_dir().unwrap().is_dir());
        assert!(config.sources_dir().unwrap().is_dir());
    }

    #[test]
    fn explicit_db_path_wins() {
        let tmp = tempdir().unwrap();
        let db = tmp.path().join("elsewhere.db");
        let config = Config {
            data_dir: Some(tmp.path().to_path_buf()),
            db_path: Some(db.clone()),
            ..Config::default()
        };
        assert_eq!(config.db_path().unwrap(), db);
    }
}
