use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use crate::category::{CategoryTable, ROUTED};
use crate::cli::ScanArgs;
use crate::error::{CatalogError, Result};
use crate::scan::DEFAULT_EXTENSION;
use crate::writer::WriterConfig;

pub const OUTPUT_ENV: &str = "CLASS_CATALOG_OUTPUT";
pub const KEYWORDS_ENV: &str = "CLASS_CATALOG_KEYWORDS";
pub const DEFAULT_BUFFER_KB: u64 = 50;
pub const DEFAULT_FILE_MB: u64 = 5;
const DEFAULT_OUTPUT_DIR: &str = "catalog";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub output_dir: PathBuf,
    pub buffer_kb: u64,
    pub file_mb: u64,
    pub extension: String,
    pub jobs: usize,
    pub categories: CategoryTable,
}

impl ScanConfig {
    pub fn new(root: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            root,
            output_dir,
            buffer_kb: DEFAULT_BUFFER_KB,
            file_mb: DEFAULT_FILE_MB,
            extension: DEFAULT_EXTENSION.to_string(),
            jobs: default_jobs(),
            categories: CategoryTable::default(),
        }
    }

    pub fn from_args(args: &ScanArgs) -> Result<Self> {
        let config = Self {
            root: args.root.clone(),
            output_dir: resolve_output_dir(args.output.as_deref()),
            buffer_kb: args.buffer_kb,
            file_mb: args.file_mb,
            extension: args.extension.trim_start_matches('.').to_string(),
            jobs: args.jobs.unwrap_or_else(default_jobs),
            categories: resolve_keyword_table(args.keywords.as_deref())?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn writer_config(&self) -> WriterConfig {
        WriterConfig::from_units(self.buffer_kb, self.file_mb)
    }

    pub fn validate(&self) -> Result<()> {
        if self.buffer_kb == 0 {
            return Err(invalid("buffer size must be at least 1 KB"));
        }
        if self.file_mb == 0 {
            return Err(invalid("file size limit must be at least 1 MB"));
        }
        if self.jobs == 0 {
            return Err(invalid("jobs must be at least 1"));
        }
        if self.extension.is_empty() {
            return Err(invalid("source extension must not be empty"));
        }
        validate_table(&self.categories)
    }
}

pub fn validate_table(table: &CategoryTable) -> Result<()> {
    let mut seen = HashSet::new();
    for category in ROUTED {
        if let Some(keyword) = table.keyword(category)
            && !seen.insert(keyword.to_lowercase())
        {
            return Err(invalid(&format!(
                "keyword '{keyword}' is assigned to more than one category"
            )));
        }
    }
    Ok(())
}

pub fn resolve_output_dir(flag: Option<&Path>) -> PathBuf {
    if let Some(p) = flag {
        return p.to_path_buf();
    }
    if let Ok(p) = env::var(OUTPUT_ENV)
        && !p.is_empty()
    {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

/// Flag, then environment, then the per-user config file if present, then
/// built-in defaults.
pub fn resolve_keyword_table(flag: Option<&Path>) -> Result<CategoryTable> {
    if let Some(p) = flag {
        return load_keyword_table(p);
    }
    if let Ok(p) = env::var(KEYWORDS_ENV)
        && !p.is_empty()
    {
        return load_keyword_table(Path::new(&p));
    }
    if let Some(p) = user_keyword_file()
        && p.exists()
    {
        return load_keyword_table(&p);
    }
    Ok(CategoryTable::default())
}

pub fn load_keyword_table(path: &Path) -> Result<CategoryTable> {
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::KeywordRead {
        path: path.to_path_buf(),
        source,
    })?;
    let table: CategoryTable =
        serde_json::from_str(&raw).map_err(|source| CatalogError::KeywordParse {
            path: path.to_path_buf(),
            source,
        })?;
    validate_table(&table)?;
    Ok(table)
}

fn user_keyword_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("class-catalog").join("keywords.json"))
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn invalid(msg: &str) -> CatalogError {
    CatalogError::InvalidConfig(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_units() {
        let config = ScanConfig::new(PathBuf::from("src"), PathBuf::from("out"));
        let writer = config.writer_config();
        assert_eq!(writer.flush_threshold, 50 * 1024);
        assert_eq!(writer.file_size_limit, 5 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let mut config = ScanConfig::new(PathBuf::from("src"), PathBuf::from("out"));
        config.buffer_kb = 0;
        assert!(matches!(config.validate(), Err(CatalogError::InvalidConfig(_))));
        config.buffer_kb = 1;
        config.file_mb = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_output_flag_wins() {
        assert_eq!(
            resolve_output_dir(Some(Path::new("/tmp/x"))),
            PathBuf::from("/tmp/x")
        );
    }

    #[test]
    fn keyword_file_overrides_some_fields() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"{"controller": "web", "service_c": ""}"#)?;

        let table = load_keyword_table(&path)?;
        assert_eq!(table.controller, "web");
        assert_eq!(table.service_a, "cbc");
        assert_eq!(table.keyword(crate::category::Category::ServiceC), None);
        Ok(())
    }

    #[test]
    fn duplicate_keywords_are_rejected() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, r#"{"service_a": "svc", "service_b": "SVC"}"#)?;
        assert!(matches!(
            load_keyword_table(&path),
            Err(CatalogError::InvalidConfig(_))
        ));
        Ok(())
    }

    #[test]
    fn broken_keyword_file_is_reported_with_path() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("keywords.json");
        std::fs::write(&path, "{not json")?;
        let err = load_keyword_table(&path).unwrap_err();
        assert!(matches!(err, CatalogError::KeywordParse { .. }));
        assert!(err.to_string().contains("keywords.json"));
        Ok(())
    }
}
