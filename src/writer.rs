//! Category-partitioned, size-bounded CSV output.
//!
//! The `DistributedWriter` keeps one in-memory buffer per category and only
//! touches the disk when a buffer reaches the flush threshold (or on
//! [`DistributedWriter::flush_all`]). Each category writes to its own file
//! family, `<stem>.csv`, `<stem>_2.csv`, ..., rotating to the next file once
//! the current one would grow past the size limit.
//!
//! Every stream is independent. The writer has a single owner; callers that
//! extract in parallel route their output through that owner.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::category::Category;
use crate::error::{CatalogError, Result};

const FILE_EXTENSION: &str = "csv";

#[derive(Debug, Copy, Clone)]
pub struct WriterConfig {
    pub flush_threshold: u64,
    pub file_size_limit: u64,
    /// Highest numbered overflow file removed before a run.
    pub cleanup_lookahead: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self::from_units(50, 5)
    }
}

impl WriterConfig {
    pub fn from_units(buffer_kb: u64, file_mb: u64) -> Self {
        Self {
            flush_threshold: buffer_kb * 1024,
            file_size_limit: file_mb * 1024 * 1024,
            cleanup_lookahead: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub stem: String,
    pub files: Vec<OutputFile>,
    /// Bytes still buffered, non-zero only after a failed flush.
    pub pending_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriterSummary {
    pub output_dir: String,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamStatus {
    pub category: Category,
    pub file_seq: u32,
    pub file_bytes: u64,
    pub buffered_bytes: u64,
}

#[derive(Debug)]
struct CategoryStream {
    stem: String,
    buffer: String,
    file_seq: u32,
    file_bytes: u64,
    fresh: bool,
    produced: Vec<OutputFile>,
}

impl CategoryStream {
    fn new(stem: String) -> Self {
        Self {
            stem,
            buffer: String::new(),
            file_seq: 1,
            file_bytes: 0,
            fresh: true,
            produced: Vec::new(),
        }
    }

    fn file_name(&self) -> String {
        file_name(&self.stem, self.file_seq)
    }

    fn rotate(&mut self) {
        self.file_seq += 1;
        self.file_bytes = 0;
        self.fresh = true;
    }
}

pub fn file_name(stem: &str, seq: u32) -> String {
    if seq <= 1 {
        format!("{stem}.{FILE_EXTENSION}")
    } else {
        format!("{stem}_{seq}.{FILE_EXTENSION}")
    }
}

pub struct DistributedWriter {
    output_dir: PathBuf,
    config: WriterConfig,
    streams: BTreeMap<Category, CategoryStream>,
}

impl DistributedWriter {
    /// Removes any previous run's files for the managed streams and makes sure
    /// the output directory exists.
    pub fn create(
        output_dir: impl Into<PathBuf>,
        config: WriterConfig,
        streams: Vec<(Category, String)>,
    ) -> Result<Self> {
        if streams.is_empty() {
            return Err(CatalogError::NoCategories);
        }
        let output_dir = output_dir.into();
        let streams: BTreeMap<Category, CategoryStream> = streams
            .into_iter()
            .map(|(c, stem)| (c, CategoryStream::new(stem)))
            .collect();

        for stream in streams.values() {
            remove_previous_output(&output_dir, &stream.stem, config.cleanup_lookahead)?;
        }
        std::fs::create_dir_all(&output_dir).map_err(|source| CatalogError::WriterIo {
            path: output_dir.clone(),
            source,
        })?;

        debug!(
            output_dir = %output_dir.display(),
            streams = streams.len(),
            flush_threshold = config.flush_threshold,
            file_size_limit = config.file_size_limit,
            "writer ready"
        );

        Ok(Self {
            output_dir,
            config,
            streams,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.streams.keys().copied()
    }

    pub fn write(&mut self, category: Category, text: &str) -> Result<()> {
        let stream = self
            .streams
            .get_mut(&category)
            .ok_or(CatalogError::UnmanagedCategory(category))?;
        stream.buffer.push_str(text);
        if stream.buffer.len() as u64 >= self.config.flush_threshold {
            self.flush(category)?;
        }
        Ok(())
    }

    pub fn flush(&mut self, category: Category) -> Result<()> {
        let limit = self.config.file_size_limit;
        let stream = self
            .streams
            .get_mut(&category)
            .ok_or(CatalogError::UnmanagedCategory(category))?;
        if stream.buffer.is_empty() {
            return Ok(());
        }

        let content_bytes = stream.buffer.len() as u64;
        // A fresh file always takes the buffer, so one flush can overshoot the
        // limit by at most its own size.
        if stream.file_bytes > 0 && stream.file_bytes + content_bytes > limit {
            stream.rotate();
            info!(
                %category,
                file = %stream.file_name(),
                limit,
                "rotating to next output file"
            );
        }

        let path = self.output_dir.join(stream.file_name());
        if let Err(source) = write_chunk(&path, stream.fresh, stream.buffer.as_bytes()) {
            // A fresh file is truncated again on retry; an appended one is cut
            // back to its committed length so the retry cannot duplicate lines.
            if !stream.fresh
                && let Err(e) = truncate_to(&path, stream.file_bytes)
            {
                error!(file = %path.display(), error = %e, "could not roll back partial write");
            }
            error!(
                %category,
                file = %path.display(),
                pending = content_bytes,
                error = %source,
                "flush failed, keeping buffer"
            );
            return Err(CatalogError::WriterIo { path, source });
        }

        if stream.fresh {
            stream.produced.push(OutputFile {
                name: stream.file_name(),
                bytes: 0,
            });
            stream.fresh = false;
        }
        stream.file_bytes += content_bytes;
        if let Some(last) = stream.produced.last_mut() {
            last.bytes = stream.file_bytes;
        }
        stream.buffer.clear();

        debug!(
            %category,
            file = %path.display(),
            file_bytes = stream.file_bytes,
            "flushed buffer"
        );
        Ok(())
    }

    /// Flushes every stream even if one of them fails; the first failure is
    /// returned and [`Self::summary`] still reflects what reached the disk.
    pub fn flush_all(&mut self) -> Result<WriterSummary> {
        let categories: Vec<Category> = self.categories().collect();
        let mut first_err = None;
        for category in categories {
            if let Err(e) = self.flush(category) {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(self.summary()),
        }
    }

    pub fn summary(&self) -> WriterSummary {
        WriterSummary {
            output_dir: self.output_dir.to_string_lossy().to_string(),
            categories: self
                .streams
                .iter()
                .map(|(category, s)| CategorySummary {
                    category: *category,
                    stem: s.stem.clone(),
                    files: s.produced.clone(),
                    pending_bytes: s.buffer.len() as u64,
                })
                .collect(),
        }
    }

    pub fn status(&self) -> Vec<StreamStatus> {
        self.streams
            .iter()
            .map(|(category, s)| StreamStatus {
                category: *category,
                file_seq: s.file_seq,
                file_bytes: s.file_bytes,
                buffered_bytes: s.buffer.len() as u64,
            })
            .collect()
    }
}

fn write_chunk(path: &Path, fresh: bool, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = if fresh {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?
    } else {
        OpenOptions::new().create(true).append(true).open(path)?
    };
    file.write_all(bytes)?;
    file.flush()
}

fn truncate_to(path: &Path, len: u64) -> std::io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    if file.metadata()?.len() > len {
        file.set_len(len)?;
    }
    Ok(())
}

fn remove_previous_output(dir: &Path, stem: &str, lookahead: u32) -> Result<()> {
    for seq in 1..=lookahead.max(1) {
        let path = dir.join(file_name(stem, seq));
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(file = %path.display(), "removed previous output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => return Err(CatalogError::WriterIo { path, source }),
        }
    }
    Ok(())
}
