//! Scan driver: walk, route, extract, render, write.
//!
//! Files are extracted in bounded chunks on a rayon pool; every rendered
//! record then goes through the single writer owner in walk order, so writer
//! state is never touched from two threads.

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::category::{Category, CategoryTable};
use crate::config::ScanConfig;
use crate::engine::{self, CategoryHook, Extraction, HookRegistry};
use crate::error::CatalogError;
use crate::scan::{routing_path, scan_sources};
use crate::writer::{DistributedWriter, WriterSummary};

const CHUNK_SIZE: usize = 256;
const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub root: String,
    pub output_dir: String,
    pub files_seen: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub structural_issues: usize,
    pub records_written: usize,
    pub write_failures: usize,
    pub duration_ms: u64,
    pub writer: WriterSummary,
}

#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    failed: usize,
    issues: usize,
    records: usize,
    write_failures: usize,
}

pub fn run_scan(config: &ScanConfig) -> Result<ScanReport> {
    let start = Instant::now();
    config.validate()?;

    // Output destinations first: a bad writer setup aborts before any file is read.
    let mut writer = DistributedWriter::create(
        &config.output_dir,
        config.writer_config(),
        config.categories.streams(),
    )?;
    let hooks = HookRegistry::from_table(&config.categories);

    info!(
        root = %config.root.display(),
        output_dir = %config.output_dir.display(),
        buffer_kb = config.buffer_kb,
        file_mb = config.file_mb,
        jobs = config.jobs,
        "scan started"
    );

    let files = scan_sources(&config.root, &config.extension)?;
    let files_seen = files.len();
    let eligible: Vec<(PathBuf, Category)> = files
        .into_iter()
        .filter_map(|path| {
            let category = config.categories.category_of(routing_path(&config.root, &path));
            (category != Category::General).then_some((path, category))
        })
        .collect();
    debug!(files_seen, eligible = eligible.len(), "walk finished");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()
        .context("Failed to build extraction thread pool")?;

    let mut tally = Tally::default();
    for chunk in eligible.chunks(CHUNK_SIZE) {
        let extracted: Vec<_> = pool.install(|| {
            chunk
                .par_iter()
                .map(|(path, category)| {
                    let hook = hooks.hook(*category);
                    (path, *category, hook, engine::extract_file(path, hook))
                })
                .collect()
        });

        for (path, category, hook, outcome) in extracted {
            tally.processed += 1;
            match outcome {
                Ok(extraction) => {
                    record_extraction(&mut writer, &mut tally, path, category, hook, &extraction)
                }
                Err(e) if e.is_per_file() => {
                    warn!(file = %path.display(), error = %e, "skipping unreadable file");
                    tally.failed += 1;
                }
                Err(e) => return Err(e.into()),
            }

            if tally.processed % PROGRESS_EVERY == 0 {
                info!(processed = tally.processed, "progress");
                for s in writer.status() {
                    debug!(
                        category = %s.category,
                        file_seq = s.file_seq,
                        file_bytes = s.file_bytes,
                        buffered_bytes = s.buffered_bytes,
                        "stream status"
                    );
                }
            }
        }
    }

    let summary = match writer.flush_all() {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "final flush incomplete");
            tally.write_failures += 1;
            writer.summary()
        }
    };

    for category in &summary.categories {
        info!(
            category = %category.category,
            files = category.files.len(),
            bytes = category.files.iter().map(|f| f.bytes).sum::<u64>(),
            "output written"
        );
    }
    info!(
        processed = tally.processed,
        failed = tally.failed,
        records = tally.records,
        "scan finished"
    );

    Ok(ScanReport {
        root: config.root.to_string_lossy().to_string(),
        output_dir: writer.output_dir().to_string_lossy().to_string(),
        files_seen,
        files_processed: tally.processed,
        files_failed: tally.failed,
        structural_issues: tally.issues,
        records_written: tally.records,
        write_failures: tally.write_failures,
        duration_ms: start.elapsed().as_millis() as u64,
        writer: summary,
    })
}

fn record_extraction(
    writer: &mut DistributedWriter,
    tally: &mut Tally,
    path: &Path,
    category: Category,
    hook: CategoryHook,
    extraction: &Extraction,
) {
    for issue in &extraction.issues {
        warn!(file = %path.display(), %issue, "structural mismatch");
    }
    tally.issues += extraction.issues.len();

    let text = hook.render(&extraction.record);
    debug!(
        file = %path.display(),
        %category,
        class = %extraction.record.name,
        methods = extraction.record.methods.len(),
        "extracted"
    );
    if text.is_empty() {
        return;
    }
    tally.records += text.lines().count();
    // A failed flush keeps its buffer; the next flush of that stream retries it.
    if let Err(e) = writer.write(category, &text) {
        error!(file = %path.display(), %category, error = %e, "write failed");
        tally.write_failures += 1;
    }
}

/// Extracts a single file. Without an explicit hook the category is routed
/// from the path; General files are still extracted, just without a hook.
pub fn extract_single(
    path: &Path,
    hook: Option<CategoryHook>,
    table: &CategoryTable,
) -> Result<(Category, Extraction), CatalogError> {
    let category = table.category_of(path);
    let hook = hook.unwrap_or_else(|| CategoryHook::for_category(category));
    let extraction = engine::extract_file(path, hook)?;
    Ok((category, extraction))
}
