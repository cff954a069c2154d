use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

pub const DEFAULT_EXTENSION: &str = "java";

/// Every regular file under `base_path` with the given extension, sorted.
/// Hidden files are included and ignore files are not honoured.
pub fn scan_sources(base_path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !base_path.is_dir() {
        anyhow::bail!("Scan root is not a directory: {}", base_path.display());
    }

    let (tx, rx) = mpsc::channel();
    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry
                && entry.file_type().is_some_and(|t| t.is_file())
                && entry.path().extension().is_some_and(|e| e == extension)
            {
                let _ = tx.send(entry.path().to_path_buf());
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx.iter().collect();
    files.sort();
    Ok(files)
}

/// Path used for category routing, so the root's own name never matches a
/// keyword.
pub fn routing_path<'a>(root: &Path, file: &'a Path) -> &'a Path {
    file.strip_prefix(root).unwrap_or(file)
}
