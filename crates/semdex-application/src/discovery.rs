//! File discovery
//!
//! Walks a root directory in parallel, applying include/exclude globs, the
//! allowed-extension list, and a size cap. Hidden files and the usual vendor
//! directories are skipped by default. Paths come back repository-relative
//! with forward slashes, ready to become [`SourceFile`] descriptors.

use crate::constants::{DEFAULT_EXCLUDED_DIRS, DEFAULT_EXTENSIONS, DEFAULT_MAX_FILE_SIZE};
use globset::{Glob, GlobSet, GlobSetBuilder};
use semdex_domain::{Error, Language, Result, SourceFile};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::UNIX_EPOCH;

/// Configuration for file discovery
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    /// File extensions to include (without dots)
    pub extensions: Vec<String>,
    /// Glob patterns a relative path must match (empty = all)
    pub include_patterns: Vec<String>,
    /// Glob patterns that exclude a relative path
    pub exclude_patterns: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: Option<u64>,
    /// Follow symbolic links
    pub follow_symlinks: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
            include_patterns: Vec::new(),
            exclude_patterns: DEFAULT_EXCLUDED_DIRS
                .iter()
                .map(|dir| format!("**/{}/**", dir))
                .collect(),
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            follow_symlinks: false,
        }
    }
}

/// A file found during discovery
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Absolute path on disk
    pub absolute_path: PathBuf,
    /// Repository-relative path with forward slashes
    pub relative_path: String,
    /// Modification time, unix seconds
    pub mtime: i64,
    /// Size in bytes
    pub size_bytes: u64,
    /// Language detected from the extension
    pub language: Language,
}

impl DiscoveredFile {
    /// Build the store descriptor for this file
    pub fn to_source_file(&self) -> Result<SourceFile> {
        SourceFile::new(
            self.relative_path.clone(),
            self.mtime,
            self.language,
            self.size_bytes,
        )
    }
}

/// Result of a discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Eligible files, sorted by relative path
    pub files: Vec<DiscoveredFile>,
    /// Entries skipped by a filter
    pub skipped: usize,
    /// Total bytes across eligible files
    pub total_bytes: u64,
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::validation(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::validation(format!("glob set: {}", e)))
}

/// Discover indexable files under a root directory
///
/// The walk itself runs on blocking threads, one per hardware thread.
pub async fn discover(root: &Path, options: &DiscoveryOptions) -> Result<DiscoveryResult> {
    if !root.is_dir() {
        return Err(Error::not_found(format!(
            "directory not found: {}",
            root.display()
        )));
    }
    let root = root.to_path_buf();
    let options = options.clone();
    tokio::task::spawn_blocking(move || walk(&root, &options))
        .await
        .map_err(|e| Error::io(format!("discovery task failed: {}", e)))?
}

fn walk(root: &Path, options: &DiscoveryOptions) -> Result<DiscoveryResult> {
    let include = build_glob_set(&options.include_patterns)?;
    let exclude = build_glob_set(&options.exclude_patterns)?;

    let threads = std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4);
    let walker = ignore::WalkBuilder::new(root)
        .follow_links(options.follow_symlinks)
        .hidden(true)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .threads(threads)
        .build_parallel();

    let (sender, receiver) = mpsc::channel::<std::result::Result<DiscoveredFile, ()>>();
    walker.run(|| {
        let sender = sender.clone();
        let root = root.to_path_buf();
        let options = options.clone();
        let include = include.clone();
        let exclude = exclude.clone();
        Box::new(move |entry| {
            use ignore::WalkState;
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::debug!(%error, "discovery entry error");
                    return WalkState::Continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                return WalkState::Continue;
            }
            match inspect(&root, entry.path(), &options, &include, &exclude) {
                Some(file) => {
                    let _ = sender.send(Ok(file));
                }
                None => {
                    let _ = sender.send(Err(()));
                }
            }
            WalkState::Continue
        })
    });
    drop(sender);

    let mut result = DiscoveryResult::default();
    for message in receiver {
        match message {
            Ok(file) => {
                result.total_bytes += file.size_bytes;
                result.files.push(file);
            }
            Err(()) => result.skipped += 1,
        }
    }
    result.files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(result)
}

/// Apply every filter to one path; `None` means skipped
fn inspect(
    root: &Path,
    path: &Path,
    options: &DiscoveryOptions,
    include: &GlobSet,
    exclude: &GlobSet,
) -> Option<DiscoveredFile> {
    let relative = path.strip_prefix(root).ok()?;
    let relative_path = relative.to_string_lossy().replace('\\', "/");

    if exclude.is_match(&relative_path) {
        return None;
    }
    if !options.include_patterns.is_empty() && !include.is_match(&relative_path) {
        return None;
    }

    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !options.extensions.is_empty()
        && !options.extensions.iter().any(|e| e.eq_ignore_ascii_case(extension))
    {
        return None;
    }

    let metadata = match path.metadata() {
        Ok(metadata) => metadata,
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "metadata unavailable");
            return None;
        }
    };
    if let Some(max_size) = options.max_file_size {
        if metadata.len() > max_size {
            return None;
        }
    }

    let mtime = metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);

    Some(DiscoveredFile {
        absolute_path: path.to_path_buf(),
        relative_path,
        mtime,
        size_bytes: metadata.len(),
        language: Language::from_extension(extension),
    })
}
