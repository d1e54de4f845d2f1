//! Parsing many files at once.
//!
//! Every file gets its own lexer, parser and tree, so workers share nothing
//! but the read-only limits.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use log::{debug, info};
use walkdir::WalkDir;

use crate::Error;
use crate::ast::Ast;
use crate::limits::ParseLimits;
use crate::parser;

pub const SOURCE_EXTENSION: &str = "golo";

/// Outcome of parsing one file
#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub result: Result<Ast, Error>,
}

impl FileResult {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Recursively find `.golo` files under `root`, sorted by path
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| Error::Walk {
            path: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    debug!("discovered {} source files under {}", files.len(), root.display());
    Ok(files)
}

/// Read and parse a single file
pub fn parse_file(path: &Path, limits: &ParseLimits) -> Result<Ast, Error> {
    let source = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parser::parse_source_with_limits(&source, limits).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `paths` on up to `jobs` threads; results come back in input order.
///
/// Workers get a stack large enough for `limits.max_nesting_depth`, so a
/// deeply nested file fails with `RecursionLimitExceeded` instead of
/// overflowing the thread.
pub fn parse_files(
    paths: &[PathBuf],
    limits: &ParseLimits,
    jobs: usize,
) -> Result<Vec<FileResult>, Error> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let jobs = jobs.clamp(1, paths.len());
    let chunk_size = paths.len().div_ceil(jobs);
    let stack_size = limits.stack_size();
    info!(
        "parsing {} files on {} threads ({} KiB stack each)",
        paths.len(),
        jobs,
        stack_size / 1024
    );

    thread::scope(|scope| -> Result<Vec<FileResult>, Error> {
        let mut workers = Vec::with_capacity(jobs);
        for (index, chunk) in paths.chunks(chunk_size).enumerate() {
            let worker = thread::Builder::new()
                .name(format!("golo-parser-{}", index))
                .stack_size(stack_size)
                .spawn_scoped(scope, move || parse_chunk(chunk, limits))
                .map_err(Error::Spawn)?;
            workers.push(worker);
        }

        let mut results = Vec::with_capacity(paths.len());
        for worker in workers {
            match worker.join() {
                Ok(chunk) => results.extend(chunk),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(results)
    })
}

fn parse_chunk(chunk: &[PathBuf], limits: &ParseLimits) -> Vec<FileResult> {
    chunk
        .iter()
        .map(|path| {
            let result = parse_file(path, limits);
            debug!("{}: {}", path.display(), if result.is_ok() { "ok" } else { "failed" });
            FileResult {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Worker count when none is configured
pub fn default_jobs() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}
