//! Sandboxed persistence for generated `_agent.csv` files.
//!
//! Paths are validated lexically first (no absolute paths, no `..`
//! segments, `_agent.csv` suffix) and then resolved against the canonical
//! sandbox root. Containment is checked component-wise on canonical paths,
//! so a sibling such as `data-evil/` never passes for a root named `data`.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::WriteRejection;

/// Required suffix marking automated output, compared case-insensitively.
pub const AGENT_SUFFIX: &str = "_agent.csv";

/// A file persisted under the sandbox root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    /// Normalized path relative to the sandbox root, `/`-separated.
    pub filename: String,
    /// Absolute canonical location of the written file.
    pub path: PathBuf,
}

/// Writes text files strictly inside one root directory.
#[derive(Debug, Clone)]
pub struct SandboxWriter {
    root: PathBuf,
}

impl SandboxWriter {
    /// Creates a writer for `root`. The directory must exist at write time.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validates `rel_path` and writes `content` there, overwriting any existing file.
    ///
    /// Missing intermediate directories are created.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteRejection`] for every validation or I/O failure.
    pub fn write(&self, rel_path: &str, content: &str) -> Result<WrittenFile, WriteRejection> {
        if rel_path.trim().is_empty() || content.is_empty() {
            return Err(WriteRejection::Empty);
        }

        let root = fs::canonicalize(&self.root)
            .ok()
            .filter(|p| p.is_dir())
            .ok_or_else(|| WriteRejection::RootMissing(self.root.clone()))?;
        let root_name = root.file_name().and_then(|n| n.to_str());

        let filename = normalize_relative(rel_path, root_name)?;
        let target = resolve(&root.join(&filename)).map_err(|source| WriteRejection::Io {
            path: root.join(&filename),
            source,
        })?;
        if !is_strictly_inside(&target, &root) || is_symlink(&target) {
            return Err(WriteRejection::OutsideRoot);
        }

        let parent = target.parent().ok_or(WriteRejection::InvalidPath)?;
        fs::create_dir_all(parent).map_err(|source| WriteRejection::Io {
            path: parent.to_path_buf(),
            source,
        })?;
        // Re-check after creation in case a component was swapped for a link.
        let parent_canon = fs::canonicalize(parent).map_err(|source| WriteRejection::Io {
            path: parent.to_path_buf(),
            source,
        })?;
        if !parent_canon.starts_with(&root) {
            return Err(WriteRejection::OutsideRoot);
        }

        fs::write(&target, content).map_err(|source| WriteRejection::Io {
            path: target.clone(),
            source,
        })?;

        info!(file = %filename, bytes = content.len(), "agent csv written");
        Ok(WrittenFile {
            filename,
            path: target,
        })
    }
}

/// Lexically validates and normalizes a caller-supplied relative path.
///
/// Backslashes become `/`, empty and `.` segments are dropped, and a leading
/// segment equal to `root_name` (case-insensitive) is stripped once.
///
/// # Errors
///
/// Returns the first [`WriteRejection`] that applies.
///
/// # Examples
///
/// ```
/// use es_dispatch::io::sandbox::normalize_relative;
///
/// let name = normalize_relative(r"data\output\plan_agent.csv", Some("data"));
/// assert_eq!(name.ok().as_deref(), Some("output/plan_agent.csv"));
/// assert!(normalize_relative("../plan_agent.csv", Some("data")).is_err());
/// ```
pub fn normalize_relative(
    rel_path: &str,
    root_name: Option<&str>,
) -> Result<String, WriteRejection> {
    let mut segments = relative_segments(rel_path)?;
    if let (Some(first), Some(name)) = (segments.first(), root_name) {
        if first.eq_ignore_ascii_case(name) {
            segments.remove(0);
        }
    }

    let file = segments.last().ok_or(WriteRejection::InvalidPath)?;
    let lowered = file.to_ascii_lowercase();
    if !lowered.ends_with(".csv") {
        return Err(WriteRejection::NotCsv);
    }
    if !lowered.ends_with(AGENT_SUFFIX) {
        return Err(WriteRejection::NotAgentCsv);
    }
    Ok(segments.join("/"))
}

/// Lexically checks a path that must stay below the sandbox root.
///
/// Applies the empty, absolute and `..` rules of [`normalize_relative`]
/// without any file-name rules, and returns the `/`-joined segments.
///
/// # Errors
///
/// Returns [`WriteRejection::Empty`], [`WriteRejection::Absolute`],
/// [`WriteRejection::Traversal`] or [`WriteRejection::InvalidPath`].
///
/// # Examples
///
/// ```
/// use es_dispatch::io::sandbox::confine_relative;
///
/// assert_eq!(confine_relative(r".\output\load.csv").ok().as_deref(), Some("output/load.csv"));
/// assert!(confine_relative("/etc/passwd").is_err());
/// assert!(confine_relative("output/../../x.csv").is_err());
/// ```
pub fn confine_relative(rel_path: &str) -> Result<String, WriteRejection> {
    let segments = relative_segments(rel_path)?;
    if segments.is_empty() {
        return Err(WriteRejection::InvalidPath);
    }
    Ok(segments.join("/"))
}

fn relative_segments(rel_path: &str) -> Result<Vec<String>, WriteRejection> {
    let unified = rel_path.replace('\\', "/");
    let path = unified.trim();
    if path.is_empty() {
        return Err(WriteRejection::Empty);
    }
    if path.starts_with('/') || has_drive_prefix(path) {
        return Err(WriteRejection::Absolute);
    }

    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(str::to_string)
        .collect();
    if segments.iter().any(|s| s == "..") {
        return Err(WriteRejection::Traversal);
    }
    Ok(segments)
}

/// `C:`-style prefixes.
fn has_drive_prefix(path: &str) -> bool {
    let b = path.as_bytes();
    b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':'
}

fn is_strictly_inside(path: &Path, root: &Path) -> bool {
    path != root && path.starts_with(root)
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Canonicalizes the deepest existing ancestor of `path` and re-appends the
/// components that do not exist yet.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match fs::canonicalize(existing) {
            Ok(mut base) => {
                base.extend(missing.iter().rev());
                return Ok(base);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(e);
                };
                missing.push(name);
                existing = parent;
            }
            Err(e) => return Err(e),
        }
    }
}
