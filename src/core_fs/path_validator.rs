use crate::core_error::FtpError;
use log::{error, warn};
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Confines client-supplied paths to the server root.
///
/// Resolution is done in two passes: a lexical pass that folds `.` and `..`
/// (refusing to climb above the root), then a filesystem pass that
/// canonicalizes the deepest existing ancestor so symlinks pointing outside
/// the root are caught as well.
#[derive(Debug, Clone)]
pub struct PathValidator {
    root: PathBuf,
}

impl PathValidator {
    /// The root must exist; it is stored canonicalized.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `input` against `cwd`. A leading `/` anchors the input at the root.
    pub fn resolve(&self, cwd: &Path, input: &str) -> Result<PathBuf, FtpError> {
        let base = if input.starts_with('/') {
            self.root.as_path()
        } else {
            cwd
        };
        let relative_base = base
            .strip_prefix(&self.root)
            .map_err(|_| self.escape(input))?;

        let mut segments: Vec<OsString> = Vec::new();
        for component in relative_base.components().chain(Path::new(input).components()) {
            match component {
                Component::Normal(segment) => segments.push(segment.to_os_string()),
                Component::ParentDir => {
                    if segments.pop().is_none() {
                        return Err(self.escape(input));
                    }
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let candidate = segments
            .iter()
            .fold(self.root.clone(), |path, segment| path.join(segment));
        self.confine(candidate, input)
    }

    /// `resolve` on tokio's blocking pool, for callers on the runtime.
    pub async fn resolve_async(&self, cwd: &Path, input: &str) -> Result<PathBuf, FtpError> {
        let validator = self.clone();
        let cwd = cwd.to_path_buf();
        let owned = input.to_string();
        match tokio::task::spawn_blocking(move || validator.resolve(&cwd, &owned)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("Path resolution task failed for {}: {}", input, e);
                Err(FtpError::PathEscape(input.to_string()))
            }
        }
    }

    /// Canonicalizes the longest existing prefix of `candidate` and re-checks
    /// containment; the missing tail (e.g. a STOR target) is appended as-is.
    fn confine(&self, candidate: PathBuf, input: &str) -> Result<PathBuf, FtpError> {
        let mut existing = candidate.as_path();
        let mut missing: Vec<OsString> = Vec::new();

        let resolved = loop {
            match existing.canonicalize() {
                Ok(real) => break real,
                Err(_) => {
                    // A dangling symlink would be followed on create.
                    if existing.symlink_metadata().is_ok() {
                        return Err(self.escape(input));
                    }
                    match (existing.parent(), existing.file_name()) {
                        (Some(parent), Some(name)) => {
                            missing.push(name.to_os_string());
                            existing = parent;
                        }
                        _ => return Err(self.escape(input)),
                    }
                }
            }
        };

        if !resolved.starts_with(&self.root) {
            return Err(self.escape(input));
        }

        Ok(missing
            .iter()
            .rev()
            .fold(resolved, |path, segment| path.join(segment)))
    }

    fn escape(&self, input: &str) -> FtpError {
        warn!("Rejected path outside of {:?}: {}", self.root, input);
        FtpError::PathEscape(input.to_string())
    }
}
