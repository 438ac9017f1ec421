//! Directory traversal for manifests and source files.
//!
//! [`FileWalker`] wraps the `ignore` crate so `.gitignore` patterns and hidden
//! files are honored, then filters by extension or file name.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use ue_deps::FileWalker;
//!
//! let walker = FileWalker::new(Utf8Path::new("./apps/web"))?
//!     .with_extensions(&["ts", "tsx"]);
//! let sources = walker.collect_sources()?;
//! let manifests = walker.collect_manifests()?;
//! # Ok::<(), ue_deps::DepsError>(())
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use ignore::WalkBuilder;

use crate::error::DepsError;

/// Directories never scanned.
const SKIP_DIRECTORIES: &[&str] = &[
    "node_modules",
    "dist",
    "build",
    ".git",
    "coverage",
    "__pycache__",
    ".turbo",
    ".next",
    ".vercel",
    "out",
];

/// Manifest file name.
pub const MANIFEST_FILE: &str = "package.json";

/// Extensions scanned when none are configured.
const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Discovers manifests and source files under a root directory.
///
/// Paths are collected single-threaded and sorted; callers parallelize the
/// per-file work afterwards.
#[derive(Debug)]
pub struct FileWalker {
    root: Utf8PathBuf,
    skip_dirs: Vec<String>,
    extensions: Vec<String>,
    follow_links: bool,
}

impl FileWalker {
    /// Creates a walker for the given root directory.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Config`] if the root doesn't exist or isn't a
    /// directory.
    pub fn new(root: &Utf8Path) -> Result<Self, DepsError> {
        if !root.exists() {
            return Err(DepsError::config(format!("root path does not exist: {root}")));
        }
        if !root.is_dir() {
            return Err(DepsError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            skip_dirs: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect(),
            follow_links: false,
        })
    }

    /// Adds directory names to skip, on top of the built-in list.
    #[must_use]
    pub fn with_skip_dirs<S: AsRef<str>>(mut self, dirs: &[S]) -> Self {
        self.skip_dirs
            .extend(dirs.iter().map(|d| d.as_ref().to_owned()));
        self
    }

    /// Replaces the source extensions (without the leading dot).
    ///
    /// An empty list keeps the defaults.
    #[must_use]
    pub fn with_extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        if !extensions.is_empty() {
            self.extensions = extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_owned())
                .collect();
        }
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Collects every source file with a configured extension.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Walk`] if traversal fails and
    /// [`DepsError::NonUtf8Path`] for a non-UTF-8 path.
    pub fn collect_sources(&self) -> Result<Vec<Utf8PathBuf>, DepsError> {
        self.collect(|path| self.is_source_file(path))
    }

    /// Collects every `package.json` in the tree (monorepo workspaces included).
    ///
    /// # Errors
    ///
    /// Same as [`collect_sources`](Self::collect_sources).
    pub fn collect_manifests(&self) -> Result<Vec<Utf8PathBuf>, DepsError> {
        self.collect(|path| path.file_name() == Some(MANIFEST_FILE))
    }

    fn collect(&self, keep: impl Fn(&Utf8Path) -> bool) -> Result<Vec<Utf8PathBuf>, DepsError> {
        let mut paths = Vec::new();

        for result in self.build_walker() {
            let entry = result?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let utf8_path =
                Utf8Path::from_path(path).ok_or_else(|| DepsError::NonUtf8Path(path.to_owned()))?;

            if !keep(utf8_path) || self.should_skip_path(utf8_path) {
                continue;
            }
            paths.push(utf8_path.to_owned());
        }

        paths.sort();
        Ok(paths)
    }

    fn build_walker(&self) -> ignore::Walk {
        WalkBuilder::new(&self.root)
            .standard_filters(true)
            .follow_links(self.follow_links)
            .threads(1)
            .require_git(false)
            .build()
    }

    fn is_source_file(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Checks path components below the root against the skip lists.
    fn should_skip_path(&self, path: &Utf8Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative.components().any(|component| {
            let name = component.as_str();
            SKIP_DIRECTORIES.contains(&name) || self.skip_dirs.iter().any(|d| d == name)
        })
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}
