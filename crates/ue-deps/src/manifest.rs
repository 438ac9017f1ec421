//! `package.json` reading and package merging.

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::{debug, warn};
use ue_core::PackageInfo;

use crate::error::DepsError;

/// The dependency sections of a `package.json`.
///
/// Every other key is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    /// Workspace package name, if declared.
    #[serde(default)]
    pub name: Option<String>,
    /// Production dependencies.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Development dependencies.
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Parses manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Manifest`] if the text is not a JSON object with
    /// string-valued dependency maps.
    pub fn parse(text: &str, path: &Utf8Path) -> Result<Self, DepsError> {
        serde_json::from_str(text).map_err(|source| DepsError::manifest(path, source))
    }

    /// Reads and parses a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`DepsError::Read`] if the file cannot be read, otherwise the
    /// errors of [`parse`](Self::parse).
    pub fn load(path: &Utf8Path) -> Result<Self, DepsError> {
        let text = std::fs::read_to_string(path).map_err(|source| DepsError::read(path, source))?;
        Self::parse(&text, path)
    }

    /// Number of declared packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len() + self.dev_dependencies.len()
    }

    /// Returns `true` if the manifest declares no packages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Loads every manifest, skipping (and logging) the ones that fail.
///
/// Returns the manifests that loaded along with their paths.
pub fn load_manifests(paths: &[Utf8PathBuf]) -> Vec<(Utf8PathBuf, PackageManifest)> {
    paths
        .iter()
        .filter_map(|path| match PackageManifest::load(path) {
            Ok(manifest) => {
                debug!(path = %path, packages = manifest.len(), "Loaded manifest");
                Some((path.clone(), manifest))
            }
            Err(err) => {
                warn!(path = %path, error = %err, "Skipping manifest");
                None
            }
        })
        .collect()
}

/// Merges manifests into one package list sorted by name.
///
/// A package listed more than once keeps the first version seen. A package
/// that is a production dependency anywhere is a production package.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use ue_deps::{merge_packages, PackageManifest};
///
/// let web = PackageManifest::parse(
///     r#"{"dependencies": {"zod": "^3.22.0"}, "devDependencies": {"vitest": "^1.0.0"}}"#,
///     Utf8Path::new("apps/web/package.json"),
/// )?;
/// let api = PackageManifest::parse(
///     r#"{"dependencies": {"vitest": "^1.2.0"}}"#,
///     Utf8Path::new("apps/api/package.json"),
/// )?;
///
/// let packages = merge_packages([&web, &api]);
/// assert_eq!(packages.len(), 2);
/// assert_eq!(packages[0].name, "vitest");
/// assert!(!packages[0].dev);
/// assert_eq!(packages[0].version, "^1.0.0");
/// # Ok::<(), ue_deps::DepsError>(())
/// ```
pub fn merge_packages<'a>(manifests: impl IntoIterator<Item = &'a PackageManifest>) -> Vec<PackageInfo> {
    let mut merged: BTreeMap<&str, PackageInfo> = BTreeMap::new();

    for manifest in manifests {
        let declared = manifest
            .dependencies
            .iter()
            .map(|(name, version)| (name, version, false))
            .chain(
                manifest
                    .dev_dependencies
                    .iter()
                    .map(|(name, version)| (name, version, true)),
            );

        for (name, version, dev) in declared {
            merged
                .entry(name.as_str())
                .and_modify(|existing| {
                    if existing.dev && !dev {
                        *existing = PackageInfo::new(name.as_str(), existing.version.as_str(), false);
                    }
                })
                .or_insert_with(|| PackageInfo::new(name.as_str(), version.as_str(), dev));
        }
    }

    merged.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_other_keys() {
        let manifest = PackageManifest::parse(
            r#"{
                "name": "union-eyes",
                "private": true,
                "scripts": {"dev": "next dev"},
                "dependencies": {"next": "14.2.3", "drizzle-orm": "^0.30.0"},
                "devDependencies": {"drizzle-kit": "^0.20.0"}
            }"#,
            Utf8Path::new("package.json"),
        )
        .unwrap();

        assert_eq!(manifest.name.as_deref(), Some("union-eyes"));
        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.dev_dependencies["drizzle-kit"], "^0.20.0");
    }

    #[test]
    fn test_parse_empty_object() {
        let manifest = PackageManifest::parse("{}", Utf8Path::new("package.json")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = PackageManifest::parse("{\"dependencies\": [1]}", Utf8Path::new("pkg/package.json"))
            .unwrap_err();
        assert!(matches!(err, DepsError::Manifest { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_merge_production_wins() {
        let mut root = PackageManifest::default();
        root.dev_dependencies.insert("zod".to_owned(), "^3.0.0".to_owned());
        let mut app = PackageManifest::default();
        app.dependencies.insert("zod".to_owned(), "^3.1.0".to_owned());
        app.dependencies.insert("axios".to_owned(), "^1.6.0".to_owned());

        let packages = merge_packages([&root, &app]);
        let names: Vec<_> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["axios", "zod"]);
        assert!(!packages[1].dev);
        assert_eq!(packages[1].version, "^3.0.0");
    }

    #[test]
    fn test_load_manifests_skips_broken() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let good = root.join("good.json");
        let bad = root.join("bad.json");
        std::fs::write(&good, r#"{"dependencies": {"stripe": "^14.0.0"}}"#).unwrap();
        std::fs::write(&bad, "not json").unwrap();

        let loaded = load_manifests(&[good.clone(), bad, root.join("missing.json")]);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, good);
    }
}
