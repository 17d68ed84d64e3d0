//! Reading the project's current version from its package manifest

use crate::error::{AnnounceError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest formats the current version can be read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    /// npm `package.json`
    PackageJson,
    /// Cargo `Cargo.toml`, `[package]` or `[workspace.package]`
    CargoToml,
}

impl ManifestKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::CargoToml => "Cargo.toml",
        }
    }
}

/// The manifest found in a project root and the version it declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub kind: ManifestKind,
    pub path: PathBuf,
    pub version: String,
}

impl Manifest {
    /// Find and read the manifest in `root`; `package.json` wins over
    /// `Cargo.toml` when both exist.
    pub fn discover(root: &Path) -> Result<Self> {
        for kind in [ManifestKind::PackageJson, ManifestKind::CargoToml] {
            let path = root.join(kind.file_name());
            if path.is_file() {
                return Self::read(kind, path);
            }
        }

        Err(AnnounceError::manifest(format!(
            "no package.json or Cargo.toml in {}",
            root.display()
        )))
    }

    pub fn read(kind: ManifestKind, path: PathBuf) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let version = match kind {
            ManifestKind::PackageJson => version_from_package_json(&content)?,
            ManifestKind::CargoToml => version_from_cargo_toml(&content)?,
        };

        let version = version.ok_or_else(|| {
            AnnounceError::InvalidCurrentVersion(format!(
                "{} doesn't contain a version field",
                path.display()
            ))
        })?;

        Ok(Manifest {
            kind,
            path,
            version,
        })
    }
}

fn version_from_package_json(content: &str) -> Result<Option<String>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    Ok(value
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

fn version_from_cargo_toml(content: &str) -> Result<Option<String>> {
    let value: toml::Value = toml::from_str(content)
        .map_err(|e| AnnounceError::manifest(format!("invalid Cargo.toml: {}", e)))?;

    let package_version = value
        .get("package")
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str());
    let workspace_version = value
        .get("workspace")
        .and_then(|w| w.get("package"))
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str());

    Ok(package_version.or(workspace_version).map(str::to_string))
}

/// Version declared by the manifest in `root`
pub fn read_current_version(root: &Path) -> Result<String> {
    Ok(Manifest::discover(root)?.version)
}
