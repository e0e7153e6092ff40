//! Module descriptor parsing from `package.json`.
//!
//! The package name encodes the registry coordinates as
//! `<prefix>-<provider>-<name...>`: the prefix is a fixed namespace and is
//! dropped, the second segment is the provider, and everything after it is
//! the module name.

use crate::error::ManifestError;
use serde::Deserialize;
use std::path::Path;

/// Manifest file looked up in the module directory
pub const MANIFEST_FILE: &str = "package.json";

/// Registry coordinates of the module being deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    /// Registry organization (from configuration, not the manifest)
    pub organization: String,
    /// Terraform provider, e.g. `aws`
    pub provider: String,
    /// Module name, may contain hyphens
    pub name: String,
    /// Version string, compared verbatim
    pub version: String,
    /// Package name as written in the manifest
    pub package: String,
}

/// Composite key of a registry module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleId {
    /// Registry organization
    pub organization: String,
    /// Module name
    pub name: String,
    /// Terraform provider
    pub provider: String,
}

impl ModuleDescriptor {
    /// Registry key of this module, without the version
    pub fn module_id(&self) -> ModuleId {
        ModuleId {
            organization: self.organization.clone(),
            name: self.name.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.organization, self.name, self.provider)
    }
}

#[derive(Deserialize)]
struct RawManifest {
    name: Option<serde_json::Value>,
    version: Option<serde_json::Value>,
}

/// Load the module descriptor from `<dir>/package.json`
pub fn load_descriptor(dir: &Path, organization: &str) -> Result<ModuleDescriptor, ManifestError> {
    let path = dir.join(MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;

    let raw: RawManifest =
        serde_json::from_str(&content).map_err(|source| ManifestError::Malformed {
            path: path.clone(),
            source,
        })?;

    let package = string_field(raw.name, "name", &path)?;
    let version = string_field(raw.version, "version", &path)?;
    let (provider, name) = parse_module_name(&package)?;

    if semver::Version::parse(&version).is_err() {
        log::warn!(
            "Version '{}' in {} is not valid SemVer; the registry may reject it",
            version,
            path.display()
        );
    }

    Ok(ModuleDescriptor {
        organization: organization.to_string(),
        provider,
        name,
        version,
        package,
    })
}

fn string_field(
    value: Option<serde_json::Value>,
    field: &'static str,
    path: &Path,
) -> Result<String, ManifestError> {
    match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Ok(s),
        _ => Err(ManifestError::MissingField {
            path: path.to_path_buf(),
            field,
        }),
    }
}

/// Split a package name into `(provider, module name)`
pub fn parse_module_name(package: &str) -> Result<(String, String), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidName {
        name: package.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = package.split('-');
    // Namespace prefix, always discarded.
    segments.next();

    let provider = segments
        .next()
        .ok_or_else(|| invalid("expected '<prefix>-<provider>-<name>'"))?;
    if provider.is_empty() {
        return Err(invalid("provider segment is empty"));
    }

    let name = segments.collect::<Vec<_>>().join("-");
    if name.is_empty() {
        return Err(invalid("module name is empty"));
    }

    Ok((provider.to_string(), name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_manifest(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(MANIFEST_FILE), contents).expect("write manifest");
        dir
    }

    #[test]
    fn test_parse_simple_name() {
        let (provider, name) = parse_module_name("tfm-aws-vpc").unwrap();
        assert_eq!(provider, "aws");
        assert_eq!(name, "vpc");
    }

    #[test]
    fn test_parse_rejoins_hyphenated_name() {
        let (provider, name) = parse_module_name("tfm-azurerm-app-service-plan").unwrap();
        assert_eq!(provider, "azurerm");
        assert_eq!(name, "app-service-plan");
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(matches!(
            parse_module_name("tfm-aws"),
            Err(ManifestError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_single_segment() {
        assert!(parse_module_name("vpc").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_provider() {
        assert!(parse_module_name("tfm--vpc").is_err());
    }

    #[test]
    fn test_parse_rejects_trailing_hyphen_only() {
        assert!(parse_module_name("tfm-aws-").is_err());
    }

    #[test]
    fn test_load_descriptor() {
        let dir = write_manifest(r#"{"name": "tfm-aws-vpc", "version": "1.2.0"}"#);
        let descriptor = load_descriptor(dir.path(), "acme").unwrap();

        assert_eq!(
            descriptor,
            ModuleDescriptor {
                organization: "acme".to_string(),
                provider: "aws".to_string(),
                name: "vpc".to_string(),
                version: "1.2.0".to_string(),
                package: "tfm-aws-vpc".to_string(),
            }
        );
        assert_eq!(descriptor.module_id().to_string(), "acme/vpc/aws");
    }

    #[test]
    fn test_load_descriptor_keeps_non_semver_version() {
        let dir = write_manifest(r#"{"name": "tfm-aws-vpc", "version": "latest"}"#);
        let descriptor = load_descriptor(dir.path(), "acme").unwrap();
        assert_eq!(descriptor.version, "latest");
    }

    #[test]
    fn test_load_descriptor_keeps_version_verbatim() {
        let dir = write_manifest(r#"{"name": "tfm-aws-vpc", "version": " 1.2.0"}"#);
        let descriptor = load_descriptor(dir.path(), "acme").unwrap();
        assert_eq!(descriptor.version, " 1.2.0");
    }

    #[test]
    fn test_load_descriptor_blank_version() {
        let dir = write_manifest(r#"{"name": "tfm-aws-vpc", "version": "   "}"#);
        assert!(matches!(
            load_descriptor(dir.path(), "acme"),
            Err(ManifestError::MissingField { field: "version", .. })
        ));
    }

    #[test]
    fn test_load_descriptor_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_descriptor(dir.path(), "acme"),
            Err(ManifestError::Read { .. })
        ));
    }

    #[test]
    fn test_load_descriptor_malformed_json() {
        let dir = write_manifest("{ name: tfm-aws-vpc");
        assert!(matches!(
            load_descriptor(dir.path(), "acme"),
            Err(ManifestError::Malformed { .. })
        ));
    }

    #[test]
    fn test_load_descriptor_missing_version() {
        let dir = write_manifest(r#"{"name": "tfm-aws-vpc"}"#);
        assert!(matches!(
            load_descriptor(dir.path(), "acme"),
            Err(ManifestError::MissingField { field: "version", .. })
        ));
    }

    #[test]
    fn test_load_descriptor_non_string_name() {
        let dir = write_manifest(r#"{"name": 42, "version": "1.0.0"}"#);
        assert!(matches!(
            load_descriptor(dir.path(), "acme"),
            Err(ManifestError::MissingField { field: "name", .. })
        ));
    }
}
