//! Request and response payloads for the registry APIs.
//!
//! The management API speaks JSON:API (`{"data": {...}}` documents); the
//! lookup API returns flat module records.

use crate::metadata::ModuleId;
use serde::{Deserialize, Serialize};

/// A module registered in the private registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryModule {
    /// Registry id, when the response carried one
    pub id: Option<String>,
    /// Module name
    pub name: String,
    /// Terraform provider
    pub provider: String,
    /// Registry-side status, e.g. `pending` or `setup_complete`
    pub status: Option<String>,
}

/// One version record of a registry module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersion {
    /// Registry id, when the response carried one
    pub id: Option<String>,
    /// Version string
    pub version: String,
    /// Registry-side status, e.g. `pending` or `ok`
    pub status: Option<String>,
    /// Pre-signed archive upload URL (create responses only)
    pub upload_url: Option<String>,
}

#[derive(Serialize)]
pub(super) struct NewDocument<A> {
    data: NewResource<A>,
}

#[derive(Serialize)]
struct NewResource<A> {
    #[serde(rename = "type")]
    kind: &'static str,
    attributes: A,
}

#[derive(Serialize)]
pub(super) struct NewModuleAttributes<'a> {
    name: &'a str,
    provider: &'a str,
}

#[derive(Serialize)]
pub(super) struct NewVersionAttributes<'a> {
    version: &'a str,
}

/// Body of `POST /organizations/{org}/registry-modules`
pub(super) fn create_module_body(id: &ModuleId) -> NewDocument<NewModuleAttributes<'_>> {
    NewDocument {
        data: NewResource {
            kind: "registry-modules",
            attributes: NewModuleAttributes {
                name: &id.name,
                provider: &id.provider,
            },
        },
    }
}

/// Body of `POST /registry-modules/{org}/{name}/{provider}/versions`
pub(super) fn create_version_body(version: &str) -> NewDocument<NewVersionAttributes<'_>> {
    NewDocument {
        data: NewResource {
            kind: "registry-module-versions",
            attributes: NewVersionAttributes { version },
        },
    }
}

#[derive(Deserialize)]
pub(super) struct Document<A> {
    data: Resource<A>,
}

#[derive(Deserialize)]
struct Resource<A> {
    id: Option<String>,
    attributes: A,
    #[serde(default)]
    links: Links,
}

#[derive(Deserialize, Default)]
struct Links {
    upload: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct ModuleAttributes {
    name: String,
    provider: String,
    status: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct VersionAttributes {
    version: String,
    status: Option<String>,
}

impl Document<ModuleAttributes> {
    pub(super) fn into_module(self) -> RegistryModule {
        RegistryModule {
            id: self.data.id,
            name: self.data.attributes.name,
            provider: self.data.attributes.provider,
            status: self.data.attributes.status,
        }
    }
}

impl Document<VersionAttributes> {
    pub(super) fn into_version(self) -> ModuleVersion {
        ModuleVersion {
            id: self.data.id,
            version: self.data.attributes.version,
            status: self.data.attributes.status,
            upload_url: self.data.links.upload,
        }
    }
}

/// Flat record returned by the lookup API
#[derive(Deserialize, Default)]
pub(super) struct LookupRecord {
    id: Option<String>,
    name: Option<String>,
    provider: Option<String>,
    version: Option<String>,
    status: Option<String>,
}

impl LookupRecord {
    pub(super) fn into_module(self, id: &ModuleId) -> RegistryModule {
        RegistryModule {
            id: self.id,
            name: self.name.unwrap_or_else(|| id.name.clone()),
            provider: self.provider.unwrap_or_else(|| id.provider.clone()),
            status: self.status,
        }
    }

    pub(super) fn into_version(self, version: &str) -> ModuleVersion {
        ModuleVersion {
            id: self.id,
            version: self.version.unwrap_or_else(|| version.to_string()),
            status: self.status,
            upload_url: None,
        }
    }
}

/// First human-readable message from an error body.
///
/// Handles JSON:API `{"errors": [{"title", "detail"}]}` as well as the
/// lookup API's `{"errors": ["Not Found"]}`.
pub(super) fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let first = value.get("errors")?.as_array()?.first()?;

    match first {
        serde_json::Value::String(message) => Some(message.clone()),
        serde_json::Value::Object(error) => {
            let title = error.get("title").and_then(|v| v.as_str());
            let detail = error.get("detail").and_then(|v| v.as_str());
            match (title, detail) {
                (Some(title), Some(detail)) => Some(format!("{title}: {detail}")),
                (Some(text), None) | (None, Some(text)) => Some(text.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_id() -> ModuleId {
        ModuleId {
            organization: "acme".to_string(),
            name: "vpc".to_string(),
            provider: "aws".to_string(),
        }
    }

    #[test]
    fn test_create_module_body_shape() {
        let body = serde_json::to_value(create_module_body(&module_id())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "data": {
                    "type": "registry-modules",
                    "attributes": { "name": "vpc", "provider": "aws" }
                }
            })
        );
    }

    #[test]
    fn test_create_version_body_shape() {
        let body = serde_json::to_value(create_version_body("1.2.0")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "data": {
                    "type": "registry-module-versions",
                    "attributes": { "version": "1.2.0" }
                }
            })
        );
    }

    #[test]
    fn test_version_document_exposes_upload_link() {
        let doc: Document<VersionAttributes> = serde_json::from_str(
            r#"{
                "data": {
                    "id": "modver-1",
                    "type": "registry-module-versions",
                    "attributes": { "version": "1.2.0", "status": "pending" },
                    "links": { "upload": "https://archivist.example/v1/object/abc" }
                }
            }"#,
        )
        .unwrap();
        let version = doc.into_version();
        assert_eq!(version.id.as_deref(), Some("modver-1"));
        assert_eq!(
            version.upload_url.as_deref(),
            Some("https://archivist.example/v1/object/abc")
        );
    }

    #[test]
    fn test_module_document_without_links() {
        let doc: Document<ModuleAttributes> = serde_json::from_str(
            r#"{"data": {"id": "mod-1", "attributes": {"name": "vpc", "provider": "aws", "status": "pending"}}}"#,
        )
        .unwrap();
        let module = doc.into_module();
        assert_eq!(module.name, "vpc");
        assert_eq!(module.status.as_deref(), Some("pending"));
    }

    #[test]
    fn test_lookup_record_falls_back_to_key() {
        let module = LookupRecord::default().into_module(&module_id());
        assert_eq!(module.name, "vpc");
        assert_eq!(module.provider, "aws");
    }

    #[test]
    fn test_error_detail_json_api() {
        let body = br#"{"errors": [{"status": "422", "title": "invalid attribute", "detail": "Version has already been taken"}]}"#;
        assert_eq!(
            error_detail(body).as_deref(),
            Some("invalid attribute: Version has already been taken")
        );
    }

    #[test]
    fn test_error_detail_plain_strings() {
        assert_eq!(
            error_detail(br#"{"errors": ["Not Found"]}"#).as_deref(),
            Some("Not Found")
        );
    }

    #[test]
    fn test_error_detail_garbage() {
        assert_eq!(error_detail(b"<html>bad gateway</html>"), None);
    }
}
