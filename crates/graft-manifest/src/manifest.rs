//! Manifest records and their on-disk formats.
//!
//! A manifest is `manifest.json` or `manifest.toml` at the top of a plugin
//! directory. `node_type`, `version` and `name` are required and must be
//! non-blank; `inputs` and `outputs` are kept as opaque JSON values.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ManifestRecord {
    pub node_type: String,
    pub version: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Value>,
    /// File the record was read from.
    pub source: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    node_type: Option<String>,
    version: Option<String>,
    name: Option<String>,
    description: Option<String>,
    icon: Option<String>,
    category: Option<String>,
    author: Option<String>,
    inputs: Option<serde_json::Value>,
    outputs: Option<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

impl ManifestRecord {
    /// Read and validate the manifest at `path`, picking the format from the
    /// file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ManifestFormat::from_path(path).ok_or_else(|| Error::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let text = std::fs::read_to_string(path).map_err(|e| Error::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text, format, path)
    }

    pub fn parse(text: &str, format: ManifestFormat, path: &Path) -> Result<Self> {
        let raw: RawManifest = match format {
            ManifestFormat::Json => serde_json::from_str(text).map_err(|e| Error::Json {
                path: path.to_path_buf(),
                source: e,
            })?,
            ManifestFormat::Toml => toml::from_str(text).map_err(|e| Error::Toml {
                path: path.to_path_buf(),
                source: e,
            })?,
        };

        let required = |value: Option<String>, field: &'static str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::MissingField {
                    path: path.to_path_buf(),
                    field,
                })
        };

        Ok(Self {
            node_type: required(raw.node_type, "node_type")?,
            version: required(raw.version, "version")?,
            name: required(raw.name, "name")?,
            description: raw.description,
            icon: raw.icon,
            category: raw.category,
            author: raw.author,
            inputs: raw.inputs,
            outputs: raw.outputs,
            source: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json() {
        let text = r#"{
            "node_type": "weather",
            "version": "0.2.0",
            "name": "Weather lookup",
            "category": "tools",
            "inputs": {"city": {"type": "string", "required": true}}
        }"#;
        let record = ManifestRecord::parse(text, ManifestFormat::Json, Path::new("m.json")).unwrap();
        assert_eq!(record.node_type, "weather");
        assert_eq!(record.category.as_deref(), Some("tools"));
        assert_eq!(record.inputs.unwrap()["city"]["type"], "string");
        assert!(record.outputs.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
node_type = "weather"
version = "0.2.0"
name = "Weather lookup"

[outputs.forecast]
type = "string"
"#;
        let record = ManifestRecord::parse(text, ManifestFormat::Toml, Path::new("m.toml")).unwrap();
        assert_eq!(record.name, "Weather lookup");
        assert_eq!(record.outputs.unwrap()["forecast"]["type"], "string");
    }

    #[test]
    fn test_blank_required_field() {
        let text = r#"{"node_type": "  ", "version": "1", "name": "x"}"#;
        let err = ManifestRecord::parse(text, ManifestFormat::Json, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "node_type", .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let text = r#"{"node_type": "a", "name": "x"}"#;
        let err = ManifestRecord::parse(text, ManifestFormat::Json, Path::new("m.json")).unwrap_err();
        assert!(matches!(err, Error::MissingField { field: "version", .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a/manifest.json")), Some(ManifestFormat::Json));
        assert_eq!(ManifestFormat::from_path(Path::new("a/manifest.yaml")), None);
    }
}
