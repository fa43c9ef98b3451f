use crate::{Error, ManifestRecord, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Manifest records keyed by node type.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    records: BTreeMap<String, ManifestRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a full scan.
    ///
    /// Any node type declared twice fails the whole build, so neither
    /// declaration is ever registered.
    pub fn from_records(records: Vec<ManifestRecord>) -> Result<Self> {
        let mut registry = Self::new();
        for record in records {
            registry.register(record)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, record: ManifestRecord) -> Result<()> {
        if let Some(existing) = self.records.get(&record.node_type) {
            return Err(Error::DuplicateNodeType {
                node_type: record.node_type.clone(),
                first: existing.source.clone(),
                second: record.source,
            });
        }
        self.records.insert(record.node_type.clone(), record);
        Ok(())
    }

    pub fn get(&self, node_type: &str) -> Option<&ManifestRecord> {
        self.records.get(node_type)
    }

    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(node_type: &str, source: &str) -> ManifestRecord {
        ManifestRecord {
            node_type: node_type.into(),
            version: "1.0.0".into(),
            name: node_type.to_uppercase(),
            description: None,
            icon: None,
            category: None,
            author: None,
            inputs: None,
            outputs: None,
            source: PathBuf::from(source),
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry =
            Registry::from_records(vec![record("b", "b/manifest.json"), record("a", "a/manifest.json")])
                .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.node_types().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(registry.get("a").unwrap().name, "A");
    }

    #[test]
    fn test_duplicate_fails_whole_build() {
        let err = Registry::from_records(vec![
            record("a", "one/manifest.json"),
            record("a", "two/manifest.json"),
        ])
        .unwrap_err();
        match err {
            Error::DuplicateNodeType { node_type, first, second } => {
                assert_eq!(node_type, "a");
                assert_eq!(first, PathBuf::from("one/manifest.json"));
                assert_eq!(second, PathBuf::from("two/manifest.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
