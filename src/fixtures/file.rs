use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::{ContractRecord, Sampling};

/// On-disk fixture document.
///
/// ```yaml
/// bene_ids: ["-10000010254618", "-10000010254619"]
/// contract_data:
///   - { id: "Z0012", year: "2021" }
/// hashed_mbis: ["7c9a..."]
/// ```
///
/// Missing keys are treated as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureDocument {
    pub bene_ids: Vec<String>,
    pub contract_data: Vec<ContractRecord>,
    pub hashed_mbis: Vec<String>,
}

/// Fixtures read from a JSON or YAML file instead of the database.
pub struct FileSource {
    document: FixtureDocument,
}

impl FileSource {
    /// Read and parse `path`; `.yaml`/`.yml` is parsed as YAML, anything else
    /// as JSON.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file {}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let document: FixtureDocument = if is_yaml {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML fixture file {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON fixture file {}", path.display()))?
        };
        Ok(Self { document })
    }

    pub fn from_document(document: FixtureDocument) -> Self {
        Self { document }
    }

    pub fn bene_ids(&self, sampling: &Sampling) -> Vec<String> {
        let mut items = self.document.bene_ids.clone();
        sampling.truncate(&mut items);
        items
    }

    pub fn contract_ids(&self, sampling: &Sampling) -> Vec<ContractRecord> {
        let mut items = self.document.contract_data.clone();
        sampling.truncate(&mut items);
        items
    }

    pub fn hashed_mbis(&self, sampling: &Sampling) -> Vec<String> {
        let mut items = self.document.hashed_mbis.clone();
        sampling.truncate(&mut items);
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_open_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"bene_ids": ["-1", "-2", "-3"], "contract_data": [{{"id": "Z0012", "year": "2021"}}]}}"#
        )
        .unwrap();

        let source = FileSource::open(file.path()).unwrap();
        let sampling = Sampling {
            table_sample_percent: None,
            limit: Some(2),
        };
        assert_eq!(source.bene_ids(&sampling), vec!["-1", "-2"]);
        assert_eq!(
            source.contract_ids(&sampling),
            vec![ContractRecord {
                id: "Z0012".into(),
                year: "2021".into()
            }]
        );
        assert!(source.hashed_mbis(&sampling).is_empty());
    }

    #[test]
    fn test_open_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "hashed_mbis:\n  - abc\n  - def").unwrap();

        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.hashed_mbis(&Sampling::full()), vec!["abc", "def"]);
        assert!(source.bene_ids(&Sampling::full()).is_empty());
    }

    #[test]
    fn test_open_rejects_garbage() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "not json").unwrap();
        let err = FileSource::open(file.path()).err().unwrap();
        assert!(err.to_string().contains("Invalid JSON fixture file"));
    }
}
