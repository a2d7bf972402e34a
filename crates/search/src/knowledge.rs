use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_ALTERNATIVES: &str = include_str!("../data/alternatives.json");
const SUPPORTED_SCHEMA_VERSION: u32 = 1;

/// Substitutes and caveats for a symbol known to be missing in some trees
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternativeEntry {
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawKnowledgeBase {
    schema_version: u32,
    #[serde(default)]
    entries: HashMap<String, AlternativeEntry>,
}

/// Static lookup table keyed by exact symbol name
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, AlternativeEntry>,
}

impl KnowledgeBase {
    /// Table shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_ALTERNATIVES)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: RawKnowledgeBase = serde_json::from_str(raw)
            .map_err(|err| SearchError::KnowledgeBase(err.to_string()))?;
        if parsed.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(SearchError::KnowledgeBase(format!(
                "schema_version {} is not supported (expected {SUPPORTED_SCHEMA_VERSION})",
                parsed.schema_version
            )));
        }
        Ok(Self {
            entries: parsed.entries,
        })
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            SearchError::KnowledgeBase(format!("{}: {err}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    /// Entries from `other` replace same-named entries here
    pub fn extend(&mut self, other: KnowledgeBase) {
        self.entries.extend(other.entries);
    }

    pub fn lookup(&self, name: &str) -> Option<&AlternativeEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_table_has_heart_rate_entry() {
        let kb = KnowledgeBase::builtin().unwrap();
        let entry = kb.lookup("BT_HRS").expect("BT_HRS entry");
        assert!(entry.warning.is_some());
        assert!(!entry.alternatives.is_empty());
        assert!(kb.lookup("bt_hrs").is_none());
    }

    #[test]
    fn user_table_overrides_builtin() {
        let mut kb = KnowledgeBase::builtin().unwrap();
        let before = kb.len();
        let user = KnowledgeBase::from_json(
            r#"{"schema_version":1,"entries":{"BT_HRS":{"warning":"custom"},"MY_SYM":{}}}"#,
        )
        .unwrap();
        kb.extend(user);
        assert_eq!(kb.len(), before + 1);
        assert_eq!(
            kb.lookup("BT_HRS").unwrap().warning.as_deref(),
            Some("custom")
        );
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let err = KnowledgeBase::from_json(r#"{"schema_version":2,"entries":{}}"#).unwrap_err();
        assert!(matches!(err, SearchError::KnowledgeBase(_)));
    }
}
