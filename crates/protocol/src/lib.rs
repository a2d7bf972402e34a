use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const RESULT_SCHEMA_VERSION: u32 = 1;

/// Qualitative trust level attached to a verification result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Confirmed declaration
    High,
    /// Textual reference only, or a case-variant declaration
    Medium,
    /// Unconfirmed fuzzy match
    Low,
}

/// Cascade tier that produced a result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    Indexed,
    BroadPattern,
    Exhaustive,
    ExhaustivePotential,
    Semantic,
    KnowledgeBase,
    NotFound,
}

impl SearchMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            SearchMethod::Indexed => "indexed",
            SearchMethod::BroadPattern => "broad_pattern",
            SearchMethod::Exhaustive => "exhaustive",
            SearchMethod::ExhaustivePotential => "exhaustive_potential",
            SearchMethod::Semantic => "semantic",
            SearchMethod::KnowledgeBase => "knowledge_base",
            SearchMethod::NotFound => "not_found",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Config,
    Menuconfig,
}

impl DeclarationKind {
    pub fn from_keyword(keyword: &str) -> Self {
        if keyword.eq_ignore_ascii_case("menuconfig") {
            DeclarationKind::Menuconfig
        } else {
            DeclarationKind::Config
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Config => "config",
            DeclarationKind::Menuconfig => "menuconfig",
        }
    }
}

/// Outcome of verifying one configuration symbol.
///
/// Built through [`VerificationResult::found`] or [`VerificationResult::unavailable`] so that
/// an unavailable result never carries a `source`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct VerificationResult {
    pub name: String,
    pub available: bool,
    /// Workspace-relative path of the file that produced the answer
    pub source: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub warning: Option<String>,
    pub confidence: Confidence,
    pub search_method: SearchMethod,
    pub declaration_kind: Option<DeclarationKind>,
    pub symbol_type: Option<String>,
    pub prompt: Option<String>,
    pub note: Option<String>,
    pub context: Option<String>,
}

impl VerificationResult {
    pub fn found(
        name: impl Into<String>,
        source: impl Into<String>,
        confidence: Confidence,
        search_method: SearchMethod,
    ) -> Self {
        Self {
            name: name.into(),
            available: true,
            source: Some(source.into()),
            description: None,
            dependencies: Vec::new(),
            alternatives: Vec::new(),
            suggestions: Vec::new(),
            warning: None,
            confidence,
            search_method,
            declaration_kind: None,
            symbol_type: None,
            prompt: None,
            note: None,
            context: None,
        }
    }

    pub fn unavailable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            available: false,
            source: None,
            description: None,
            dependencies: Vec::new(),
            alternatives: Vec::new(),
            suggestions: Vec::new(),
            warning: None,
            confidence: Confidence::Low,
            search_method: SearchMethod::NotFound,
            declaration_kind: None,
            symbol_type: None,
            prompt: None,
            note: None,
            context: None,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dedup_preserving_order(dependencies);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn add_alternatives<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternatives.extend(items.into_iter().map(Into::into));
        self.alternatives = dedup_preserving_order(std::mem::take(&mut self.alternatives));
    }

    pub fn add_suggestions<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions.extend(items.into_iter().map(Into::into));
        self.suggestions = dedup_preserving_order(std::mem::take(&mut self.suggestions));
    }
}

/// Drop empty and repeated entries, keeping the first occurrence of each.
pub fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct VerifyResponse {
    pub schema_version: u32,
    pub workspace: String,
    pub results: Vec<VerificationResult>,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

pub fn response_schema() -> Result<String> {
    let schema = schemars::schema_for!(VerifyResponse);
    serialize_json_pretty(&schema)
}
