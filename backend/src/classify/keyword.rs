//! Keyword classification dialect
//!
//! Keys on descriptive substrings of the upstream field: "Source 4" marks a
//! raw source feeding the downstream actor, "Plant Alpha" marks a capacity
//! declaration, "Unit 12" on the downstream side marks terminal consumption.
//! The substring tables are configuration, loadable from JSON.

use serde::{Deserialize, Serialize};

use super::{fallback_kind, RowClassifier};
use crate::models::{LedgerRow, RowKind};

/// Classifier keyed on descriptive keywords
///
/// The default tables match the reference data sets; alternative tables can
/// be supplied via [`KeywordClassifier::from_json`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordClassifier {
    /// Upstream substrings marking a raw source
    source_keywords: Vec<String>,

    /// Upstream substrings marking a capacity declaration
    declaration_keywords: Vec<String>,

    /// Downstream substrings marking an end-user
    user_keywords: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self {
            source_keywords: vec!["Source".into(), "Well".into()],
            declaration_keywords: vec!["Plant".into(), "Station".into(), "Fountain".into()],
            user_keywords: vec!["Unit".into(), "Module".into(), "Terminal".into()],
        }
    }
}

impl KeywordClassifier {
    /// Load keyword tables from a JSON document
    ///
    /// # Example
    /// ```
    /// use water_network_core_rs::KeywordClassifier;
    ///
    /// let json = r#"{
    ///     "source_keywords": ["Spring"],
    ///     "declaration_keywords": ["Works"],
    ///     "user_keywords": ["Home"]
    /// }"#;
    /// let classifier = KeywordClassifier::from_json(json).unwrap();
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn matches_any(field: Option<&str>, keywords: &[String]) -> bool {
        field.is_some_and(|f| keywords.iter().any(|k| f.contains(k.as_str())))
    }
}

impl RowClassifier for KeywordClassifier {
    fn classify(&self, row: &LedgerRow) -> RowKind {
        if Self::matches_any(row.upstream_id(), &self.source_keywords) {
            return RowKind::SourceToActor;
        }
        if Self::matches_any(row.upstream_id(), &self.declaration_keywords)
            && row.downstream_id().is_none()
        {
            return RowKind::ActorDeclaration;
        }
        if Self::matches_any(row.downstream_id(), &self.user_keywords) {
            return RowKind::ActorToUser;
        }
        fallback_kind(row)
    }
}
