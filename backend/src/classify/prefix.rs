//! Prefix classification dialect
//!
//! Keys on identifier prefixes instead of descriptive keywords: a
//! `source_` upstream marks a raw source, a `user_` downstream marks
//! terminal consumption, a declared actor with no downstream marks a
//! capacity declaration. The prefix tables are configuration, loadable
//! from JSON.

use serde::{Deserialize, Serialize};

use super::{fallback_kind, RowClassifier};
use crate::models::{LedgerRow, RowKind};

/// Classifier keyed on identifier prefixes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefixClassifier {
    /// Prefixes marking a raw source identifier
    source_prefixes: Vec<String>,

    /// Prefixes marking a processing-facility identifier
    facility_prefixes: Vec<String>,

    /// Prefixes marking an end-user identifier
    user_prefixes: Vec<String>,
}

impl Default for PrefixClassifier {
    fn default() -> Self {
        Self {
            source_prefixes: vec!["source_".into()],
            facility_prefixes: vec!["usine_".into(), "plant_".into()],
            user_prefixes: vec!["usager_".into(), "user_".into()],
        }
    }
}

impl PrefixClassifier {
    /// Load prefix tables from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn has_prefix(field: Option<&str>, prefixes: &[String]) -> bool {
        field.is_some_and(|f| prefixes.iter().any(|p| f.starts_with(p.as_str())))
    }
}

impl RowClassifier for PrefixClassifier {
    fn classify(&self, row: &LedgerRow) -> RowKind {
        if Self::has_prefix(row.upstream_id(), &self.source_prefixes) {
            return RowKind::SourceToActor;
        }
        if Self::has_prefix(row.downstream_id(), &self.user_prefixes) {
            return RowKind::ActorToUser;
        }
        if Self::has_prefix(row.actor_id(), &self.facility_prefixes)
            && row.downstream_id().is_none()
            && row.upstream_id().is_none()
        {
            return RowKind::ActorDeclaration;
        }
        fallback_kind(row)
    }
}
