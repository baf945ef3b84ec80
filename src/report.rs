//! Write the replacement report.
//!
//! The report is a JSON object holding the number of substitutions and the
//! substitution table:
//!
//! ```json
//! { "count": 3, "items": { "foo": "a", "bar": "b" } }
//! ```

use std::path::Path;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::substitution::Substitutions;

/// List of errors for this module.
#[derive(Debug, Error)]
pub enum ReportError {
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Summary of the substitutions of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplacementReport {
    /// Number of substitutions performed.
    pub count: u64,

    /// Tokens by class name, in assignment order.
    #[serde(serialize_with = "serialize_items")]
    pub items: Vec<(String, String)>,
}

impl ReplacementReport {
    /// Build a report from a substitution table.
    pub fn from_substitutions(substitutions: &Substitutions) -> Self {
        Self {
            count: substitutions.count(),
            items: substitutions
                .iter()
                .map(|(name, token)| (name.to_owned(), token.to_owned()))
                .collect(),
        }
    }

    /// Serialize the report to a JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report to a JSON file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_json()?)?;

        Ok(())
    }
}

/// Serialize pairs as a map, keeping their order.
fn serialize_items<S>(items: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(items.iter().map(|(name, token)| (name, token)))
}
