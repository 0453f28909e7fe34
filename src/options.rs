//! Transpiler configuration
//!
//! Everything the transpiler needs from its host is passed in here; there
//! is no process-wide registry. A JSON document can override any field:
//!
//! ```json
//! { "instrument": true, "sqlFunction": "db.query", "globalObjects": [] }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::is_assignment_target;
use crate::schema::{default_global_objects, default_modules, BOType, ModuleSchema};

pub const DEFAULT_SQL_FUNCTION: &str = "execute_query";

#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("invalid options document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sqlFunction `{0}` is not a Python callable name")]
    InvalidSqlFunction(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranspileOptions {
    /// Emit step-control calls and the error-reporting wrapper
    pub instrument: bool,
    /// Treat an incomplete statement as an error instead of a warning
    pub reject_incomplete: bool,
    /// Python callee that receives the text of SQL-shaped assignments
    pub sql_function: String,
    pub modules: Vec<ModuleSchema>,
    pub global_objects: Vec<BOType>,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        TranspileOptions {
            instrument: false,
            reject_incomplete: true,
            sql_function: DEFAULT_SQL_FUNCTION.to_string(),
            modules: default_modules(),
            global_objects: default_global_objects(),
        }
    }
}

impl TranspileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON options document. Missing fields keep
    /// their defaults.
    pub fn from_json(json: &str) -> Result<Self, OptionsError> {
        let options: TranspileOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if !is_assignment_target(&self.sql_function) || self.sql_function.contains('[') {
            return Err(OptionsError::InvalidSqlFunction(self.sql_function.clone()));
        }
        Ok(())
    }

    pub fn with_instrument(mut self, instrument: bool) -> Self {
        self.instrument = instrument;
        self
    }

    pub fn with_reject_incomplete(mut self, reject: bool) -> Self {
        self.reject_incomplete = reject;
        self
    }

    pub fn with_sql_function(mut self, name: impl Into<String>) -> Self {
        self.sql_function = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = TranspileOptions::default();
        assert!(!options.instrument);
        assert!(options.reject_incomplete);
        assert_eq!(options.sql_function, "execute_query");
        assert_eq!(options.modules.len(), 3);
        assert_eq!(options.global_objects[0].name, "UTR");
    }

    #[test]
    fn test_from_json_partial() {
        let options = TranspileOptions::from_json(r#"{"instrument": true, "sqlFunction": "db.query"}"#)
            .expect("valid");
        assert!(options.instrument);
        assert!(options.reject_incomplete);
        assert_eq!(options.sql_function, "db.query");
        assert_eq!(options.modules.len(), 3);
    }

    #[test]
    fn test_from_json_errors() {
        assert!(matches!(
            TranspileOptions::from_json("{not json"),
            Err(OptionsError::Parse(_))
        ));
        assert!(matches!(
            TranspileOptions::from_json(r#"{"sqlFunction": "run query"}"#),
            Err(OptionsError::InvalidSqlFunction(_))
        ));
    }
}
