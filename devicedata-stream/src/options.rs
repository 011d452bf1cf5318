// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use devicedata_core::Result;
use serde::{Deserialize, Serialize};

/// Source whose `square` boluses report `immediate`/`extended` amounts.
pub const DIASEND: &str = "diasend";

/// Field whose presence enables display-value derivation.
pub const DEFAULT_TIMESTAMP_FIELD: &str = "time";

/// Settings for the bolus conversion pipeline.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```
/// use devicedata_stream::options::ConvertBolusOptions;
///
/// let options = ConvertBolusOptions::from_json_str(r#"{"timestampField": "deviceTime"}"#).unwrap();
/// assert_eq!(options.timestamp_field, "deviceTime");
/// assert!(options.is_square_vendor("diasend"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConvertBolusOptions {
    /// Sources whose `square` boluses need their vendor fields renamed.
    pub square_vendor_sources: Vec<String>,
    /// A bolus must carry this field before its display values are derived.
    pub timestamp_field: String,
}

impl ConvertBolusOptions {
    /// Parses options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON or has fields of the wrong type.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_square_vendor_source(mut self, source: impl Into<String>) -> Self {
        self.square_vendor_sources.push(source.into());
        self
    }

    #[must_use]
    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = field.into();
        self
    }

    pub fn is_square_vendor(&self, source: &str) -> bool {
        self.square_vendor_sources.iter().any(|s| s == source)
    }
}

impl Default for ConvertBolusOptions {
    fn default() -> Self {
        Self {
            square_vendor_sources: vec![DIASEND.to_string()],
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
        }
    }
}
