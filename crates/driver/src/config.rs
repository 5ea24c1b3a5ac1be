//! Collection configuration, optionally loaded from a TOML file.
//!
//! A collection names its backend scheme, its table, and which document
//! fields form the primary key. Endpoint and credential handling belong to
//! whoever constructs the [`crate::Backend`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use docstore_core::{Error, Result};

/// Scheme of the built-in wide-column driver.
pub const DEFAULT_SCHEME: &str = "tablestore";

/// What a write does when a non-key field cannot be read from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Leave the column out of the write
    #[default]
    Skip,
    /// Fail that action with the field error; nothing is written
    Abort,
}

/// Configuration of one collection.
///
/// # Example
///
/// ```toml
/// table = "gamble_play_users"
/// partition_key = "periodId"
/// sort_key = "userId"
/// # "skip" (default) or "abort"
/// missing_field_policy = "skip"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Registry scheme that opens this collection
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Backend table name
    pub table: String,
    /// Document field holding the partition key
    pub partition_key: String,
    /// Document field holding the sort key, for tables that have one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
    /// Handling of unreadable non-key fields during writes
    #[serde(default)]
    pub missing_field_policy: MissingFieldPolicy,
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

impl CollectionConfig {
    /// Configuration for a table keyed by `partition_key` alone.
    pub fn new(table: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            scheme: default_scheme(),
            table: table.into(),
            partition_key: partition_key.into(),
            sort_key: None,
            missing_field_policy: MissingFieldPolicy::default(),
        }
    }

    /// Builder: set the sort key field.
    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Builder: set the missing-field policy.
    pub fn with_missing_field_policy(mut self, policy: MissingFieldPolicy) -> Self {
        self.missing_field_policy = policy;
        self
    }

    /// Builder: set the registry scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Check the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty table or partition key,
    /// an empty sort key, or a sort key equal to the partition key.
    pub fn validate(&self) -> Result<()> {
        if self.table.is_empty() {
            return Err(Error::configuration("table name is empty"));
        }
        if self.partition_key.is_empty() {
            return Err(Error::configuration("partition key field is empty"));
        }
        match self.sort_key.as_deref() {
            Some("") => Err(Error::configuration("sort key field is empty")),
            Some(sk) if sk == self.partition_key => Err(Error::configuration(format!(
                "sort key {} duplicates the partition key",
                sk
            ))),
            _ => Ok(()),
        }
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CollectionConfig = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("failed to parse collection config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML and write it to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::internal(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::internal(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Commented template for a new config file.
    pub fn default_toml() -> &'static str {
        r#"# Collection configuration
#
# Registry scheme that opens this collection (default: "tablestore")
scheme = "tablestore"

# Backend table name
table = "my_table"

# Document field holding the partition key (required)
partition_key = "id"

# Document field holding the sort key, if the table has one
# sort_key = "created_at"

# What a write does when a non-key field cannot be read:
#   "skip"  = leave the column out (default)
#   "abort" = fail that action, write nothing
missing_field_policy = "skip"
"#
    }
}
