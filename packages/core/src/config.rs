//! Column naming configuration for nested set tables
//!
//! The primary key, left, right and level column names are fixed once per
//! configuration. The root (partition) column is *not* part of the
//! configuration: one configuration can serve several forests stored in
//! different tables or partitioned by different columns, so every operation
//! takes the root column name as an explicit argument.

use crate::db::quote_identifier;
use crate::services::NestedSetError;
use serde::{Deserialize, Serialize};

fn default_primary_key_column() -> String {
    "id".to_string()
}

fn default_left_column() -> String {
    "left".to_string()
}

fn default_right_column() -> String {
    "right".to_string()
}

fn default_level_column() -> String {
    "level".to_string()
}

/// Physical column names of a nested set table
///
/// Missing fields fall back to `id`, `left`, `right` and `level` when
/// deserialized.
///
/// # Examples
///
/// ```
/// use nestree_core::NestedSetConfig;
///
/// let config = NestedSetConfig::from_json_str(r#"{ "primary_key_column": "category_id" }"#).unwrap();
/// assert_eq!(config.primary_key_column, "category_id");
/// assert_eq!(config.left_column, "left");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedSetConfig {
    /// Primary key column
    #[serde(default = "default_primary_key_column")]
    pub primary_key_column: String,

    /// Column holding the left coordinate
    #[serde(default = "default_left_column")]
    pub left_column: String,

    /// Column holding the right coordinate
    #[serde(default = "default_right_column")]
    pub right_column: String,

    /// Column holding the depth (root = 0)
    #[serde(default = "default_level_column")]
    pub level_column: String,
}

impl Default for NestedSetConfig {
    fn default() -> Self {
        Self {
            primary_key_column: default_primary_key_column(),
            left_column: default_left_column(),
            right_column: default_right_column(),
            level_column: default_level_column(),
        }
    }
}

impl NestedSetConfig {
    pub fn new(
        primary_key_column: impl Into<String>,
        left_column: impl Into<String>,
        right_column: impl Into<String>,
        level_column: impl Into<String>,
    ) -> Self {
        Self {
            primary_key_column: primary_key_column.into(),
            left_column: left_column.into(),
            right_column: right_column.into(),
            level_column: level_column.into(),
        }
    }

    /// Parse a configuration from JSON, applying defaults for missing fields
    pub fn from_json_str(json: &str) -> Result<Self, NestedSetError> {
        serde_json::from_str(json).map_err(|e| NestedSetError::InvalidConfig(e.to_string()))
    }

    /// Validate configuration
    ///
    /// Every column name must be non-empty and the four names must be
    /// pairwise distinct.
    pub fn validate(&self) -> Result<(), NestedSetError> {
        let columns = [
            ("primary_key_column", &self.primary_key_column),
            ("left_column", &self.left_column),
            ("right_column", &self.right_column),
            ("level_column", &self.level_column),
        ];

        for (field, name) in &columns {
            if name.trim().is_empty() {
                return Err(NestedSetError::InvalidConfig(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        for (i, (field_a, name_a)) in columns.iter().enumerate() {
            for (field_b, name_b) in &columns[i + 1..] {
                if name_a == name_b {
                    return Err(NestedSetError::InvalidConfig(format!(
                        "{} and {} both use column '{}'",
                        field_a, field_b, name_a
                    )));
                }
            }
        }

        Ok(())
    }

    /// Returns true when `column` names one of the engine-managed columns
    pub(crate) fn is_managed_column(&self, column: &str) -> bool {
        column == self.left_column || column == self.right_column || column == self.level_column
    }
}

/// Quoted column identifiers resolved once from a [`NestedSetConfig`]
///
/// Shared by the reader, query factory and writer so that quoting happens in
/// one place.
#[derive(Debug, Clone)]
pub struct ColumnNames {
    config: NestedSetConfig,
    pub pk: String,
    pub left: String,
    pub right: String,
    pub level: String,
}

impl ColumnNames {
    /// Validate `config` and quote its column names
    pub fn resolve(config: NestedSetConfig) -> Result<Self, NestedSetError> {
        config.validate()?;

        Ok(Self {
            pk: quote_identifier(&config.primary_key_column),
            left: quote_identifier(&config.left_column),
            right: quote_identifier(&config.right_column),
            level: quote_identifier(&config.level_column),
            config,
        })
    }

    /// Quote a per-call root column name
    pub fn root(&self, root_column: &str) -> String {
        quote_identifier(root_column)
    }

    pub fn config(&self) -> &NestedSetConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NestedSetConfig::default();
        assert_eq!(config.primary_key_column, "id");
        assert_eq!(config.left_column, "left");
        assert_eq!(config.right_column, "right");
        assert_eq!(config.level_column, "level");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = NestedSetConfig::default();

        // Invalid: empty column name
        config.level_column = "  ".to_string();
        assert!(config.validate().is_err());

        // Invalid: left and right share a column
        config.level_column = "level".to_string();
        config.right_column = "left".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("left_column and right_column"));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = NestedSetConfig::from_json_str(r#"{"level_column": "depth"}"#).unwrap();
        assert_eq!(config.level_column, "depth");
        assert_eq!(config.primary_key_column, "id");

        assert!(NestedSetConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn test_column_names_are_quoted() {
        let names = ColumnNames::resolve(NestedSetConfig::new("id", "lft", "rgt", "lvl")).unwrap();
        assert_eq!(names.pk, "\"id\"");
        assert_eq!(names.left, "\"lft\"");
        assert_eq!(names.root("root_id"), "\"root_id\"");
        assert!(names.config().is_managed_column("rgt"));
        assert!(!names.config().is_managed_column("id"));
    }
}
