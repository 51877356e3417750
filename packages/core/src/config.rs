//! Configuration for the notebook engine
use serde::{Deserialize, Serialize};

/// Who removes the descendants of a deleted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeleteCascade {
    /// The persistence collaborator cascades to the subtree on its own.
    #[default]
    Store,
    /// The engine deletes descendants leaf-first before the document itself.
    Engine,
}

impl std::str::FromStr for DeleteCascade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "store" => Ok(DeleteCascade::Store),
            "engine" => Ok(DeleteCascade::Engine),
            other => Err(format!("unknown delete cascade mode '{}'", other)),
        }
    }
}

/// Configuration for the notebook services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    /// Element name used to wrap search matches (e.g. `mark`)
    pub highlight_tag: String,

    /// Attribute that identifies a wrapper as a removable search marker
    pub highlight_attribute: String,

    /// Maximum number of records created by a single import
    pub max_import_records: usize,

    /// Subtree removal strategy on delete
    pub delete_cascade: DeleteCascade,

    /// Title given to imported records that carry none
    pub default_title: String,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            highlight_tag: "mark".to_string(),
            highlight_attribute: "data-search-highlight".to_string(),
            max_import_records: 1000,
            delete_cascade: DeleteCascade::Store,
            default_title: "Untitled".to_string(),
        }
    }
}

impl NotebookConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !is_markup_name(&self.highlight_tag) {
            return Err(format!(
                "highlight_tag '{}' is not a valid element name",
                self.highlight_tag
            ));
        }

        if !is_markup_name(&self.highlight_attribute) {
            return Err(format!(
                "highlight_attribute '{}' is not a valid attribute name",
                self.highlight_attribute
            ));
        }

        if self.max_import_records == 0 {
            return Err("max_import_records must be greater than 0".to_string());
        }

        if self.default_title.trim().is_empty() {
            return Err("default_title cannot be empty".to_string());
        }

        Ok(())
    }

    /// Overlay values from `NOTEBOOK_*` environment variables.
    ///
    /// - `NOTEBOOK_MAX_IMPORT_RECORDS`
    /// - `NOTEBOOK_DELETE_CASCADE` (`store` or `engine`)
    /// - `NOTEBOOK_DEFAULT_TITLE`
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var("NOTEBOOK_MAX_IMPORT_RECORDS") {
            match raw.parse::<usize>() {
                Ok(value) => self.max_import_records = value,
                Err(_) => tracing::warn!("Ignoring NOTEBOOK_MAX_IMPORT_RECORDS={}", raw),
            }
        }

        if let Ok(raw) = std::env::var("NOTEBOOK_DELETE_CASCADE") {
            match raw.parse::<DeleteCascade>() {
                Ok(value) => self.delete_cascade = value,
                Err(e) => tracing::warn!("Ignoring NOTEBOOK_DELETE_CASCADE: {}", e),
            }
        }

        if let Ok(raw) = std::env::var("NOTEBOOK_DEFAULT_TITLE") {
            self.default_title = raw;
        }

        self
    }
}

/// Letters, digits and `-`/`_`, starting with a letter.
fn is_markup_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_is_valid() {
        assert!(NotebookConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_marker_names() {
        let config = NotebookConfig {
            highlight_tag: "<mark>".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("highlight_tag"));

        let config = NotebookConfig {
            highlight_attribute: "data search".to_string(),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("highlight_attribute"));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = NotebookConfig {
            max_import_records: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = NotebookConfig {
            default_title: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: NotebookConfig =
            serde_json::from_value(json!({"delete_cascade": "engine"})).unwrap();
        assert_eq!(config.delete_cascade, DeleteCascade::Engine);
        assert_eq!(config.highlight_tag, "mark");
    }

    #[test]
    fn test_delete_cascade_from_str() {
        assert_eq!("Engine".parse::<DeleteCascade>(), Ok(DeleteCascade::Engine));
        assert!("both".parse::<DeleteCascade>().is_err());
    }
}
