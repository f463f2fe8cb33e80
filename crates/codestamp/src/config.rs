//! YAML configuration store.
//!
//! The configuration document is a YAML mapping. Top-level keys whose values
//! are mappings double as template entries, keyed by template id:
//!
//! ```yaml
//! crud/create:
//!   description: Create endpoint for a model
//!   required_params: [model_name, fields]
//!   defaults:
//!     base_class: Model
//!   author: codegen          # inline default
//!
//! database:
//!   host: localhost
//!   port: 5432
//! ```
//!
//! Arbitrary settings live next to template entries and are reached through
//! dotted keys (`"database.host"`) with [`ConfigStore::get_value`] and
//! [`ConfigStore::set_value`]. Mutations stay in memory until
//! [`ConfigStore::save`].

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, KeyLookupError};
use crate::output::{self, OverwritePolicy};

const INLINE_ORIGIN: &str = "<inline>";

/// Settings for one template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    /// Parameters that must be supplied by the caller or defaulted.
    pub required_params: Vec<String>,
    /// Values used when the caller does not supply a parameter.
    pub defaults: BTreeMap<String, Value>,
    /// Human readable summary.
    pub description: Option<String>,
}

/// Raw shape of a template entry.
///
/// `required_kwargs` is the legacy spelling of `required_params`. Any key
/// that is not one of the reserved ones is an inline default.
#[derive(Debug, Deserialize)]
struct TemplateEntry {
    #[serde(default, alias = "required_kwargs")]
    required_params: Vec<String>,
    #[serde(default)]
    defaults: BTreeMap<String, Value>,
    #[serde(default)]
    description: Option<String>,
    #[serde(flatten)]
    inline: BTreeMap<String, Value>,
}

impl TemplateConfig {
    fn from_entry(template_id: &str, entry: &Mapping) -> Result<Self, ConfigError> {
        let raw: TemplateEntry = serde_yaml::from_value(Value::Mapping(entry.clone())).map_err(|e| {
            ConfigError::InvalidTemplateEntry {
                template_id: template_id.to_string(),
                message: e.to_string(),
            }
        })?;

        // Explicit `defaults` win over inline keys.
        let mut defaults = raw.inline;
        defaults.extend(raw.defaults);

        Ok(Self {
            required_params: raw.required_params,
            defaults,
            description: raw.description,
        })
    }
}

/// In-memory configuration document with an optional backing file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    document: Mapping,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// Creates an empty store with no backing file.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a store from a YAML file.
    ///
    /// An empty file is an empty configuration.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotFound`] if the file does not exist
    /// - [`ConfigError::Parse`] if it is not valid YAML
    /// - [`ConfigError::Malformed`] if the top level is not a mapping
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let document = parse_document(&text, &path.display().to_string())?;
        tracing::debug!(?path, entries = document.len(), "Loaded configuration");

        Ok(Self {
            document,
            path: Some(path.to_path_buf()),
        })
    }

    /// Parses a store from YAML text. The store has no backing file.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            document: parse_document(text, INLINE_ORIGIN)?,
            path: None,
        })
    }

    /// The file this store was loaded from or last saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The whole document.
    pub fn document(&self) -> &Mapping {
        &self.document
    }

    /// Returns the configuration for `template_id`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingTemplate`] if there is no mapping entry for the
    /// template, [`ConfigError::InvalidTemplateEntry`] if the entry cannot be
    /// interpreted.
    pub fn get_config(&self, template_id: &str) -> Result<TemplateConfig, ConfigError> {
        self.template_config(template_id)?
            .ok_or_else(|| ConfigError::MissingTemplate {
                template_id: template_id.to_string(),
            })
    }

    /// Like [`get_config`](Self::get_config), but a missing entry is `None`.
    pub fn template_config(
        &self,
        template_id: &str,
    ) -> Result<Option<TemplateConfig>, ConfigError> {
        match self.document.get(template_id) {
            Some(Value::Mapping(entry)) => TemplateConfig::from_entry(template_id, entry).map(Some),
            _ => Ok(None),
        }
    }

    /// Required parameters of a template, or an empty list if it has no entry.
    pub fn get_required_params(&self, template_id: &str) -> Result<Vec<String>, ConfigError> {
        Ok(self
            .template_config(template_id)?
            .map(|config| config.required_params)
            .unwrap_or_default())
    }

    /// Top-level keys holding mappings, in document order.
    pub fn template_ids(&self) -> Vec<String> {
        self.document
            .iter()
            .filter(|(_, value)| value.is_mapping())
            .filter_map(|(key, _)| key.as_str().map(str::to_string))
            .collect()
    }

    /// Looks up a dotted key such as `"database.host"`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyLookupError`] naming the first absent segment.
    pub fn get_value(&self, key: &str) -> Result<&Value, KeyLookupError> {
        let mut segments = key.split('.');
        let missing = |segment: &str| KeyLookupError {
            key: key.to_string(),
            missing: segment.to_string(),
        };

        let first = segments.next().unwrap_or_default();
        let mut current = self.document.get(first).ok_or_else(|| missing(first))?;
        for segment in segments {
            current = match current {
                Value::Mapping(map) => map.get(segment).ok_or_else(|| missing(segment))?,
                _ => return Err(missing(segment)),
            };
        }
        Ok(current)
    }

    /// Sets a dotted key, creating intermediate mappings as needed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidKey`] if the key or one of its segments is empty
    /// - [`ConfigError::NotAMapping`] if an intermediate segment holds a scalar
    ///   or sequence, which is left untouched
    pub fn set_value(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ConfigError> {
        let segments: Vec<&str> = key.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::InvalidKey { key: key.to_string() });
        }
        let Some((last, parents)) = segments.split_last() else {
            return Err(ConfigError::InvalidKey { key: key.to_string() });
        };

        let mut current = &mut self.document;
        for (depth, segment) in parents.iter().enumerate() {
            let child = current
                .entry(Value::String((*segment).to_string()))
                .or_insert(Value::Mapping(Mapping::new()));
            current = match child {
                Value::Mapping(map) => map,
                _ => {
                    return Err(ConfigError::NotAMapping {
                        key: key.to_string(),
                        blocked_at: segments[..=depth].join("."),
                    })
                }
            };
        }

        current.insert(Value::String((*last).to_string()), value.into());
        Ok(())
    }

    /// Writes the document back to the file it was loaded from.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoPath`] if the store has no backing file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = self.path.as_deref().ok_or(ConfigError::NoPath)?;
        self.write_to(path)
    }

    /// Writes the document to `path` and makes it the backing file.
    pub fn save_to(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.write_to(path)?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = serde_yaml::to_string(&self.document).map_err(|e| ConfigError::Parse {
            origin: path.display().to_string(),
            source: e,
        })?;
        output::write_atomic(path, &text, OverwritePolicy::Overwrite).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(?path, "Saved configuration");
        Ok(())
    }
}

fn parse_document(text: &str, origin: &str) -> Result<Mapping, ConfigError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| ConfigError::Parse {
        origin: origin.to_string(),
        source: e,
    })?;

    match value {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        _ => Err(ConfigError::Malformed {
            origin: origin.to_string(),
            message: "top level must be a mapping".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
crud/create:
  description: Create endpoint
  required_params: [model_name, fields]
  author: inline
  defaults:
    author: explicit
    base_class: Model

legacy:
  required_kwargs: [name]

database:
  host: localhost
  port: 5432
"#;

    fn store() -> ConfigStore {
        ConfigStore::from_yaml_str(DOC).unwrap()
    }

    // =========================================================================
    // Template entries
    // =========================================================================

    #[test]
    fn test_get_config() {
        let config = store().get_config("crud/create").unwrap();
        assert_eq!(config.required_params, vec!["model_name", "fields"]);
        assert_eq!(config.description.as_deref(), Some("Create endpoint"));
        assert_eq!(config.defaults.get("base_class"), Some(&Value::from("Model")));
    }

    #[test]
    fn test_explicit_defaults_win_over_inline() {
        let config = store().get_config("crud/create").unwrap();
        assert_eq!(config.defaults.get("author"), Some(&Value::from("explicit")));
    }

    #[test]
    fn test_required_kwargs_alias() {
        assert_eq!(store().get_required_params("legacy").unwrap(), vec!["name"]);
    }

    #[test]
    fn test_missing_template() {
        let store = store();
        assert!(matches!(
            store.get_config("nope"),
            Err(ConfigError::MissingTemplate { .. })
        ));
        assert!(store.get_required_params("nope").unwrap().is_empty());
        assert_eq!(store.template_config("nope").unwrap(), None);
    }

    #[test]
    fn test_invalid_template_entry() {
        let store = ConfigStore::from_yaml_str("bad:\n  required_params: 3\n").unwrap();
        assert!(matches!(
            store.get_config("bad"),
            Err(ConfigError::InvalidTemplateEntry { .. })
        ));
    }

    #[test]
    fn test_template_ids() {
        assert_eq!(store().template_ids(), vec!["crud/create", "legacy", "database"]);
    }

    // =========================================================================
    // Dotted keys
    // =========================================================================

    #[test]
    fn test_get_value() {
        let store = store();
        assert_eq!(store.get_value("database.host").unwrap(), &Value::from("localhost"));
        assert_eq!(store.get_value("database.port").unwrap(), &Value::from(5432));
        assert!(store.get_value("database").unwrap().is_mapping());
    }

    #[test]
    fn test_get_value_missing_segment() {
        let err = store().get_value("database.user").unwrap_err();
        assert_eq!(err.key, "database.user");
        assert_eq!(err.missing, "user");

        let err = store().get_value("database.host.name").unwrap_err();
        assert_eq!(err.missing, "name");
    }

    #[test]
    fn test_set_value_creates_intermediates() {
        let mut store = store();
        store.set_value("output.paths.models", "src/models").unwrap();
        assert_eq!(
            store.get_value("output.paths.models").unwrap(),
            &Value::from("src/models")
        );
    }

    #[test]
    fn test_set_value_refuses_to_clobber_scalar() {
        let mut store = store();
        let err = store.set_value("database.host.name", "x").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NotAMapping { ref blocked_at, .. } if blocked_at == "database.host"
        ));
        assert_eq!(store.get_value("database.host").unwrap(), &Value::from("localhost"));
    }

    #[test]
    fn test_set_value_invalid_key() {
        let mut store = store();
        assert!(matches!(store.set_value("", 1), Err(ConfigError::InvalidKey { .. })));
        assert!(matches!(store.set_value("a..b", 1), Err(ConfigError::InvalidKey { .. })));
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_empty_document() {
        let store = ConfigStore::from_yaml_str("").unwrap();
        assert!(store.document().is_empty());
        assert!(store.template_ids().is_empty());
    }

    #[test]
    fn test_non_mapping_top_level() {
        assert!(matches!(
            ConfigStore::from_yaml_str("- a\n- b\n"),
            Err(ConfigError::Malformed { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ConfigStore::from_yaml_str("invalid: yaml: content"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_save_without_path() {
        assert!(matches!(store().save(), Err(ConfigError::NoPath)));
    }
}
