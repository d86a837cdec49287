use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::settings::Settings;

/// JSON configuration tree backed by a file.
///
/// The tree always holds every default key: whatever the file provides is
/// merged over [`ConfigStore::defaults`], keys the defaults do not know about
/// are kept as they are. Values are addressed with dotted paths such as
/// `email.smtp_port`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    tree: Value,
}

impl ConfigStore {
    /// Load the file at `path`. A missing file is created with the defaults;
    /// an empty or malformed one is reported and replaced in memory by the
    /// defaults, leaving the file untouched.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tree = read_tree(&path);
        let store = Self { path, tree };

        if !store.path.exists() {
            if let Err(e) = store.save() {
                tracing::warn!(path = %store.path.display(), error = %e, "Could not create config file");
            } else {
                tracing::info!(path = %store.path.display(), "Created config file with defaults");
            }
        }

        store
    }

    /// Compiled-in defaults as a JSON tree.
    pub fn defaults() -> Value {
        serde_json::to_value(Settings::default()).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    pub fn reload(&mut self) {
        self.tree = read_tree(&self.path);
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.tree)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "Config saved");
        Ok(())
    }

    /// Drop every override and go back to the defaults (not saved).
    pub fn reset(&mut self) {
        self.tree = Self::defaults();
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.tree, |node, key| node.as_object()?.get(key))
    }

    /// Typed lookup; falls back to `default` when the key is missing or has
    /// another type.
    pub fn get_or<T: DeserializeOwned>(&self, path: &str, default: T) -> T {
        self.get(path)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or(default)
    }

    /// Set a value, creating intermediate objects along the way.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<()> {
        let keys: Vec<&str> = path.split('.').collect();
        let (last, parents) = keys
            .split_last()
            .ok_or_else(|| ConfigError::Invalid("empty config path".to_string()))?;

        let mut node = &mut self.tree;
        for key in parents {
            let object = node
                .as_object_mut()
                .ok_or_else(|| ConfigError::NotAnObject(path.to_string()))?;
            node = object
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let object = node
            .as_object_mut()
            .ok_or_else(|| ConfigError::NotAnObject(path.to_string()))?;
        object.insert(last.to_string(), value.into());
        Ok(())
    }

    /// Typed settings. A field whose value does not fit its type is replaced
    /// by its default and reported with its dotted key; the rest of the tree
    /// still applies.
    pub fn settings(&self) -> Result<Settings> {
        if let Ok(settings) = serde_json::from_value(self.tree.clone()) {
            return Ok(settings);
        }

        let defaults = Self::defaults();
        let mut repaired = self.tree.clone();
        if let (Some(default_sections), Some(sections)) = (defaults.as_object(), repaired.as_object_mut()) {
            for (section, default_section) in default_sections {
                let Some(default_fields) = default_section.as_object() else {
                    continue;
                };

                let current = sections
                    .entry(section.clone())
                    .or_insert_with(|| default_section.clone());
                if !current.is_object() {
                    tracing::warn!(key = %section, "Config section is not an object, using defaults");
                    *current = default_section.clone();
                    continue;
                }

                for (field, default_value) in default_fields {
                    let Some(value) = current.get(field) else {
                        continue;
                    };

                    let mut candidate = defaults.clone();
                    candidate[section.as_str()][field.as_str()] = value.clone();
                    if let Err(e) = serde_json::from_value::<Settings>(candidate) {
                        tracing::warn!(
                            key = %format!("{}.{}", section, field),
                            value = %value,
                            error = %e,
                            "Invalid config value, using default"
                        );
                        current[field.as_str()] = default_value.clone();
                    }
                }
            }
        }

        serde_json::from_value(repaired).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn read_tree(path: &Path) -> Value {
    let defaults = ConfigStore::defaults();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return defaults,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Could not read config, using defaults");
            return defaults;
        }
    };

    if raw.trim().is_empty() {
        tracing::warn!(path = %path.display(), "Config file is empty, using defaults");
        return defaults;
    }

    match serde_json::from_str::<Value>(&raw) {
        Ok(user @ Value::Object(_)) => merge(defaults, user),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "Config root is not an object, using defaults");
            defaults
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Malformed config, using defaults");
            defaults
        }
    }
}

/// Merge `user` over `defaults`: user values win, nested objects merge key by
/// key, keys only present in `user` are kept.
fn merge(defaults: Value, user: Value) -> Value {
    match (defaults, user) {
        (Value::Object(defaults), Value::Object(mut user)) => {
            for (key, default) in defaults {
                let merged = match user.remove(&key) {
                    Some(value) => merge(default, value),
                    None => default,
                };
                user.insert(key, merged);
            }
            Value::Object(user)
        }
        (_, user) => user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::WhatsAppSettings;
    use serde_json::json;

    #[test]
    fn missing_file_yields_defaults_and_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let store = ConfigStore::load(&path);

        assert_eq!(store.tree(), &ConfigStore::defaults());
        assert!(path.exists());
        assert_eq!(store.settings().unwrap(), Settings::default());
    }

    #[test]
    fn malformed_and_empty_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ \"email\": ").unwrap();
        assert_eq!(ConfigStore::load(&broken).tree(), &ConfigStore::defaults());
        assert_eq!(std::fs::read_to_string(&broken).unwrap(), "{ \"email\": ");

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, "  \n").unwrap();
        assert_eq!(ConfigStore::load(&empty).tree(), &ConfigStore::defaults());
    }

    #[test]
    fn partial_file_merges_key_wise_and_keeps_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            json!({
                "email": { "enabled": true, "signature": "Team" },
                "extra": { "theme": "dark" }
            })
            .to_string(),
        )
        .unwrap();

        let store = ConfigStore::load(&path);

        assert_eq!(store.get("email.enabled"), Some(&json!(true)));
        assert_eq!(store.get("email.smtp_server"), Some(&json!("smtp.gmail.com")));
        assert_eq!(store.get("email.signature"), Some(&json!("Team")));
        assert_eq!(store.get("extra.theme"), Some(&json!("dark")));
        assert_eq!(store.get("notifications.days_before_expiry"), Some(&json!(1)));
    }

    #[test]
    fn set_then_reload_round_trips_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = ConfigStore::load(&path);
        store.set("email.smtp_port", 465).unwrap();
        store.save().unwrap();

        let reloaded = ConfigStore::load(&path);
        assert_eq!(reloaded.get_or("email.smtp_port", 0u16), 465);
        assert_eq!(reloaded.settings().unwrap().email.smtp_port, 465);

        let defaults = ConfigStore::defaults();
        for section in ["email", "whatsapp", "notifications", "business", "database"] {
            for key in defaults[section].as_object().unwrap().keys() {
                let dotted = format!("{}.{}", section, key);
                assert!(reloaded.get(&dotted).is_some(), "missing {}", dotted);
            }
        }
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json"));

        store.set("reports.weekly.enabled", true).unwrap();

        assert_eq!(store.get("reports.weekly.enabled"), Some(&json!(true)));
        assert!(store.get("reports.monthly").is_none());
        assert_eq!(store.get_or("reports.weekly.missing", 7), 7);
    }

    #[test]
    fn set_through_a_scalar_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json"));

        let err = store.set("email.smtp_port.value", 1).unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject(_)));
    }

    #[test]
    fn mistyped_fields_fall_back_to_their_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json"));

        store.set("email.smtp_port", "not a port").unwrap();
        store.set("email.smtp_server", "smtp.example.com").unwrap();
        store.set("notifications.days_before_expiry", "3").unwrap();
        store.set("notifications.send_time", "07:30").unwrap();
        store.set("business.name", "Acme").unwrap();

        let settings = store.settings().unwrap();

        assert_eq!(settings.email.smtp_port, 587);
        assert_eq!(settings.email.smtp_server, "smtp.example.com");
        assert_eq!(settings.notifications.days_before_expiry, 1);
        assert_eq!(settings.notifications.send_time, "07:30");
        assert_eq!(settings.business.name, "Acme");
        assert_eq!(store.get("email.smtp_port"), Some(&json!("not a port")));
    }

    #[test]
    fn non_object_section_falls_back_to_its_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json"));

        store.set("whatsapp", 5).unwrap();

        let settings = store.settings().unwrap();
        assert_eq!(settings.whatsapp, WhatsAppSettings::default());
    }

    #[test]
    fn reset_restores_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.json"));
        store.set("business.name", "Acme").unwrap();

        store.reset();

        assert_eq!(store.settings().unwrap(), Settings::default());
    }
}
