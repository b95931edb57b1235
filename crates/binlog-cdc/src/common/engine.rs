//! Engine configuration
//!
//! The tailing engine is configured through a flat, ordered property map.
//! Ordering is by key, so two configurations built from the same inputs
//! compare and print identically.

use std::collections::BTreeMap;
use std::fmt;

const MASK: &str = "******";
const SENSITIVE_MARKERS: &[&str] = &["password", "secret"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    properties: BTreeMap<String, String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.properties.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of the properties with password/secret values masked.
    pub fn masked(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .map(|(k, v)| {
                let value = if is_sensitive(k) {
                    MASK.to_string()
                } else {
                    v.clone()
                };
                (k.clone(), value)
            })
            .collect()
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_lowercase();
    SENSITIVE_MARKERS.iter().any(|m| key.contains(m))
}

/// Masked, one property per line.
impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{{")?;
        for (key, value) in self.masked() {
            writeln!(f, "  {}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_sensitive_values() {
        let config = EngineConfig::new()
            .with("database.user", "cdc")
            .with("database.password", "hunter2")
            .with("ssl.keystore.SECRET", "s3cr3t")
            .with("max.batch.size", 1000);

        let masked = config.masked();
        assert_eq!(masked["database.user"], "cdc");
        assert_eq!(masked["database.password"], MASK);
        assert_eq!(masked["ssl.keystore.SECRET"], MASK);
        assert_eq!(masked["max.batch.size"], "1000");

        assert_eq!(config.get("database.password"), Some("hunter2"));
    }

    #[test]
    fn test_display_is_ordered_and_masked() {
        let config = EngineConfig::new()
            .with("b", "2")
            .with("a", "1")
            .with("database.password", "hunter2");

        let rendered = config.to_string();
        assert_eq!(
            rendered,
            "{\n  a: 1\n  b: 2\n  database.password: ******\n}"
        );
        assert!(!rendered.contains("hunter2"));
    }
}
