//! Transfer engine configuration.

use serde::{Deserialize, Serialize};

use stockyard_core::DomainError;

pub const DEFAULT_MAX_CARRIER_DEPTH: usize = 10;

/// Policy knobs of the transfer engine.
///
/// Defaults match a stock installation; [`TransferConfig::from_env`] overrides
/// individual values from `STOCKYARD_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Deepest carrier nesting a transfer may touch (root is depth 0).
    pub max_carrier_depth: usize,
    /// Name of the location retired unit loads are sent to.
    pub trash_location: String,
    /// Name of the location cleared unit loads are sent to.
    pub clearing_location: String,
    /// Inserted between a retired label and its uniqueness suffix.
    pub retired_label_separator: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_carrier_depth: DEFAULT_MAX_CARRIER_DEPTH,
            trash_location: "TRASH".to_string(),
            clearing_location: "CLEARING".to_string(),
            retired_label_separator: "-X-".to_string(),
        }
    }
}

impl TransferConfig {
    pub const ENV_MAX_CARRIER_DEPTH: &'static str = "STOCKYARD_MAX_CARRIER_DEPTH";
    pub const ENV_TRASH_LOCATION: &'static str = "STOCKYARD_TRASH_LOCATION";
    pub const ENV_CLEARING_LOCATION: &'static str = "STOCKYARD_CLEARING_LOCATION";
    pub const ENV_RETIRED_LABEL_SEPARATOR: &'static str = "STOCKYARD_RETIRED_LABEL_SEPARATOR";

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, DomainError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (unset keys keep defaults).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(Self::ENV_MAX_CARRIER_DEPTH) {
            config.max_carrier_depth = raw.trim().parse().map_err(|e| {
                DomainError::validation(
                    Self::ENV_MAX_CARRIER_DEPTH,
                    format!("'{raw}' is not a carrier depth: {e}"),
                )
            })?;
        }
        if let Some(name) = lookup(Self::ENV_TRASH_LOCATION) {
            config.trash_location = name;
        }
        if let Some(name) = lookup(Self::ENV_CLEARING_LOCATION) {
            config.clearing_location = name;
        }
        if let Some(separator) = lookup(Self::ENV_RETIRED_LABEL_SEPARATOR) {
            config.retired_label_separator = separator;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.trash_location.trim().is_empty() {
            return Err(DomainError::validation("trash_location", "name cannot be empty"));
        }
        if self.clearing_location.trim().is_empty() {
            return Err(DomainError::validation("clearing_location", "name cannot be empty"));
        }
        if self.retired_label_separator.is_empty() {
            return Err(DomainError::validation("retired_label_separator", "cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let config = TransferConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TransferConfig::default());
        assert_eq!(config.max_carrier_depth, 10);
    }

    #[test]
    fn overrides_are_applied() {
        let config = TransferConfig::from_lookup(lookup(&[
            ("STOCKYARD_MAX_CARRIER_DEPTH", " 4 "),
            ("STOCKYARD_TRASH_LOCATION", "NIRVANA"),
        ]))
        .unwrap();
        assert_eq!(config.max_carrier_depth, 4);
        assert_eq!(config.trash_location, "NIRVANA");
        assert_eq!(config.clearing_location, "CLEARING");
    }

    #[test]
    fn malformed_depth_is_a_validation_error() {
        let err =
            TransferConfig::from_lookup(lookup(&[("STOCKYARD_MAX_CARRIER_DEPTH", "deep")])).unwrap_err();
        match err {
            DomainError::Validation { field, reason } => {
                assert_eq!(field, TransferConfig::ENV_MAX_CARRIER_DEPTH);
                assert!(reason.contains("deep"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_location_names_are_rejected() {
        let err = TransferConfig::from_lookup(lookup(&[("STOCKYARD_CLEARING_LOCATION", " ")]))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { ref field, .. } if field == "clearing_location"));
    }
}
