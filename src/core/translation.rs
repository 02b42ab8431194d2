use crate::errors::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

static STANDARD_NAMES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("t2m", "air_temperature_2m"),
        ("rh2m", "relative_humidity_2m"),
        ("sd", "surface_snow_thickness"),
    ])
});

/// Translation from short variable keys to canonical physical names
#[derive(Debug, Clone, Copy)]
pub struct VariableTranslation {
    table: &'static BTreeMap<&'static str, &'static str>,
}

impl VariableTranslation {
    pub fn standard() -> Self {
        Self {
            table: &STANDARD_NAMES,
        }
    }

    /// Canonical name of `key`, e.g. `t2m` -> `air_temperature_2m`
    pub fn canonical(&self, key: &str) -> Result<&'static str> {
        self.table
            .get(key)
            .copied()
            .ok_or_else(|| Error::UnsupportedVariable(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

impl Default for VariableTranslation {
    fn default() -> Self {
        Self::standard()
    }
}
