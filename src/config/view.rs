use crate::core::cycle::{interval_from_hours, DEFAULT_FCINT_HOURS, MAX_FCINT_HOURS};
use crate::core::CycleTimestamp;
use crate::errors::{Error, Result};
use crate::utils::Substitution;
use chrono::Duration;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Separator between the segments of a setting path
pub const PATH_DELIMITER: char = '#';

/// Where per-member overrides live in the settings tree
pub const MEMBER_SETTINGS: &str = "EPS#MEMBER_SETTINGS";

/// Read-only view over the nested experiment settings
///
/// Paths address nested tables with `#`, e.g. `SURFEX#IO#CSURF_FILETYPE`.
/// Member overrides are stored under `EPS#MEMBER_SETTINGS#<member>` with
/// the same layout as the shared settings.
#[derive(Debug, Clone)]
pub struct ConfigurationView {
    settings: Value,
    system_vars: BTreeMap<String, String>,
}

impl ConfigurationView {
    pub fn new(settings: Value) -> Self {
        Self {
            settings,
            system_vars: BTreeMap::new(),
        }
    }

    /// Attaches the system variables available to placeholder parsing
    pub fn with_system_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.system_vars = vars;
        self
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    /// Starts a lookup of a single setting path
    pub fn setting(&self, path: impl Into<String>) -> Setting<'_> {
        self.first_of([path.into()])
    }

    /// Starts a lookup trying each path in order; the first present one wins
    ///
    /// Used for variable specific settings with a generic fallback such as
    /// `OBSERVATIONS#QC#T2M#TESTS` then `OBSERVATIONS#QC#TESTS`.
    pub fn first_of<I, S>(&self, paths: I) -> Setting<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Setting {
            view: self,
            paths: paths.into_iter().map(Into::into).collect(),
            member: None,
            basedtg: None,
            validtime: None,
            default: None,
            allow_parsing: true,
        }
    }

    /// Cycle interval from `GENERAL#FCINT` (hours, fractions allowed)
    pub fn fcint(&self, member: Option<u32>) -> Result<Duration> {
        let hours = self
            .setting("GENERAL#FCINT")
            .member(member)
            .default(DEFAULT_FCINT_HOURS)
            .get::<f64>()?;
        if !(hours.is_finite() && hours > 0.0 && hours <= MAX_FCINT_HOURS) {
            return Err(Error::ConfigValue {
                path: "GENERAL#FCINT".to_string(),
                reason: format!("cycle interval must be in (0, {MAX_FCINT_HOURS}] hours, got {hours}"),
            });
        }
        Ok(interval_from_hours(hours))
    }

    fn lookup(&self, path: &str, member: Option<u32>) -> Option<&Value> {
        if let Some(member) = member {
            let member_path = format!("{MEMBER_SETTINGS}{PATH_DELIMITER}{member}{PATH_DELIMITER}{path}");
            if let Some(value) = navigate(&self.settings, &member_path) {
                return Some(value);
            }
        }
        navigate(&self.settings, path)
    }
}

fn navigate<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    path.split(PATH_DELIMITER)
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
        .filter(|value| !value.is_null())
}

/// A pending setting lookup, see [`ConfigurationView::setting`]
#[derive(Debug, Clone)]
pub struct Setting<'a> {
    view: &'a ConfigurationView,
    paths: Vec<String>,
    member: Option<u32>,
    basedtg: Option<CycleTimestamp>,
    validtime: Option<CycleTimestamp>,
    default: Option<Value>,
    allow_parsing: bool,
}

impl<'a> Setting<'a> {
    /// Prefers the override of this ensemble member when present
    pub fn member(mut self, member: Option<u32>) -> Self {
        self.member = member;
        self
    }

    pub fn basedtg(mut self, basedtg: CycleTimestamp) -> Self {
        self.basedtg = Some(basedtg);
        self
    }

    pub fn validtime(mut self, validtime: CycleTimestamp) -> Self {
        self.validtime = Some(validtime);
        self
    }

    /// Value returned when none of the paths is set
    pub fn default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Disables placeholder substitution for this lookup
    pub fn raw(mut self) -> Self {
        self.allow_parsing = false;
        self
    }

    /// Returns the resolved value, `None` when absent and no default was given
    pub fn value(&self) -> Option<Value> {
        let found = self
            .paths
            .iter()
            .find_map(|path| self.view.lookup(path, self.member))
            .cloned()
            .or_else(|| self.default.clone())?;

        if !self.allow_parsing {
            return Some(found);
        }

        let substitution = Substitution::new()
            .basedtg(self.basedtg)
            .validtime(self.validtime)
            .member(self.member)
            .vars(&self.view.system_vars);
        Some(parse_strings(found, &substitution))
    }

    /// Returns the value converted to `T`
    ///
    /// # Errors
    ///
    /// `Error::ConfigKey` naming the first path when the setting is absent and
    /// no default was supplied, `Error::ConfigValue` when conversion fails.
    pub fn get<T: DeserializeOwned>(self) -> Result<T> {
        match self.get_opt()? {
            Some(value) => Ok(value),
            None => Err(Error::ConfigKey(self.paths.join(" | "))),
        }
    }

    /// Like [`Setting::get`] but returns `None` for an absent setting
    pub fn get_opt<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(value) = self.value() else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::ConfigValue {
                path: self.paths.join(" | "),
                reason: e.to_string(),
            })
    }
}

fn parse_strings(value: Value, substitution: &Substitution<'_>) -> Value {
    match value {
        Value::String(s) => Value::String(substitution.apply(&s)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| parse_strings(item, substitution))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, parse_strings(v, substitution)))
                .collect(),
        ),
        other => other,
    }
}
