//! Selection of assimilated variables from the SURFEX observation switches.
//!
//! `SURFEX#ASSIM#OBS#NNCO` holds one activation flag per observation slot and
//! `SURFEX#ASSIM#OBS#COBS_M` the observation type of each slot.

use crate::config::ConfigurationView;
use crate::core::CycleTimestamp;
use crate::errors::{Error, Result};
use serde_json::Value;

/// Observation types understood by the assimilation tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationType {
    T2m,
    Rh2m,
    Swe,
}

impl ObservationType {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "T2M" => Some(ObservationType::T2m),
            "RH2M" => Some(ObservationType::Rh2m),
            "SWE" => Some(ObservationType::Swe),
            _ => None,
        }
    }

    /// Short variable key used in file names and the translation table
    pub fn variable(&self) -> &'static str {
        match self {
            ObservationType::T2m => "t2m",
            ObservationType::Rh2m => "rh2m",
            ObservationType::Swe => "sd",
        }
    }
}

/// Variable of each NNCO slot in the fixed SURFEX observation order
const POSITIONAL_VARIABLES: [(usize, &str); 3] = [(0, "t2m"), (1, "rh2m"), (4, "sd")];

/// Activation flags and observation types of the current configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    nnco: Vec<i64>,
    types: Vec<String>,
}

impl ObservationTable {
    pub fn new(nnco: Vec<i64>, types: Vec<String>) -> Self {
        Self { nnco, types }
    }

    pub fn from_config(config: &ConfigurationView, member: Option<u32>) -> Result<Self> {
        let nnco = config.setting("SURFEX#ASSIM#OBS#NNCO").member(member).get()?;
        let types = config.setting("SURFEX#ASSIM#OBS#COBS_M").member(member).get()?;
        Ok(Self::new(nnco, types))
    }

    fn active_codes(&self) -> impl Iterator<Item = &str> {
        self.nnco
            .iter()
            .zip(self.types.iter())
            .filter(|(flag, _)| **flag == 1)
            .map(|(_, code)| code.as_str())
    }

    /// Variables written to the SODA observation file
    ///
    /// Unknown codes are ignored; SWE is only included on snow assimilation cycles.
    pub fn soda_variables(&self, snow_cycle: bool) -> Vec<&'static str> {
        let mut selected = Vec::new();
        for code in self.active_codes() {
            match ObservationType::from_code(code) {
                Some(ObservationType::Swe) if !snow_cycle => {}
                Some(obs) => {
                    if !selected.contains(&obs.variable()) {
                        selected.push(obs.variable());
                    }
                }
                None => {}
            }
        }
        selected
    }

    /// Variables written to the obsmon database
    ///
    /// # Errors
    ///
    /// `Error::UnsupportedObservationType` for an active slot with an unknown code.
    pub fn obsmon_variables(&self) -> Result<Vec<&'static str>> {
        let mut selected = Vec::new();
        for code in self.active_codes() {
            let obs = ObservationType::from_code(code)
                .ok_or_else(|| Error::UnsupportedObservationType(code.to_string()))?;
            // Snow depth has no obsmon output.
            if obs != ObservationType::Swe && !selected.contains(&obs.variable()) {
                selected.push(obs.variable());
            }
        }
        Ok(selected)
    }
}

/// Variables activated in NNCO by slot position (0: t2m, 1: rh2m, 4: sd)
pub fn positional_variables(nnco: &[i64]) -> Vec<&'static str> {
    POSITIONAL_VARIABLES
        .iter()
        .filter(|(slot, _)| nnco.get(*slot) == Some(&1))
        .map(|(_, var)| *var)
        .collect()
}

/// Reads `SURFEX#ASSIM#ISBA#UPDATE_SNOW_CYCLES` as hours of the day
///
/// Entries may be numbers or strings such as `"06"`.
pub fn snow_assimilation_hours(config: &ConfigurationView, member: Option<u32>) -> Result<Vec<u32>> {
    const PATH: &str = "SURFEX#ASSIM#ISBA#UPDATE_SNOW_CYCLES";
    let entries: Vec<Value> = config
        .setting(PATH)
        .member(member)
        .default(Value::Array(Vec::new()))
        .get()?;

    entries
        .iter()
        .map(|entry| {
            let hour = match entry {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            };
            hour.filter(|h| *h < 24)
                .map(|h| h as u32)
                .ok_or_else(|| Error::ConfigValue {
                    path: PATH.to_string(),
                    reason: format!("invalid cycle hour {entry}"),
                })
        })
        .collect()
}

/// Whether `cycle` falls on one of the snow assimilation hours
pub fn is_snow_cycle(hours: &[u32], cycle: CycleTimestamp) -> bool {
    hours.contains(&cycle.hour())
}
