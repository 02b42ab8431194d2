use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Task arguments given on the command line as `key=value key=value`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskArgs {
    values: BTreeMap<String, String>,
}

impl TaskArgs {
    /// Parses space separated `key=value` pairs; later keys win
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        let mut values = BTreeMap::new();
        for pair in raw.unwrap_or_default().split_whitespace() {
            let (key, value) = pair
                .split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .ok_or_else(|| Error::InvalidArgument(pair.to_string()))?;
            values.insert(key.to_string(), value.to_string());
        }
        Ok(Self { values })
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parses the value of `key`, `None` when it was not given
    pub fn parse_value<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| Error::InvalidArgument(format!("{key}={raw}")))
            })
            .transpose()
    }

    /// Rejects any key not listed in `accepted`
    pub fn ensure_known(&self, task: &str, accepted: &[&str]) -> Result<()> {
        match self.values.keys().find(|key| !accepted.contains(&key.as_str())) {
            Some(key) => Err(Error::UnknownArgument {
                task: task.to_string(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}
