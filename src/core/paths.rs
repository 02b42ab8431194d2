use crate::core::CycleTimestamp;
use crate::errors::{Error, Result};
use crate::utils::Substitution;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical directory roles of an experiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectoryRole {
    /// Experiment root holding configuration and progress files
    Experiment,
    Work,
    Archive,
    ExtraArchive,
    Observation,
    Binary,
    FirstGuess,
    Climate,
    /// Experiment library with shared input such as `domain.json`
    ExperimentLibrary,
}

impl DirectoryRole {
    /// Key of the role in the experiment file-path table
    pub fn key(&self) -> &'static str {
        match self {
            DirectoryRole::Experiment => "exp_dir",
            DirectoryRole::Work => "wrk_dir",
            DirectoryRole::Archive => "archive_dir",
            DirectoryRole::ExtraArchive => "extrarch_dir",
            DirectoryRole::Observation => "obs_dir",
            DirectoryRole::Binary => "bin_dir",
            DirectoryRole::FirstGuess => "first_guess_dir",
            DirectoryRole::Climate => "climdir",
            DirectoryRole::ExperimentLibrary => "sfx_exp_lib",
        }
    }

    /// Name of the default directory used when the role is not configured
    pub fn default_dir(&self) -> Option<&'static str> {
        match self {
            DirectoryRole::Experiment | DirectoryRole::ExperimentLibrary => None,
            DirectoryRole::Work => Some("default_wrk_dir"),
            DirectoryRole::Archive => Some("default_archive_dir"),
            DirectoryRole::ExtraArchive => Some("default_extrarch_dir"),
            DirectoryRole::Observation => Some("default_obs_dir"),
            DirectoryRole::Binary => Some("default_bin_dir"),
            DirectoryRole::FirstGuess => Some("default_first_guess_dir"),
            DirectoryRole::Climate => Some("default_climdir"),
        }
    }
}

impl fmt::Display for DirectoryRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Time and member parameters applied to a path template
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQuery {
    pub member: Option<u32>,
    pub basedtg: Option<CycleTimestamp>,
    pub validtime: Option<CycleTimestamp>,
}

impl PathQuery {
    pub fn new() -> Self {
        Self::default()
    }

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
}

/// Maps directory roles to concrete paths for a cycle and member
#[derive(Debug, Clone)]
pub struct SystemPathResolver {
    paths: BTreeMap<String, String>,
    base_root: PathBuf,
    vars: BTreeMap<String, String>,
}

impl SystemPathResolver {
    /// Creates a resolver over the experiment file-path table
    ///
    /// `base_root` anchors relative templates and unconfigured default directories.
    pub fn new(paths: BTreeMap<String, String>, base_root: impl Into<PathBuf>) -> Self {
        Self {
            paths,
            base_root: base_root.into(),
            vars: BTreeMap::new(),
        }
    }

    /// System variables substituted as `@NAME@` in templates
    pub fn with_vars(mut self, vars: BTreeMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Resolves the directory of `role`
    ///
    /// Lookup order: the role's own entry, the entry of its default directory,
    /// then `<base_root>/<default directory name>`.
    ///
    /// # Errors
    ///
    /// `Error::UnknownSystemPath` when the role is unset and has no default.
    pub fn resolve_path(&self, role: DirectoryRole, query: &PathQuery) -> Result<PathBuf> {
        let template = match self.paths.get(role.key()) {
            Some(template) => template.clone(),
            None => {
                let default_dir = role
                    .default_dir()
                    .ok_or_else(|| Error::UnknownSystemPath(role.key().to_string()))?;
                debug!("{} not configured, falling back to {}", role, default_dir);
                self.paths
                    .get(default_dir)
                    .cloned()
                    .unwrap_or_else(|| default_dir.to_string())
            }
        };
        Ok(self.anchor(&self.substitute(&template, query)))
    }

    /// Resolves `filename` inside the directory of `role`
    ///
    /// # Errors
    ///
    /// `Error::FileResolution` when `require_exists` is set and the file is absent.
    pub fn resolve_file(
        &self,
        role: DirectoryRole,
        filename: &str,
        query: &PathQuery,
        require_exists: bool,
    ) -> Result<PathBuf> {
        let dir = self.resolve_path(role, query)?;
        let path = dir.join(self.substitute(filename, query));
        if require_exists && !path.exists() {
            return Err(Error::FileResolution(path));
        }
        Ok(path)
    }

    /// Records a concrete path for `role`; the last registration wins
    pub fn register(&mut self, role: DirectoryRole, path: impl AsRef<Path>) {
        self.paths
            .insert(role.key().to_string(), path.as_ref().display().to_string());
    }

    fn substitute(&self, template: &str, query: &PathQuery) -> String {
        Substitution::new()
            .basedtg(query.basedtg)
            .validtime(query.validtime)
            .member(query.member)
            .vars(&self.vars)
            .apply(template)
    }

    fn anchor(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> SystemPathResolver {
        let paths = BTreeMap::from([
            ("exp_dir".to_string(), "/exp".to_string()),
            ("wrk_dir".to_string(), "/scratch/wrk/@YYYY@@MM@@DD@_@HH@/@E@".to_string()),
            ("default_obs_dir".to_string(), "/obs/@YYYY@/@MM@".to_string()),
        ]);
        SystemPathResolver::new(paths, "/exp")
    }

    fn dtg() -> CycleTimestamp {
        CycleTimestamp::parse("2023010106").unwrap()
    }

    #[test]
    fn test_configured_template() {
        let query = PathQuery::new().member(Some(1)).basedtg(dtg());
        let wrk = resolver().resolve_path(DirectoryRole::Work, &query).unwrap();
        assert_eq!(wrk, PathBuf::from("/scratch/wrk/20230101_06/mbr001"));
    }

    #[test]
    fn test_default_dir_entry() {
        let query = PathQuery::new().basedtg(dtg());
        let obs = resolver().resolve_path(DirectoryRole::Observation, &query).unwrap();
        assert_eq!(obs, PathBuf::from("/obs/2023/01"));
    }

    #[test]
    fn test_default_dir_name_under_base_root_is_deterministic() {
        let r = resolver();
        let query = PathQuery::new().basedtg(dtg());
        let first = r.resolve_path(DirectoryRole::Archive, &query).unwrap();
        let second = r.resolve_path(DirectoryRole::Archive, &query).unwrap();
        assert_eq!(first, PathBuf::from("/exp/default_archive_dir"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_role_without_default() {
        let r = SystemPathResolver::new(BTreeMap::new(), "/exp");
        let result = r.resolve_path(DirectoryRole::ExperimentLibrary, &PathQuery::new());
        assert!(matches!(result, Err(Error::UnknownSystemPath(key)) if key == "sfx_exp_lib"));
    }

    #[test]
    fn test_register_last_write_wins() {
        let mut r = resolver();
        r.register(DirectoryRole::Archive, "/archive/a");
        r.register(DirectoryRole::Archive, "/archive/b");
        let archive = r.resolve_path(DirectoryRole::Archive, &PathQuery::new()).unwrap();
        assert_eq!(archive, PathBuf::from("/archive/b"));
    }

    #[test]
    fn test_resolve_file_existence() {
        let dir = tempfile::tempdir().unwrap();
        let mut r = resolver();
        r.register(DirectoryRole::Observation, dir.path());

        let missing = r.resolve_file(DirectoryRole::Observation, "qc_x.json", &PathQuery::new(), true);
        assert!(matches!(missing, Err(Error::FileResolution(p)) if p == dir.path().join("qc_x.json")));

        let unchecked = r
            .resolve_file(DirectoryRole::Observation, "qc_x.json", &PathQuery::new(), false)
            .unwrap();
        assert_eq!(unchecked, dir.path().join("qc_x.json"));

        std::fs::write(dir.path().join("qc_x.json"), "{}").unwrap();
        let present = r
            .resolve_file(DirectoryRole::Observation, "qc_x.json", &PathQuery::new(), true)
            .unwrap();
        assert_eq!(present, unchecked);
    }

    #[test]
    fn test_relative_template_is_anchored() {
        let paths = BTreeMap::from([("climdir".to_string(), "climate".to_string())]);
        let r = SystemPathResolver::new(paths, "/exp");
        let clim = r.resolve_path(DirectoryRole::Climate, &PathQuery::new()).unwrap();
        assert_eq!(clim, PathBuf::from("/exp/climate"));
    }
}
