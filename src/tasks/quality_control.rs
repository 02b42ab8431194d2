use crate::core::{DirectoryRole, PathQuery, Task, TaskContext};
use crate::errors::{Error, Result};
use crate::surfex::{QualityControlRequest, SurfaceLibrary};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Indentation of the QC output JSON
const OUTPUT_INDENT: usize = 2;

/// Titan quality control of the observations of one variable
///
/// Writes `<obs_dir>/qc_<canonical name>.json`.
#[derive(Debug)]
pub struct QualityControl;

impl Task for QualityControl {
    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        let var = ctx.variable()?;
        let canonical = ctx.translation.canonical(var)?;
        let an_time = ctx.times.current;

        let mut settings = match ctx.task_settings.as_ref().and_then(|s| s.get(var)) {
            Some(custom) => custom.clone(),
            None => default_dataset_settings(var)?,
        };

        let domain_file = match &ctx.domain_file {
            Some(file) => file.clone(),
            None => ctx
                .paths
                .resolve_path(DirectoryRole::ExperimentLibrary, &PathQuery::new())?
                .join("domain.json"),
        };
        let fg_file = ctx.paths.resolve_file(
            DirectoryRole::Archive,
            "raw.nc",
            &PathQuery::new().basedtg(an_time),
            false,
        )?;

        let object = settings.as_object_mut().ok_or_else(|| Error::ConfigValue {
            path: format!("task_settings#{var}"),
            reason: "dataset settings must be a table".to_string(),
        })?;
        object.insert("domain".to_string(), json!({ "domain_file": domain_file }));
        object.insert(
            "firstguess".to_string(),
            json!({ "fg_file": fg_file, "fg_var": canonical }),
        );

        let tests: Value = ctx
            .config
            .first_of([
                format!("OBSERVATIONS#QC#{}#TESTS", var.to_uppercase()),
                "OBSERVATIONS#QC#TESTS".to_string(),
            ])
            .member(ctx.member)
            .get()?;

        if let Some(netatmo) = settings
            .pointer_mut("/sets/netatmo")
            .and_then(Value::as_object_mut)
        {
            // The observation reader expands the date placeholders itself.
            let pattern: String = ctx
                .config
                .setting("OBSERVATIONS#NETATMO_FILEPATTERN")
                .member(ctx.member)
                .raw()
                .get()?;
            debug!("netatmo file pattern {}", pattern);
            netatmo.insert("filepattern".to_string(), Value::String(pattern));
        }
        if let Some(bufr) = settings
            .pointer_mut("/sets/bufr")
            .and_then(Value::as_object_mut)
        {
            let pattern = ctx.obsdir.join("ob@YYYY@@MM@@DD@@HH@");
            bufr.insert("filepattern".to_string(), json!(pattern));
        }

        let output = ctx.obsdir.join(format!("qc_{canonical}.json"));
        info!("Quality control of {} into {}", var, output.display());

        let request = QualityControlRequest {
            variable: var.to_string(),
            analysis_time: an_time,
            settings,
            tests,
            blacklist: json!({}),
            output,
            indent: OUTPUT_INDENT,
        };
        library.quality_control(ctx.workdir(), &request)
    }
}

/// Built-in observation sets and tests per variable
fn default_dataset_settings(var: &str) -> Result<Value> {
    let tests = |minval: f64, maxval: f64| {
        json!({
            "nometa": { "do_test": true },
            "domain": { "do_test": true },
            "blacklist": { "do_test": true },
            "redundancy": { "do_test": true },
            "plausibility": { "do_test": true, "minval": minval, "maxval": maxval }
        })
    };

    let settings = match var {
        "t2m" => json!({
            "sets": {
                "netatmo": {
                    "varname": "Temperature",
                    "filetype": "netatmo",
                    "tests": tests(200.0, 340.0)
                }
            }
        }),
        "rh2m" => json!({
            "sets": {
                "netatmo": {
                    "varname": "Humidity",
                    "filetype": "netatmo",
                    "tests": tests(0.0, 100.0)
                }
            }
        }),
        "sd" => json!({
            "sets": {
                "bufr": {
                    "varname": "totalSnowDepth",
                    "filetype": "bufr",
                    "tests": tests(0.0, 10000.0)
                }
            }
        }),
        other => return Err(Error::UnsupportedVariable(other.to_string())),
    };
    Ok(settings)
}
