use super::replace_symlink;
use crate::config::load_settings;
use crate::core::observations::positional_variables;
use crate::core::{Task, TaskContext};
use crate::errors::{Error, Result};
use crate::surfex::{FieldSource, FirstGuessRequest, SurfaceLibrary};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Converter definitions per variable and file format, relative to `exp_dir`
const CONVERTERS_FILE: &str = "config/first_guess.yml";

const DEFAULT_CACHE_TIME: u64 = 3600;

/// Fields always present in the OI first guess
const STATIC_FIELDS: [&str; 2] = ["altitude", "land_area_fraction"];

/// Builds the NetCDF first guess read by QC and OI
///
/// With a task variable a single `raw_<c>.nc` is written and `raw.nc` links to
/// it. Otherwise every variable activated in NNCO goes into `raw.nc` and each
/// `raw_<c>.nc` links to that file.
#[derive(Debug)]
pub struct FirstGuess4Oi;

impl Task for FirstGuess4Oi {
    fn accepted_args(&self) -> &'static [&'static str] {
        &["cache_time"]
    }

    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        let single = ctx
            .var_name
            .as_deref()
            .filter(|var| ctx.translation.contains(var));

        // (link, link target) pairs, created once the output exists
        let mut links: Vec<(PathBuf, String)> = Vec::new();
        let (mut variables, output) = match single {
            Some(var) => {
                let canonical = ctx.translation.canonical(var)?;
                let file = format!("raw_{canonical}.nc");
                links.push((ctx.archive.join("raw.nc"), file.clone()));
                (vec![canonical.to_string()], ctx.archive.join(file))
            }
            None => {
                let nnco: Vec<i64> = ctx
                    .config
                    .setting("SURFEX#ASSIM#OBS#NNCO")
                    .member(ctx.member)
                    .get()?;
                let mut variables = Vec::new();
                for var in positional_variables(&nnco) {
                    let canonical = ctx.translation.canonical(var)?;
                    links.push((
                        ctx.archive.join(format!("raw_{canonical}.nc")),
                        "raw.nc".to_string(),
                    ));
                    variables.push(canonical.to_string());
                }
                (variables, ctx.archive.join("raw.nc"))
            }
        };
        variables.extend(STATIC_FIELDS.iter().map(|f| f.to_string()));

        if output.exists() {
            info!("Output already exists {}", output.display());
        } else {
            let cache_time = ctx
                .args
                .parse_value::<u64>("cache_time")?
                .unwrap_or(DEFAULT_CACHE_TIME);
            let converters_file = ctx.exp_dir.join(CONVERTERS_FILE);
            let converters = load_settings(&converters_file)?;

            let sources = variables
                .iter()
                .map(|var| field_source(ctx, var, &converters, &converters_file))
                .collect::<Result<Vec<_>>>()?;

            let request = FirstGuessRequest {
                validtime: ctx.times.current,
                output: output.clone(),
                domain_file: ctx.domain_file.clone(),
                cache_time,
                sources,
                system_vars: ctx.system.clone(),
            };
            library.first_guess_for_oi(ctx.workdir(), &request)?;
        }

        for (link, target) in links {
            replace_symlink(Path::new(&target), &link)?;
        }
        Ok(())
    }
}

/// Input file, format and converter of one field
fn field_source(
    ctx: &TaskContext,
    var: &str,
    converters: &Value,
    converters_file: &Path,
) -> Result<FieldSource> {
    let setting = |name: &str| {
        ctx.config
            .first_of([
                format!("INITIAL_CONDITIONS#FG4OI#{var}#{name}"),
                format!("INITIAL_CONDITIONS#FG4OI#{name}"),
            ])
            .member(ctx.member)
    };
    let input_file: String = setting("INPUTFILE")
        .basedtg(ctx.times.previous)
        .validtime(ctx.times.current)
        .get()?;
    let file_format: String = setting("FILEFORMAT").get()?;
    let converter: String = setting("CONVERTER").get()?;
    debug!("{}: {} {} {}", var, input_file, file_format, converter);

    let mut definitions = converters
        .get(&file_format)
        .cloned()
        .ok_or_else(|| Error::ConfigKey(format!("{file_format} in {}", converters_file.display())))?;
    if let Some(defs) = definitions.as_object_mut() {
        defs.insert("filepattern".to_string(), Value::String(input_file.clone()));
    }

    let converter_config = converters
        .get(var)
        .and_then(|v| v.get(&file_format))
        .and_then(|v| v.get("converter"))
        .and_then(|v| v.get(&converter))
        .cloned()
        .ok_or_else(|| Error::MissingConverter {
            converter: converter.clone(),
            file: converters_file.to_path_buf(),
        })?;

    Ok(FieldSource {
        variable: var.to_string(),
        input_file,
        file_format,
        converter,
        definitions,
        converter_config,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use crate::core::TaskKind;
    use crate::errors::Error;
    use crate::testing::{Fixture, LibraryCall, RecordingLibrary};
    use serde_json::json;
    use std::fs;
    use std::path::PathBuf;

    const CONVERTERS: &str = r#"
netcdf:
  fcint: 10800
  offset: 0
air_temperature_2m:
  netcdf:
    converter:
      none:
        name: air_temperature_2m
relative_humidity_2m:
  netcdf:
    converter:
      none:
        name: relative_humidity_2m
surface_snow_thickness:
  netcdf:
    converter:
      none:
        name: surface_snow_thickness
altitude:
  netcdf:
    converter:
      phi2m:
        name: surface_geopotential
land_area_fraction:
  netcdf:
    converter:
      none:
        name: land_area_fraction
"#;

    fn fixture() -> Fixture {
        let fixture = Fixture::new()
            .set(
                "INITIAL_CONDITIONS#FG4OI#INPUTFILE",
                json!("/data/fc@YYYY@@MM@@DD@@HH@+@LL@.nc"),
            )
            .set("INITIAL_CONDITIONS#FG4OI#FILEFORMAT", json!("netcdf"))
            .set("INITIAL_CONDITIONS#FG4OI#CONVERTER", json!("none"))
            .set("INITIAL_CONDITIONS#FG4OI#altitude#CONVERTER", json!("phi2m"))
            .set("SURFEX#ASSIM#OBS#NNCO", json!([1, 1, 0, 0, 1]));
        let file = fixture.exp_dir().join("config/first_guess.yml");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, CONVERTERS).unwrap();
        fixture
    }

    fn archive(fixture: &Fixture, file: &str) -> PathBuf {
        fixture.path("archive/2023010100").join(file)
    }

    #[test]
    fn test_single_variable() {
        let fixture = fixture().with_var("t2m");
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::FirstGuess4Oi, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::FirstGuess(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(request.output, archive(&fixture, "raw_air_temperature_2m.nc"));
        assert_eq!(request.cache_time, 3600);
        let names: Vec<&str> = request.sources.iter().map(|s| s.variable.as_str()).collect();
        assert_eq!(names, ["air_temperature_2m", "altitude", "land_area_fraction"]);

        let t2m = &request.sources[0];
        assert_eq!(t2m.input_file, "/data/fc2022123118+06.nc");
        assert_eq!(t2m.definitions["filepattern"], "/data/fc2022123118+06.nc");
        assert_eq!(t2m.definitions["fcint"], 10800);
        assert_eq!(t2m.converter_config, json!({ "name": "air_temperature_2m" }));
        assert_eq!(request.sources[1].converter, "phi2m");

        assert_eq!(
            fs::read_link(archive(&fixture, "raw.nc")).unwrap(),
            PathBuf::from("raw_air_temperature_2m.nc")
        );
    }

    #[test]
    fn test_positional_variables_and_cache_time() {
        let mut fixture = fixture();
        fixture.options.args = Some("cache_time=60".to_string());
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::FirstGuess4Oi, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::FirstGuess(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(request.output, archive(&fixture, "raw.nc"));
        assert_eq!(request.cache_time, 60);
        assert_eq!(request.sources.len(), 5);
        for file in [
            "raw_air_temperature_2m.nc",
            "raw_relative_humidity_2m.nc",
            "raw_surface_snow_thickness.nc",
        ] {
            assert_eq!(
                fs::read_link(archive(&fixture, file)).unwrap(),
                PathBuf::from("raw.nc")
            );
        }
    }

    #[test]
    fn test_existing_output_short_circuits() {
        let fixture = fixture().with_var("rh2m");
        let output = archive(&fixture, "raw_relative_humidity_2m.nc");
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "fg").unwrap();

        let library = RecordingLibrary::new();
        fixture.run(TaskKind::FirstGuess4Oi, &library).unwrap();

        assert!(library.calls().is_empty());
        assert!(fs::symlink_metadata(archive(&fixture, "raw.nc")).is_ok());
    }

    #[test]
    fn test_missing_converter() {
        let fixture = fixture()
            .with_var("t2m")
            .set("INITIAL_CONDITIONS#FG4OI#CONVERTER", json!("rh2q"));
        let library = RecordingLibrary::new();
        let result = fixture.run(TaskKind::FirstGuess4Oi, &library);
        assert!(matches!(result, Err(Error::MissingConverter { converter, .. }) if converter == "rh2q"));
        assert!(library.calls().is_empty());
    }

    #[test]
    fn test_rejects_unknown_argument() {
        let mut fixture = fixture();
        fixture.options.args = Some("cachetime=60".to_string());
        let result = fixture.lifecycle(TaskKind::FirstGuess4Oi);
        assert!(matches!(result, Err(Error::UnknownArgument { key, .. }) if key == "cachetime"));
    }
}
