use crate::core::{DirectoryRole, Task, TaskContext};
use crate::errors::Result;
use crate::surfex::{OiParameters, OptimalInterpolationRequest, SurfaceLibrary};
use std::fs;
use tracing::info;

/// Horizontal OI of one variable from the QC'd observations
///
/// Reads `raw_<c>.nc` from the archive and writes `an_<c>.nc` next to it.
#[derive(Debug)]
pub struct OptimalInterpolation;

impl Task for OptimalInterpolation {
    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        let var = ctx.variable()?;
        let canonical = ctx.translation.canonical(var)?;
        let section = format!("OBSERVATIONS#OI#{}", var.to_uppercase());

        let param = |name: &str| {
            ctx.config
                .setting(format!("{section}#{name}"))
                .member(ctx.member)
        };
        let params = OiParameters {
            hlength: param("HLENGTH").default(30000.0).get()?,
            vlength: param("VLENGTH").default(100000.0).get()?,
            wlength: param("WLENGTH").default(0.5).get()?,
            max_locations: param("MAX_LOCATIONS").default(20).get()?,
            elev_gradient: param("GRADIENT").default(0.0).get()?,
            epsilon: param("EPISLON").default(0.25).get()?,
            min_value: param("MINVALUE").get_opt()?,
            max_value: param("MAXVALUE").get_opt()?,
        };

        let observations_file = ctx.paths.resolve_file(
            DirectoryRole::Observation,
            &format!("qc_{canonical}.json"),
            &ctx.cycle_query(),
            true,
        )?;
        let input_file = ctx.archive.join(format!("raw_{canonical}.nc"));
        let output_file = ctx.archive.join(format!("an_{canonical}.nc"));
        if output_file.exists() {
            info!("Removing stale analysis {}", output_file.display());
            fs::remove_file(&output_file)?;
        }

        let request = OptimalInterpolationRequest {
            variable: canonical.to_string(),
            input_file,
            observations_file,
            output_file,
            params,
        };
        library.optimal_interpolation(ctx.workdir(), &request)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::TaskKind;
    use crate::errors::Error;
    use crate::testing::{Fixture, LibraryCall, RecordingLibrary};
    use serde_json::json;
    use std::fs;

    fn write_qc(fixture: &Fixture, canonical: &str) {
        let dir = fixture.path("obs/2023010100");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("qc_{canonical}.json")), "{}").unwrap();
    }

    #[test]
    fn test_defaults_and_files() {
        let fixture = Fixture::new().with_var("t2m");
        write_qc(&fixture, "air_temperature_2m");
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::OptimalInterpolation, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::OptimalInterpolation(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(request.variable, "air_temperature_2m");
        assert_eq!(
            request.input_file,
            fixture.path("archive/2023010100/raw_air_temperature_2m.nc")
        );
        assert_eq!(
            request.output_file,
            fixture.path("archive/2023010100/an_air_temperature_2m.nc")
        );
        assert_eq!(
            request.observations_file,
            fixture.path("obs/2023010100/qc_air_temperature_2m.json")
        );
        let params = &request.params;
        assert_eq!(params.hlength, 30000.0);
        assert_eq!(params.vlength, 100000.0);
        assert_eq!(params.wlength, 0.5);
        assert_eq!(params.max_locations, 20);
        assert_eq!(params.elev_gradient, 0.0);
        assert_eq!(params.epsilon, 0.25);
        assert_eq!(params.min_value, None);
        assert_eq!(params.max_value, None);
    }

    #[test]
    fn test_configured_parameters_and_stale_output() {
        let fixture = Fixture::new()
            .with_var("rh2m")
            .set("OBSERVATIONS#OI#RH2M#HLENGTH", json!(40000))
            .set("OBSERVATIONS#OI#RH2M#GRADIENT", json!(-0.0065))
            .set("OBSERVATIONS#OI#RH2M#MINVALUE", json!(0))
            .set("OBSERVATIONS#OI#RH2M#MAXVALUE", json!(100));
        write_qc(&fixture, "relative_humidity_2m");
        let stale = fixture.path("archive/2023010100/an_relative_humidity_2m.nc");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let library = RecordingLibrary::new();
        fixture.run(TaskKind::OptimalInterpolation, &library).unwrap();

        assert!(!stale.exists());
        let calls = library.calls();
        let LibraryCall::OptimalInterpolation(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(request.params.hlength, 40000.0);
        assert_eq!(request.params.elev_gradient, -0.0065);
        assert_eq!(request.params.min_value, Some(0.0));
        assert_eq!(request.params.max_value, Some(100.0));
    }

    #[test]
    fn test_missing_qc_output() {
        let fixture = Fixture::new().with_var("t2m");
        let library = RecordingLibrary::new();
        let result = fixture.run(TaskKind::OptimalInterpolation, &library);
        assert!(matches!(result, Err(Error::FileResolution(_))));
        assert!(library.calls().is_empty());
    }

    #[test]
    fn test_unknown_variable() {
        let fixture = Fixture::new().with_var("wg2");
        let library = RecordingLibrary::new();
        let result = fixture.run(TaskKind::OptimalInterpolation, &library);
        assert!(matches!(result, Err(Error::UnsupportedVariable(v)) if v == "wg2"));
        assert!(library.calls().is_empty());
    }
}
