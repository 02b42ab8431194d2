use crate::core::observations::{is_snow_cycle, snow_assimilation_hours, ObservationTable};
use crate::core::{DirectoryRole, Task, TaskContext};
use crate::errors::{Error, Result};
use crate::surfex::{AnalysisInput, SodaRequest, SurfaceLibrary};
use tracing::info;

/// Converts the OI analyses of the cycle into a SODA observation file
#[derive(Debug)]
pub struct Oi2soda;

impl Task for Oi2soda {
    fn execute(&self, ctx: &TaskContext, library: &dyn SurfaceLibrary) -> Result<()> {
        let dtg = ctx.times.current;
        let obfile = format!("OBSERVATIONS_{}.DAT", dtg.strftime("%y%m%dH%H"));
        let output =
            ctx.paths
                .resolve_file(DirectoryRole::Observation, &obfile, &ctx.cycle_query(), false)?;

        let table = ObservationTable::from_config(&ctx.config, ctx.member)?;
        let snow_hours = snow_assimilation_hours(&ctx.config, ctx.member)?;
        let snow_cycle = is_snow_cycle(&snow_hours, dtg);

        let mut request = SodaRequest {
            dtg,
            t2m: None,
            rh2m: None,
            sd: None,
            output,
        };
        for var in table.soda_variables(snow_cycle) {
            let canonical = ctx.translation.canonical(var)?;
            let input = Some(AnalysisInput {
                file: ctx.archive.join(format!("an_{canonical}.nc")),
                var: canonical.to_string(),
            });
            let slot = match var {
                "t2m" => &mut request.t2m,
                "rh2m" => &mut request.rh2m,
                "sd" => &mut request.sd,
                other => return Err(Error::UnsupportedVariable(other.to_string())),
            };
            *slot = input;
        }

        info!(
            "Writing {} (snow cycle: {})",
            request.output.display(),
            snow_cycle
        );
        library.oi2soda(ctx.workdir(), &request)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::TaskKind;
    use crate::surfex::AnalysisInput;
    use crate::testing::{Fixture, LibraryCall, RecordingLibrary};
    use serde_json::json;

    fn fixture(snow_cycles: serde_json::Value) -> Fixture {
        Fixture::new()
            .set("SURFEX#ASSIM#OBS#NNCO", json!([1, 1, 0, 0, 1]))
            .set("SURFEX#ASSIM#OBS#COBS_M", json!(["T2M", "RH2M", "X", "X", "SWE"]))
            .set("SURFEX#ASSIM#ISBA#UPDATE_SNOW_CYCLES", snow_cycles)
    }

    #[test]
    fn test_snow_cycle_includes_snow_depth() {
        let fixture = fixture(json!(["00", "12"]));
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::Oi2soda, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::Oi2soda(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(
            request.output,
            fixture.path("obs/2023010100/OBSERVATIONS_230101H00.DAT")
        );
        assert_eq!(
            request.t2m,
            Some(AnalysisInput {
                file: fixture.path("archive/2023010100/an_air_temperature_2m.nc"),
                var: "air_temperature_2m".to_string(),
            })
        );
        assert!(request.rh2m.is_some());
        assert_eq!(
            request.sd.as_ref().map(|sd| sd.file.clone()),
            Some(fixture.path("archive/2023010100/an_surface_snow_thickness.nc"))
        );
    }

    #[test]
    fn test_other_cycles_skip_snow_depth() {
        let fixture = fixture(json!([6]));
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::Oi2soda, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::Oi2soda(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert!(request.t2m.is_some());
        assert!(request.rh2m.is_some());
        assert_eq!(request.sd, None);
    }

    #[test]
    fn test_each_variable_fills_its_own_input() {
        let fixture = Fixture::new()
            .set("SURFEX#ASSIM#OBS#NNCO", json!([0, 1, 0, 0, 0]))
            .set("SURFEX#ASSIM#OBS#COBS_M", json!(["T2M", "RH2M", "X", "X", "SWE"]))
            .set("SURFEX#ASSIM#ISBA#UPDATE_SNOW_CYCLES", json!(["00"]));
        let library = RecordingLibrary::new();
        fixture.run(TaskKind::Oi2soda, &library).unwrap();

        let calls = library.calls();
        let LibraryCall::Oi2soda(request) = &calls[0] else {
            panic!("unexpected call {calls:?}");
        };
        assert_eq!(request.t2m, None);
        assert_eq!(request.sd, None);
        assert_eq!(
            request.rh2m.as_ref().map(|rh2m| rh2m.var.as_str()),
            Some("relative_humidity_2m")
        );
    }
}
