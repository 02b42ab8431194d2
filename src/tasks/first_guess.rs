use super::replace_symlink;
use crate::core::{DirectoryRole, PathQuery, Task, TaskContext};
use crate::errors::{Error, Result};
use crate::surfex::SurfaceLibrary;
use std::path::PathBuf;
use tracing::info;

/// Which link in the work directory receives the first guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkTarget {
    /// `<wrk>/first_guess_sfx`
    FirstGuess,
    /// `<wrk>/fc_start_sfx`
    ForecastStart,
}

/// Links the previous cycle's surface file into the work directory
#[derive(Debug)]
pub struct FirstGuess {
    target: LinkTarget,
}

impl FirstGuess {
    pub fn first_guess() -> Self {
        Self {
            target: LinkTarget::FirstGuess,
        }
    }

    /// Variant used when cycling: the link is the forecast start file
    pub fn cycle_first_guess() -> Self {
        Self {
            target: LinkTarget::ForecastStart,
        }
    }

    fn link(&self, ctx: &TaskContext) -> PathBuf {
        match self.target {
            LinkTarget::FirstGuess => ctx.first_guess_link(),
            LinkTarget::ForecastStart => ctx.forecast_start_link(),
        }
    }
}

impl Task for FirstGuess {
    fn execute(&self, ctx: &TaskContext, _library: &dyn SurfaceLibrary) -> Result<()> {
        let suffix = surface_file_suffix(ctx)?;
        let csurffile: String = ctx
            .config
            .setting("SURFEX#IO#CSURFFILE")
            .member(ctx.member)
            .get()?;

        let query = PathQuery::new()
            .member(ctx.member)
            .basedtg(ctx.times.previous)
            .validtime(ctx.times.current);
        let fg_file = ctx.paths.resolve_file(
            DirectoryRole::FirstGuess,
            &format!("{csurffile}{suffix}"),
            &query,
            false,
        )?;

        let link = self.link(ctx);
        info!("Linking {} -> {}", link.display(), fg_file.display());
        replace_symlink(&fg_file, &link)
    }
}

/// File name extension of SURFEX files of the configured type
fn surface_file_suffix(ctx: &TaskContext) -> Result<&'static str> {
    let filetype: String = ctx
        .config
        .setting("SURFEX#IO#CSURF_FILETYPE")
        .member(ctx.member)
        .get()?;
    let lfagmap: bool = ctx
        .config
        .setting("SURFEX#IO#LFAGMAP")
        .member(ctx.member)
        .default(false)
        .get()?;

    match filetype.to_uppercase().as_str() {
        "FA" if lfagmap => Ok(".sfx"),
        "FA" => Ok(".fa"),
        "LFI" => Ok(".lfi"),
        "NC" => Ok(".nc"),
        "ASCII" => Ok(".txt"),
        _ => Err(Error::UnsupportedFileType(filetype)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::core::TaskKind;
    use crate::errors::Error;
    use crate::testing::{Fixture, RecordingLibrary};
    use rstest::rstest;
    use serde_json::json;
    use std::fs;

    fn fixture(filetype: &str, lfagmap: bool) -> Fixture {
        Fixture::new()
            .set("SURFEX#IO#CSURFFILE", json!("SURFOUT"))
            .set("SURFEX#IO#CSURF_FILETYPE", json!(filetype))
            .set("SURFEX#IO#LFAGMAP", json!(lfagmap))
    }

    #[rstest]
    #[case("NC", false, "SURFOUT.nc")]
    #[case("FA", true, "SURFOUT.sfx")]
    #[case("FA", false, "SURFOUT.fa")]
    #[case("LFI", false, "SURFOUT.lfi")]
    #[case("ASCII", false, "SURFOUT.txt")]
    fn test_links_previous_cycle_file(
        #[case] filetype: &str,
        #[case] lfagmap: bool,
        #[case] file: &str,
    ) {
        let fixture = fixture(filetype, lfagmap);
        fixture
            .run(TaskKind::FirstGuess, &RecordingLibrary::new())
            .unwrap();

        let link = fixture.path("wrk/first_guess_sfx");
        assert_eq!(
            fs::read_link(link).unwrap(),
            fixture.path("archive/2022123118").join(file)
        );
    }

    #[test]
    fn test_cycle_first_guess_replaces_stale_link() {
        let fixture = fixture("NC", false);
        let link = fixture.path("wrk/fc_start_sfx");
        fs::create_dir_all(fixture.path("wrk")).unwrap();
        std::os::unix::fs::symlink("/nonexistent/old.nc", &link).unwrap();

        fixture
            .run(TaskKind::CycleFirstGuess, &RecordingLibrary::new())
            .unwrap();

        assert_eq!(
            fs::read_link(&link).unwrap(),
            fixture.path("archive/2022123118/SURFOUT.nc")
        );
        assert!(!fixture.path("wrk/first_guess_sfx").exists());
    }

    #[test]
    fn test_unsupported_file_type() {
        let fixture = fixture("GRIB", false);
        let result = fixture.run(TaskKind::FirstGuess, &RecordingLibrary::new());
        assert!(matches!(result, Err(Error::UnsupportedFileType(t)) if t == "GRIB"));
    }
}
