use crate::core::CycleTimestamp;
use std::collections::BTreeMap;

/// Substitutes `@TOKEN@` placeholders in configuration values and path templates
///
/// Supported tokens:
/// * base time: `@YYYY@ @YY@ @MM@ @DD@ @HH@ @mm@`
/// * valid time: `@YYYY_LL@ @MM_LL@ @DD_LL@ @HH_LL@ @mm_LL@`
/// * lead time in hours (needs both times): `@LL@ @LLL@ @LLLL@`
/// * ensemble member: `@E@` (`mbr003`) and `@EE@` (`003`)
/// * any system variable `@NAME@`
#[derive(Debug, Clone, Default)]
pub struct Substitution<'a> {
    basedtg: Option<CycleTimestamp>,
    validtime: Option<CycleTimestamp>,
    member: Option<u32>,
    vars: Option<&'a BTreeMap<String, String>>,
}

impl<'a> Substitution<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn basedtg(mut self, basedtg: Option<CycleTimestamp>) -> Self {
        self.basedtg = basedtg;
        self
    }

    pub fn validtime(mut self, validtime: Option<CycleTimestamp>) -> Self {
        self.validtime = validtime;
        self
    }

    pub fn member(mut self, member: Option<u32>) -> Self {
        self.member = member;
        self
    }

    pub fn vars(mut self, vars: &'a BTreeMap<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Returns `template` with every known placeholder replaced
    pub fn apply(&self, template: &str) -> String {
        if !template.contains('@') {
            return template.to_string();
        }

        let mut out = template.to_string();

        if let Some(base) = self.basedtg {
            out = replace_time(&out, base, "");
        }
        if let Some(valid) = self.validtime {
            out = replace_time(&out, valid, "_LL");
        }
        if let (Some(base), Some(valid)) = (self.basedtg, self.validtime) {
            let lead = (valid - base).num_hours();
            out = out
                .replace("@LLLL@", &format!("{lead:04}"))
                .replace("@LLL@", &format!("{lead:03}"))
                .replace("@LL@", &format!("{lead:02}"));
        }
        if let Some(member) = self.member {
            out = out
                .replace("@EE@", &format!("{member:03}"))
                .replace("@E@", &format!("mbr{member:03}"));
        }
        if let Some(vars) = self.vars {
            for (key, value) in vars {
                out = out.replace(&format!("@{key}@"), value);
            }
        }
        out
    }
}

fn replace_time(template: &str, time: CycleTimestamp, suffix: &str) -> String {
    let mut out = template.to_string();
    for (token, fmt) in [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MM", "%m"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("mm", "%M"),
    ] {
        // Valid time has no two-digit year token.
        if suffix.is_empty() || token != "YY" {
            out = out.replace(&format!("@{token}{suffix}@"), &time.strftime(fmt));
        }
    }
    out
}
