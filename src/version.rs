use crate::error::Error;
use once_cell::sync;
use regex::Regex;
use std::fmt::{Display, Formatter};

/// Upstream release version, `MAJOR.MINOR[.PATCH]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl Version {
    /// Parse versions like "7.2" or "7.0.1". Leading zeros are rejected, so a parsed
    /// version is always displayed exactly as it was written.
    pub fn parse(s: &str) -> Result<Self, Error> {
        static V_RE: sync::Lazy<Regex> = sync::Lazy::new(|| {
            Regex::new(r"^(0|[1-9]\d*)\.(0|[1-9]\d*)(?:\.(0|[1-9]\d*))?$").expect("must compile")
        });

        let invalid = || Error::InvalidVersion(s.to_string());
        let caps = V_RE.captures(s).ok_or_else(invalid)?;
        let number = |idx: usize| -> Result<Option<u32>, Error> {
            caps.get(idx)
                .map(|m| m.as_str().parse::<u32>().map_err(|_| invalid()))
                .transpose()
        };

        Ok(Version {
            major: number(1)?.ok_or_else(invalid)?,
            minor: number(2)?.ok_or_else(invalid)?,
            patch: number(3)?,
        })
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        Ok(())
    }
}
