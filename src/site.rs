//! The six collection sites and subject-ID/site cross-validation.
//!
//! A subject ID's leading digit names the site that collected it:
//! `1` uconn, `2` indiana, `3` iowa, `4` suny, `5` washu, `6` ucsd.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Uconn,
    Indiana,
    Iowa,
    Suny,
    Washu,
    Ucsd,
}

/// Site-level precondition failures. Any of these aborts the operation
/// before the filesystem is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SiteError {
    #[error("{0} is not a known site name")]
    UnknownSite(String),

    #[error("{id} does not match site name {site}")]
    Mismatch { id: String, site: Site },

    #[error("There are participants from different sites in this folder. ID prefixes = {0:?}")]
    MixedSites(BTreeSet<char>),

    #[error("No subject IDs found to check against site {0}")]
    NoSubjects(Site),
}

impl Site {
    pub const ALL: [Site; 6] = [
        Site::Uconn,
        Site::Indiana,
        Site::Iowa,
        Site::Suny,
        Site::Washu,
        Site::Ucsd,
    ];

    /// Directory name used for this site in the archives.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Uconn => "uconn",
            Self::Indiana => "indiana",
            Self::Iowa => "iowa",
            Self::Suny => "suny",
            Self::Washu => "washu",
            Self::Ucsd => "ucsd",
        }
    }

    /// Leading subject-ID digit for this site.
    #[must_use]
    pub fn digit(self) -> char {
        match self {
            Self::Uconn => '1',
            Self::Indiana => '2',
            Self::Iowa => '3',
            Self::Suny => '4',
            Self::Washu => '5',
            Self::Ucsd => '6',
        }
    }

    #[must_use]
    pub fn from_digit(digit: char) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.digit() == digit)
    }

    /// Site that collected `subject_id`, from its first character.
    #[must_use]
    pub fn of_subject(subject_id: &str) -> Option<Self> {
        subject_id.chars().next().and_then(Self::from_digit)
    }

    /// Check that `subject_id` belongs to this site.
    ///
    /// # Errors
    ///
    /// [`SiteError::Mismatch`] when the leading digit names another site
    /// or no site at all.
    pub fn check_subject(self, subject_id: &str) -> Result<(), SiteError> {
        if Self::of_subject(subject_id) == Some(self) {
            Ok(())
        } else {
            Err(SiteError::Mismatch {
                id: subject_id.to_string(),
                site: self,
            })
        }
    }

    /// Check that every ID shares one leading digit and that it is this
    /// site's digit.
    ///
    /// # Errors
    ///
    /// [`SiteError::NoSubjects`], [`SiteError::MixedSites`] or
    /// [`SiteError::Mismatch`].
    pub fn check_all<'a, I>(self, subject_ids: I) -> Result<(), SiteError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: Vec<&str> = subject_ids.into_iter().collect();
        let prefixes: BTreeSet<char> = ids.iter().filter_map(|id| id.chars().next()).collect();
        match prefixes.len() {
            0 => Err(SiteError::NoSubjects(self)),
            1 => ids.first().map_or(Ok(()), |id| self.check_subject(id)),
            _ => Err(SiteError::MixedSites(prefixes)),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Site {
    type Err = SiteError;

    /// Accepts the directory name, case-insensitively, plus `indy` for
    /// Indiana.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "indy" {
            return Ok(Self::Indiana);
        }
        Self::ALL
            .into_iter()
            .find(|site| site.name() == lower)
            .ok_or_else(|| SiteError::UnknownSite(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_round_trip() {
        for site in Site::ALL {
            assert_eq!(Site::from_digit(site.digit()), Some(site));
        }
        assert_eq!(Site::from_digit('7'), None);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("suny".parse::<Site>().unwrap(), Site::Suny);
        assert_eq!("Indy".parse::<Site>().unwrap(), Site::Indiana);
        assert_eq!("indiana".parse::<Site>().unwrap(), Site::Indiana);
        assert!(matches!(
            "mars".parse::<Site>(),
            Err(SiteError::UnknownSite(_))
        ));
    }

    #[test]
    fn test_check_subject() {
        assert!(Site::Suny.check_subject("40001001").is_ok());
        let err = Site::Suny.check_subject("30001001").unwrap_err();
        assert_eq!(err.to_string(), "30001001 does not match site name suny");
        assert!(Site::Suny.check_subject("").is_err());
    }

    #[test]
    fn test_check_all() {
        assert!(Site::Washu.check_all(["50001001", "50002002"]).is_ok());
        assert!(matches!(
            Site::Washu.check_all(["50001001", "40002002"]),
            Err(SiteError::MixedSites(_))
        ));
        assert!(matches!(
            Site::Washu.check_all(["40002002"]),
            Err(SiteError::Mismatch { .. })
        ));
        assert!(matches!(
            Site::Washu.check_all(Vec::<&str>::new()),
            Err(SiteError::NoSubjects(_))
        ));
    }
}
