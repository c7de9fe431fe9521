//! Neuropsych filename conventions.
//!
//! A subject folder holds, per test session:
//! - `<id>_<EXP>_<n>_<run>_sum.txt` summary files
//! - `<id>_<EXP>_<n>_<run>.txt` detail files
//! - `<id>_<run>.xml` one session metadata file

use serde::Serialize;

use super::tokenize::{tokenize, Delimiters, NameError};

/// Which neuropsych bucket a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuroKind {
    SumTxt,
    Txt,
    Xml,
}

impl NeuroKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::SumTxt => "sum.txt",
            Self::Txt => "txt",
            Self::Xml => "xml",
        }
    }
}

/// Fields encoded in a neuropsych filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeuroName {
    pub kind: NeuroKind,
    pub subject_id: String,
    /// Experiment code; absent for XML files.
    pub experiment: Option<String>,
    /// For txt files the first character of the run token, for XML the
    /// whole run token.
    pub run_letter: String,
    /// Last token of the name, e.g. `sum.txt`, `txt` or `xml`.
    pub extension: String,
}

/// Parse a neuropsych filename.
///
/// # Errors
///
/// Returns [`NameError::TooFewTokens`] when the name does not have the
/// token count its bucket needs.
pub fn parse_neuro_name(name: &str) -> Result<NeuroName, NameError> {
    if name.ends_with("_sum.txt") {
        let tokens = tokenize(name, Delimiters::Underscore);
        require(name, &tokens, 5)?;
        return Ok(NeuroName {
            kind: NeuroKind::SumTxt,
            subject_id: tokens[0].to_string(),
            experiment: Some(tokens[1].to_string()),
            run_letter: first_char(tokens[3]),
            extension: tokens[tokens.len() - 1].to_string(),
        });
    }

    let tokens = tokenize(name, Delimiters::UnderscoreDot);
    if name.ends_with("xml") {
        require(name, &tokens, 3)?;
        return Ok(NeuroName {
            kind: NeuroKind::Xml,
            subject_id: tokens[0].to_string(),
            experiment: None,
            run_letter: tokens[1].to_string(),
            extension: tokens[tokens.len() - 1].to_string(),
        });
    }

    require(name, &tokens, 5)?;
    Ok(NeuroName {
        kind: NeuroKind::Txt,
        subject_id: tokens[0].to_string(),
        experiment: Some(tokens[1].to_string()),
        run_letter: first_char(tokens[3]),
        extension: tokens[tokens.len() - 1].to_string(),
    })
}

fn require(name: &str, tokens: &[&str], expected: usize) -> Result<(), NameError> {
    if tokens.len() < expected {
        Err(NameError::TooFewTokens {
            name: name.to_string(),
            expected,
            found: tokens.len(),
        })
    } else {
        Ok(())
    }
}

fn first_char(token: &str) -> String {
    token.chars().take(1).collect()
}
