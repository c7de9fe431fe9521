//! Bounds-checked filename tokenizer.
//!
//! ERP filenames follow `<exp>_<version>_<run><n>_<subject>_<suffix>.<ext>`.
//! Fields are read by position after splitting on a delimiter set; a name
//! with too few tokens is a [`NameError`], never a silent mis-index.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters a filename is split on before positional field extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiters {
    /// `_` only.
    Underscore,
    /// `_` and `.`.
    UnderscoreDot,
    /// `_`, `.` and any ASCII uppercase letter (the letter is consumed).
    UnderscoreDotUpper,
}

impl Delimiters {
    fn is_delimiter(self, c: char) -> bool {
        match self {
            Self::Underscore => c == '_',
            Self::UnderscoreDot => c == '_' || c == '.',
            Self::UnderscoreDotUpper => c == '_' || c == '.' || c.is_ascii_uppercase(),
        }
    }
}

/// Split `name` on the delimiter set. Empty tokens are kept so that
/// positions stay stable.
#[must_use]
pub fn tokenize(name: &str, delimiters: Delimiters) -> Vec<&str> {
    name.split(|c: char| delimiters.is_delimiter(c)).collect()
}

/// A filename that does not have the shape its rule expects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum NameError {
    #[error("Malformed filename {name}: expected at least {expected} tokens, found {found}")]
    TooFewTokens {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Malformed filename {name}: empty {field} field")]
    EmptyField { name: String, field: &'static str },
}

/// Token positions of each semantic field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameLayout {
    pub experiment: usize,
    pub version: usize,
    pub run: usize,
    pub subject: usize,
}

impl Default for NameLayout {
    fn default() -> Self {
        Self {
            experiment: 0,
            version: 1,
            run: 2,
            subject: 3,
        }
    }
}

impl NameLayout {
    /// Smallest token count that satisfies every position.
    #[must_use]
    pub fn min_tokens(&self) -> usize {
        self.experiment
            .max(self.version)
            .max(self.run)
            .max(self.subject)
            + 1
    }
}

/// Fields extracted from a recognized filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ParsedName {
    pub experiment: String,
    pub version: String,
    /// The whole run token, e.g. `a1`.
    pub run_token: String,
    /// First character of the run token.
    pub run_letter: char,
    pub subject_id: String,
}

/// Extract the positional fields of `name` according to `layout`.
///
/// # Errors
///
/// Returns [`NameError`] when the name has fewer tokens than the layout
/// needs or when the experiment, run or subject token is empty.
pub fn parse_fields(
    name: &str,
    delimiters: Delimiters,
    layout: &NameLayout,
) -> Result<ParsedName, NameError> {
    let tokens = tokenize(name, delimiters);
    let expected = layout.min_tokens();
    if tokens.len() < expected {
        return Err(NameError::TooFewTokens {
            name: name.to_string(),
            expected,
            found: tokens.len(),
        });
    }

    let field = |idx: usize, field: &'static str| -> Result<&str, NameError> {
        let token = tokens[idx];
        if token.is_empty() {
            Err(NameError::EmptyField {
                name: name.to_string(),
                field,
            })
        } else {
            Ok(token)
        }
    };

    let experiment = field(layout.experiment, "experiment")?;
    let run_token = field(layout.run, "run")?;
    let subject_id = field(layout.subject, "subject")?;
    let version = tokens[layout.version];
    // run_token is non-empty, checked above
    let run_letter = run_token.chars().next().unwrap_or_default();

    Ok(ParsedName {
        experiment: experiment.to_string(),
        version: version.to_string(),
        run_token: run_token.to_string(),
        run_letter,
        subject_id: subject_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_underscore() {
        assert_eq!(
            tokenize("vp3_6_a1_40001001_32.cnt", Delimiters::Underscore),
            vec!["vp3", "6", "a1", "40001001", "32.cnt"]
        );
    }

    #[test]
    fn test_tokenize_upper_consumes_letter() {
        assert_eq!(
            tokenize("vp3_6_a1_40001001T.avg", Delimiters::UnderscoreDotUpper),
            vec!["vp3", "6", "a1", "40001001", "", "avg"]
        );
    }

    #[test]
    fn test_parse_fields_cnt() {
        let parsed = parse_fields(
            "cpt_4_b1_10001001_32.cnt",
            Delimiters::Underscore,
            &NameLayout::default(),
        )
        .unwrap();
        assert_eq!(parsed.experiment, "cpt");
        assert_eq!(parsed.version, "4");
        assert_eq!(parsed.run_token, "b1");
        assert_eq!(parsed.run_letter, 'b');
        assert_eq!(parsed.subject_id, "10001001");
    }

    #[test]
    fn test_parse_fields_too_few_tokens() {
        let err = parse_fields("cpt_4.avg", Delimiters::UnderscoreDot, &NameLayout::default())
            .unwrap_err();
        assert_eq!(
            err,
            NameError::TooFewTokens {
                name: "cpt_4.avg".to_string(),
                expected: 4,
                found: 3,
            }
        );
    }

    #[test]
    fn test_parse_fields_empty_run() {
        let err = parse_fields(
            "cpt_4__10001001.avg",
            Delimiters::UnderscoreDot,
            &NameLayout::default(),
        )
        .unwrap_err();
        assert!(matches!(err, NameError::EmptyField { field: "run", .. }));
    }

    #[test]
    fn test_min_tokens() {
        let layout = NameLayout {
            experiment: 1,
            version: 2,
            run: 3,
            subject: 0,
        };
        assert_eq!(layout.min_tokens(), 4);
    }
}
