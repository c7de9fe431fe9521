//! The ERP suffix rule table.
//!
//! Each rule maps a filename suffix to a semantic [`Category`]. A name can
//! match several rules; the first matching rule decides how the name is
//! tokenized. The second-run heuristic is kept as its own named rule so
//! it can be overridden or switched off from configuration.

use serde::{Deserialize, Serialize};

use super::tokenize::{tokenize, Delimiters, NameLayout};

/// Semantic bucket a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Continuous recording, `_32.cnt`.
    Cnt,
    /// `.dat` behavioral data.
    Dat,
    /// Averaged plot, `_avg.ps`.
    Ps,
    /// Averaged waveform, `.avg`.
    Avg,
    /// `_orig.cnt`.
    OrigCnt,
    /// `_32_original.cnt`, never expected in a clean folder.
    BadOrig,
    /// Re-acquired recording (`_rr.cnt` or second-run `_32.cnt`).
    Rerun,
    /// `_cnt.h1`.
    CntH1,
    /// `_avg.h1`.
    H1,
    /// `_avg.h1.ps`.
    H1Ps,
}

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Cnt,
        Category::Dat,
        Category::Ps,
        Category::Avg,
        Category::OrigCnt,
        Category::BadOrig,
        Category::Rerun,
        Category::CntH1,
        Category::H1,
        Category::H1Ps,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cnt => "cnt",
            Self::Dat => "dat",
            Self::Ps => "ps",
            Self::Avg => "avg",
            Self::OrigCnt => "orig_cnt",
            Self::BadOrig => "bad_orig",
            Self::Rerun => "rerun",
            Self::CntH1 => "cnt_h1",
            Self::H1 => "h1",
            Self::H1Ps => "h1_ps",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// One suffix predicate and how to tokenize names it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRule {
    pub suffix: &'static str,
    pub category: Category,
    pub delimiters: Delimiters,
}

const fn rule(suffix: &'static str, category: Category, delimiters: Delimiters) -> SuffixRule {
    SuffixRule {
        suffix,
        category,
        delimiters,
    }
}

/// Marks a `_32.cnt` recording as a second run when one character of one
/// token equals `marker` (e.g. run token `a2`).
///
/// This mirrors a single site's naming habit and should be confirmed by
/// whoever owns the naming convention before it is generalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondRunRule {
    pub suffix: String,
    pub token: usize,
    pub position: usize,
    pub marker: char,
}

impl Default for SecondRunRule {
    fn default() -> Self {
        Self {
            suffix: "_32.cnt".to_string(),
            token: 2,
            position: 1,
            marker: '2',
        }
    }
}

impl SecondRunRule {
    /// Whether `name` is a second-run recording under this rule.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        if !name.ends_with(&self.suffix) {
            return false;
        }
        tokenize(name, Delimiters::Underscore)
            .get(self.token)
            .and_then(|token| token.chars().nth(self.position))
            == Some(self.marker)
    }
}

/// The full, ordered ERP rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<SuffixRule>,
    second_run: Option<SecondRunRule>,
    layout: NameLayout,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::erp()
    }
}

impl RuleTable {
    /// The standard ERP rule table.
    #[must_use]
    pub fn erp() -> Self {
        use Category::*;
        use Delimiters::*;

        Self {
            rules: vec![
                rule("_32.cnt", Cnt, Underscore),
                rule("dat", Dat, UnderscoreDotUpper),
                rule("_avg.ps", Ps, Underscore),
                rule(".avg", Avg, UnderscoreDotUpper),
                rule("_orig.cnt", OrigCnt, Underscore),
                rule("_32_original.cnt", BadOrig, Underscore),
                rule("_rr.cnt", Rerun, Underscore),
                rule("_cnt.h1", CntH1, Underscore),
                rule("_avg.h1", H1, Underscore),
                rule("_avg.h1.ps", H1Ps, Underscore),
            ],
            second_run: Some(SecondRunRule::default()),
            layout: NameLayout::default(),
        }
    }

    /// Replace (or disable, with `None`) the second-run rule.
    #[must_use]
    pub fn with_second_run(mut self, rule: Option<SecondRunRule>) -> Self {
        self.second_run = rule;
        self
    }

    #[must_use]
    pub fn with_layout(mut self, layout: NameLayout) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn layout(&self) -> &NameLayout {
        &self.layout
    }

    #[must_use]
    pub fn second_run(&self) -> Option<&SecondRunRule> {
        self.second_run.as_ref()
    }

    /// Every suffix rule matching `name`, in table order.
    pub fn matching<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a SuffixRule> + 'a {
        self.rules.iter().filter(move |r| name.ends_with(r.suffix))
    }
}
