//! Layered application configuration.
//!
//! Every lookup table the engine compares against lives here and is passed
//! into the engine explicitly. Sources, lowest precedence first:
//!
//! 1. built-in defaults ([`Config::default`])
//! 2. a TOML file (`--config <path>`, or `config.toml` in the platform
//!    config directory)
//! 3. environment variables prefixed `LABQC_`, with `__` for nesting
//!    (`LABQC_NEURO__ID_LENGTH=9`)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::classify::{Category, NameLayout, RuleTable, SecondRunRule};
use crate::site::Site;

/// Expected version and per-category file counts for one experiment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expectation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub counts: BTreeMap<Category, usize>,
}

/// Experiment code → [`Expectation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectationTable {
    experiments: BTreeMap<String, Expectation>,
}

impl Default for ExpectationTable {
    fn default() -> Self {
        Self::erp()
    }
}

impl ExpectationTable {
    /// The standard ERP battery.
    #[must_use]
    pub fn erp() -> Self {
        let mut table = Self::empty();
        for (exp, n) in [
            ("vp3", 3),
            ("cpt", 6),
            ("ern", 4),
            ("ant", 4),
            ("aod", 2),
            ("anr", 2),
            ("stp", 2),
            ("gng", 2),
        ] {
            table.set_count(exp, Category::Avg, n);
            table.set_count(exp, Category::Ps, 1);
        }
        for exp in ["eeo", "eec", "vp3", "cpt", "ern", "ant", "aod", "ans", "stp", "gng"] {
            table.set_count(exp, Category::Cnt, 1);
        }
        for exp in ["vp3", "cpt", "ern", "ant", "aod", "ans", "stp", "gng"] {
            table.set_count(exp, Category::Dat, 1);
        }
        for (exp, version) in [
            ("eeo", "4"),
            ("eec", "4"),
            ("vp3", "6"),
            ("cpt", "4"),
            ("ern", "9"),
            ("ant", "6"),
            ("aod", "7"),
            ("ans", "5"),
            ("stp", "3"),
            ("gng", "3"),
        ] {
            table.set_version(exp, version);
        }
        table
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            experiments: BTreeMap::new(),
        }
    }

    pub fn set_count(&mut self, experiment: &str, category: Category, count: usize) {
        self.experiments
            .entry(experiment.to_string())
            .or_default()
            .counts
            .insert(category, count);
    }

    pub fn set_version(&mut self, experiment: &str, version: &str) {
        self.experiments
            .entry(experiment.to_string())
            .or_default()
            .version = Some(version.to_string());
    }

    #[must_use]
    pub fn get(&self, experiment: &str) -> Option<&Expectation> {
        self.experiments.get(experiment)
    }

    #[must_use]
    pub fn version(&self, experiment: &str) -> Option<&str> {
        self.get(experiment).and_then(|e| e.version.as_deref())
    }

    /// `(experiment, expected count)` for every experiment with an
    /// expectation in `category`.
    pub fn counts_for(&self, category: Category) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.experiments
            .iter()
            .filter_map(move |(exp, e)| e.counts.get(&category).map(|&n| (exp.as_str(), n)))
    }

    /// Categories that have at least one expectation, in category order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.counts_for(*c).next().is_some())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expectation)> {
        self.experiments.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }
}

/// Naming-rule settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub second_run_enabled: bool,
    pub second_run: SecondRunRule,
    pub layout: NameLayout,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            second_run_enabled: true,
            second_run: SecondRunRule::default(),
            layout: NameLayout::default(),
        }
    }
}

impl ClassifierConfig {
    /// The ERP rule table with these overrides applied.
    #[must_use]
    pub fn rule_table(&self) -> RuleTable {
        let second_run = self.second_run_enabled.then(|| self.second_run.clone());
        RuleTable::erp()
            .with_second_run(second_run)
            .with_layout(self.layout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrayConfig {
    /// A file is allowed when its name ends with one of these.
    pub allowed_suffixes: Vec<String>,
}

impl Default for StrayConfig {
    fn default() -> Self {
        Self {
            allowed_suffixes: strings(&[
                "_rr.cnt", "_32.cnt", "_orig.cnt", "avg", "avg.ps", "dat", "txt", "sub",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Files whose subject ID and run letter take part in the identity check.
    pub suffixes: Vec<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            suffixes: strings(&["_32.cnt", "_orig.cnt", "_avg.ps", ".avg", "dat"]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuroConfig {
    pub experiments: Vec<String>,
    pub files_per_extension: usize,
    pub id_length: usize,
    pub latest_dob_year: i32,
}

impl Default for NeuroConfig {
    fn default() -> Self {
        Self {
            experiments: strings(&["TOLT", "CBST"]),
            files_per_extension: 2,
            id_length: 8,
            latest_dob_year: 2010,
        }
    }
}

/// Peak-pick archive layout and expected `.mt` pick tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeaksConfig {
    pub root: PathBuf,
    /// `{exp}` is replaced by the experiment code.
    pub dir_template: String,
    pub reject_dir: String,
    /// Last-token extensions an accepted subject must have, all of them.
    pub extensions: Vec<String>,
    /// Experiment → `<condition>_<peak>` → expected number of picks.
    pub expected_picks: BTreeMap<String, BTreeMap<String, usize>>,
}

impl Default for PeaksConfig {
    fn default() -> Self {
        let picks = |keys: &[&str]| -> BTreeMap<String, usize> {
            keys.iter().map(|k| ((*k).to_string(), 61)).collect()
        };
        let mut expected_picks = BTreeMap::new();
        expected_picks.insert("aod".to_string(), picks(&["1_N1", "2_P2", "2_N1", "1_P3"]));
        expected_picks.insert(
            "vp3".to_string(),
            picks(&["1_N1", "2_N1", "3_N1", "1_P3", "2_P3", "3_P3"]),
        );
        expected_picks.insert(
            "ant".to_string(),
            picks(&["1_N4", "2_N4", "3_N4", "1_P3", "2_P3", "3_P3"]),
        );

        Self {
            root: PathBuf::from("/vol01/active_projects/HBNL"),
            dir_template: "{exp}_phase4__NewPPicker_peaks_2018".to_string(),
            reject_dir: "reject".to_string(),
            extensions: strings(&["h1", "mt", "pdf"]),
            expected_picks,
        }
    }
}

impl PeaksConfig {
    /// `<root>/<template(exp)>/<site>`.
    #[must_use]
    pub fn accepted_dir(&self, experiment: &str, site: Site) -> PathBuf {
        self.root
            .join(self.dir_template.replace("{exp}", experiment))
            .join(site.name())
    }

    /// `<root>/<template(exp)>/<site>/<reject>`.
    #[must_use]
    pub fn rejected_dir(&self, experiment: &str, site: Site) -> PathBuf {
        self.accepted_dir(experiment, site).join(&self.reject_dir)
    }
}

/// Filter settings passed to the averaging tool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub lowpass: f64,
    pub highpass: f64,
    pub threshold: u32,
}

/// External programs and their parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub cnt_to_h1: String,
    pub h1_to_avg: String,
    pub plot: String,
    pub raw_data_check: String,
    pub file_size_check: String,
    pub default_filter: FilterParams,
    /// Per-experiment overrides of `default_filter`.
    pub filters: BTreeMap<String, FilterParams>,
    pub baseline: [i32; 2],
}

impl Default for ToolsConfig {
    fn default() -> Self {
        let mut filters = BTreeMap::new();
        filters.insert(
            "ant".to_string(),
            FilterParams {
                lowpass: 8.0,
                highpass: 0.03,
                threshold: 75,
            },
        );
        filters.insert(
            "ans".to_string(),
            FilterParams {
                lowpass: 16.0,
                highpass: 0.03,
                threshold: 100,
            },
        );

        Self {
            cnt_to_h1: "create_cnthdf1_from_cntneuroX.sh".to_string(),
            h1_to_avg: "create_avghdf1_from_cnthdf1X".to_string(),
            plot: "plot_hdf1_data.sh".to_string(),
            raw_data_check: "ERP-raw-data_check.sh".to_string(),
            file_size_check: "DVD-file-size_check.sh".to_string(),
            default_filter: FilterParams {
                lowpass: 16.0,
                highpass: 0.03,
                threshold: 75,
            },
            filters,
            baseline: [-125, 0],
        }
    }
}

impl ToolsConfig {
    #[must_use]
    pub fn filter_for(&self, experiment: &str) -> FilterParams {
        self.filters
            .get(experiment)
            .copied()
            .unwrap_or(self.default_filter)
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub expectations: ExpectationTable,
    pub classifier: ClassifierConfig,
    pub strays: StrayConfig,
    pub identity: IdentityConfig,
    pub neuro: NeuroConfig,
    pub peaks: PeaksConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Load defaults, then the TOML file, then `LABQC_*` variables.
    ///
    /// With `path == None` the platform config file is used when it
    /// exists.
    ///
    /// # Errors
    ///
    /// Fails when an explicit `path` does not exist or when any source
    /// does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default_path) = Self::config_path().filter(|p| p.exists()) {
                    log::debug!("Using config file {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        figment
            .merge(Env::prefixed("LABQC_").split("__"))
            .extract()
            .context("Invalid configuration")
    }

    /// `config.toml` in the platform-specific configuration directory.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "labqc", "labqc").map(|d| d.config_dir().join("config.toml"))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_expectations() {
        let table = ExpectationTable::erp();
        assert_eq!(table.get("cpt").unwrap().counts[&Category::Avg], 6);
        assert_eq!(table.get("eeo").unwrap().counts.get(&Category::Avg), None);
        assert_eq!(table.version("ern"), Some("9"));
        assert_eq!(table.version("anr"), None);
        assert_eq!(table.counts_for(Category::Cnt).count(), 10);
        assert_eq!(table.counts_for(Category::Dat).count(), 8);
        assert_eq!(
            table.categories(),
            vec![Category::Cnt, Category::Dat, Category::Ps, Category::Avg]
        );
    }

    #[test]
    fn test_filter_for() {
        let tools = ToolsConfig::default();
        assert_eq!(tools.filter_for("ant").lowpass, 8.0);
        assert_eq!(tools.filter_for("ans").threshold, 100);
        assert_eq!(tools.filter_for("vp3").threshold, 75);
    }

    #[test]
    fn test_peak_dirs() {
        let peaks = PeaksConfig {
            root: PathBuf::from("/peaks"),
            ..PeaksConfig::default()
        };
        assert_eq!(
            peaks.rejected_dir("vp3", Site::Suny),
            PathBuf::from("/peaks/vp3_phase4__NewPPicker_peaks_2018/suny/reject")
        );
    }

    #[test]
    fn test_classifier_config_disables_second_run() {
        let config = ClassifierConfig {
            second_run_enabled: false,
            ..ClassifierConfig::default()
        };
        assert!(config.rule_table().second_run().is_none());
        assert!(ClassifierConfig::default().rule_table().second_run().is_some());
    }
}
