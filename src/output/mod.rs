//! Output formatters for reports.
//!
//! - text for terminals and the session log
//! - JSON for automation and scripting
//! - CSV for spreadsheet import, including the neuropsych XML table
//!
//! # Example
//!
//! ```no_run
//! use labqc::config::Config;
//! use labqc::output::TextOutput;
//! use labqc::validate::Validator;
//! use std::path::Path;
//!
//! let validator = Validator::from_config(&Config::default());
//! let report = validator.review_folder(Path::new("/data/40001001")).unwrap();
//! print!("{}", TextOutput::new(&[report]).colored());
//! ```

pub mod csv;
pub mod json;
pub mod session_log;
pub mod text;

pub use csv::{write_xml_table, CsvOutput, CsvOutputError};
pub use json::{JsonOutput, JsonOutputError};
pub use session_log::SessionLog;
pub use text::TextOutput;
