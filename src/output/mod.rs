//! Output formatters for sync reports and stored articles.
//!
//! - [`text`]: human-readable lines, matching what the log shows
//! - [`json`]: machine-readable documents for scripting
//!
//! # Example
//!
//! ```no_run
//! use mdsync::error::ExitCode;
//! use mdsync::output::json::JsonSyncOutput;
//! # fn report() -> mdsync::sync::SyncReport { unimplemented!() }
//!
//! let output = JsonSyncOutput::new(&report(), ExitCode::Success);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonSyncOutput;
pub use text::{write_page, write_record, write_summary};
