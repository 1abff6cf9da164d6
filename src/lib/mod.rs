//! Env file loading library.
//!
//! This library parses `.env` style text, one `key = value` or `key : value`
//! declaration per line, into an in-memory map. Text can come from a string,
//! a single file or several files, and the result can be exported to the
//! process environment.
//!
//! # Format
//!
//! - Surrounding whitespace around keys and values is ignored
//! - Blank lines and lines starting with `#` are skipped
//! - `=` takes priority; `:` is only used on lines without `=`
//! - A line with no separator, or with its separator twice, is malformed
//!
//! There are no quotes, escapes, interpolation or multi-line values.
//!
//! # Features
//!
//! - **Optional tracing**: Detailed logging when the `tracing` feature is enabled
//!
//! # Example
//!
//! ```rust
//! use env_content::content::EnvContent;
//!
//! let mut env = EnvContent::new();
//! env.load_from_str("# database\nDB_HOST = localhost\nDB_PORT: 5432").unwrap();
//!
//! assert_eq!(env.get("DB_PORT").unwrap(), "5432");
//! ```

pub mod content;
pub mod parse;

pub use content::{EnvContent, EnvContentOptions, EnvError, ErrorKind, FileFailure, LoadReport};
pub use parse::DuplicateKeys;
