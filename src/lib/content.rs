//! In-memory env content and the loaders that fill it.
//!
//! [`EnvContent`] owns a single key/value map. Each `load_*` call starts from a
//! fresh map; lines and files processed within one call accumulate into it.
//!
//! # Error reporting
//!
//! - A malformed line stops the current text or file. Pairs written before it
//!   stay in the map and remain visible through [`EnvContent::get_all`].
//! - [`EnvContent::load_from_files`] keeps going after a failed file and reports
//!   the status of the last file in the batch. An empty result always reports
//!   [`EnvError::Empty`] instead.
//!
//! # Examples
//!
//! ```rust,no_run
//! use env_content::content::EnvContent;
//!
//! let mut env = EnvContent::new();
//! env.load_from_files([".env", ".env.local"]).unwrap();
//!
//! let port = env.get("PORT").unwrap();
//! println!("listening on {port}");
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use crate::parse::{self, DuplicateKeys, ParseError};

/// Key/value pairs loaded from env text or files.
#[derive(Debug, Clone, Default)]
pub struct EnvContent {
  /// `None` until the first load or [`EnvContent::set`].
  pairs: Option<HashMap<String, String>>,
  options: EnvContentOptions,
}

impl EnvContent {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_options(options: EnvContentOptions) -> Self {
    Self {
      pairs: None,
      options,
    }
  }

  /// Replaces the current pairs with the ones parsed from `text`.
  pub fn load_from_str(&mut self, text: &str) -> Result<&HashMap<String, String>, EnvError> {
    #[cfg(feature = "tracing")]
    debug!("Loading env content from string");

    let duplicates = self.options.duplicate_keys;
    let pairs = self.pairs.insert(HashMap::new());
    parse::parse_into(text, pairs, duplicates)?;

    Ok(&*pairs)
  }

  /// Replaces the current pairs with the ones parsed from the file at `path`.
  pub fn load_from_file<P: AsRef<Path>>(
    &mut self,
    path: P,
  ) -> Result<&HashMap<String, String>, EnvError> {
    let path = path.as_ref();

    #[cfg(feature = "tracing")]
    debug!(?path, "Loading env file");

    let duplicates = self.options.duplicate_keys;
    let pairs = self.pairs.insert(HashMap::new());
    let text = read_env_file(path)?;
    parse::parse_into(&text, pairs, duplicates)?;

    Ok(&*pairs)
  }

  /// Replaces the current pairs with the ones parsed from every file in
  /// `paths`, later files overriding earlier ones.
  ///
  /// Fails with [`EnvError::Empty`] when nothing was loaded. Otherwise the
  /// result mirrors the last file: its error if it failed, success if it
  /// loaded. Use [`EnvContent::load_from_files_with_report`] to see every
  /// failure.
  pub fn load_from_files<I, P>(&mut self, paths: I) -> Result<&HashMap<String, String>, EnvError>
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    let report = self.load_from_files_with_report(paths);
    let pairs = self.pairs.get_or_insert_with(HashMap::new);

    if pairs.is_empty() {
      return Err(EnvError::Empty);
    }

    match report.into_last_file_error() {
      Some(error) => Err(error),
      None => Ok(&*pairs),
    }
  }

  /// Same load as [`EnvContent::load_from_files`], returning every per-file
  /// failure instead of a single status.
  pub fn load_from_files_with_report<I, P>(&mut self, paths: I) -> LoadReport
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    let duplicates = self.options.duplicate_keys;
    let pairs = self.pairs.insert(HashMap::new());
    let mut report = LoadReport::default();

    for (position, path) in paths.into_iter().enumerate() {
      let path = path.as_ref();
      report.files_attempted += 1;

      #[cfg(feature = "tracing")]
      trace!(?path, position, "Loading env file in batch");

      let outcome = read_env_file(path)
        .and_then(|text| parse::parse_into(&text, pairs, duplicates).map_err(EnvError::from));

      match outcome {
        Ok(_) => report.files_read += 1,
        Err(error) => {
          #[cfg(feature = "tracing")]
          debug!(?path, %error, "Skipping env file");

          report.failures.push(FileFailure {
            position,
            path: path.to_path_buf(),
            error,
          });
        }
      }
    }

    #[cfg(feature = "tracing")]
    debug!(
      "Loaded {} of {} files, {} pairs",
      report.files_read,
      report.files_attempted,
      pairs.len()
    );

    report
  }

  /// Returns the value for `key`.
  ///
  /// An absent key and a key holding an empty value both fail with
  /// [`EnvError::MissingValue`].
  pub fn get(&self, key: &str) -> Result<&str, EnvError> {
    self
      .pairs
      .as_ref()
      .and_then(|pairs| pairs.get(key))
      .map(String::as_str)
      .filter(|value| !value.is_empty())
      .ok_or_else(|| EnvError::MissingValue(key.to_string()))
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self
      .pairs
      .get_or_insert_with(HashMap::new)
      .insert(key.into(), value.into());
  }

  pub fn get_all(&self) -> Result<&HashMap<String, String>, EnvError> {
    match &self.pairs {
      Some(pairs) if !pairs.is_empty() => Ok(pairs),
      _ => Err(EnvError::EmptyMap),
    }
  }

  /// Copies every pair into the process environment and returns how many
  /// variables were set.
  ///
  /// Pairs the platform can't represent (empty key, `=` or NUL in the key,
  /// NUL in the value) are skipped without error.
  ///
  /// # Safety
  ///
  /// This writes through [`std::env::set_var`]. The caller must ensure no
  /// other thread reads or writes the process environment while it runs.
  pub unsafe fn export_to_env(&self) -> Result<usize, EnvError> {
    let pairs = self.pairs.as_ref().ok_or(EnvError::EmptyMap)?;
    let mut exported = 0;

    for (key, value) in pairs {
      if !is_exportable(key, value) {
        #[cfg(feature = "tracing")]
        trace!("Skipping unexportable variable {:?}", key);
        continue;
      }

      // SAFETY: upheld by the caller, see above.
      unsafe { std::env::set_var(key, value) };
      exported += 1;
    }

    #[cfg(feature = "tracing")]
    debug!("Exported {} of {} variables", exported, pairs.len());

    Ok(exported)
  }

  /// Whether any load or [`EnvContent::set`] has happened yet.
  pub fn is_initialized(&self) -> bool {
    self.pairs.is_some()
  }

  pub fn len(&self) -> usize {
    self.pairs.as_ref().map_or(0, HashMap::len)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn read_env_file(path: &Path) -> Result<String, EnvError> {
  std::fs::read_to_string(path).map_err(|source| EnvError::Read {
    path: path.to_path_buf(),
    source,
  })
}

fn is_exportable(key: &str, value: &str) -> bool {
  !key.is_empty() && !key.contains(['=', '\0']) && !value.contains('\0')
}

/// Configuration for an [`EnvContent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvContentOptions {
  /// How a key repeated within one load is handled. Defaults to overwriting.
  pub duplicate_keys: DuplicateKeys,
}

/// Outcome of [`EnvContent::load_from_files_with_report`].
#[derive(Debug, Default)]
pub struct LoadReport {
  pub files_attempted: usize,
  pub files_read: usize,
  pub failures: Vec<FileFailure>,
}

impl LoadReport {
  /// The error of the last file in the batch, if that file failed.
  pub fn into_last_file_error(mut self) -> Option<EnvError> {
    let attempted = self.files_attempted;
    self
      .failures
      .pop()
      .filter(|failure| failure.position + 1 == attempted)
      .map(|failure| failure.error)
  }
}

/// A file that could not be read or parsed during a batch load.
#[derive(Debug)]
pub struct FileFailure {
  /// Index of the file in the batch.
  pub position: usize,
  pub path: PathBuf,
  pub error: EnvError,
}

/// Errors returned by [`EnvContent`].
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
  /// The file could not be opened or is not valid UTF-8
  #[error("Can not read file {path:?}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  /// The input holds no key value pairs
  #[error(".env is empty or does not have key value pairs")]
  Empty,
  /// A line has no separator, or its separator more than once
  #[error(".env is not in correct format at line {line}: {content:?}")]
  WrongFormat { line: usize, content: String },
  /// A repeated key under [`DuplicateKeys::Reject`]
  #[error("Key {key:?} at line {line} already exists")]
  AlreadyExists { line: usize, key: String },
  /// The key is absent or holds an empty value
  #[error("Value for key {0:?} is not found")]
  MissingValue(String),
  /// Nothing has been loaded or set yet
  #[error("Map does not have key value pairs")]
  EmptyMap,
}

impl EnvError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      EnvError::Read { .. } => ErrorKind::ReadError,
      EnvError::Empty => ErrorKind::Empty,
      EnvError::WrongFormat { .. } => ErrorKind::WrongFormat,
      EnvError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
      EnvError::MissingValue(_) => ErrorKind::MissingValue,
      EnvError::EmptyMap => ErrorKind::EmptyMap,
    }
  }
}

impl From<ParseError> for EnvError {
  fn from(error: ParseError) -> Self {
    match error {
      ParseError::WrongFormat { line, content } => EnvError::WrongFormat { line, content },
      ParseError::AlreadyExists { line, key } => EnvError::AlreadyExists { line, key },
      ParseError::Empty => EnvError::Empty,
    }
  }
}

/// Field-less classification of an [`EnvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  ReadError,
  Empty,
  WrongFormat,
  AlreadyExists,
  MissingValue,
  EmptyMap,
}
