use std::{borrow::Cow, collections::HashMap, convert::TryFrom, fmt};

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

const COMMENT_PREFIX: char = '#';

/// Character dividing a key from its value on one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Separator {
  Equals,
  Colon,
}

impl Separator {
  pub const fn as_char(self) -> char {
    match self {
      Separator::Equals => '=',
      Separator::Colon => ':',
    }
  }

  /// `=` wins whenever it appears; `:` is only considered on lines without `=`.
  fn detect(line: &str) -> Option<Self> {
    if line.contains(Separator::Equals.as_char()) {
      Some(Separator::Equals)
    } else if line.contains(Separator::Colon.as_char()) {
      Some(Separator::Colon)
    } else {
      None
    }
  }
}

impl fmt::Display for Separator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_char())
  }
}

/// What to do when a key shows up a second time within one load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
  /// Later lines replace earlier values.
  #[default]
  Overwrite,
  /// A repeated key fails with [`ParseError::AlreadyExists`].
  Reject,
}

/// One classified input line. Errors carry line 1; [`parse_into`] sets the real line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EnvLine<'a> {
  Pair(EnvPair<'a>),
  Comment,
  Blank,
}

impl<'a> TryFrom<&'a str> for EnvLine<'a> {
  type Error = ParseError;

  fn try_from(s: &'a str) -> Result<Self, Self::Error> {
    let trimmed = s.trim();

    if trimmed.is_empty() {
      Ok(EnvLine::Blank)
    } else if trimmed.starts_with(COMMENT_PREFIX) {
      Ok(EnvLine::Comment)
    } else {
      Ok(EnvLine::Pair(trimmed.try_into()?))
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EnvPair<'a> {
  pub(crate) key: Cow<'a, str>,
  pub(crate) value: Cow<'a, str>,
  pub(crate) separator: Separator,
}

impl<'a> fmt::Display for EnvPair<'a> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{}{}", self.key, self.separator, self.value)
  }
}

impl<'a> TryFrom<&'a str> for EnvPair<'a> {
  type Error = ParseError;

  fn try_from(s: &'a str) -> Result<Self, Self::Error> {
    let trimmed = s.trim();
    let wrong_format = || ParseError::WrongFormat {
      line: 1,
      content: trimmed.to_string(),
    };

    let separator = Separator::detect(trimmed).ok_or_else(wrong_format)?;
    let (key, value) = trimmed
      .split_once(separator.as_char())
      .filter(|(_, value)| !value.contains(separator.as_char()))
      .ok_or_else(wrong_format)?;

    Ok(EnvPair {
      key: Cow::Borrowed(key.trim()),
      value: Cow::Borrowed(value.trim()),
      separator,
    })
  }
}

/// Parses `text` line by line and writes every pair into `pairs`.
///
/// Stops at the first malformed line. Pairs written before that line stay in
/// the map. Fails with [`ParseError::Empty`] when `pairs` holds nothing once
/// the whole input has been consumed.
///
/// Returns the number of pair lines written.
pub fn parse_into(
  text: &str,
  pairs: &mut HashMap<String, String>,
  duplicates: DuplicateKeys,
) -> Result<usize, ParseError> {
  #[cfg(feature = "tracing")]
  debug!("Parsing env content with {} lines", text.lines().count());

  let mut written = 0;

  for (index, raw) in text.lines().enumerate() {
    let line = index + 1;

    #[cfg(feature = "tracing")]
    trace!("Parsing line {}: {:?}", line, raw);

    let pair = match EnvLine::try_from(raw).map_err(|err| err.at_line(line))? {
      EnvLine::Pair(pair) => pair,
      EnvLine::Comment | EnvLine::Blank => continue,
    };

    if duplicates == DuplicateKeys::Reject && pairs.contains_key(&*pair.key) {
      return Err(ParseError::AlreadyExists {
        line,
        key: pair.key.into_owned(),
      });
    }

    #[cfg(feature = "tracing")]
    trace!("Found pair: {}", pair);

    pairs.insert(pair.key.into_owned(), pair.value.into_owned());
    written += 1;
  }

  #[cfg(feature = "tracing")]
  debug!("Wrote {} pairs, map holds {}", written, pairs.len());

  if pairs.is_empty() {
    return Err(ParseError::Empty);
  }

  Ok(written)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
  #[error("Wrong format at line {line}: {content:?}")]
  WrongFormat { line: usize, content: String },
  #[error("Key {key:?} at line {line} already exists")]
  AlreadyExists { line: usize, key: String },
  #[error("Input is empty or does not have key value pairs")]
  Empty,
}

impl ParseError {
  fn at_line(self, line: usize) -> Self {
    match self {
      ParseError::WrongFormat { content, .. } => ParseError::WrongFormat { line, content },
      ParseError::AlreadyExists { key, .. } => ParseError::AlreadyExists { line, key },
      ParseError::Empty => ParseError::Empty,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(text: &str) -> (HashMap<String, String>, Result<usize, ParseError>) {
    let mut pairs = HashMap::new();
    let result = parse_into(text, &mut pairs, DuplicateKeys::Overwrite);
    (pairs, result)
  }

  #[test]
  fn test_parse_simple() {
    let (pairs, result) = parse("key1 = value1\nkey2 = value2");

    assert_eq!(result, Ok(2));
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs["key1"], "value1");
    assert_eq!(pairs["key2"], "value2");
  }

  #[test]
  fn test_parse_comment_blank_and_colon() {
    let (pairs, result) = parse("#comment\n\nkey:value");

    assert_eq!(result, Ok(1));
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs["key"], "value");
  }

  #[test]
  fn test_parse_mixed_separators_and_spacing() {
    let input = "\n\n#comment 1\n key1 =     value1\n key2    : value2\n\n  key3 : value3\r\nkey4 =    value4   \n#comment 2\n";
    let (pairs, result) = parse(input);

    assert_eq!(result, Ok(4));
    for i in 1..=4 {
      assert_eq!(pairs[&format!("key{i}")], format!("value{i}"));
    }
  }

  #[test]
  fn test_parse_empty_and_comment_only() {
    for input in ["", "#This is a comment", "#c1\n #c2\n\n   \n#c3"] {
      let (pairs, result) = parse(input);
      assert_eq!(result, Err(ParseError::Empty), "input: {input:?}");
      assert!(pairs.is_empty());
    }
  }

  #[test]
  fn test_parse_missing_separator() {
    let (pairs, result) = parse("keyvalue");
    assert_eq!(
      result,
      Err(ParseError::WrongFormat {
        line: 1,
        content: "keyvalue".to_string()
      })
    );
    assert!(pairs.is_empty());

    let (_, result) = parse("# This is a comment\n \nkey value");
    assert_eq!(
      result,
      Err(ParseError::WrongFormat {
        line: 3,
        content: "key value".to_string()
      })
    );
  }

  #[test]
  fn test_parse_repeated_separator() {
    assert!(matches!(
      parse("a=b=c").1,
      Err(ParseError::WrongFormat { line: 1, .. })
    ));
    assert!(matches!(
      parse("a:b:c").1,
      Err(ParseError::WrongFormat { line: 1, .. })
    ));
  }

  #[test]
  fn test_equals_takes_priority_over_colon() {
    let (pairs, result) = parse("url = http://localhost:8080");

    assert_eq!(result, Ok(1));
    assert_eq!(pairs["url"], "http://localhost:8080");
  }

  #[test]
  fn test_wrong_format_keeps_earlier_pairs() {
    let (pairs, result) = parse("a=1\nb=2\nbroken\nc=3");

    assert!(matches!(result, Err(ParseError::WrongFormat { line: 3, .. })));
    assert_eq!(pairs.len(), 2);
    assert!(!pairs.contains_key("c"));
  }

  #[test]
  fn test_duplicate_keys_overwrite_by_default() {
    let (pairs, result) = parse("a=1\na=2");

    assert_eq!(result, Ok(2));
    assert_eq!(pairs["a"], "2");
  }

  #[test]
  fn test_duplicate_keys_rejected() {
    let mut pairs = HashMap::new();
    let result = parse_into("a=1\nb=2\n a : 3", &mut pairs, DuplicateKeys::Reject);

    assert_eq!(
      result,
      Err(ParseError::AlreadyExists {
        line: 3,
        key: "a".to_string()
      })
    );
    assert_eq!(pairs["a"], "1");
  }

  #[test]
  fn test_parse_into_merges_with_existing_pairs() {
    let mut pairs = HashMap::from([("a".to_string(), "1".to_string())]);

    // Comment-only input is not empty when the map already holds pairs.
    assert_eq!(parse_into("# nothing", &mut pairs, DuplicateKeys::Overwrite), Ok(0));
    assert_eq!(parse_into("b=2", &mut pairs, DuplicateKeys::Overwrite), Ok(1));
    assert_eq!(pairs.len(), 2);
  }

  #[test]
  fn test_env_line_from_str() {
    assert_eq!(EnvLine::try_from("   ").unwrap(), EnvLine::Blank);

    assert_eq!(EnvLine::try_from("# a = comment").unwrap(), EnvLine::Comment);

    match EnvLine::try_from("  KEY :  value ").unwrap() {
      EnvLine::Pair(pair) => {
        assert_eq!(pair.key, "KEY");
        assert_eq!(pair.value, "value");
        assert_eq!(pair.separator, Separator::Colon);
        assert_eq!(pair.to_string(), "KEY:value");
      }
      other => panic!("Expected Pair, got {other:?}"),
    }

    assert!(EnvLine::try_from("invalid line without separator").is_err());
  }

  #[test]
  fn test_empty_key_and_value() {
    let pair = EnvPair::try_from("KEY=   ").unwrap();
    assert_eq!(pair.key, "KEY");
    assert_eq!(pair.value, "");

    let pair = EnvPair::try_from("= value").unwrap();
    assert_eq!(pair.key, "");
    assert_eq!(pair.value, "value");
    assert_eq!(pair.separator, Separator::Equals);
  }
}
