//! Filters that rewrite word separators and letter case.
//!
//! All of them accept `Strings`: a string, or a list whose strings are each
//! rewritten.

use std::sync::LazyLock;

use filterchain_types::{Error, Filter, Result, Strings, Value};
use regex::Regex;
use serde::Deserialize;

use super::{parse_options, FromOptions, NoOptions};

static LEADING_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{Z}").expect("separator regex is invalid"));

fn space() -> String {
    " ".to_owned()
}

fn dash() -> String {
    "-".to_owned()
}

fn non_empty(filter: &str, option: &str, separator: String) -> Result<String> {
    if separator.is_empty() {
        return Err(Error::invalid_configuration(
            filter,
            format_args!("`{option}` must not be empty"),
        ));
    }

    Ok(separator)
}

/// Pushes `word` with its first character uppercased.
fn push_capitalized(out: &mut String, word: &str) {
    let mut chars = word.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
}

/// Joins the pieces of `value` around `separator`, capitalizing each.  A
/// separator followed by a Unicode space separator (`\p{Z}`) or by nothing is
/// kept.
fn camel_case(value: &str, separator: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pieces = value.split(separator);

    if let Some(first) = pieces.next() {
        push_capitalized(&mut out, first);
    }

    for piece in pieces {
        if piece.is_empty() || LEADING_SEPARATOR.is_match(piece) {
            out.push_str(separator);
            out.push_str(piece);
        } else {
            push_capitalized(&mut out, piece);
        }
    }

    out
}

fn lowercase_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeparatorOptions {
    #[serde(default = "space")]
    separator: String,
}

/// Signature: `value: Strings | word_separator_to_camel_case(separator: String?): Strings`
///
/// Removes `separator` (default `" "`) and capitalizes the word after it.
///
/// # Examples
///
/// - `"camel cased words" | word_separator_to_camel_case()` returns `"CamelCasedWords"`
/// - `"user-2-user" | word_separator_to_camel_case(separator: "-")` returns `"User2User"`
#[derive(Debug, Clone)]
pub struct SeparatorToCamelCase {
    separator: String,
}

impl SeparatorToCamelCase {
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `separator` is empty.
    pub fn new(separator: impl Into<String>) -> Result<Self> {
        Ok(Self {
            separator: non_empty(Self::NAME, "separator", separator.into())?,
        })
    }
}

impl FromOptions for SeparatorToCamelCase {
    const NAME: &'static str = "word_separator_to_camel_case";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: SeparatorOptions = parse_options(Self::NAME, options)?;
        Self::new(options.separator)
    }
}

impl Filter for SeparatorToCamelCase {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| camel_case(s, &self.separator)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct SeparatorToSeparatorOptions {
    #[serde(default = "space")]
    search_separator: String,
    #[serde(default = "dash")]
    replacement_separator: String,
}

/// Signature: `value: Strings | word_separator_to_separator(searchSeparator: String?, replacementSeparator: String?): Strings`
///
/// Replaces every `searchSeparator` (default `" "`) with
/// `replacementSeparator` (default `"-"`).
///
/// # Examples
///
/// - `"dash separated words" | word_separator_to_separator()` returns `"dash-separated-words"`
#[derive(Debug, Clone)]
pub struct SeparatorToSeparator {
    search: String,
    replacement: String,
}

impl SeparatorToSeparator {
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `search` is empty.
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            search: non_empty(Self::NAME, "searchSeparator", search.into())?,
            replacement: replacement.into(),
        })
    }
}

impl FromOptions for SeparatorToSeparator {
    const NAME: &'static str = "word_separator_to_separator";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: SeparatorToSeparatorOptions = parse_options(Self::NAME, options)?;
        Self::new(options.search_separator, options.replacement_separator)
    }
}

impl Filter for SeparatorToSeparator {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| s.replace(&self.search, &self.replacement)))
    }
}

/// Signature: `value: Strings | word_dash_to_separator(separator: String?): Strings`
///
/// Replaces every `-` with `separator` (default `" "`).
///
/// # Examples
///
/// - `"dash-separated-words" | word_dash_to_separator(separator: "+")` returns `"dash+separated+words"`
#[derive(Debug, Clone)]
pub struct DashToSeparator {
    separator: String,
}

impl DashToSeparator {
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl FromOptions for DashToSeparator {
    const NAME: &'static str = "word_dash_to_separator";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: SeparatorOptions = parse_options(Self::NAME, options)?;
        Ok(Self::new(options.separator))
    }
}

impl Filter for DashToSeparator {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| s.replace('-', &self.separator)))
    }
}

/// Signature: `value: Strings | word_dash_to_camel_case(): Strings`
///
/// # Examples
///
/// - `"camel-cased-words" | word_dash_to_camel_case()` returns `"CamelCasedWords"`
#[derive(Debug, Clone, Copy, Default)]
pub struct DashToCamelCase;

impl FromOptions for DashToCamelCase {
    const NAME: &'static str = "word_dash_to_camel_case";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for DashToCamelCase {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| camel_case(s, "-")))
    }
}

/// Signature: `value: Strings | word_underscore_to_camel_case(): Strings`
///
/// # Examples
///
/// - `"camel_cased_words" | word_underscore_to_camel_case()` returns `"CamelCasedWords"`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreToCamelCase;

impl FromOptions for UnderscoreToCamelCase {
    const NAME: &'static str = "word_underscore_to_camel_case";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for UnderscoreToCamelCase {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| camel_case(s, "_")))
    }
}

/// Signature: `value: Strings | word_underscore_to_studly_case(): Strings`
///
/// Like [`UnderscoreToCamelCase`], but the first letter is lowercased.
///
/// # Examples
///
/// - `"studly_cased_words" | word_underscore_to_studly_case()` returns `"studlyCasedWords"`
/// - `"Studly_Cased" | word_underscore_to_studly_case()` returns `"studlyCased"`
#[derive(Debug, Clone, Copy, Default)]
pub struct UnderscoreToStudlyCase;

impl FromOptions for UnderscoreToStudlyCase {
    const NAME: &'static str = "word_underscore_to_studly_case";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for UnderscoreToStudlyCase {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| lowercase_first(&camel_case(s, "_"))))
    }
}

#[cfg(test)]
mod tests {
    use filterchain_types::{FilterDyn, Value};
    use serde_json::json;

    use super::*;

    #[test]
    fn separator_to_camel_case() {
        let filter = SeparatorToCamelCase::from_options(None).unwrap();
        assert_eq!(
            filter.apply("camel cased words".into()).unwrap(),
            Value::from("CamelCasedWords")
        );
        assert_eq!(filter.apply("test šuma".into()).unwrap(), Value::from("TestŠuma"));

        let dashes =
            SeparatorToCamelCase::from_options(Some(&json!({ "separator": "-" }))).unwrap();
        assert_eq!(dashes.apply("user-2-user".into()).unwrap(), Value::from("User2User"));
        assert_eq!(dashes.apply("a- b-".into()).unwrap(), Value::from("A- b-"));
        assert_eq!(dashes.apply("a-\u{a0}b".into()).unwrap(), Value::from("A-\u{a0}b"));
        assert_eq!(dashes.apply("a-\u{3000}b".into()).unwrap(), Value::from("A-\u{3000}b"));
        assert_eq!(dashes.apply("a-\tb-\nc".into()).unwrap(), Value::from("A\tb\nc"));

        assert!(SeparatorToCamelCase::new("").is_err());
    }

    #[test]
    fn separator_to_separator() {
        let filter = SeparatorToSeparator::from_options(None).unwrap();
        assert_eq!(
            filter.apply("dash separated words".into()).unwrap(),
            Value::from("dash-separated-words")
        );

        let custom = SeparatorToSeparator::new(":", "+").unwrap();
        assert_eq!(custom.apply("a:b:c".into()).unwrap(), Value::from("a+b+c"));

        assert!(SeparatorToSeparator::from_options(Some(&json!({ "searchSeparator": "" })))
            .is_err());
    }

    #[test]
    fn dash_to_separator() {
        let filter = DashToSeparator::from_options(None).unwrap();
        assert_eq!(
            filter.apply("dash-separated-words".into()).unwrap(),
            Value::from("dash separated words")
        );
        assert_eq!(
            DashToSeparator::new("+").apply("a-b".into()).unwrap(),
            Value::from("a+b")
        );
    }

    #[test]
    fn camel_and_studly_case() {
        assert_eq!(
            DashToCamelCase.apply("camel-cased-words".into()).unwrap(),
            Value::from("CamelCasedWords")
        );
        assert_eq!(
            UnderscoreToCamelCase.apply("camel_cased_words".into()).unwrap(),
            Value::from("CamelCasedWords")
        );
        assert_eq!(
            UnderscoreToStudlyCase.apply("studly_cased_words".into()).unwrap(),
            Value::from("studlyCasedWords")
        );
        assert_eq!(
            UnderscoreToStudlyCase.apply("".into()).unwrap(),
            Value::from("")
        );
    }

    #[test]
    fn lists_and_other_values() {
        let list = Value::List(vec!["a_b".into(), Value::Int(1)]);
        assert_eq!(
            UnderscoreToCamelCase.apply(list).unwrap(),
            Value::List(vec!["AB".into(), Value::Int(1)])
        );
        assert_eq!(DashToCamelCase.apply(Value::Null).unwrap(), Value::Null);
    }
}
