//! String, number, list and path filters.
//!
//! Conventions used:
//!
//! - Signature of a filter: `value: T | name(opt_1: U_1, ...): V` means that `name` is a filter
//!   that accepts values of type `T`, takes options `opt_i` of type `U_i`, and returns a value
//!   of type `V`.  Any value that is not a `T` is returned unchanged.
//!   - An option type with a question mark (e.g., `encoding: String?`) means that the option is
//!     optional and can be omitted.
//! - `Scalar` is any of `Int`, `Float`, `Bool` or `String`.  `Strings` is a `String`, or a
//!   `List` whose `String` elements are each transformed.

use std::sync::{Arc, LazyLock};

use bitflags::bitflags;
use filterchain_types::{Error, Filter, Result, Scalar, Strings, Value};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use super::{check_encoding, parse_options, FromOptions, NoOptions, OneOrMany};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseOptions {
    encoding: Option<String>,
}

fn case_filter(name: &str, options: Option<&serde_json::Value>) -> Result<()> {
    let options: CaseOptions = parse_options(name, options)?;
    check_encoding(name, options.encoding.as_deref())
}

/// Signature: `value: String | string_to_lower(encoding: String?): String`
///
/// Lowercases a string, Unicode-aware.  `encoding` may only be `"UTF-8"`.
///
/// # Examples
///
/// - `"ABC" | string_to_lower()` returns `"abc"`
/// - `"ŠUMA" | string_to_lower()` returns `"šuma"`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToLower;

impl FromOptions for StringToLower {
    const NAME: &'static str = "string_to_lower";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        case_filter(Self::NAME, options).map(|()| Self)
    }
}

impl Filter for StringToLower {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        Ok(value.to_lowercase().into())
    }
}

/// Signature: `value: String | string_to_upper(encoding: String?): String`
///
/// Uppercases a string, Unicode-aware.  `encoding` may only be `"UTF-8"`.
///
/// # Examples
///
/// - `"abc" | string_to_upper()` returns `"ABC"`
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToUpper;

impl FromOptions for StringToUpper {
    const NAME: &'static str = "string_to_upper";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        case_filter(Self::NAME, options).map(|()| Self)
    }
}

impl Filter for StringToUpper {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        Ok(value.to_uppercase().into())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct TrimOptions {
    char_list: Option<String>,
}

/// Signature: `value: String | string_trim(charList: String?): String`
///
/// Removes leading and trailing whitespace from a string, or, if `charList`
/// is given and non-empty, every leading and trailing character in it.
///
/// # Examples
///
/// - `"   hi   " | string_trim()` returns `"hi"`
/// - `"--hi-" | string_trim(charList: "-")` returns `"hi"`
#[derive(Debug, Clone, Default)]
pub struct StringTrim {
    chars: Option<Vec<char>>,
}

impl StringTrim {
    /// Trims whitespace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trims the characters in `chars`, or whitespace if it is empty.
    #[must_use]
    pub fn chars(chars: &str) -> Self {
        Self {
            chars: (!chars.is_empty()).then(|| chars.chars().collect()),
        }
    }
}

impl FromOptions for StringTrim {
    const NAME: &'static str = "string_trim";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: TrimOptions = parse_options(Self::NAME, options)?;
        Ok(options
            .char_list
            .as_deref()
            .map_or_else(Self::new, Self::chars))
    }
}

impl Filter for StringTrim {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        let trimmed = match &self.chars {
            None => value.trim(),
            Some(chars) => value.trim_matches(|c: char| chars.contains(&c)),
        };

        Ok(trimmed.into())
    }
}

/// Signature: `value: String | strip_newlines(): String`
///
/// Removes every `\r` and `\n` from a string.
///
/// # Examples
///
/// - `"a\r\nb\n" | strip_newlines()` returns `"ab"`
#[derive(Debug, Clone, Copy, Default)]
pub struct StripNewlines;

impl FromOptions for StripNewlines {
    const NAME: &'static str = "strip_newlines";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for StripNewlines {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        Ok(value
            .chars()
            .filter(|c| !matches!(c, '\r' | '\n'))
            .collect::<String>()
            .into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PrefixOptions {
    prefix: String,
}

/// Signature: `value: Scalar | string_prefix(prefix: String): String`
///
/// Prepends `prefix` to the value's text.
///
/// # Examples
///
/// - `"bar" | string_prefix(prefix: "foo")` returns `"foobar"`
/// - `12 | string_prefix(prefix: "#")` returns `"#12"`
#[derive(Debug, Clone)]
pub struct StringPrefix {
    prefix: Arc<str>,
}

impl StringPrefix {
    #[must_use]
    pub fn new(prefix: impl Into<Arc<str>>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl FromOptions for StringPrefix {
    const NAME: &'static str = "string_prefix";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: PrefixOptions = parse_options(Self::NAME, options)?;
        Ok(Self::new(options.prefix))
    }
}

impl Filter for StringPrefix {
    type Value = Scalar;

    fn filter(&self, value: Scalar) -> Result<Value> {
        Ok(format!("{}{value}", self.prefix).into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SuffixOptions {
    suffix: String,
}

/// Signature: `value: Scalar | string_suffix(suffix: String): String`
///
/// Appends `suffix` to the value's text.
///
/// # Examples
///
/// - `"foo" | string_suffix(suffix: "bar")` returns `"foobar"`
#[derive(Debug, Clone)]
pub struct StringSuffix {
    suffix: Arc<str>,
}

impl StringSuffix {
    #[must_use]
    pub fn new(suffix: impl Into<Arc<str>>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl FromOptions for StringSuffix {
    const NAME: &'static str = "string_suffix";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: SuffixOptions = parse_options(Self::NAME, options)?;
        Ok(Self::new(options.suffix))
    }
}

impl Filter for StringSuffix {
    type Value = Scalar;

    fn filter(&self, value: Scalar) -> Result<Value> {
        Ok(format!("{value}{}", self.suffix).into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PregReplaceOptions {
    pattern: OneOrMany<String>,
    replacement: Option<OneOrMany<String>>,
}

const DELIMITERS: &[char] = &['/', '#', '~', '%', '!', '@', '|'];

/// Splits `/body/flags` into its body and flags.
fn split_delimited(pattern: &str) -> Option<(&str, &str)> {
    let delimiter = pattern.chars().next().filter(|c| DELIMITERS.contains(c))?;
    let rest = &pattern[delimiter.len_utf8()..];
    let end = rest.rfind(delimiter)?;
    let flags = &rest[end + delimiter.len_utf8()..];

    flags
        .chars()
        .all(|c| c.is_ascii_alphabetic())
        .then_some((&rest[..end], flags))
}

fn compile_pattern(pattern: &str) -> Result<Regex> {
    let (body, flags) = split_delimited(pattern).unwrap_or((pattern, ""));
    let mut builder = RegexBuilder::new(body);

    for flag in flags.chars() {
        match flag {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            'U' => builder.swap_greed(true),
            'u' => builder.unicode(true),
            'e' => {
                return Err(Error::invalid_configuration(
                    PregReplace::NAME,
                    format_args!("pattern `{pattern}` uses the unsupported `e` modifier"),
                ))
            }
            other => {
                return Err(Error::invalid_configuration(
                    PregReplace::NAME,
                    format_args!("pattern `{pattern}` has unknown modifier `{other}`"),
                ))
            }
        };
    }

    builder.build().map_err(|e| {
        Error::invalid_configuration_from(
            PregReplace::NAME,
            format_args!("invalid pattern `{pattern}`"),
            e,
        )
    })
}

/// Signature: `value: Strings | preg_replace(pattern: String | [String], replacement: (String | [String])?): Strings`
///
/// Replaces every match of `pattern` with `replacement`.  Patterns may be
/// bare regular expressions or delimited like `/abc/i`, with modifiers
/// `i`, `m`, `s`, `x`, `u` and `U`.  Replacements can refer to groups as `$1`
/// or `${name}`.
///
/// With a list of patterns, each one is applied in turn.  A single
/// `replacement` is used for all of them; a list of replacements pairs up by
/// index, with missing ones treated as `""`.
///
/// # Examples
///
/// - `"Tu et Foo" | preg_replace(pattern: "/foo/i", replacement: "Bar")` returns `"Tu et Bar"`
/// - `["a1", "b2"] | preg_replace(pattern: "/\d/")` returns `["a", "b"]`
#[derive(Debug, Clone)]
pub struct PregReplace {
    rules: Vec<(Regex, String)>,
}

impl PregReplace {
    /// Replaces matches of a single `pattern` with `replacement`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if `pattern` does not compile.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            rules: vec![(compile_pattern(pattern)?, replacement.to_owned())],
        })
    }

    fn replace(&self, text: &str) -> String {
        self.rules
            .iter()
            .fold(text.to_owned(), |acc, (regex, replacement)| {
                regex.replace_all(&acc, replacement.as_str()).into_owned()
            })
    }
}

impl FromOptions for PregReplace {
    const NAME: &'static str = "preg_replace";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: PregReplaceOptions = parse_options(Self::NAME, options)?;
        let replacement_for = |i: usize| match &options.replacement {
            None => String::new(),
            Some(OneOrMany::One(r)) => r.clone(),
            Some(OneOrMany::Many(rs)) => rs.get(i).cloned().unwrap_or_default(),
        };

        let rules = options
            .pattern
            .into_vec()
            .into_iter()
            .enumerate()
            .map(|(i, pattern)| Ok((compile_pattern(&pattern)?, replacement_for(i))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }
}

impl Filter for PregReplace {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| self.replace(s)))
    }
}

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number regex is invalid")
});

/// The numeric prefix of `s`, if any: `" 12abc"` is `12`, `"abc"` is `None`.
fn leading_number(s: &str) -> Option<&str> {
    LEADING_NUMBER.find(s).map(|m| m.as_str().trim_start())
}

#[allow(clippy::cast_possible_truncation)]
fn string_to_int(s: &str) -> i64 {
    let Some(number) = leading_number(s) else {
        return 0;
    };

    if !number.contains(['.', 'e', 'E']) {
        if let Ok(n) = number.parse::<i64>() {
            return n;
        }
    }

    number.parse::<f64>().map_or(0, |x| x as i64)
}

fn string_to_float(s: &str) -> f64 {
    leading_number(s)
        .and_then(|number| number.parse().ok())
        .unwrap_or(0.)
}

/// Signature: `value: Scalar | to_int(): Int`
///
/// Converts a scalar to an integer.  Floats are truncated towards zero, booleans
/// become `0` or `1`, and strings are read up to the end of their leading
/// number (`"12abc"` is `12`).  Strings with no leading number become `0`.
///
/// Also registered as `int`.
///
/// # Examples
///
/// - `"-3.9" | to_int()` returns `-3`
/// - `"1e3" | to_int()` returns `1000`
/// - `"abc" | to_int()` returns `0`
#[derive(Debug, Clone, Copy, Default)]
pub struct ToInt;

impl FromOptions for ToInt {
    const NAME: &'static str = "to_int";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for ToInt {
    type Value = Scalar;

    #[allow(clippy::cast_possible_truncation)]
    fn filter(&self, value: Scalar) -> Result<Value> {
        Ok(Value::Int(match value {
            Scalar::Int(n) => n,
            Scalar::Float(x) => x as i64,
            Scalar::Bool(b) => i64::from(b),
            Scalar::String(s) => string_to_int(&s),
        }))
    }
}

/// Signature: `value: Scalar | to_float(): Float`
///
/// Converts a scalar to a float, reading strings like [`ToInt`] does.
///
/// Also registered as `float`.
///
/// # Examples
///
/// - `"2.5kg" | to_float()` returns `2.5`
/// - `true | to_float()` returns `1.0`
#[derive(Debug, Clone, Copy, Default)]
pub struct ToFloat;

impl FromOptions for ToFloat {
    const NAME: &'static str = "to_float";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for ToFloat {
    type Value = Scalar;

    #[allow(clippy::cast_precision_loss)]
    fn filter(&self, value: Scalar) -> Result<Value> {
        Ok(Value::Float(match value {
            Scalar::Int(n) => n as f64,
            Scalar::Float(x) => x,
            Scalar::Bool(b) => f64::from(u8::from(b)),
            Scalar::String(s) => string_to_float(&s),
        }))
    }
}

bitflags! {
    /// The kinds of "empty" value that [`ToNull`] turns into `null`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NullTypes: u8 {
        /// `false`
        const BOOLEAN = 1;
        /// `0`
        const INTEGER = 2;
        /// `[]` and `{}`
        const EMPTY_ARRAY = 4;
        /// `""`
        const STRING = 8;
        /// `"0"`
        const ZERO_STRING = 16;
        /// `0.0`
        const FLOAT = 32;
    }
}

impl NullTypes {
    const NAMES: [(&'static str, Self); 6] = [
        ("boolean", Self::BOOLEAN),
        ("integer", Self::INTEGER),
        ("array", Self::EMPTY_ARRAY),
        ("string", Self::STRING),
        ("zero", Self::ZERO_STRING),
        ("float", Self::FLOAT),
    ];

    /// Looks up a set by its option name, e.g. `"zero"`, `"boolean"` or `"all"`.
    #[must_use]
    pub fn from_option_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("all") {
            return Some(Self::all());
        }

        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(_, types)| types)
    }

    /// The set with the given bits, if they are all known.
    #[must_use]
    pub fn from_option_bits(bits: i64) -> Option<Self> {
        u8::try_from(bits).ok().and_then(Self::from_bits)
    }
}

impl Default for NullTypes {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NullTypeSpec {
    Bits(i64),
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToNullOptions {
    #[serde(rename = "type")]
    kind: Option<OneOrMany<NullTypeSpec>>,
}

/// Signature: `value | to_null(type: (Int | String | [Int | String])?): Value`
///
/// Returns `null` for values that count as empty, and everything else
/// unchanged.  `type` selects what counts as empty, either as a bitset of
/// [`NullTypes`] or by name (`boolean`, `integer`, `array`, `string`, `zero`,
/// `float`, `all`); a list combines its entries.  By default all of them do.
///
/// Also registered as `null`.
///
/// # Examples
///
/// - `"" | to_null()` returns `null`
/// - `"0" | to_null(type: "string")` returns `"0"`
/// - `false | to_null(type: ["boolean", 2])` returns `null`
#[derive(Debug, Clone, Copy, Default)]
pub struct ToNull {
    types: NullTypes,
}

impl ToNull {
    #[must_use]
    pub const fn new(types: NullTypes) -> Self {
        Self { types }
    }

    #[must_use]
    pub const fn types(&self) -> NullTypes {
        self.types
    }

    fn is_empty(&self, value: &Value) -> bool {
        let has = |types: NullTypes| self.types.contains(types);

        match value {
            Value::Bool(b) => has(NullTypes::BOOLEAN) && !b,
            Value::Int(n) => has(NullTypes::INTEGER) && *n == 0,
            Value::Float(x) => has(NullTypes::FLOAT) && *x == 0.,
            Value::String(s) => {
                (has(NullTypes::STRING) && s.is_empty())
                    || (has(NullTypes::ZERO_STRING) && &**s == "0")
            }
            Value::List(l) => has(NullTypes::EMPTY_ARRAY) && l.is_empty(),
            Value::Structure(s) => has(NullTypes::EMPTY_ARRAY) && s.is_empty(),
            Value::Null | Value::Object(_) => false,
        }
    }
}

impl FromOptions for ToNull {
    const NAME: &'static str = "to_null";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: ToNullOptions = parse_options(Self::NAME, options)?;
        let Some(kind) = options.kind else {
            return Ok(Self::default());
        };

        let mut types = NullTypes::empty();
        for spec in kind.into_vec() {
            types |= match spec {
                NullTypeSpec::Bits(bits) => NullTypes::from_option_bits(bits),
                NullTypeSpec::Name(ref name) => NullTypes::from_option_name(name),
            }
            .ok_or_else(|| {
                Error::invalid_configuration(Self::NAME, format_args!("unknown type {spec:?}"))
            })?;
        }

        Ok(Self::new(types))
    }
}

impl Filter for ToNull {
    type Value = Value;

    fn filter(&self, value: Value) -> Result<Value> {
        Ok(if self.is_empty(&value) {
            Value::Null
        } else {
            value
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListOptions {
    #[serde(default)]
    list: Vec<serde_json::Value>,
    #[serde(default)]
    strict: bool,
}

impl ListOptions {
    fn into_parts(self) -> (Vec<Value>, bool) {
        (self.list.into_iter().map(Value::from).collect(), self.strict)
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

/// Loose equality: booleans compare with truthiness, numbers compare by value
/// across `Int` and `Float`, and numeric strings compare equal to numbers.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Bool(x), other) | (other, Value::Bool(x)) => *x == other.is_truthy(),
        (Value::String(s), other) | (other, Value::String(s)) if as_number(other).is_some() => {
            s.trim().parse::<f64>().ok() == as_number(other)
        }
        _ => match (as_number(a), as_number(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

fn list_contains(list: &[Value], value: &Value, strict: bool) -> bool {
    if strict {
        list.contains(value)
    } else {
        list.iter().any(|item| loosely_equal(item, value))
    }
}

/// Signature: `value | blacklist(list: [Value]?, strict: Bool?): Value`
///
/// Returns `null` if `value` is in `list`, otherwise `value`.  Without
/// `strict`, comparison is loose: `"1"`, `1` and `1.0` are all equal.
///
/// # Examples
///
/// - `"bad" | blacklist(list: ["bad"])` returns `null`
/// - `"1" | blacklist(list: [1], strict: true)` returns `"1"`
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    list: Vec<Value>,
    strict: bool,
}

impl Blacklist {
    #[must_use]
    pub fn new(list: Vec<Value>, strict: bool) -> Self {
        Self { list, strict }
    }
}

impl FromOptions for Blacklist {
    const NAME: &'static str = "blacklist";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let (list, strict) = parse_options::<ListOptions>(Self::NAME, options)?.into_parts();
        Ok(Self::new(list, strict))
    }
}

impl Filter for Blacklist {
    type Value = Value;

    fn filter(&self, value: Value) -> Result<Value> {
        Ok(if list_contains(&self.list, &value, self.strict) {
            Value::Null
        } else {
            value
        })
    }
}

/// Signature: `value | whitelist(list: [Value]?, strict: Bool?): Value`
///
/// Returns `value` if it is in `list`, otherwise `null`.  Comparison works
/// like in [`Blacklist`].
///
/// # Examples
///
/// - `"ok" | whitelist(list: ["ok"])` returns `"ok"`
/// - `2 | whitelist(list: ["2.0"])` returns `2`
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    list: Vec<Value>,
    strict: bool,
}

impl Whitelist {
    #[must_use]
    pub fn new(list: Vec<Value>, strict: bool) -> Self {
        Self { list, strict }
    }
}

impl FromOptions for Whitelist {
    const NAME: &'static str = "whitelist";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let (list, strict) = parse_options::<ListOptions>(Self::NAME, options)?.into_parts();
        Ok(Self::new(list, strict))
    }
}

impl Filter for Whitelist {
    type Value = Value;

    fn filter(&self, value: Value) -> Result<Value> {
        Ok(if list_contains(&self.list, &value, self.strict) {
            value
        } else {
            Value::Null
        })
    }
}

fn trim_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && !path.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// Signature: `value: String | base_name(): String`
///
/// The last component of a `/`-separated path, ignoring trailing slashes.
///
/// # Examples
///
/// - `"/etc/sudoers.d" | base_name()` returns `"sudoers.d"`
/// - `"/etc/" | base_name()` returns `"etc"`
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseName;

impl FromOptions for BaseName {
    const NAME: &'static str = "base_name";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for BaseName {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        let path = trim_trailing_slashes(&value);
        if path == "/" {
            return Ok("".into());
        }

        Ok(path.rsplit('/').next().unwrap_or(path).into())
    }
}

/// Signature: `value: String | dir(): String`
///
/// The parent directory of a `/`-separated path: `"."` if there is none, and
/// `"/"` for entries of the root.
///
/// # Examples
///
/// - `"/etc/passwd" | dir()` returns `"/etc"`
/// - `"file.txt" | dir()` returns `"."`
#[derive(Debug, Clone, Copy, Default)]
pub struct Dir;

impl FromOptions for Dir {
    const NAME: &'static str = "dir";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        parse_options::<NoOptions>(Self::NAME, options).map(|_| Self)
    }
}

impl Filter for Dir {
    type Value = Arc<str>;

    fn filter(&self, value: Arc<str>) -> Result<Value> {
        let path = trim_trailing_slashes(&value);
        let parent = match path.rfind('/') {
            None => ".",
            Some(i) => trim_trailing_slashes(&path[..i]),
        };

        Ok(if parent.is_empty() { "/" } else { parent }.into())
    }
}
