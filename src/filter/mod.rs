//! Built-in filters, available by name through [`FilterRegistry::shared`].
//!
//! Every filter here follows the same contract: a value outside its domain
//! (e.g. `null` given to a string filter) comes back unchanged, and bad options
//! are rejected when the filter is built, never when it runs.
//!
//! Options are JSON objects.  Keys are camelCase; unknown keys are rejected.
//!
//! | name | aliases | options |
//! |------|---------|---------|
//! | `string_to_lower` | | `encoding` |
//! | `string_to_upper` | | `encoding` |
//! | `string_trim` | | `charList` |
//! | `strip_newlines` | | |
//! | `string_prefix` | | `prefix` (required) |
//! | `string_suffix` | | `suffix` (required) |
//! | `preg_replace` | | `pattern` (required), `replacement` |
//! | `to_int` | `int` | |
//! | `to_float` | `float` | |
//! | `to_null` | `null` | `type` |
//! | `blacklist` | | `list`, `strict` |
//! | `whitelist` | | `list`, `strict` |
//! | `base_name` | | |
//! | `dir` | | |
//! | `strip_tags` | | `allowTags`, `allowAttribs` |
//! | `html_entities` | | `quoteStyle`, `doubleEncode`, `encoding` |
//! | `word_separator_to_camel_case` | `separator_to_camel_case` | `separator` |
//! | `word_separator_to_separator` | `separator_to_separator` | `searchSeparator`, `replacementSeparator` |
//! | `word_dash_to_separator` | `dash_to_separator` | `separator` |
//! | `word_dash_to_camel_case` | `dash_to_camel_case` | |
//! | `word_underscore_to_camel_case` | `underscore_to_camel_case` | |
//! | `word_underscore_to_studly_case` | `underscore_to_studly_case` | |
//!
//! [`FilterRegistry::shared`]: crate::FilterRegistry::shared

pub mod builtin;
pub mod markup;
pub mod word;

use std::sync::Arc;

use filterchain_types::{Error, FilterDyn, Result};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::warn;

use crate::{chain::SharedFilter, registry::FilterRegistry};

pub use builtin::{
    BaseName, Blacklist, Dir, NullTypes, PregReplace, StringPrefix, StringSuffix, StringToLower,
    StringToUpper, StringTrim, StripNewlines, ToFloat, ToInt, ToNull, Whitelist,
};
pub use markup::{HtmlEntities, QuoteStyle, StripTags};
pub use word::{
    DashToCamelCase, DashToSeparator, SeparatorToCamelCase, SeparatorToSeparator,
    UnderscoreToCamelCase, UnderscoreToStudlyCase,
};

/// A filter that can be built from the JSON options of a [`FilterSpec`].
///
/// [`FilterSpec`]: crate::FilterSpec
pub trait FromOptions: Sized {
    /// The name the filter is registered under.
    const NAME: &'static str;

    /// Builds the filter, validating `options`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfiguration`] if the options are malformed.
    fn from_options(options: Option<&serde_json::Value>) -> Result<Self>;
}

/// Deserializes the options of `filter`.  Missing options deserialize like an
/// empty object, so option structs with defaults need no special casing.
pub(crate) fn parse_options<T: DeserializeOwned>(
    filter: &str,
    options: Option<&serde_json::Value>,
) -> Result<T> {
    let empty = serde_json::Value::Object(serde_json::Map::new());
    let options = match options {
        None | Some(serde_json::Value::Null) => &empty,
        Some(options) => options,
    };

    T::deserialize(options)
        .map_err(|e| Error::invalid_configuration_from(filter, "malformed options", e))
}

/// Options of filters that take none.  Any key is an error.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NoOptions {}

/// A single item or a list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(x) => vec![x],
            Self::Many(xs) => xs,
        }
    }
}

/// Validates an `encoding` option.  Strings are always UTF-8 here, so that is
/// the only accepted value.
pub(crate) fn check_encoding(filter: &str, encoding: Option<&str>) -> Result<()> {
    match encoding {
        None => Ok(()),
        Some(e) if e.eq_ignore_ascii_case("utf-8") || e.eq_ignore_ascii_case("utf8") => Ok(()),
        Some(e) => Err(Error::invalid_configuration(
            filter,
            format_args!("unsupported encoding `{e}`, only UTF-8 is supported"),
        )),
    }
}

fn factory<F>(options: Option<&serde_json::Value>) -> Result<SharedFilter>
where
    F: FromOptions + FilterDyn + Send + Sync + 'static,
{
    Ok(Arc::new(F::from_options(options)?))
}

type Factory = fn(Option<&serde_json::Value>) -> Result<SharedFilter>;

macro_rules! build_map {
    ($(
        $ty:ty $(: $($alias:literal),*)?;
    )*) => {
        [$(
            (
                <$ty as FromOptions>::NAME,
                {
                    const ALIASES: &[&str] = &[$($($alias),*)?];
                    ALIASES
                },
                factory::<$ty> as Factory,
            ),
        )*]
    };
}

/// Every built-in filter: its name, its aliases and its factory.
fn builtins() -> Vec<(&'static str, &'static [&'static str], Factory)> {
    Vec::from(build_map! {
        StringToLower;
        StringToUpper;
        StringTrim;
        StripNewlines;
        StringPrefix;
        StringSuffix;
        PregReplace;
        ToInt: "int";
        ToFloat: "float";
        ToNull: "null";
        Blacklist;
        Whitelist;
        BaseName;
        Dir;
        StripTags;
        HtmlEntities;
        SeparatorToCamelCase: "separator_to_camel_case";
        SeparatorToSeparator: "separator_to_separator";
        DashToSeparator: "dash_to_separator";
        DashToCamelCase: "dash_to_camel_case";
        UnderscoreToCamelCase: "underscore_to_camel_case";
        UnderscoreToStudlyCase: "underscore_to_studly_case";
    })
}

/// Registers every built-in filter and its aliases in `registry`.  An alias
/// that collides with a filter name is skipped with a warning.
pub(crate) fn register_builtins(registry: &mut FilterRegistry) {
    let builtins = builtins();

    for &(name, _, factory) in &builtins {
        registry.register(name, factory);
    }

    for (name, aliases, _) in builtins {
        for &alias in aliases {
            if let Err(error) = registry.alias(alias, name) {
                warn!(alias, name, %error, "skipping built-in alias");
            }
        }
    }
}
