//! HTML filters.

use std::{collections::BTreeSet, fmt::Write as _, sync::LazyLock};

use filterchain_types::{Filter, Result, Strings, Value};
use regex::{Captures, Regex};
use serde::Deserialize;

use super::{check_encoding, parse_options, FromOptions, OneOrMany};

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex is invalid"));

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<\s*(/?)\s*([A-Za-z][A-Za-z0-9:-]*)([^>]*)>").expect("tag regex is invalid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_:][-A-Za-z0-9_:.]*)(?:\s*=\s*("[^"]*"|'[^']*'|[^\s"'>/=`]+))?"#)
        .expect("attribute regex is invalid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
        .expect("entity regex is invalid")
});

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct StripTagsOptions {
    allow_tags: Option<OneOrMany<String>>,
    allow_attribs: Option<OneOrMany<String>>,
}

/// Signature: `value: Strings | strip_tags(allowTags: (String | [String])?, allowAttribs: (String | [String])?): Strings`
///
/// Removes HTML comments and every tag not named in `allowTags`.  Allowed tags
/// are kept with only the attributes named in `allowAttribs`.  Text between
/// tags is kept.  Tag and attribute names are matched case-insensitively and
/// written back lowercased.
///
/// # Examples
///
/// - `"<a name=\"foo\"> ABC </a>" | strip_tags()` returns `" ABC "`
/// - `"<IMG ID=\"bar\" SRC=\"x\"/>" | strip_tags(allowTags: "img", allowAttribs: "id")` returns
///   `"<img id=\"bar\" />"`
#[derive(Debug, Clone, Default)]
pub struct StripTags {
    tags: BTreeSet<String>,
    attributes: BTreeSet<String>,
}

impl StripTags {
    /// Keeps the `tags` and, on them, the `attributes` given.
    pub fn new<I, J>(tags: I, attributes: J) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| t.as_ref().to_ascii_lowercase())
                .collect(),
            attributes: attributes
                .into_iter()
                .map(|a| a.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    fn rebuild(&self, tag: &Captures<'_>) -> String {
        let name = tag[2].to_ascii_lowercase();
        if !self.tags.contains(&name) {
            return String::new();
        }

        if !tag[1].is_empty() {
            return format!("</{name}>");
        }

        let rest = &tag[3];
        let mut out = format!("<{name}");
        for attribute in ATTRIBUTE.captures_iter(rest) {
            let attribute_name = attribute[1].to_ascii_lowercase();
            if !self.attributes.contains(&attribute_name) {
                continue;
            }

            let _ = match attribute.get(2).map(|v| v.as_str()) {
                None => write!(out, " {attribute_name}"),
                Some(v) if v.starts_with(['"', '\'']) => write!(out, " {attribute_name}={v}"),
                Some(v) => write!(out, " {attribute_name}=\"{v}\""),
            };
        }

        if rest.trim_end().ends_with('/') {
            out.push_str(" /");
        }
        out.push('>');

        out
    }

    fn strip(&self, text: &str) -> String {
        let text = COMMENT.replace_all(text, "");
        TAG.replace_all(&text, |tag: &Captures<'_>| self.rebuild(tag))
            .into_owned()
    }
}

impl FromOptions for StripTags {
    const NAME: &'static str = "strip_tags";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: StripTagsOptions = parse_options(Self::NAME, options)?;
        Ok(Self::new(
            options.allow_tags.map(OneOrMany::into_vec).unwrap_or_default(),
            options
                .allow_attribs
                .map(OneOrMany::into_vec)
                .unwrap_or_default(),
        ))
    }
}

impl Filter for StripTags {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| self.strip(s)))
    }
}

/// Which quotes [`HtmlEntities`] escapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// `"` and `'`.
    #[default]
    Both,
    /// Only `"`.
    Double,
    /// Neither.
    None,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct HtmlEntitiesOptions {
    #[serde(default)]
    quote_style: QuoteStyle,
    #[serde(default = "yes")]
    double_encode: bool,
    encoding: Option<String>,
}

/// Signature: `value: Strings | html_entities(quoteStyle: String?, doubleEncode: Bool?, encoding: String?): Strings`
///
/// Escapes `&`, `<` and `>`, and quotes according to `quoteStyle`: `"both"`
/// (the default), `"double"` or `"none"`.  `'` is written as `&#039;`.  With
/// `doubleEncode: false`, existing entities like `&amp;` are left alone.
///
/// # Examples
///
/// - `"<b>\"hi\" & 'bye'</b>" | html_entities()` returns
///   `"&lt;b&gt;&quot;hi&quot; &amp; &#039;bye&#039;&lt;/b&gt;"`
#[derive(Debug, Clone, Copy)]
pub struct HtmlEntities {
    quote_style: QuoteStyle,
    double_encode: bool,
}

impl Default for HtmlEntities {
    fn default() -> Self {
        Self::new(QuoteStyle::default(), true)
    }
}

impl HtmlEntities {
    #[must_use]
    pub const fn new(quote_style: QuoteStyle, double_encode: bool) -> Self {
        Self {
            quote_style,
            double_encode,
        }
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());

        for (i, c) in text.char_indices() {
            match c {
                '&' if !self.double_encode && ENTITY.is_match(&text[i..]) => out.push('&'),
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' if self.quote_style != QuoteStyle::None => out.push_str("&quot;"),
                '\'' if self.quote_style == QuoteStyle::Both => out.push_str("&#039;"),
                c => out.push(c),
            }
        }

        out
    }
}

impl FromOptions for HtmlEntities {
    const NAME: &'static str = "html_entities";

    fn from_options(options: Option<&serde_json::Value>) -> Result<Self> {
        let options: HtmlEntitiesOptions = parse_options(Self::NAME, options)?;
        check_encoding(Self::NAME, options.encoding.as_deref())?;
        Ok(Self::new(options.quote_style, options.double_encode))
    }
}

impl Filter for HtmlEntities {
    type Value = Strings;

    fn filter(&self, value: Strings) -> Result<Value> {
        Ok(value.map(|s| self.escape(s)))
    }
}

#[cfg(test)]
mod tests {
    use filterchain_types::{FilterDyn, Value};
    use serde_json::json;

    use super::*;

    fn strip(filter: &StripTags, input: &str) -> String {
        match filter.apply(input.into()).unwrap() {
            Value::String(s) => s.to_string(),
            other => panic!("expected a string, got {other}"),
        }
    }

    #[test]
    fn strips_every_tag_by_default() {
        let filter = StripTags::default();
        assert_eq!(strip(&filter, r#"<a name="foo"> ABC </a>"#), " ABC ");
        assert_eq!(strip(&filter, "a<br/>b<!-- <p>gone</p> -->c"), "abc");
        assert_eq!(strip(&filter, "1 < 2"), "1 < 2");
    }

    #[test]
    fn keeps_allowed_tags_and_attributes() {
        let filter = StripTags::from_options(Some(&json!({
            "allowTags": ["img", "B"],
            "allowAttribs": "id",
        })))
        .unwrap();

        insta::assert_snapshot!(
            strip(&filter, r#"<p><B class="x">bold</B> <IMG ID="bar" SRC='x.png'/></p>"#),
            @r#"<b>bold</b> <img id="bar" />"#
        );
        assert_eq!(strip(&filter, "<img id=bar>"), r#"<img id="bar">"#);
        assert_eq!(strip(&filter, "<img id>"), "<img id>");
    }

    #[test]
    fn strips_strings_in_lists() {
        let filter = StripTags::default();
        assert_eq!(
            filter
                .apply(Value::List(vec!["<i>a</i>".into(), Value::Int(1)]))
                .unwrap(),
            Value::List(vec!["a".into(), Value::Int(1)])
        );
        assert_eq!(filter.apply(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn escapes_entities() {
        let filter = HtmlEntities::default();
        insta::assert_snapshot!(
            filter.escape(r#"<b>"hi" & 'bye'</b>"#),
            @"&lt;b&gt;&quot;hi&quot; &amp; &#039;bye&#039;&lt;/b&gt;"
        );

        let double = HtmlEntities::new(QuoteStyle::Double, true);
        assert_eq!(double.escape(r#"'a' "b""#), "'a' &quot;b&quot;");

        let none = HtmlEntities::new(QuoteStyle::None, true);
        assert_eq!(none.escape(r#"'a' "b""#), r#"'a' "b""#);
    }

    #[test]
    fn double_encoding() {
        assert_eq!(HtmlEntities::default().escape("&amp;"), "&amp;amp;");

        let filter =
            HtmlEntities::from_options(Some(&json!({ "doubleEncode": false }))).unwrap();
        assert_eq!(filter.escape("&amp; &#39; &#x27; & x"), "&amp; &#39; &#x27; &amp; x");
    }

    #[test]
    fn entity_options() {
        let filter =
            HtmlEntities::from_options(Some(&json!({ "quoteStyle": "double" }))).unwrap();
        assert_eq!(filter.escape("'"), "'");

        assert!(HtmlEntities::from_options(Some(&json!({ "quoteStyle": "single" }))).is_err());
        assert!(HtmlEntities::from_options(Some(&json!({ "encoding": "koi8-r" }))).is_err());
    }
}
