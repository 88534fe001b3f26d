use serde::{Deserialize, Serialize};

use crate::chain::DEFAULT_PRIORITY;

/// Declarative description of a chain made of named filters.
///
/// ```json
/// { "filters": [ { "name": "strip_tags", "options": { "allowTags": "img" }, "priority": 10100 } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    /// The filters to attach, in attach order.
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

/// One named filter in a [`ChainConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterSpec {
    /// Registry name or alias of the filter.
    pub name: String,
    /// Options handed to the filter's factory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
    /// Priority to attach with; [`DEFAULT_PRIORITY`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl FilterSpec {
    /// A spec with no options at the default priority.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: None,
            priority: None,
        }
    }

    /// Sets the options.
    #[must_use]
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The priority this spec attaches with.
    #[must_use]
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }
}

impl ChainConfig {
    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// The text is not valid JSON or does not describe a chain.
    pub fn from_json(json: &str) -> filterchain_types::Result<Self> {
        use filterchain_types::MessageExt;

        serde_json::from_str(json).msg("invalid chain configuration")
    }

    /// Renders this configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Only if an options value cannot be serialized, which does not happen
    /// for options that came from JSON.
    pub fn to_json(&self) -> filterchain_types::Result<String> {
        use filterchain_types::MessageExt;

        serde_json::to_string_pretty(self).msg("could not serialize chain configuration")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ChainConfig, FilterSpec};
    use crate::DEFAULT_PRIORITY;

    #[test]
    fn parses_filters_with_optional_fields() {
        let config = ChainConfig::from_json(
            r#"{
                "filters": [
                    { "name": "string_trim" },
                    { "name": "preg_replace", "options": { "pattern": "/a/" }, "priority": 5 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.filters,
            vec![
                FilterSpec::new("string_trim"),
                FilterSpec::new("preg_replace")
                    .with_options(json!({ "pattern": "/a/" }))
                    .with_priority(5),
            ]
        );
        assert_eq!(config.filters[0].effective_priority(), DEFAULT_PRIORITY);
    }

    #[test]
    fn rejects_unknown_keys() {
        let error = ChainConfig::from_json(r#"{ "filters": [ { "nmae": "x" } ] }"#).unwrap_err();
        assert!(error.to_string().starts_with("invalid chain configuration"));
    }

    #[test]
    fn skips_absent_fields_when_serializing() {
        let config = ChainConfig {
            filters: vec![FilterSpec::new("dir").with_priority(7)],
        };

        insta::assert_json_snapshot!(config, @r#"
        {
          "filters": [
            {
              "name": "dir",
              "priority": 7
            }
          ]
        }
        "#);
    }
}
