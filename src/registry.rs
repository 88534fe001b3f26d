use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, LazyLock},
};

use filterchain_types::{bail, Error, Result};
use tracing::debug;

use crate::chain::SharedFilter;

/// Builds a configured filter from optional JSON options.
///
/// Implemented for every `Fn(Option<&serde_json::Value>) -> Result<SharedFilter>`.
pub trait FilterFactory {
    /// Create a new filter instance.
    ///
    /// # Errors
    ///
    /// Implementors should return [`Error::InvalidConfiguration`] if the
    /// options are not acceptable.
    fn create(&self, options: Option<&serde_json::Value>) -> Result<SharedFilter>;
}

impl<F> FilterFactory for F
where
    F: Fn(Option<&serde_json::Value>) -> Result<SharedFilter>,
{
    #[inline]
    fn create(&self, options: Option<&serde_json::Value>) -> Result<SharedFilter> {
        self(options)
    }
}

type BoxedFactory = Box<dyn FilterFactory + Send + Sync>;

static SHARED: LazyLock<Arc<FilterRegistry>> =
    LazyLock::new(|| Arc::new(FilterRegistry::with_builtins()));

/// Maps filter names and aliases to [`FilterFactory`]s.
///
/// Lookups are forgiving about spelling: names are compared after dropping any
/// namespace prefix (`Word\`, `word::`), ASCII-lowercasing, and removing
/// everything that is not a letter or digit.  `StringToLower`,
/// `string_to_lower` and `stringtolower` all name the same filter.
#[derive(Default)]
pub struct FilterRegistry {
    factories: BTreeMap<String, BoxedFactory>,
    aliases: BTreeMap<String, String>,
}

impl FilterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every filter in [`crate::filter`].
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::filter::register_builtins(&mut registry);
        registry
    }

    /// The process-wide registry of built-in filters, used by
    /// [`FilterChain::new`](crate::FilterChain::new).
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Registers `factory` under `name`, replacing any factory or alias with
    /// the same normalized name.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: FilterFactory + Send + Sync + 'static,
    {
        let key = normalize(name);
        debug!(name, key = key.as_str(), "registering filter");
        self.aliases.remove(&key);
        self.factories.insert(key, Box::new(factory));
        self
    }

    /// Makes `alias` resolve to the filter registered as `target`.  An alias
    /// that normalizes to `target` itself is a no-op.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownFilter`] if `target` is not a registered name.
    /// - [`Error::Other`] if `alias` is already the name of another filter.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<&mut Self> {
        let target_key = normalize(target);
        if !self.factories.contains_key(&target_key) {
            return Err(Error::unknown_filter(target));
        }

        let key = normalize(alias);
        if key == target_key {
            return Ok(self);
        }
        if self.factories.contains_key(&key) {
            bail!("cannot alias `{alias}` to `{target}`: a filter is already registered as `{key}`");
        }

        debug!(alias, target, "registering alias");
        self.aliases.insert(key, target_key);
        Ok(self)
    }

    /// Finds the factory for `name`, following one level of alias.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownFilter`] if nothing is registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&(dyn FilterFactory + Send + Sync)> {
        let key = normalize(name);
        let key = self.aliases.get(&key).unwrap_or(&key);

        self.factories
            .get(key)
            .map(|factory| &**factory)
            .ok_or_else(|| Error::unknown_filter(name))
    }

    /// Resolves `name` and builds the filter with `options`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownFilter`] if nothing is registered under `name`.
    /// - [`Error::InvalidConfiguration`] if the factory rejects `options`.
    pub fn create(&self, name: &str, options: Option<&serde_json::Value>) -> Result<SharedFilter> {
        self.resolve(name)?.create(options).map_err(|e| match e {
            e @ Error::InvalidConfiguration { .. } => e,
            other => Error::InvalidConfiguration {
                filter: name.to_owned(),
                message: "filter could not be constructed".to_owned(),
                source: Some(Box::new(other)),
            },
        })
    }

    /// Whether `name` resolves to a factory.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// The normalized names of all registered factories, aliases excluded.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .finish()
    }
}

fn normalize(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '\\' || c == ':')
        .next()
        .unwrap_or(name);

    base.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use filterchain_types::{Callback, Error, Value};
    use serde_json::json;

    use super::{normalize, FilterRegistry};
    use crate::chain::SharedFilter;

    fn constant(options: Option<&serde_json::Value>) -> filterchain_types::Result<SharedFilter> {
        let value = Value::from(options.cloned().unwrap_or_default());
        Ok(Arc::new(Callback::new(move |_| Ok(value.clone()))))
    }

    #[test]
    fn normalizes_spelling_and_namespaces() {
        assert_eq!(normalize("StringToLower"), "stringtolower");
        assert_eq!(normalize("string_to_lower"), "stringtolower");
        assert_eq!(normalize(r"Acme\Filter\StringToLower"), "stringtolower");
        assert_eq!(normalize("word::dash-to-separator"), "dashtoseparator");
    }

    #[test]
    fn resolves_names_and_aliases() {
        let mut registry = FilterRegistry::new();
        registry.register("constant", constant);
        registry.alias("const", "constant").unwrap();

        let filter = registry.create("CONST", Some(&json!(5))).unwrap();
        assert_eq!(filter.apply(Value::Null).unwrap(), Value::Int(5));
        assert!(registry.contains("Constant"));
        assert_eq!(registry.names().collect::<Vec<_>>(), ["constant"]);
    }

    #[test]
    fn unknown_names_and_alias_targets() {
        let mut registry = FilterRegistry::new();
        assert!(matches!(
            registry.create("missing", None),
            Err(Error::UnknownFilter { .. })
        ));
        assert!(matches!(
            registry.alias("x", "missing"),
            Err(Error::UnknownFilter { .. })
        ));
    }

    #[test]
    fn factory_failures_become_configuration_errors() {
        let mut registry = FilterRegistry::new();
        registry.register(
            "picky",
            |_: Option<&serde_json::Value>| -> filterchain_types::Result<SharedFilter> {
                filterchain_types::bail!("no thanks")
            },
        );

        let error = registry.create("picky", None).unwrap_err();
        assert!(matches!(error, Error::InvalidConfiguration { ref filter, .. } if filter == "picky"));
    }

    #[test]
    fn aliases_never_shadow_registered_filters() {
        let mut registry = FilterRegistry::with_builtins();

        let error = registry.alias("dir", "base_name").unwrap_err();
        assert!(matches!(error, Error::Other { .. }), "{error}");

        let dir = registry.create("dir", None).unwrap();
        assert_eq!(dir.apply("/etc/passwd".into()).unwrap(), Value::from("/etc"));

        assert!(registry.alias("Dir", "dir").is_ok());
        assert_eq!(
            registry.create("DIR", None).unwrap().apply("/etc/passwd".into()).unwrap(),
            Value::from("/etc")
        );
    }

    #[test]
    fn reregistering_replaces_alias() {
        let mut registry = FilterRegistry::new();
        registry.register("a", constant);
        registry.register("b", constant);
        registry.alias("c", "a").unwrap();
        registry.register("c", constant);

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            ["a", "b", "c"]
        );
    }

    #[test]
    fn shared_registry_has_builtins() {
        let registry = FilterRegistry::shared();
        for name in ["StringTrim", "StripTags", "StringToLower", "int", "null", "PregReplace"] {
            assert!(registry.contains(name), "{name} should be registered");
        }
    }
}
