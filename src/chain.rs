use std::{
    cmp::Reverse,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, OnceLock,
    },
};

use filterchain_types::{Callback, Error, Filter, FilterDyn, Result, Value};
use tracing::{debug, trace};

use crate::{
    config::{ChainConfig, FilterSpec},
    registry::FilterRegistry,
};

/// Priority given to filters attached without an explicit one.
pub const DEFAULT_PRIORITY: i32 = 1000;

/// A filter as stored in a chain.  Clones and merges share these.
pub type SharedFilter = Arc<dyn FilterDyn + Send + Sync>;

static NEXT_CHAIN_ID: AtomicU64 = AtomicU64::new(0);

/// Identifies one attached entry of one chain, as returned by the `attach`
/// methods and consumed by [`FilterChain::detach`].
///
/// Handles are scoped to the chain that issued them: a clone or merge target
/// has its own handles, so a handle never detaches an entry of another chain,
/// even when the same filter is attached there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    chain: u64,
    sequence: u64,
}

/// Read-only view of an attached entry, see [`FilterChain::entries`].
#[derive(Debug, Clone, Copy)]
pub struct EntryInfo<'a> {
    /// Handle to detach this entry with.
    pub handle: EntryHandle,
    /// Priority the entry was attached with.
    pub priority: i32,
    /// Registry name, for entries attached by name.
    pub name: Option<&'a str>,
    /// The filter itself.
    pub filter: &'a SharedFilter,
}

#[derive(Clone)]
struct Entry {
    filter: SharedFilter,
    priority: i32,
    sequence: u64,
    /// Name and options, when the entry came from the registry.
    origin: Option<FilterSpec>,
}

impl Entry {
    /// Execution order: priority descending, then attach order.
    fn sort_key(&self) -> (Reverse<i32>, u64) {
        (Reverse(self.priority), self.sequence)
    }
}

/// An ordered, mutable collection of filters run in sequence over one value.
///
/// Entries run by priority, highest first.  Among equal priorities they run in
/// attach order.  The order is resolved lazily on the first run or
/// enumeration after a mutation and cached until the next one.
///
/// Mutation needs `&mut self`; to hand an independently mutable chain to
/// someone else, [`Clone`] it.  A clone has its own entries and counters but
/// shares the underlying filters.
pub struct FilterChain {
    id: u64,
    entries: Vec<Entry>,
    next_sequence: u64,
    order: OnceLock<Vec<usize>>,
    registry: Arc<FilterRegistry>,
}

impl FilterChain {
    /// Creates an empty chain that resolves names through
    /// [`FilterRegistry::shared`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(FilterRegistry::shared())
    }

    /// Creates an empty chain that resolves names through `registry`.
    #[must_use]
    pub fn with_registry(registry: Arc<FilterRegistry>) -> Self {
        Self {
            id: NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            next_sequence: 0,
            order: OnceLock::new(),
            registry,
        }
    }

    /// Builds a chain from `config`, resolving names through
    /// [`FilterRegistry::shared`].
    ///
    /// # Errors
    ///
    /// See [`FilterChain::apply_config`].
    pub fn from_config(config: &ChainConfig) -> Result<Self> {
        Self::new().with_config(config)
    }

    /// Attaches every filter of `config` to this chain and returns it.
    ///
    /// # Errors
    ///
    /// See [`FilterChain::apply_config`].
    pub fn with_config(mut self, config: &ChainConfig) -> Result<Self> {
        self.apply_config(config)?;
        Ok(self)
    }

    /// The registry used by [`FilterChain::attach_by_name`].
    #[must_use]
    pub fn registry(&self) -> &Arc<FilterRegistry> {
        &self.registry
    }

    /// Replaces the registry used for future name lookups.  Entries already
    /// attached are unaffected.
    pub fn set_registry(&mut self, registry: Arc<FilterRegistry>) {
        self.registry = registry;
    }

    /// Attaches `filter` with the given `priority`.
    pub fn attach<F>(&mut self, filter: F, priority: i32) -> EntryHandle
    where
        F: FilterDyn + Send + Sync + 'static,
    {
        self.push(Arc::new(filter), priority, None)
    }

    /// Attaches `filter` with [`DEFAULT_PRIORITY`].
    pub fn attach_default<F>(&mut self, filter: F) -> EntryHandle
    where
        F: FilterDyn + Send + Sync + 'static,
    {
        self.attach(filter, DEFAULT_PRIORITY)
    }

    /// Attaches an already shared filter, e.g. one detached from another
    /// chain or used by several chains at once.
    pub fn attach_shared(&mut self, filter: SharedFilter, priority: i32) -> EntryHandle {
        self.push(filter, priority, None)
    }

    /// Attaches a closure as a filter.  See [`Callback`].
    pub fn attach_fn<F>(&mut self, callback: F, priority: i32) -> EntryHandle
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.attach(Callback::new(callback), priority)
    }

    /// Builds the filter registered as `name` with `options` and attaches it.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownFilter`] if no filter is registered under `name`.
    /// - [`Error::InvalidConfiguration`] if the filter rejects `options`.
    ///
    /// On error the chain is left unchanged.
    pub fn attach_by_name(
        &mut self,
        name: &str,
        options: Option<serde_json::Value>,
        priority: i32,
    ) -> Result<EntryHandle> {
        let filter = self.registry.create(name, options.as_ref())?;
        let origin = FilterSpec {
            name: name.to_owned(),
            options,
            priority: None,
        };

        Ok(self.push(filter, priority, Some(origin)))
    }

    /// Attaches every filter of `config`, in order.
    ///
    /// All filters are built before any is attached, so if one fails the chain
    /// is left unchanged.
    ///
    /// # Errors
    ///
    /// See [`FilterChain::attach_by_name`].
    pub fn apply_config(&mut self, config: &ChainConfig) -> Result<()> {
        let built = config
            .filters
            .iter()
            .map(|spec| {
                self.registry
                    .create(&spec.name, spec.options.as_ref())
                    .map(|filter| (filter, spec))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(chain = self.id, filters = built.len(), "applying chain config");

        for (filter, spec) in built {
            let origin = FilterSpec {
                priority: None,
                ..spec.clone()
            };
            self.push(filter, spec.effective_priority(), Some(origin));
        }

        Ok(())
    }

    /// Describes this chain as a [`ChainConfig`] listing the filters in
    /// execution order.  Building a chain from the result reproduces the same
    /// execution order.
    ///
    /// # Errors
    ///
    /// [`Error::NotSerializable`] if any entry was attached as an object or
    /// callback rather than by name.
    pub fn to_config(&self) -> Result<ChainConfig> {
        let filters = self
            .ordered()
            .map(|entry| match &entry.origin {
                Some(origin) => Ok(FilterSpec {
                    priority: Some(entry.priority),
                    ..origin.clone()
                }),
                None => Err(Error::NotSerializable {
                    filter: entry.filter.type_name().to_owned(),
                }),
            })
            .collect::<Result<_>>()?;

        Ok(ChainConfig { filters })
    }

    /// Removes the entry identified by `handle`, returning its filter.
    ///
    /// Detaching an entry that is not attached to this chain (already
    /// detached, cleared, or issued by another chain) is a no-op returning
    /// `None`.
    pub fn detach(&mut self, handle: EntryHandle) -> Option<SharedFilter> {
        if handle.chain != self.id {
            trace!(chain = self.id, ?handle, "ignoring handle of another chain");
            return None;
        }

        let index = self
            .entries
            .iter()
            .position(|entry| entry.sequence == handle.sequence)?;
        let entry = self.entries.remove(index);
        self.invalidate();

        debug!(
            chain = self.id,
            sequence = entry.sequence,
            filter = entry.filter.type_name(),
            "detached filter"
        );

        Some(entry.filter)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        debug!(chain = self.id, removed = self.entries.len(), "cleared chain");
        self.entries.clear();
        self.invalidate();
    }

    /// Appends copies of `other`'s entries to this chain.  `other` is not
    /// modified.
    ///
    /// The copies keep their priorities and share `other`'s filters.  They are
    /// attached in `other`'s execution order after this chain's existing
    /// entries, so `other`'s relative order is preserved and, at equal
    /// priority, they run after the entries already here.
    ///
    /// To merge a chain with itself, merge a clone of it.
    pub fn merge(&mut self, other: &FilterChain) {
        let incoming: Vec<Entry> = other.ordered().cloned().collect();

        debug!(
            chain = self.id,
            from = other.id,
            entries = incoming.len(),
            "merging chain"
        );

        for entry in incoming {
            self.push(entry.filter, entry.priority, entry.origin);
        }
    }

    /// Number of attached entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Alias of [`FilterChain::count`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The attached filters, in execution order.
    pub fn filters(&self) -> impl ExactSizeIterator<Item = &SharedFilter> + '_ {
        self.ordered().map(|entry| &entry.filter)
    }

    /// The attached entries, in execution order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = EntryInfo<'_>> + '_ {
        self.ordered().map(|entry| EntryInfo {
            handle: EntryHandle {
                chain: self.id,
                sequence: entry.sequence,
            },
            priority: entry.priority,
            name: entry.origin.as_ref().map(|origin| origin.name.as_str()),
            filter: &entry.filter,
        })
    }

    /// Runs `value` through every filter in execution order, returning the
    /// result of the last one.  An empty chain returns `value` unchanged.
    ///
    /// # Errors
    ///
    /// The first error returned by a filter, unmodified.  Later filters do
    /// not run.
    pub fn filter(&self, value: Value) -> Result<Value> {
        self.ordered().try_fold(value, |value, entry| {
            trace!(
                chain = self.id,
                sequence = entry.sequence,
                priority = entry.priority,
                filter = entry.filter.type_name(),
                input = value.kind(),
                "applying filter"
            );
            entry.filter.apply(value)
        })
    }

    fn push(&mut self, filter: SharedFilter, priority: i32, origin: Option<FilterSpec>) -> EntryHandle {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        debug!(
            chain = self.id,
            sequence,
            priority,
            filter = filter.type_name(),
            name = origin.as_ref().map(|origin| origin.name.as_str()),
            "attached filter"
        );

        self.entries.push(Entry {
            filter,
            priority,
            sequence,
            origin,
        });
        self.invalidate();

        EntryHandle {
            chain: self.id,
            sequence,
        }
    }

    fn invalidate(&mut self) {
        self.order = OnceLock::new();
    }

    fn order(&self) -> &[usize] {
        self.order.get_or_init(|| {
            let mut order: Vec<usize> = (0..self.entries.len()).collect();
            // sequences are unique, so this is a total order
            order.sort_unstable_by_key(|&i| self.entries[i].sort_key());
            order
        })
    }

    fn ordered(&self) -> impl ExactSizeIterator<Item = &Entry> + '_ {
        self.order().iter().map(|&i| &self.entries[i])
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

/// A clone has its own entries, handles and sequence counter, and shares the
/// filters and registry with the original.
impl Clone for FilterChain {
    fn clone(&self) -> Self {
        Self {
            id: NEXT_CHAIN_ID.fetch_add(1, Ordering::Relaxed),
            entries: self.entries.clone(),
            next_sequence: self.next_sequence,
            order: self.order.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("id", &self.id)
            .field(
                "entries",
                &self
                    .ordered()
                    .map(|entry| (entry.priority, entry.sequence, entry.filter.type_name()))
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// A chain is itself a filter, so chains can be nested.
impl Filter for FilterChain {
    type Value = Value;

    fn filter(&self, value: Value) -> Result<Value> {
        FilterChain::filter(self, value)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use filterchain_types::{bail, Value};

    use super::{FilterChain, DEFAULT_PRIORITY};
    use crate::Error;

    /// Chain whose callbacks record their label into `log` when run.
    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, filters: &[(&'static str, i32)]) -> FilterChain {
        let mut chain = FilterChain::new();
        for &(label, priority) in filters {
            let log = Arc::clone(log);
            chain.attach_fn(
                move |value| {
                    log.lock().unwrap().push(label);
                    Ok(value)
                },
                priority,
            );
        }
        chain
    }

    fn run_order(chain: &FilterChain, log: &Arc<Mutex<Vec<&'static str>>>) -> Vec<&'static str> {
        log.lock().unwrap().clear();
        chain.filter(Value::Null).unwrap();
        log.lock().unwrap().clone()
    }

    #[test]
    fn empty_chain_is_identity() {
        let chain = FilterChain::new();
        assert_eq!(chain.count(), 0);
        assert_eq!(chain.filter("something".into()).unwrap(), Value::from("something"));
    }

    #[test]
    fn priority_descending_then_fifo() {
        let log = Arc::default();
        let chain = recording(&log, &[("a", 1), ("b", 100), ("c", 100)]);
        assert_eq!(run_order(&chain, &log), ["b", "c", "a"]);
    }

    #[test]
    fn negative_and_default_priorities() {
        let log = Arc::default();
        let chain = recording(
            &log,
            &[("neg", -5), ("default", DEFAULT_PRIORITY), ("zero", 0), ("high", 5000)],
        );
        assert_eq!(run_order(&chain, &log), ["high", "default", "zero", "neg"]);
    }

    #[test]
    fn order_is_recomputed_after_mutation() {
        let log = Arc::default();
        let mut chain = recording(&log, &[("a", 1)]);
        assert_eq!(run_order(&chain, &log), ["a"]);

        let inner = Arc::clone(&log);
        chain.attach_fn(
            move |value| {
                inner.lock().unwrap().push("b");
                Ok(value)
            },
            2,
        );
        assert_eq!(run_order(&chain, &log), ["b", "a"]);
    }

    #[test]
    fn detach_removes_exactly_one_entry() {
        let log = Arc::default();
        let mut chain = recording(&log, &[("a", 1), ("b", 1), ("c", 1)]);
        let handles: Vec<_> = chain.entries().map(|entry| entry.handle).collect();

        assert!(chain.detach(handles[1]).is_some());
        assert_eq!(run_order(&chain, &log), ["a", "c"]);

        // a second detach is a silent no-op
        assert!(chain.detach(handles[1]).is_none());
        assert_eq!(chain.count(), 2);
    }

    #[test]
    fn same_filter_attached_twice_detaches_by_handle() {
        let mut chain = FilterChain::new();
        let shared: super::SharedFilter = Arc::new(filterchain_types::Callback::new(|value: Value| {
            Ok(match value {
                Value::Int(n) => Value::Int(n * 2),
                other => other,
            })
        }));

        let first = chain.attach_shared(Arc::clone(&shared), DEFAULT_PRIORITY);
        chain.attach_shared(Arc::clone(&shared), DEFAULT_PRIORITY);
        assert_eq!(chain.filter(Value::Int(3)).unwrap(), Value::Int(12));

        let removed = chain.detach(first).unwrap();
        assert!(Arc::ptr_eq(&removed, &shared));
        assert_eq!(chain.filter(Value::Int(3)).unwrap(), Value::Int(6));
    }

    #[test]
    fn handles_do_not_cross_chains() {
        let mut a = FilterChain::new();
        let handle = a.attach_fn(Ok, DEFAULT_PRIORITY);
        let mut b = a.clone();

        assert!(b.detach(handle).is_none());
        assert_eq!(b.count(), 1);
        assert!(a.detach(handle).is_some());
        assert_eq!(b.count(), 1);
    }

    #[test]
    fn clear_keeps_sequences_increasing() {
        let log = Arc::default();
        let mut chain = recording(&log, &[("a", 1)]);
        let old = chain.entries().next().unwrap().handle;
        chain.clear();
        assert!(chain.is_empty());

        let new = chain.attach_fn(Ok, 1);
        assert_ne!(old, new);
        assert!(chain.detach(old).is_none());
    }

    #[test]
    fn merge_appends_after_equal_priorities() {
        let log = Arc::default();
        let mut x = recording(&log, &[("p1", 10), ("p2", 5)]);
        let y = recording(&log, &[("q1", 10), ("q2", 1)]);

        x.merge(&y);
        assert_eq!(x.count(), 4);
        assert_eq!(y.count(), 2);
        assert_eq!(run_order(&x, &log), ["p1", "q1", "p2", "q2"]);
    }

    #[test]
    fn merge_keeps_relative_order_of_ties() {
        let log = Arc::default();
        let mut x = recording(&log, &[("p", 0)]);
        let y = recording(&log, &[("q1", 0), ("q2", 0), ("q3", 0)]);

        x.merge(&y);
        x.merge(&y);
        assert_eq!(
            run_order(&x, &log),
            ["p", "q1", "q2", "q3", "q1", "q2", "q3"]
        );
    }

    #[test]
    fn merge_with_clone_of_self_duplicates_entries() {
        let log = Arc::default();
        let mut x = recording(&log, &[("a", 2), ("b", 1)]);
        let copy = x.clone();
        x.merge(&copy);
        assert_eq!(run_order(&x, &log), ["a", "a", "b", "b"]);
    }

    #[test]
    fn clone_is_isolated_but_shares_filters() {
        let mut a = FilterChain::new();
        a.attach_fn(Ok, DEFAULT_PRIORITY);
        let mut b = a.clone();
        b.attach_fn(|_| Ok(Value::Bool(true)), DEFAULT_PRIORITY);

        assert_eq!(a.count(), 1);
        assert_eq!(b.count(), 2);
        assert_ne!(
            a.filter(Value::Int(1)).unwrap(),
            b.filter(Value::Int(1)).unwrap()
        );

        let first_a = a.filters().next().unwrap();
        let first_b = b.filters().next().unwrap();
        assert!(Arc::ptr_eq(first_a, first_b));
    }

    #[test]
    fn errors_propagate_unmodified_and_stop_the_fold() {
        let ran = Arc::new(Mutex::new(false));
        let mut chain = FilterChain::new();
        chain.attach_fn(|_| bail!("boom"), 2);
        let flag = Arc::clone(&ran);
        chain.attach_fn(
            move |value| {
                *flag.lock().unwrap() = true;
                Ok(value)
            },
            1,
        );

        let error = chain.filter(Value::Null).unwrap_err();
        assert!(matches!(&error, Error::Other { message, source: None } if message == "boom"));
        assert!(!*ran.lock().unwrap());
    }

    #[test]
    fn unknown_name_leaves_chain_unchanged() {
        let mut chain = FilterChain::new();
        chain.attach_fn(Ok, 1);

        let error = chain.attach_by_name("doesNotExist", None, 1).unwrap_err();
        assert!(matches!(error, Error::UnknownFilter { ref name } if name == "doesNotExist"));
        assert_eq!(chain.count(), 1);
    }

    #[test]
    fn with_config_uses_the_chain_registry() {
        let mut registry = crate::FilterRegistry::new();
        registry.register("nothing", |_: Option<&serde_json::Value>| {
            Ok::<super::SharedFilter, Error>(Arc::new(filterchain_types::Callback::new(
                |_: Value| Ok(Value::Null),
            )))
        });
        let config = crate::ChainConfig {
            filters: vec![crate::FilterSpec::new("Nothing").with_priority(3)],
        };

        let chain = FilterChain::with_registry(Arc::new(registry))
            .with_config(&config)
            .unwrap();
        assert_eq!(chain.filter("x".into()).unwrap(), Value::Null);
        assert_eq!(chain.entries().next().unwrap().priority, 3);

        assert!(FilterChain::new().with_config(&config).is_err());
    }

    #[test]
    fn chains_nest() {
        let mut inner = FilterChain::new();
        inner.attach_by_name("string_to_upper", None, 1).unwrap();
        let mut outer = FilterChain::new();
        outer.attach_by_name("string_trim", None, 2).unwrap();
        outer.attach(inner, 1);

        assert_eq!(outer.filter("  hi ".into()).unwrap(), Value::from("HI"));
    }

    #[test]
    fn debug_lists_entries_in_order() {
        let mut chain = FilterChain::new();
        chain.attach_by_name("dir", None, 1).unwrap();
        chain.attach_by_name("base_name", None, 2).unwrap();

        let debug = format!("{chain:?}");
        let base = debug.find("BaseName").unwrap();
        let dir = debug.find("Dir").unwrap();
        assert!(base < dir, "{debug}");

        let entry = format!("{:?}", chain.entries().next().unwrap());
        assert!(entry.contains("priority: 2") && entry.contains("BaseName"), "{entry}");
    }
}
