#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! Priority-ordered chains of composable value filters.
//!
//! # Chains
//!
//! A [`FilterChain`] holds filters, each attached with a priority.  Running the
//! chain folds one [`Value`] through every filter, highest priority first;
//! filters with equal priority run in the order they were attached.
//!
//! ```rust
//! use filterchain::{FilterChain, Value, DEFAULT_PRIORITY};
//!
//! let mut chain = FilterChain::new();
//! chain.attach_by_name("string_trim", None, 100)?;
//! chain.attach_by_name("strip_tags", None, DEFAULT_PRIORITY)?;
//! chain.attach_by_name("StringToLower", None, 900)?;
//!
//! let out = chain.filter(Value::from(r#"<a name="foo"> ABC </a>"#))?;
//! assert_eq!(out, Value::from("abc"));
//! # Ok::<(), filterchain::Error>(())
//! ```
//!
//! # Registry
//!
//! A [`FilterRegistry`] maps names (and aliases) to [`FilterFactory`]s that
//! build configured filters from JSON options.  [`FilterRegistry::shared`] is
//! preloaded with the filters in [`filter`].
//!
//! # Configuration
//!
//! [`ChainConfig`] describes a chain of named filters declaratively and can be
//! read from or written to JSON with `serde`.

mod chain;
mod config;
pub mod filter;
mod registry;

pub use chain::{EntryHandle, EntryInfo, FilterChain, SharedFilter, DEFAULT_PRIORITY};
pub use config::{ChainConfig, FilterSpec};
pub use filterchain_types::{
    bail, other, Callback, Error, Filter, FilterDyn, MessageExt, Opaque, Result, Scalar, Strings,
    Structure, TryFromValue, Value,
};
pub use registry::{FilterFactory, FilterRegistry};
