#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! API types for writing filters usable in a [filterchain](https://docs.rs/filterchain).
//!
//! # Value
//!
//! This crate provides the value type [`Value`] that flows through a chain, the
//! [`Opaque`] handle for carrying host objects through it by reference, and the
//! trait [`TryFromValue`] that declares which shapes of [`Value`] a filter
//! accepts.
//!
//! # Errors
//!
//! Provides the [`Error`] enum to handle and create errors, including other
//! Rust errors with [`other!`] and [`MessageExt`].
//!
//! # Filters
//!
//! Provides the typed [`Filter`] trait and the object-safe [`FilterDyn`] one, as
//! well as the [`Callback`] adapter that turns a plain closure into a filter.

#[macro_use]
mod error;
mod filter;
mod value;

pub use error::{Error, MessageExt, Result};
pub use filter::{Callback, Filter, FilterDyn};
pub use value::{Opaque, Scalar, Strings, Structure, TryFromValue, Value};
