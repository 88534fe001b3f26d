use core::fmt;

use super::{
    value::{TryFromValue, Value},
    Result,
};

/// A typed filter: transforms one [`Value`] in its domain into another.
///
/// The domain is the associated [`Filter::Value`] type.  Inputs that do not
/// unwrap into it never reach [`Filter::filter`]; [`FilterDyn::apply`]
/// returns them verbatim instead.  This is how e.g. a lowercasing filter
/// passes `null`, numbers and host objects through untouched.
///
/// Configuration belongs in the implementing struct and should be validated
/// when it is constructed, so that `filter` only fails for reasons that depend
/// on the input itself.
pub trait Filter {
    /// The input type this filter understands.  See [`TryFromValue`].
    type Value: TryFromValue;

    /// Transform a `value` that is inside this filter's domain.
    ///
    /// # Errors
    ///
    /// An implementor should return `Err` only if the value cannot be
    /// transformed for a reason other than its shape.
    fn filter(&self, value: Self::Value) -> Result<Value>;
}

/// An object-safe version of [`Filter`].  All `F: Filter` implement this trait,
/// so prefer implementing `Filter` unless you must inspect the raw [`Value`]
/// before deciding whether to handle it.
///
/// Filters stored in a chain are `Send + Sync` and may be shared between
/// chains after a clone or merge, so any state behind `&self` must be safe to
/// share.
pub trait FilterDyn {
    /// Call this filter with the given `value`.
    ///
    /// # Errors
    ///
    /// Implementors should return an `Err` if the filter call is invalid.
    fn apply(&self, value: Value) -> Result<Value>;

    /// The Rust type name of the filter, for logs and error messages.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F: Filter> FilterDyn for F {
    #[inline]
    fn apply(&self, value: Value) -> Result<Value> {
        match F::Value::try_from_value(value) {
            Ok(value) => self.filter(value),
            Err(value) => Ok(value),
        }
    }
}

impl fmt::Debug for dyn FilterDyn + Send + Sync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Adapter that lets a plain closure act as a [`Filter`].
///
/// The closure sees every value, including ones other filters would pass
/// through, so it is responsible for its own type-gating.
///
/// # Examples
///
/// ```rust
/// # use filterchain_types::{Callback, FilterDyn, Value};
/// let reverse = Callback::new(|value: Value| {
///     Ok(match value {
///         Value::String(s) => s.chars().rev().collect::<String>().into(),
///         other => other,
///     })
/// });
///
/// assert_eq!(reverse.apply("Hello!".into()).unwrap(), Value::from("!olleH"));
/// assert_eq!(reverse.apply(Value::Int(3)).unwrap(), Value::Int(3));
/// ```
#[derive(Clone)]
pub struct Callback<F>(F);

impl<F> Callback<F>
where
    F: Fn(Value) -> Result<Value>,
{
    /// Wraps `callback`.
    #[inline]
    #[must_use]
    pub const fn new(callback: F) -> Self {
        Self(callback)
    }
}

impl<F> Filter for Callback<F>
where
    F: Fn(Value) -> Result<Value>,
{
    type Value = Value;

    #[inline]
    fn filter(&self, value: Value) -> Result<Value> {
        (self.0)(value)
    }
}

impl<F> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}
