use core::fmt;

use std::error::Error as StdError;

/// A specialized [`Result`](core::result::Result) type using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Error type for filter chains, registries and the filters themselves.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// A filter was requested by a name that no registry entry or alias
    /// resolves to.
    UnknownFilter {
        /// The name as it was requested, before normalization.
        name: String,
    },
    /// A filter rejected the options it was constructed with.
    ///
    /// Raised at composition time, never while a chain is running.
    InvalidConfiguration {
        /// The name of the filter that rejected its options.
        filter: String,
        /// What was wrong with the options.
        message: String,
        /// An optional underlying error, e.g. a regex or deserialization error.
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
    /// A chain entry cannot be exported to a configuration because it was not
    /// attached by name (a callback or a directly constructed filter).
    NotSerializable {
        /// The Rust type name of the offending filter.
        filter: String,
    },
    /// A non-[`Error`] error type that implements [`std::error::Error`] and `Send` and `Sync`.
    ///
    /// See [`MessageExt`] to create this from an appropriate [`Result`].
    Other {
        /// The error message for this error.
        message: String,
        /// An optional inner error that implements [`std::error::Error`] + `Send + Sync`.
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnknownFilter { name } => write!(f, "unrecognized filter `{name}`"),
            Error::InvalidConfiguration {
                filter,
                message,
                source,
            } => {
                write!(f, "invalid configuration for filter `{filter}`: {message}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
            Error::NotSerializable { filter } => write!(
                f,
                "filter `{filter}` was not attached by name and cannot be exported"
            ),
            Error::Other { message, source } => {
                write!(f, "{message}")?;
                if let Some(source) = source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
        }
    }
}

/// Easily create an [`Error`] from an inner format string and optional
/// [`std::error::Error`] type.
///
/// # Examples
///
/// With no inner error:
///
/// ```rust
/// # use filterchain_types::{Error, other};
/// let error = other!("expected at most {} items, found {}", 3, 5);
///
/// assert!(matches!(error, Error::Other { source: None, .. }));
/// assert_eq!(error.to_string(), "expected at most 3 items, found 5");
/// ```
///
/// With an inner error.
///
/// ```rust
/// # use filterchain_types::{Error, other};
/// let to_parse = "abcdef";
/// let source = to_parse.parse::<i32>().unwrap_err();
/// let error = other!(@source, "couldn't parse integer `{to_parse}`");
///
/// assert!(matches!(error, Error::Other { source: Some(..), .. }));
/// ```
#[macro_export]
macro_rules! other {
    (@Option: $err:expr, $($tt:tt)*) => {
        $crate::Error::Other {
            message: format!($($tt)*),
            source: $err,
        }
    };

    (@$err:expr, $($tt:tt)*) => {
        $crate::other!(@Option:Some(Box::new($err)), $($tt)*)
    };

    ($($tt:tt)*) => {
        $crate::other!(@Option: None, $($tt)*)
    };
}

/// Exit early out of a function with an [`other!`] Error variant.  Equivalent
/// to `return other!(...)`, so the function must have type [`Result`].
#[macro_export]
macro_rules! bail {
    ($($tt:tt)*) => {
        return Err($crate::other!($($tt)*))
    };
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::InvalidConfiguration { source, .. } | Error::Other { source, .. } => source
                .as_deref()
                .map(|source| source as &(dyn StdError + 'static)),
            Error::UnknownFilter { .. } | Error::NotSerializable { .. } => None,
        }
    }
}

impl Error {
    /// Creates a new [`Error`] with the given `message`.
    #[inline]
    #[must_use]
    pub fn message(message: String) -> Self {
        Self::Other {
            message,
            source: None,
        }
    }

    /// Creates an `UnknownFilter` variant for the requested `name`.
    #[inline]
    #[must_use]
    pub fn unknown_filter(name: &str) -> Self {
        Self::UnknownFilter {
            name: name.to_owned(),
        }
    }

    /// Creates an `InvalidConfiguration` variant with no underlying error.
    #[must_use]
    pub fn invalid_configuration<D: fmt::Display>(filter: &str, message: D) -> Self {
        Self::InvalidConfiguration {
            filter: filter.to_owned(),
            message: message.to_string(),
            source: None,
        }
    }

    /// Creates an `InvalidConfiguration` variant caused by `source`.
    #[must_use]
    pub fn invalid_configuration_from<D, E>(filter: &str, message: D, source: E) -> Self
    where
        D: fmt::Display,
        E: StdError + Send + Sync + 'static,
    {
        Self::InvalidConfiguration {
            filter: filter.to_owned(),
            message: message.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether this error was raised while composing a chain (unknown name or
    /// rejected options), as opposed to while running one.
    #[must_use]
    pub fn is_composition_error(&self) -> bool {
        match self {
            Self::UnknownFilter { .. } | Self::InvalidConfiguration { .. } => true,
            Self::NotSerializable { .. } | Self::Other { .. } => false,
        }
    }
}

/// Helper trait to provide the [`msg`](MessageExt::msg)
/// and [`with_msg`](MessageExt::with_msg) methods available on [`Result`]
/// and [`Option`].
pub trait MessageExt {
    type Wrapped: Sized;

    /// If `self` is `Ok` or `Some`, keep that.  Otherwise, return
    /// `Err(Error::Other)` with the given message, and the inner `E`
    /// if `Self = Result<T, E>`, otherwise `None`.
    #[allow(clippy::missing_errors_doc)]
    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped;
    /// Equivalent to [`MessageExt::msg`] but lazily calls the `message` function
    /// when necessary.
    #[allow(clippy::missing_errors_doc)]
    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D;
}

impl<T, E: StdError + Send + Sync + 'static> MessageExt for core::result::Result<T, E> {
    type Wrapped = Result<T>;

    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped {
        match self {
            Ok(t) => Ok(t),
            Err(source) => Err(Error::Other {
                message: message.to_string(),
                source: Some(Box::new(source)),
            }),
        }
    }

    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D,
    {
        match self {
            Ok(t) => Ok(t),
            Err(source) => Err(Error::Other {
                message: message().to_string(),
                source: Some(Box::new(source)),
            }),
        }
    }
}

impl<T> MessageExt for Option<T> {
    type Wrapped = Result<T>;

    fn msg<D: fmt::Display>(self, message: D) -> Self::Wrapped {
        self.ok_or(Error::message(message.to_string()))
    }

    fn with_msg<D, F>(self, message: F) -> Self::Wrapped
    where
        D: fmt::Display,
        F: FnOnce() -> D,
    {
        self.ok_or_else(|| Error::message(message().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, MessageExt};

    #[test]
    fn configuration_errors_render_filter_and_source() {
        let source = "x".parse::<i64>().unwrap_err();
        let error = Error::invalid_configuration_from("to_int", "bad option", source);

        insta::assert_snapshot!(
            error.to_string(),
            @"invalid configuration for filter `to_int`: bad option: invalid digit found in string"
        );
        assert!(error.is_composition_error());
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn unknown_filters_are_composition_errors() {
        let error = Error::unknown_filter("nope");

        assert!(error.is_composition_error());
        assert_eq!(error.to_string(), "unrecognized filter `nope`");
        assert!(std::error::Error::source(&error).is_none());
    }

    #[test]
    fn option_message() {
        let error = None::<()>.msg("nothing here").unwrap_err();
        assert!(matches!(error, Error::Other { source: None, .. }));
        assert!(!error.is_composition_error());
    }
}
