use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

use serde::Serialize;

use super::Result;

/// Type alias representing a key-value structure of [`Value`]
pub type Structure = BTreeMap<Arc<str>, Value>;

/// Trait declaring which shapes of [`Value`] a type can be unwrapped from.
///
/// This is the domain of a typed [`Filter`](crate::Filter): a value that does
/// not unwrap is handed back untouched and the filter passes it through.
pub trait TryFromValue: Sized {
    /// Try to unwrap a [`Value`] variant into an instance of type `Self`.
    ///
    /// # Errors
    ///
    /// Returns the original `value`, unmodified, when it is outside the
    /// domain of `Self`.
    fn try_from_value(value: Value) -> core::result::Result<Self, Value>;
}

/// A variant-typed value of anything that can flow through a filter chain.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// A value of `null`.
    #[serde(serialize_with = "serialize_null_as_option")]
    Null,
    /// A floating-point value.
    Float(f64),
    /// A signed integer value.
    Int(i64),
    /// A boolean value.  Note that this is distinct from the integer type.
    Bool(bool),
    /// A UTF-8 string value, stored as an `Arc<str>` for cheaper cloning.
    String(Arc<str>),
    /// A list of other values, not necessarily of the same type.
    List(Vec<Value>),
    /// A String-value nested mapping of values.
    Structure(Structure),
    /// A host object carried by reference.  No built-in filter understands
    /// it, so it always comes out of a chain as the same reference.
    #[serde(serialize_with = "serialize_opaque")]
    Object(Opaque),
}

/// A reference-counted host object stored in a [`Value::Object`].
///
/// Equality is reference identity: two `Opaque`s are equal only if they point
/// to the same allocation.
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    /// Moves `object` into a new shared allocation.
    #[must_use]
    pub fn new<T: Any + Send + Sync>(object: T) -> Self {
        Self(Arc::new(object))
    }

    /// Wraps an existing shared allocation without copying it.
    #[must_use]
    pub fn from_arc(object: Arc<dyn Any + Send + Sync>) -> Self {
        Self(object)
    }

    /// Borrows the object as a `T`, if that is what it is.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Whether `self` and `other` point to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({:p})", Arc::as_ptr(&self.0))
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

macro_rules! generate_impls {
    ($($variant:ident ($ty:ty)$(,)?)*) => {
        $(
            impl TryFromValue for $ty {
                fn try_from_value(value: Value) -> core::result::Result<Self, Value> {
                    match value {
                        Value::$variant(x) => Ok(x),
                        other => Err(other),
                    }
                }
            }

            impl From<$ty> for Value {
                #[inline]
                fn from(x: $ty) -> Self {
                    Self::$variant(x)
                }
            }
        )*
    };
}

generate_impls! {
    Float(f64),
    Int(i64),
    Bool(bool),
    String(Arc<str>),
    List(Vec<Value>),
    Structure(Structure),
    Object(Opaque),
}

impl TryFromValue for Value {
    #[inline]
    fn try_from_value(value: Value) -> core::result::Result<Self, Value> {
        Ok(value)
    }
}

impl<T: TryFromValue> TryFromValue for Option<T> {
    fn try_from_value(value: Value) -> core::result::Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from_value(other).map(Some),
        }
    }
}

/// A value restricted to the scalar variants: the domain of filters that
/// operate on "anything printable".
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// See [`Value::Float`].
    Float(f64),
    /// See [`Value::Int`].
    Int(i64),
    /// See [`Value::Bool`].
    Bool(bool),
    /// See [`Value::String`].
    String(Arc<str>),
}

impl TryFromValue for Scalar {
    fn try_from_value(value: Value) -> core::result::Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(Self::Float(x)),
            Value::Int(n) => Ok(Self::Int(n)),
            Value::Bool(b) => Ok(Self::Bool(b)),
            Value::String(s) => Ok(Self::String(s)),
            other => Err(other),
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Float(x) => Self::Float(x),
            Scalar::Int(n) => Self::Int(n),
            Scalar::Bool(b) => Self::Bool(b),
            Scalar::String(s) => Self::String(s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Float(x) => write!(f, "{x}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A string, or a list whose string elements should each be transformed.
///
/// Non-string list elements are kept as they are.
#[derive(Debug, Clone, PartialEq)]
pub enum Strings {
    /// A single string.
    One(Arc<str>),
    /// A list of values, some of which may be strings.
    Many(Vec<Value>),
}

impl Strings {
    /// Applies `f` to the string, or to every string in the list.
    pub fn map<F: FnMut(&str) -> String>(self, mut f: F) -> Value {
        match self {
            Self::One(s) => Value::String(f(&s).into()),
            Self::Many(list) => Value::List(
                list.into_iter()
                    .map(|item| match item {
                        Value::String(s) => Value::String(f(&s).into()),
                        other => other,
                    })
                    .collect(),
            ),
        }
    }
}

impl TryFromValue for Strings {
    fn try_from_value(value: Value) -> core::result::Result<Self, Value> {
        match value {
            Value::String(s) => Ok(Self::One(s)),
            Value::List(l) => Ok(Self::Many(l)),
            other => Err(other),
        }
    }
}

impl Value {
    /// Try to unwrap a value that implements [`TryFromValue`].
    ///
    /// Unlike the pass-through used by filters, this treats a value outside
    /// the domain of `T` as an error.  Useful inside callbacks.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if it is not possible to unwrap `self` to an instance
    /// of type `T`.
    #[inline]
    pub fn try_unwrap<T: TryFromValue>(self) -> Result<T> {
        T::try_from_value(self).map_err(|value| {
            other!(
                "expected a {}, got {} `{value}`",
                std::any::type_name::<T>(),
                value.kind()
            )
        })
    }

    /// A short lowercase name for the variant, for messages and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Float(_) => "float",
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Structure(_) => "structure",
            Self::Object(_) => "object",
        }
    }

    /// Borrows the string contents if this is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is "truthy".
    ///
    /// - `Null` is `false`
    /// - `Int`s and `Float`s are `true` if they are nonzero.
    /// - `String`s, `List`s, and `Structure`s are `true` if they are nonempty
    /// - `Object`s are `true`
    /// - `Bool`s are the boolean value
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Float(f) => *f != 0.,
            Self::Int(i) => *i != 0,
            Self::Bool(b) => *b,
            Self::String(s) => !s.is_empty(),
            Self::List(l) => !l.is_empty(),
            Self::Structure(s) => !s.is_empty(),
            Self::Object(_) => true,
        }
    }
}

/// Helper function to serialize `Value::Null` as `Option::None`, which is understood
/// as a null value by e.g., `serde_json`.
#[inline]
fn serialize_null_as_option<S: serde::Serializer>(se: S) -> core::result::Result<S::Ok, S::Error> {
    None::<()>.serialize(se)
}

/// Host objects have no data representation and serialize as `null`.
#[inline]
fn serialize_opaque<S: serde::Serializer>(
    _: &Opaque,
    se: S,
) -> core::result::Result<S::Ok, S::Error> {
    None::<()>.serialize(se)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, r#""{s}""#),
            Self::List(ls) => {
                write!(f, "[")?;
                for (i, x) in ls.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{x}")?;
                }
                write!(f, "]")
            }
            Self::Structure(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, r#" "{k}": {v}"#)?;
                }
                write!(f, " }}")
            }
            Self::Object(o) => write!(f, "{o:?}"),
        }
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Null,
            Some(x) => x.into(),
        }
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Self {
        Self::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(Arc::from(value))
    }
}

/// Converts JSON data, e.g. filter options or test fixtures, into a [`Value`].
///
/// Integers that fit an `i64` become `Int`; every other number becomes `Float`.
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match value {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Self::String(s.into()),
            Json::Array(a) => Self::List(a.into_iter().map(Self::from).collect()),
            Json::Object(o) => Self::Structure(
                o.into_iter()
                    .map(|(k, v)| (Arc::from(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Opaque, Scalar, Strings, TryFromValue, Value};

    #[test]
    fn mismatched_domain_hands_value_back() {
        let value = Value::List(vec![Value::Int(1)]);
        let back = Arc::<str>::try_from_value(value.clone()).unwrap_err();
        assert_eq!(back, value);

        assert!(Scalar::try_from_value(Value::Null).is_err());
        assert_eq!(
            Option::<i64>::try_from_value(Value::Null).unwrap(),
            None::<i64>
        );
    }

    #[test]
    fn opaque_equality_is_identity() {
        let a = Opaque::new(vec![1_u8, 2, 3]);
        let b = Opaque::new(vec![1_u8, 2, 3]);

        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a.clone()), Value::Object(b));
        assert_eq!(a.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn strings_map_only_touches_strings() {
        let Ok(strings) = Strings::try_from_value(Value::List(vec![
            "a".into(),
            Value::Int(1),
            "b".into(),
        ])) else {
            panic!("a list is in the domain of Strings");
        };

        let mapped = strings.map(str::to_uppercase);
        assert_eq!(
            mapped,
            Value::List(vec!["A".into(), Value::Int(1), "B".into()])
        );
    }

    #[test]
    fn display_and_serialize() {
        let value = Value::from(json!({ "a": [1, 2.5, "x", null], "b": true }));

        insta::assert_snapshot!(value.to_string(), @r#"{ "a": [1, 2.5, "x", null], "b": true }"#);
        insta::assert_json_snapshot!(value, @r#"
        {
          "a": [
            1,
            2.5,
            "x",
            null
          ],
          "b": true
        }
        "#);
    }

    #[test]
    fn try_unwrap_reports_the_kind() {
        let error = Value::Bool(true).try_unwrap::<i64>().unwrap_err();
        assert!(error.to_string().contains("got bool `true`"));
    }
}
