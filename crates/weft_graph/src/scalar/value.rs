use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use thiserror::Error;

// -----------------------------------------------------------------------------
// Scalar

/// One decoded scalar token.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Str(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl Scalar {
    /// A short human-readable name of the variant, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "integer",
            Scalar::UInt(_) => "unsigned integer",
            Scalar::Float(_) => "float",
            Scalar::Char(_) => "char",
            Scalar::Str(_) => "string",
            Scalar::Date(_) => "date",
            Scalar::DateTime(_) => "date-time",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => fmt::Display::fmt(v, f),
            Scalar::Int(v) => fmt::Display::fmt(v, f),
            Scalar::UInt(v) => fmt::Display::fmt(v, f),
            Scalar::Float(v) => fmt::Display::fmt(v, f),
            Scalar::Char(v) => fmt::Display::fmt(v, f),
            Scalar::Str(v) => f.write_str(v),
            Scalar::Date(v) => fmt::Display::fmt(v, f),
            Scalar::DateTime(v) => f.write_str(&v.to_rfc3339()),
        }
    }
}

impl From<&str> for Scalar {
    #[inline]
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_owned())
    }
}

impl From<String> for Scalar {
    #[inline]
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

// -----------------------------------------------------------------------------
// ScalarError

/// Failure to decode, encode or convert a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ScalarError {
    #[error("cannot decode `{text}` as {type_name}: {reason}")]
    Decode {
        type_name: &'static str,
        text: String,
        reason: String,
    },

    #[error("{type_name} cannot hold a {found} value")]
    Mismatch {
        type_name: &'static str,
        found: &'static str,
    },

    #[error("value {value} is out of range for {type_name}")]
    OutOfRange {
        type_name: &'static str,
        value: String,
    },

    #[error("no codec registered for scalar type `{0}`")]
    UnknownType(String),
}

impl ScalarError {
    #[inline]
    fn mismatch(type_name: &'static str, found: &Scalar) -> Self {
        ScalarError::Mismatch {
            type_name,
            found: found.kind_name(),
        }
    }

    #[inline]
    fn out_of_range(type_name: &'static str, value: impl fmt::Display) -> Self {
        ScalarError::OutOfRange {
            type_name,
            value: value.to_string(),
        }
    }
}

// -----------------------------------------------------------------------------
// ScalarType

/// A Rust type that can be stored in a scalar field slot.
///
/// `TYPE_NAME` is the key under which the matching codec is registered in a
/// [`ScalarRegistry`](crate::scalar::ScalarRegistry).
///
/// # Examples
///
/// ```
/// use weft_graph::scalar::{Scalar, ScalarType};
///
/// assert_eq!(u8::from_scalar(Scalar::Int(7)), Ok(7));
/// assert!(u8::from_scalar(Scalar::Int(-1)).is_err());
/// assert_eq!(true.to_scalar(), Scalar::Bool(true));
/// ```
pub trait ScalarType: Sized + Send + Sync + 'static {
    /// The declared scalar type name.
    const TYPE_NAME: &'static str;

    /// Converts a decoded scalar into `Self`.
    fn from_scalar(value: Scalar) -> Result<Self, ScalarError>;

    /// Converts `self` into its dynamic form.
    fn to_scalar(&self) -> Scalar;
}

macro_rules! impl_signed {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl ScalarType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
                match value {
                    Scalar::Int(v) => <$ty>::try_from(v).map_err(|_| ScalarError::out_of_range($name, v)),
                    Scalar::UInt(v) => <$ty>::try_from(v).map_err(|_| ScalarError::out_of_range($name, v)),
                    other => Err(ScalarError::mismatch($name, &other)),
                }
            }

            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::Int(*self as i64)
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty => $name:literal),* $(,)?) => {$(
        impl ScalarType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
                match value {
                    Scalar::Int(v) => <$ty>::try_from(v).map_err(|_| ScalarError::out_of_range($name, v)),
                    Scalar::UInt(v) => <$ty>::try_from(v).map_err(|_| ScalarError::out_of_range($name, v)),
                    other => Err(ScalarError::mismatch($name, &other)),
                }
            }

            #[inline]
            fn to_scalar(&self) -> Scalar {
                Scalar::UInt(*self as u64)
            }
        }
    )*};
}

impl_signed!(i8 => "i8", i16 => "i16", i32 => "i32", i64 => "i64", isize => "isize");
impl_unsigned!(u8 => "u8", u16 => "u16", u32 => "u32", u64 => "u64", usize => "usize");

impl ScalarType for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Float(v) => Ok(v),
            Scalar::Int(v) => Ok(v as f64),
            Scalar::UInt(v) => Ok(v as f64),
            other => Err(ScalarError::mismatch("f64", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Float(*self)
    }
}

impl ScalarType for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        f64::from_scalar(value).map(|v| v as f32)
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Float(f64::from(*self))
    }
}

impl ScalarType for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Bool(v) => Ok(v),
            other => Err(ScalarError::mismatch("bool", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Bool(*self)
    }
}

impl ScalarType for char {
    const TYPE_NAME: &'static str = "char";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Char(v) => Ok(v),
            Scalar::Str(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ScalarError::Decode {
                        type_name: "char",
                        text: s,
                        reason: "expected exactly one character".into(),
                    }),
                }
            }
            other => Err(ScalarError::mismatch("char", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Char(*self)
    }
}

impl ScalarType for String {
    const TYPE_NAME: &'static str = "string";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Str(v) => Ok(v),
            Scalar::Char(c) => Ok(c.to_string()),
            other => Err(ScalarError::mismatch("string", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Str(self.clone())
    }
}

impl ScalarType for NaiveDate {
    const TYPE_NAME: &'static str = "date";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::Date(v) => Ok(v),
            Scalar::DateTime(v) => Ok(v.date_naive()),
            other => Err(ScalarError::mismatch("date", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::Date(*self)
    }
}

impl ScalarType for DateTime<FixedOffset> {
    const TYPE_NAME: &'static str = "datetime";

    fn from_scalar(value: Scalar) -> Result<Self, ScalarError> {
        match value {
            Scalar::DateTime(v) => Ok(v),
            other => Err(ScalarError::mismatch("datetime", &other)),
        }
    }

    #[inline]
    fn to_scalar(&self) -> Scalar {
        Scalar::DateTime(*self)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Scalar, ScalarError, ScalarType};

    #[test]
    fn integer_ranges_are_checked() {
        assert_eq!(i8::from_scalar(Scalar::Int(-128)), Ok(-128));
        assert!(matches!(
            i8::from_scalar(Scalar::Int(200)),
            Err(ScalarError::OutOfRange { type_name: "i8", .. })
        ));
        assert_eq!(u64::from_scalar(Scalar::UInt(u64::MAX)), Ok(u64::MAX));
        assert!(u16::from_scalar(Scalar::Int(-3)).is_err());
        assert_eq!(i64::from_scalar(Scalar::UInt(5)), Ok(5));
    }

    #[test]
    fn mismatched_variants_fail() {
        assert_eq!(
            bool::from_scalar(Scalar::Int(1)),
            Err(ScalarError::Mismatch {
                type_name: "bool",
                found: "integer",
            })
        );
        assert!(String::from_scalar(Scalar::Float(1.5)).is_err());
    }

    #[test]
    fn char_accepts_single_character_strings() {
        assert_eq!(char::from_scalar(Scalar::from("x")), Ok('x'));
        assert!(char::from_scalar(Scalar::from("xy")).is_err());
        assert_eq!(String::from_scalar(Scalar::Char('q')), Ok("q".to_owned()));
    }

    #[test]
    fn floats_widen_integers() {
        assert_eq!(f64::from_scalar(Scalar::Int(-2)), Ok(-2.0));
        assert_eq!(f32::from_scalar(Scalar::Float(0.5)), Ok(0.5));
        assert_eq!(1.25f32.to_scalar(), Scalar::Float(1.25));
    }

    #[test]
    fn date_times_narrow_to_dates() {
        let moment = chrono::DateTime::parse_from_rfc3339("2024-02-29T23:30:00+01:00").unwrap();
        assert_eq!(
            NaiveDate::from_scalar(Scalar::DateTime(moment)),
            Ok(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert!(NaiveDate::from_scalar(Scalar::from("2024-02-29")).is_err());
        assert_eq!(Scalar::DateTime(moment).to_string(), "2024-02-29T23:30:00+01:00");
    }
}
