use alloc::format;
use alloc::vec::Vec;
use core::fmt::Display;
use core::marker::PhantomData;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};

use super::{Scalar, ScalarError, ScalarType};

// -----------------------------------------------------------------------------
// ScalarCodec

/// Translates between wire text and [`Scalar`] values for one scalar type.
///
/// Codecs must be total over their declared domain: every value produced by
/// [`decode`](Self::decode) must be accepted by [`encode`](Self::encode).
pub trait ScalarCodec: Send + Sync + 'static {
    /// The scalar type name this codec is registered under.
    fn type_name(&self) -> &'static str;

    /// Decodes one wire-level text token.
    fn decode(&self, text: &str) -> Result<Scalar, ScalarError>;

    /// Encodes a scalar back to wire text.
    fn encode(&self, value: &Scalar) -> Result<String, ScalarError>;
}

// -----------------------------------------------------------------------------
// FromStrCodec

/// A codec for any [`ScalarType`] that also implements [`FromStr`] and [`Display`].
///
/// Surrounding whitespace is tolerated on decode.
///
/// # Examples
///
/// ```
/// use weft_graph::scalar::{FromStrCodec, Scalar, ScalarCodec};
///
/// let codec = FromStrCodec::<u16>::new();
/// assert_eq!(codec.decode(" 42 "), Ok(Scalar::UInt(42)));
/// assert_eq!(codec.encode(&Scalar::UInt(7)).unwrap(), "7");
/// assert!(codec.decode("-1").is_err());
/// ```
pub struct FromStrCodec<T>(PhantomData<fn() -> T>);

impl<T> FromStrCodec<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromStrCodec<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ScalarCodec for FromStrCodec<T>
where
    T: ScalarType + FromStr + Display,
    T::Err: Display,
{
    #[inline]
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        let parsed = match text.parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) if text.trim().len() != text.len() => text.trim().parse::<T>(),
            Err(err) => Err(err),
        };
        parsed
            .map(|value| value.to_scalar())
            .map_err(|err| ScalarError::Decode {
                type_name: T::TYPE_NAME,
                text: text.to_owned(),
                reason: err.to_string(),
            })
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        T::from_scalar(value.clone()).map(|value| value.to_string())
    }
}

// -----------------------------------------------------------------------------
// BoolCodec

/// Lenient boolean codec: `true/false`, `yes/no`, `on/off`, `1/0`, any case.
#[derive(Clone, Copy, Default, Debug)]
pub struct BoolCodec;

impl ScalarCodec for BoolCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        let trimmed = text.trim();
        let value = if ["true", "yes", "on", "1"]
            .iter()
            .any(|t| trimmed.eq_ignore_ascii_case(t))
        {
            true
        } else if ["false", "no", "off", "0"]
            .iter()
            .any(|t| trimmed.eq_ignore_ascii_case(t))
        {
            false
        } else {
            return Err(ScalarError::Decode {
                type_name: "bool",
                text: text.to_owned(),
                reason: "expected true/false, yes/no, on/off or 1/0".into(),
            });
        };
        Ok(Scalar::Bool(value))
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        bool::from_scalar(value.clone()).map(|v| if v { "true" } else { "false" }.to_owned())
    }
}

// -----------------------------------------------------------------------------
// StringCodec

/// Verbatim string codec; text is never trimmed.
#[derive(Clone, Copy, Default, Debug)]
pub struct StringCodec;

impl ScalarCodec for StringCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        "string"
    }

    #[inline]
    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        Ok(Scalar::Str(text.to_owned()))
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        String::from_scalar(value.clone())
    }
}

// -----------------------------------------------------------------------------
// DateCodec

/// Calendar dates written with a `chrono` format string, `%Y-%m-%d` by default.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use weft_graph::scalar::{DateCodec, Scalar, ScalarCodec};
///
/// let day = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
/// assert_eq!(DateCodec::new().decode("1999-12-31"), Ok(Scalar::Date(day)));
/// assert_eq!(DateCodec::with_format("%d/%m/%Y").encode(&Scalar::Date(day)).unwrap(), "31/12/1999");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct DateCodec {
    format: &'static str,
}

impl DateCodec {
    #[inline]
    pub const fn new() -> Self {
        Self::with_format("%Y-%m-%d")
    }

    #[inline]
    pub const fn with_format(format: &'static str) -> Self {
        Self { format }
    }
}

impl Default for DateCodec {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarCodec for DateCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        NaiveDate::TYPE_NAME
    }

    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        NaiveDate::parse_from_str(text.trim(), self.format)
            .map(Scalar::Date)
            .map_err(|err| ScalarError::Decode {
                type_name: NaiveDate::TYPE_NAME,
                text: text.to_owned(),
                reason: err.to_string(),
            })
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        NaiveDate::from_scalar(value.clone()).map(|date| date.format(self.format).to_string())
    }
}

// -----------------------------------------------------------------------------
// DateTimeCodec

/// RFC 3339 timestamps with their UTC offset.
#[derive(Clone, Copy, Default, Debug)]
pub struct DateTimeCodec;

impl ScalarCodec for DateTimeCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        <DateTime<FixedOffset>>::TYPE_NAME
    }

    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        DateTime::parse_from_rfc3339(text.trim())
            .map(Scalar::DateTime)
            .map_err(|err| ScalarError::Decode {
                type_name: <DateTime<FixedOffset>>::TYPE_NAME,
                text: text.to_owned(),
                reason: err.to_string(),
            })
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        <DateTime<FixedOffset>>::from_scalar(value.clone()).map(|moment| moment.to_rfc3339())
    }
}

// -----------------------------------------------------------------------------
// EnumCodec

/// A closed set of variant names, some of which may carry a custom value.
///
/// Decoding accepts a variant's name or its value and yields the name as a
/// [`Scalar::Str`]; encoding writes the name. Field descriptors select the
/// codec by its type name with
/// [`FieldDescriptor::codec`](crate::info::FieldDescriptor::codec).
///
/// # Examples
///
/// ```
/// use weft_graph::scalar::{EnumCodec, Scalar, ScalarCodec};
///
/// let codec = EnumCodec::new("scenario")
///     .valued("firstValue", "3")
///     .valued("secondValue", "5")
///     .valued("thirdValue", "7");
/// assert_eq!(codec.decode("5"), Ok(Scalar::from("secondValue")));
/// assert_eq!(codec.decode("thirdValue"), Ok(Scalar::from("thirdValue")));
/// assert_eq!(codec.encode(&Scalar::from("secondValue")).unwrap(), "secondValue");
/// assert!(codec.decode("4").is_err());
/// ```
#[derive(Clone, Debug)]
pub struct EnumCodec {
    type_name: &'static str,
    variants: Vec<(&'static str, Option<&'static str>)>,
}

impl EnumCodec {
    #[inline]
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            variants: Vec::new(),
        }
    }

    /// Adds a variant known only by its name.
    pub fn variant(mut self, name: &'static str) -> Self {
        self.variants.push((name, None));
        self
    }

    /// Adds a variant that also decodes from `value`.
    pub fn valued(mut self, name: &'static str, value: &'static str) -> Self {
        self.variants.push((name, Some(value)));
        self
    }

    fn name_of(&self, text: &str) -> Option<&'static str> {
        let by_name = self.variants.iter().find(|(name, _)| *name == text);
        by_name
            .or_else(|| self.variants.iter().find(|(_, value)| *value == Some(text)))
            .map(|(name, _)| *name)
    }

    fn unknown(&self, text: &str) -> ScalarError {
        let names: Vec<&str> = self.variants.iter().map(|(name, _)| *name).collect();
        ScalarError::Decode {
            type_name: self.type_name,
            text: text.to_owned(),
            reason: format!("expected one of {}", names.join(", ")),
        }
    }
}

impl ScalarCodec for EnumCodec {
    #[inline]
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn decode(&self, text: &str) -> Result<Scalar, ScalarError> {
        self.name_of(text.trim())
            .map(Scalar::from)
            .ok_or_else(|| self.unknown(text))
    }

    fn encode(&self, value: &Scalar) -> Result<String, ScalarError> {
        let text = match value {
            Scalar::Str(text) => text.clone(),
            other => other.to_string(),
        };
        self.name_of(&text).map(str::to_owned).ok_or_else(|| self.unknown(&text))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate};

    use super::{BoolCodec, DateCodec, DateTimeCodec, EnumCodec, FromStrCodec, ScalarCodec, StringCodec};
    use crate::scalar::{Scalar, ScalarError};

    #[test]
    fn bool_codec_is_lenient() {
        assert_eq!(BoolCodec.decode("Yes"), Ok(Scalar::Bool(true)));
        assert_eq!(BoolCodec.decode(" 0 "), Ok(Scalar::Bool(false)));
        assert!(BoolCodec.decode("maybe").is_err());
        assert_eq!(BoolCodec.encode(&Scalar::Bool(false)).unwrap(), "false");
    }

    #[test]
    fn char_codec_keeps_whitespace_characters() {
        let codec = FromStrCodec::<char>::new();
        assert_eq!(codec.decode(" "), Ok(Scalar::Char(' ')));
        assert_eq!(codec.decode(" z "), Ok(Scalar::Char('z')));
    }

    #[test]
    fn float_codec_round_trips_text() {
        let codec = FromStrCodec::<f64>::new();
        let value = codec.decode("2.5").unwrap();
        assert_eq!(codec.encode(&value).unwrap(), "2.5");
    }

    #[test]
    fn decode_error_names_the_type() {
        let codec = FromStrCodec::<i32>::new();
        let Err(ScalarError::Decode { type_name, text, .. }) = codec.decode("abc") else {
            panic!("expected decode error");
        };
        assert_eq!(type_name, "i32");
        assert_eq!(text, "abc");
    }

    #[test]
    fn strings_are_verbatim() {
        assert_eq!(StringCodec.decode("  a b "), Ok(Scalar::from("  a b ")));
    }

    #[test]
    fn dates_use_their_format() {
        let codec = DateCodec::new();
        let day = NaiveDate::from_ymd_opt(2001, 9, 8).unwrap();
        assert_eq!(codec.decode(" 2001-09-08 "), Ok(Scalar::Date(day)));
        assert_eq!(codec.encode(&Scalar::Date(day)).unwrap(), "2001-09-08");
        assert!(codec.decode("08/09/2001").is_err());
        assert!(codec.encode(&Scalar::from("2001-09-08")).is_err());
    }

    #[test]
    fn date_times_keep_their_offset() {
        let text = "2020-05-17T08:15:00-04:00";
        let value = DateTimeCodec.decode(text).unwrap();
        assert_eq!(value, Scalar::DateTime(DateTime::parse_from_rfc3339(text).unwrap()));
        assert_eq!(DateTimeCodec.encode(&value).unwrap(), text);
        assert!(matches!(
            DateTimeCodec.decode("yesterday"),
            Err(ScalarError::Decode { type_name: "datetime", .. })
        ));
    }

    #[test]
    fn enum_values_decode_to_names() {
        let codec = EnumCodec::new("scenario")
            .valued("firstValue", "3")
            .valued("secondValue", "5")
            .valued("thirdValue", "7");
        assert_eq!(codec.decode("5"), Ok(Scalar::from("secondValue")));
        assert_eq!(codec.decode("secondValue"), Ok(Scalar::from("secondValue")));
        assert_eq!(codec.encode(&Scalar::from("5")).unwrap(), "secondValue");
        assert_eq!(codec.encode(&Scalar::UInt(7)).unwrap(), "thirdValue");

        let Err(ScalarError::Decode { reason, .. }) = codec.decode("second") else {
            panic!("expected decode error");
        };
        assert_eq!(reason, "expected one of firstValue, secondValue, thirdValue");
    }

    #[test]
    fn names_win_over_values() {
        let codec = EnumCodec::new("odd").valued("one", "two").variant("two");
        assert_eq!(codec.decode("two"), Ok(Scalar::from("two")));
        assert_eq!(codec.decode("one"), Ok(Scalar::from("one")));
    }
}
