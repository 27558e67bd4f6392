use std::sync::Arc;
use std::hash::{Hash, Hasher};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use either::Either;
use serde::{Serialize, Deserialize};

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any valid configuration value.
#[derive(Debug, Serialize, Hash, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn to_null(&self) -> Option<()> {
        match self {
            Value::Null => Some(()),
            _ => None
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None
        }
    }

    pub fn into_vec(self) -> Result<Arc<Vec<Value>>, Value> {
        match self {
            Value::Array(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    pub fn into_dict(self) -> Result<Arc<Dict>, Value> {
        match self {
            Value::Dict(v) => Ok(v),
            _ => Err(self)
        }
    }

    /// Looks up `key` if `self` is a dictionary.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(std::borrow::Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64, u128, usize => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, i128, isize => Value::Num);
impl_from_primitive!(f64 => Value::Num);

impl From<()> for Value  {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<A, B> From<Either<A, B>> for Value where Value: From<A>, Value: From<B> {
    fn from(value: Either<A, B>) -> Self {
        either::for_both!(value, v => v.into())
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (<Arc::<str>>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::from(vec))
    }
}

/// A signed, unsigned, or floating point numeric value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    /// An 8-bit unsigned integer.
    U8(u8),
    /// A 16-bit unsigned integer.
    U16(u16),
    /// A 32-bit unsigned integer.
    U32(u32),
    /// A 64-bit unsigned integer.
    U64(u64),
    /// A 128-bit unsigned integer.
    U128(u128),
    /// An unsigned integer of platform width.
    USize(usize),
    /// An 8-bit signed integer.
    I8(i8),
    /// A 16-bit signed integer.
    I16(i16),
    /// A 32-bit signed integer.
    I32(i32),
    /// A 64-bit signed integer.
    I64(i64),
    /// A 128-bit signed integer.
    I128(i128),
    /// A signed integer of platform width.
    ISize(isize),
    /// A 64-bit float. Only produced for values that aren't integers.
    F64(f64),
}

impl Num {
    /// Converts an integer `self` into a `u128`, or the `i128` it was if
    /// signed. Returns `None` for floats.
    pub fn to_u128_strict(self) -> Option<Result<u128, i128>> {
        Some(match self {
            Num::U8(v) => Ok(v as u128),
            Num::U16(v) => Ok(v as u128),
            Num::U32(v) => Ok(v as u128),
            Num::U64(v) => Ok(v as u128),
            Num::U128(v) => Ok(v),
            Num::USize(v) => Ok(v as u128),
            Num::I8(v) => Err(v as i128),
            Num::I16(v) => Err(v as i128),
            Num::I32(v) => Err(v as i128),
            Num::I64(v) => Err(v as i128),
            Num::I128(v) => Err(v),
            Num::ISize(v) => Err(v as i128),
            Num::F64(_) => return None,
        })
    }

    /// Converts an integer `self` into a `u128` if it's non-negative.
    /// Returns `None` for floats.
    pub fn to_u128_lossy(self) -> Option<Result<u128, i128>> {
        self.to_u128_strict().map(|v| match v {
            Err(i) if i >= 0 => Ok(i as u128),
            other => other,
        })
    }

    pub fn to_f64(self) -> f64 {
        match (self, self.to_u128_strict()) {
            (Num::F64(f), _) => f,
            (_, Some(Ok(v))) => v as f64,
            (_, Some(Err(v))) => v as f64,
            (_, None) => f64::NAN,
        }
    }
}

impl PartialEq for Num {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Num { }

impl Hash for Num {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.to_u128_lossy() {
            Some(Ok(v)) => v.hash(state),
            Some(Err(v)) => v.hash(state),
            None => self.to_f64().to_bits().hash(state),
        }
    }
}

impl PartialOrd for Num {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Num {
    /// Integers never compare equal to floats; an integer sorts before a float
    /// of the same magnitude.
    ///
    /// ```rust
    /// use portfolio::value::Num;
    ///
    /// assert!(Num::from(-1i8) < Num::from(0u8));
    /// assert!(Num::from(-0i8) == Num::from(0u8));
    /// assert!(Num::from(10i32) == Num::from(10u64));
    /// assert!(Num::from(5u32) > Num::from(-1i64));
    /// assert!(Num::from(1.5f64) > Num::from(1u8));
    /// assert!(Num::from(1u8) < Num::from(1.0f64));
    /// ```
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.to_u128_lossy(), other.to_u128_lossy()) {
            (Some(Ok(a)), Some(Ok(b))) => a.cmp(&b),
            (Some(Ok(_)), Some(Err(_))) => Ordering::Greater,
            (Some(Err(_)), Some(Ok(_))) => Ordering::Less,
            (Some(Err(a)), Some(Err(b))) => a.cmp(&b),
            (Some(_), None) => self.to_f64().total_cmp(&other.to_f64()).then(Ordering::Less),
            (None, Some(_)) => self.to_f64().total_cmp(&other.to_f64()).then(Ordering::Greater),
            (None, None) => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value)
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: U8, u16: U16, u32: U32, u64: U64, u128: U128, usize: USize,
    i8: I8, i16: I16, i32: I32, i64: I64, i128: I128, isize: ISize,
    f64: F64,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<$crate::value::Value> for $T {
                type Error = Value;

                fn try_from($v: $crate::value::Value) -> Result<Self, Self::Error> {
                    (|| $e)()
                }
            }
        )+
    };
}

impl_try_from_value!(() => |v| v.to_null().ok_or(v));
impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(Arc<Dict> => |v| v.into_dict());
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));

impl_try_from_value!(u8, u16, u32, u64, u128, usize =>
    |v| v.to_num().and_then(|v| v.to_u128_lossy()?.ok()?.try_into().ok()).ok_or(v));

impl_try_from_value!(i8, i16, i32, i64, i128, isize =>
    |v| v.to_num().and_then(|v| match v.to_u128_lossy()? {
        Ok(u) => u.try_into().ok(),
        Err(i) => i.try_into().ok(),
    }).ok_or(v));

impl<T: TryFrom<Value, Error = Value>> TryFrom<Value> for Vec<T> {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let arc = value.into_vec()?;
        match Arc::try_unwrap(arc) {
            Ok(vec) => vec.into_iter().map(|v| v.try_into()).collect(),
            Err(arc) => arc.iter().cloned().map(|v| v.try_into()).collect()
        }
    }
}

#[cfg(test)]
static_assertions::assert_impl_all!(Value: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_scalars_deserialize_into_variants() {
        let value: Value = serde_yaml_ng::from_str(r#"
            name: Jane
            age: 31
            offset: -4
            ratio: 1.5
            active: true
            missing: ~
            tags: [a, b]
        "#).unwrap();

        assert_eq!(value.get("name").and_then(Value::as_str), Some("Jane"));
        assert_eq!(value.get("age").cloned().map(u32::try_from), Some(Ok(31)));
        assert_eq!(value.get("offset").cloned().map(i64::try_from), Some(Ok(-4)));
        assert_eq!(value.get("ratio").and_then(Value::to_num), Some(Num::F64(1.5)));
        assert_eq!(value.get("active").and_then(Value::to_bool), Some(true));
        assert!(value.get("missing").unwrap().is_null());
        assert_eq!(value.get("tags").and_then(Value::as_slice).map(|s| s.len()), Some(2));
    }

    #[test]
    fn typed_accessors_do_not_panic_on_mismatch() {
        let value = Value::from("text");
        assert!(value.as_dict().is_none());
        assert!(value.get("anything").is_none());
        assert!(value.as_slice().is_none());
        assert_eq!(value.clone().into_vec(), Err(value.clone()));
        assert_eq!(value.kind(), "string");
    }

    #[test]
    fn serializes_to_plain_json() {
        let value: Value = serde_json::from_str(r#"{"a":[1,-2,2.5,null,"x"]}"#).unwrap();
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"a":[1,-2,2.5,null,"x"]}"#);
    }
}
