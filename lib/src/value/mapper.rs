use std::sync::Arc;

use crate::error::{ErrorDetail, Result};
use crate::value::{Value, Source};

pub trait Mapper {
    type Output: Into<Value> + 'static;

    fn map<I: Source>(&self, input: I) -> Result<Self::Output>;
}

pub trait Format: Sized {
    /// The data format's error type.
    type Error: serde::de::Error + ErrorDetail + 'static;

    /// Parses `string` as the data format `Self` as a `T` or returns an error
    /// if the `string` is an invalid `T`. **_Note:_** This method is _not_
    /// intended to be called directly. Instead, it is intended to be
    /// _implemented_ and then used indirectly via [`Format::read()`].
    fn from_str<T: serde::de::DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn read<I: Source, T: serde::de::DeserializeOwned>(input: I) -> Result<T> {
        let input = input.try_read::<Arc<str>>()?;
        Ok(Self::from_str(&input)?)
    }
}

impl<F: Format> Mapper for F {
    type Output = Value;

    fn map<I: Source>(&self, input: I) -> Result<Self::Output> {
        Self::read(input)
    }
}

macro_rules! impl_format {
    ($name:ident : $func:expr, $E:ty) => (
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;

            fn from_str<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, $E> {
                $func(s)
            }
        }
    );
}

impl_format!(Yaml: serde_yaml_ng::from_str, serde_yaml_ng::Error);
impl_format!(Json: serde_json::from_str, serde_json::error::Error);
