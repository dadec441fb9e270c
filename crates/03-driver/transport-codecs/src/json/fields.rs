//! Strict accessors over a JSON object.
//!
//! Every failure names the key it was reading; parents prefix their own field
//! with [`CodecError::within`]. `null` counts as absent.
//!
//! [`finite`] and [`finite_seq`] are the encode side for numbers: JSON has no
//! NaN or infinity, and `serde_json` would write them as `null`.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use transport_fabric::{CodecError, CodecResult};

pub(crate) struct Fields<'a>(&'a Map<String, Value>);

impl<'a> Fields<'a> {
    pub fn of(value: &'a Value) -> CodecResult<Self> {
        value
            .as_object()
            .map(Fields)
            .ok_or_else(|| CodecError::decode("", format!("expected object, found {}", kind(value))))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a String, &'a Value)> {
        self.0.iter()
    }

    pub fn required(&self, key: &str) -> CodecResult<&'a Value> {
        self.optional(key).ok_or_else(|| CodecError::missing(key))
    }

    pub fn optional(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|value| !value.is_null())
    }

    pub fn string(&self, key: &str) -> CodecResult<String> {
        string(self.required(key)?).map_err(|err| err.within(key))
    }

    pub fn opt_string(&self, key: &str) -> CodecResult<Option<String>> {
        self.optional(key)
            .map(|value| string(value).map_err(|err| err.within(key)))
            .transpose()
    }

    pub fn u64(&self, key: &str) -> CodecResult<u64> {
        unsigned(self.required(key)?).map_err(|err| err.within(key))
    }

    pub fn u32(&self, key: &str) -> CodecResult<u32> {
        narrow(self.u64(key)?, key)
    }

    pub fn u8(&self, key: &str) -> CodecResult<u8> {
        narrow(self.u64(key)?, key)
    }

    pub fn bool(&self, key: &str) -> CodecResult<bool> {
        let value = self.required(key)?;
        value
            .as_bool()
            .ok_or_else(|| CodecError::decode(key, format!("expected bool, found {}", kind(value))))
    }

    pub fn f64(&self, key: &str) -> CodecResult<f64> {
        number(self.required(key)?).map_err(|err| err.within(key))
    }

    pub fn opt_f64(&self, key: &str) -> CodecResult<Option<f64>> {
        self.optional(key)
            .map(|value| number(value).map_err(|err| err.within(key)))
            .transpose()
    }

    pub fn array(&self, key: &str) -> CodecResult<&'a [Value]> {
        array(self.required(key)?).map_err(|err| err.within(key))
    }

    pub fn f64_seq(&self, key: &str) -> CodecResult<Vec<f64>> {
        seq(self.array(key)?, number).map_err(|err| err.within(key))
    }

    pub fn u32_seq(&self, key: &str) -> CodecResult<Vec<u32>> {
        seq(self.array(key)?, |value| {
            unsigned(value).and_then(|wide| narrow(wide, ""))
        })
        .map_err(|err| err.within(key))
    }

    pub fn string_seq(&self, key: &str) -> CodecResult<Vec<String>> {
        seq(self.array(key)?, string).map_err(|err| err.within(key))
    }

    /// Object whose values are all strings.
    pub fn string_map(&self, key: &str) -> CodecResult<BTreeMap<String, String>> {
        string_map(self.required(key)?).map_err(|err| err.within(key))
    }
}

pub(crate) fn string_map(value: &Value) -> CodecResult<BTreeMap<String, String>> {
    let object = value
        .as_object()
        .ok_or_else(|| CodecError::decode("", format!("expected object, found {}", kind(value))))?;
    object
        .iter()
        .map(|(k, v)| Ok((k.clone(), string(v).map_err(|err| err.within(k))?)))
        .collect()
}

pub(crate) fn array(value: &Value) -> CodecResult<&[Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CodecError::decode("", format!("expected array, found {}", kind(value))))
}

pub(crate) fn number(value: &Value) -> CodecResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| CodecError::decode("", format!("expected number, found {}", kind(value))))
}

pub(crate) fn finite(value: f64) -> CodecResult<Value> {
    if value.is_finite() {
        Ok(Value::from(value))
    } else {
        Err(CodecError::encode("", format!("{value} has no JSON representation")))
    }
}

pub(crate) fn finite_seq(values: &[f64]) -> CodecResult<Value> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| finite(*value).map_err(|err| err.within(format!("[{idx}]"))))
        .collect::<CodecResult<Vec<_>>>()
        .map(Value::Array)
}

fn string(value: &Value) -> CodecResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CodecError::decode("", format!("expected string, found {}", kind(value))))
}

fn unsigned(value: &Value) -> CodecResult<u64> {
    value.as_u64().ok_or_else(|| {
        CodecError::decode(
            "",
            format!("expected unsigned integer, found {}", kind(value)),
        )
    })
}

fn narrow<T: TryFrom<u64>>(wide: u64, key: &str) -> CodecResult<T> {
    T::try_from(wide).map_err(|_| CodecError::decode(key, format!("{wide} out of range")))
}

fn seq<T>(items: &[Value], item: impl Fn(&Value) -> CodecResult<T>) -> CodecResult<Vec<T>> {
    items
        .iter()
        .enumerate()
        .map(|(idx, value)| item(value).map_err(|err| err.within(format!("[{idx}]"))))
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
