//! Typed parameter values.

use crate::error::{ConfigError, Result};
use crate::schema::ValueType;

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Byte(u8),
    String(String),
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Long(i64),
    ULong(u64),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Byte(_) => ValueType::Byte,
            Scalar::String(_) => ValueType::String,
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::Int32(_) => ValueType::Int32,
            Scalar::UInt32(_) => ValueType::UInt32,
            Scalar::Int64(_) => ValueType::Int64,
            Scalar::UInt64(_) => ValueType::UInt64,
            Scalar::Long(_) => ValueType::Long,
            Scalar::ULong(_) => ValueType::ULong,
        }
    }
}

/// A contiguous array of one declared element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayValue {
    Byte(Vec<u8>),
    String(Vec<String>),
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Long(Vec<i64>),
    ULong(Vec<u64>),
}

impl ArrayValue {
    /// Allocate an empty array of `ty` with room for `capacity` elements.
    pub fn with_capacity(ty: ValueType, capacity: usize) -> Result<Self> {
        fn reserve<T>(capacity: usize) -> Result<Vec<T>> {
            let mut v = Vec::new();
            v.try_reserve_exact(capacity)
                .map_err(|e| ConfigError::Allocation(e.to_string()))?;
            Ok(v)
        }
        Ok(match ty {
            ValueType::Byte => ArrayValue::Byte(reserve(capacity)?),
            ValueType::String => ArrayValue::String(reserve(capacity)?),
            ValueType::Bool => ArrayValue::Bool(reserve(capacity)?),
            ValueType::Int32 => ArrayValue::Int32(reserve(capacity)?),
            ValueType::UInt32 => ArrayValue::UInt32(reserve(capacity)?),
            ValueType::Int64 => ArrayValue::Int64(reserve(capacity)?),
            ValueType::UInt64 => ArrayValue::UInt64(reserve(capacity)?),
            ValueType::Long => ArrayValue::Long(reserve(capacity)?),
            ValueType::ULong => ArrayValue::ULong(reserve(capacity)?),
        })
    }

    /// Build an array from scalars that all carry the element type.
    ///
    /// Returns `None` if any element has a different type.
    pub fn from_scalars(ty: ValueType, items: Vec<Scalar>) -> Result<Option<Self>> {
        let mut array = Self::with_capacity(ty, items.len())?;
        for item in items {
            if !array.push(item) {
                return Ok(None);
            }
        }
        Ok(Some(array))
    }

    fn push(&mut self, item: Scalar) -> bool {
        match (self, item) {
            (ArrayValue::Byte(v), Scalar::Byte(x)) => v.push(x),
            (ArrayValue::String(v), Scalar::String(x)) => v.push(x),
            (ArrayValue::Bool(v), Scalar::Bool(x)) => v.push(x),
            (ArrayValue::Int32(v), Scalar::Int32(x)) => v.push(x),
            (ArrayValue::UInt32(v), Scalar::UInt32(x)) => v.push(x),
            (ArrayValue::Int64(v), Scalar::Int64(x)) => v.push(x),
            (ArrayValue::UInt64(v), Scalar::UInt64(x)) => v.push(x),
            (ArrayValue::Long(v), Scalar::Long(x)) => v.push(x),
            (ArrayValue::ULong(v), Scalar::ULong(x)) => v.push(x),
            _ => return false,
        }
        true
    }

    pub fn len(&self) -> usize {
        match self {
            ArrayValue::Byte(v) => v.len(),
            ArrayValue::String(v) => v.len(),
            ArrayValue::Bool(v) => v.len(),
            ArrayValue::Int32(v) => v.len(),
            ArrayValue::UInt32(v) => v.len(),
            ArrayValue::Int64(v) => v.len(),
            ArrayValue::UInt64(v) => v.len(),
            ArrayValue::Long(v) => v.len(),
            ArrayValue::ULong(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scalar or array payload of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(Scalar),
    Array(ArrayValue),
}

/// A parsed parameter together with its declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    pub ty: ValueType,
    pub value: Value,
}

impl ParamValue {
    pub fn scalar(value: Scalar) -> Self {
        Self {
            ty: value.value_type(),
            value: Value::Scalar(value),
        }
    }

    pub fn array(ty: ValueType, value: ArrayValue) -> Self {
        Self {
            ty,
            value: Value::Array(value),
        }
    }

    /// Element count; scalars report zero.
    pub fn count(&self) -> usize {
        match &self.value {
            Value::Scalar(_) => 0,
            Value::Array(a) => a.len(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match &self.value {
            Value::Scalar(s) => Some(s),
            Value::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.value {
            Value::Array(a) => Some(a),
            Value::Scalar(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_from_matching_scalars() {
        let array = ArrayValue::from_scalars(
            ValueType::UInt32,
            vec![Scalar::UInt32(1), Scalar::UInt32(2)],
        )
        .unwrap()
        .unwrap();
        assert_eq!(array, ArrayValue::UInt32(vec![1, 2]));
        assert_eq!(ParamValue::array(ValueType::UInt32, array).count(), 2);
    }

    #[test]
    fn test_array_rejects_mixed_types() {
        let array = ArrayValue::from_scalars(
            ValueType::Int64,
            vec![Scalar::Int64(1), Scalar::Long(2)],
        )
        .unwrap();
        assert!(array.is_none());
    }

    #[test]
    fn test_scalar_count_is_zero() {
        let value = ParamValue::scalar(Scalar::Bool(true));
        assert_eq!(value.count(), 0);
        assert_eq!(value.ty, ValueType::Bool);
        assert!(value.as_array().is_none());
    }
}
