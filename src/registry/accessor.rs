//! Typed reads with caller-supplied defaults.
//!
//! Reads never fail. An unknown handle, an unknown parameter, a type
//! mismatch, a scalar read of an array (or the reverse) and an index past
//! the end all yield the default.

use crate::tables::{ArrayValue, BlockInstance, Handle, Scalar};

use super::ConfigRegistry;

/// Element types that can be read out of an array parameter.
pub trait ArrayElement: Clone {
    fn slice(array: &ArrayValue) -> Option<&[Self]>;
}

impl ArrayElement for u8 {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::Byte(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for String {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::String(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for bool {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for i32 {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::Int32(v) => Some(v),
            _ => None,
        }
    }
}

impl ArrayElement for u32 {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::UInt32(v) => Some(v),
            _ => None,
        }
    }
}

/// Covers both `int64` and `long` arrays.
impl ArrayElement for i64 {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::Int64(v) | ArrayValue::Long(v) => Some(v),
            _ => None,
        }
    }
}

/// Covers both `uint64` and `ulong` arrays.
impl ArrayElement for u64 {
    fn slice(array: &ArrayValue) -> Option<&[Self]> {
        match array {
            ArrayValue::UInt64(v) | ArrayValue::ULong(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! scalar_getter {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty) => {
        $(#[$doc])*
        pub fn $name(&self, name: &str, default: $ty) -> $ty {
            match self.scalar(name) {
                Some(Scalar::$variant(v)) => *v,
                _ => default,
            }
        }
    };
}

impl BlockInstance {
    fn scalar(&self, name: &str) -> Option<&Scalar> {
        self.param(name)?.as_scalar()
    }

    fn array_slice<T: ArrayElement>(&self, name: &str) -> Option<&[T]> {
        T::slice(self.param(name)?.as_array()?)
    }

    scalar_getter!(get_byte, Byte, u8);
    scalar_getter!(get_bool, Bool, bool);
    scalar_getter!(get_int32, Int32, i32);
    scalar_getter!(get_uint32, UInt32, u32);
    scalar_getter!(get_int64, Int64, i64);
    scalar_getter!(get_uint64, UInt64, u64);
    scalar_getter!(
        /// Reads a `long` parameter; `int64` parameters are not matched.
        get_long,
        Long,
        i64
    );
    scalar_getter!(
        /// Reads a `ulong` parameter; `uint64` parameters are not matched.
        get_ulong,
        ULong,
        u64
    );

    pub fn get_string(&self, name: &str, default: &str) -> String {
        match self.scalar(name) {
            Some(Scalar::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Element count of an array parameter, or `default` for anything else.
    pub fn get_array_len(&self, name: &str, default: usize) -> usize {
        self.param(name)
            .and_then(|p| p.as_array())
            .map_or(default, ArrayValue::len)
    }

    pub fn get_array_at<T: ArrayElement>(&self, name: &str, index: usize, default: T) -> T {
        self.array_slice::<T>(name)
            .and_then(|items| items.get(index))
            .cloned()
            .unwrap_or(default)
    }

    /// `count` elements starting at `start`; the whole range must exist.
    pub fn get_array_range<T: ArrayElement>(
        &self,
        name: &str,
        start: usize,
        count: usize,
        default: Vec<T>,
    ) -> Vec<T> {
        let Some(items) = self.array_slice::<T>(name) else {
            return default;
        };
        start
            .checked_add(count)
            .and_then(|end| items.get(start..end))
            .map_or(default, <[T]>::to_vec)
    }
}

macro_rules! registry_getter {
    ($name:ident, $ty:ty) => {
        pub fn $name(&self, handle: Handle, name: &str, default: $ty) -> $ty {
            match self.block(handle) {
                Some(block) => block.$name(name, default),
                None => default,
            }
        }
    };
}

impl ConfigRegistry {
    registry_getter!(get_byte, u8);
    registry_getter!(get_bool, bool);
    registry_getter!(get_int32, i32);
    registry_getter!(get_uint32, u32);
    registry_getter!(get_int64, i64);
    registry_getter!(get_uint64, u64);
    registry_getter!(get_long, i64);
    registry_getter!(get_ulong, u64);
    registry_getter!(get_array_len, usize);

    pub fn get_string(&self, handle: Handle, name: &str, default: &str) -> String {
        match self.block(handle) {
            Some(block) => block.get_string(name, default),
            None => default.to_string(),
        }
    }

    pub fn get_array_at<T: ArrayElement>(
        &self,
        handle: Handle,
        name: &str,
        index: usize,
        default: T,
    ) -> T {
        match self.block(handle) {
            Some(block) => block.get_array_at(name, index, default),
            None => default,
        }
    }

    pub fn get_array_range<T: ArrayElement>(
        &self,
        handle: Handle,
        name: &str,
        start: usize,
        count: usize,
        default: Vec<T>,
    ) -> Vec<T> {
        match self.block(handle) {
            Some(block) => block.get_array_range(name, start, count, default),
            None => default,
        }
    }

    /// Parameter names set in the block behind `handle`, sorted.
    pub fn param_names(&self, handle: Handle) -> Vec<String> {
        self.block(handle)
            .map(|b| b.param_names().map(str::to_string).collect())
            .unwrap_or_default()
    }
}
