//! Mapping between Rust scalar types and numpy type descriptors.
//!
//! Every field of a record is one of the kinds below. The single character
//! code and the byte width together form the descriptor (`i4`, `f8`, `c16`)
//! that ends up in the header after the byte order marker.

use std::fmt;
use std::str::FromStr;

use byteorder::{ByteOrder, NativeEndian};
use num_complex::{Complex32, Complex64};

use crate::error::{NpyError, Result};
use crate::header::NATIVE_ENDIAN_SYMBOL;

/// numpy scalar kinds that can be streamed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// `b1`
    Bool,
    /// `i1`
    I8,
    /// `i2`
    I16,
    /// `i4`
    I32,
    /// `i8`
    I64,
    /// `u1`
    U8,
    /// `u2`
    U16,
    /// `u4`
    U32,
    /// `u8`
    U64,
    /// `f4`
    F32,
    /// `f8`
    F64,
    /// `c8`, two `f4`
    C64,
    /// `c16`, two `f8`
    C128,
}

impl DType {
    /// single character numpy type code
    pub fn code(self) -> char {
        match self {
            DType::Bool => 'b',
            DType::I8 | DType::I16 | DType::I32 | DType::I64 => 'i',
            DType::U8 | DType::U16 | DType::U32 | DType::U64 => 'u',
            DType::F32 | DType::F64 => 'f',
            DType::C64 | DType::C128 => 'c',
        }
    }

    /// width of one value in bytes
    pub fn size(self) -> usize {
        match self {
            DType::Bool | DType::I8 | DType::U8 => 1,
            DType::I16 | DType::U16 => 2,
            DType::I32 | DType::U32 | DType::F32 => 4,
            DType::I64 | DType::U64 | DType::F64 | DType::C64 => 8,
            DType::C128 => 16,
        }
    }

    /// inverse of `code()` and `size()`
    pub fn from_code(code: char, size: usize) -> Option<DType> {
        let dtype = match (code, size) {
            ('b', 1) | ('?', 1) => DType::Bool,
            ('i', 1) => DType::I8,
            ('i', 2) => DType::I16,
            ('i', 4) => DType::I32,
            ('i', 8) => DType::I64,
            ('u', 1) => DType::U8,
            ('u', 2) => DType::U16,
            ('u', 4) => DType::U32,
            ('u', 8) => DType::U64,
            ('f', 4) => DType::F32,
            ('f', 8) => DType::F64,
            ('c', 8) => DType::C64,
            ('c', 16) => DType::C128,
            _ => return None,
        };
        Some(dtype)
    }

    fn from_name(name: &str) -> Option<DType> {
        let dtype = match name {
            "bool" => DType::Bool,
            "int8" => DType::I8,
            "int16" => DType::I16,
            "int32" => DType::I32,
            "int64" => DType::I64,
            "uint8" => DType::U8,
            "uint16" => DType::U16,
            "uint32" => DType::U32,
            "uint64" => DType::U64,
            "float32" => DType::F32,
            "float64" => DType::F64,
            "complex64" => DType::C64,
            "complex128" => DType::C128,
            _ => return None,
        };
        Some(dtype)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.code(), self.size())
    }
}

impl FromStr for DType {
    type Err = NpyError;

    /// Accepts numpy names (`float64`) and descriptors (`f8`, `<f8`, `|u1`, `?`).
    fn from_str(s: &str) -> Result<DType> {
        let s = s.trim();
        if let Some(dtype) = DType::from_name(s) {
            return Ok(dtype);
        }

        let unsupported = || NpyError::UnsupportedType(s.to_owned());
        let mut chars = s.chars().peekable();
        match chars.peek() {
            Some('=') | Some('|') => {
                chars.next();
            }
            Some(&c) if c == '<' || c == '>' => {
                if c != NATIVE_ENDIAN_SYMBOL {
                    return Err(unsupported());
                }
                chars.next();
            }
            _ => (),
        }

        let code = chars.next().ok_or_else(unsupported)?;
        let digits: String = chars.collect();
        if code == '?' && digits.is_empty() {
            return Ok(DType::Bool);
        }
        let size = digits.parse::<usize>().map_err(|_| unsupported())?;
        DType::from_code(code, size).ok_or_else(unsupported)
    }
}

/// A fixed-width value with a numpy type code.
///
/// Implemented for `bool`, the fixed-width integers, `f32`, `f64` and the
/// complex types of `num_complex`.
pub trait Scalar: Copy {
    /// dtype this type is stored as
    const DTYPE: DType;

    /// Writes the value in native byte order. `out` is exactly `DTYPE.size()` long.
    fn write_ne(&self, out: &mut [u8]);
}

macro_rules! scalar {
    ($ty:ty, $dtype:expr, |$v:ident, $out:ident| $body:expr) => {
        impl Scalar for $ty {
            const DTYPE: DType = $dtype;

            #[inline]
            fn write_ne(&self, $out: &mut [u8]) {
                let $v = *self;
                $body
            }
        }
    };
}

scalar!(bool, DType::Bool, |v, out| out[0] = v as u8);
scalar!(i8, DType::I8, |v, out| out[0] = v as u8);
scalar!(i16, DType::I16, |v, out| NativeEndian::write_i16(out, v));
scalar!(i32, DType::I32, |v, out| NativeEndian::write_i32(out, v));
scalar!(i64, DType::I64, |v, out| NativeEndian::write_i64(out, v));
scalar!(u8, DType::U8, |v, out| out[0] = v);
scalar!(u16, DType::U16, |v, out| NativeEndian::write_u16(out, v));
scalar!(u32, DType::U32, |v, out| NativeEndian::write_u32(out, v));
scalar!(u64, DType::U64, |v, out| NativeEndian::write_u64(out, v));
scalar!(f32, DType::F32, |v, out| NativeEndian::write_f32(out, v));
scalar!(f64, DType::F64, |v, out| NativeEndian::write_f64(out, v));
scalar!(Complex32, DType::C64, |v, out| {
    NativeEndian::write_f32(&mut out[..4], v.re);
    NativeEndian::write_f32(&mut out[4..], v.im);
});
scalar!(Complex64, DType::C128, |v, out| {
    NativeEndian::write_f64(&mut out[..8], v.re);
    NativeEndian::write_f64(&mut out[8..], v.im);
});

/// A scalar whose dtype is only known at runtime, e.g. a parsed CSV cell
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// `bool`
    Bool(bool),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
    /// `Complex32`
    C64(Complex32),
    /// `Complex64`
    C128(Complex64),
}

macro_rules! dispatch {
    ($value:expr, $v:ident => $body:expr) => {
        match $value {
            Value::Bool($v) => $body,
            Value::I8($v) => $body,
            Value::I16($v) => $body,
            Value::I32($v) => $body,
            Value::I64($v) => $body,
            Value::U8($v) => $body,
            Value::U16($v) => $body,
            Value::U32($v) => $body,
            Value::U64($v) => $body,
            Value::F32($v) => $body,
            Value::F64($v) => $body,
            Value::C64($v) => $body,
            Value::C128($v) => $body,
        }
    };
}

impl Value {
    /// dtype of the contained value
    pub fn dtype(&self) -> DType {
        dispatch!(*self, v => scalar_dtype(&v))
    }

    /// native byte order encoding, see `Scalar::write_ne`
    pub fn write_ne(&self, out: &mut [u8]) {
        dispatch!(*self, v => v.write_ne(out))
    }

    /// Parses `text` as a value of `dtype`.
    ///
    /// Booleans accept `true`/`false`/`True`/`False`/`1`/`0`, complex numbers
    /// the `1.5+2j` notation.
    pub fn parse(dtype: DType, text: &str) -> Result<Value> {
        let s = text.trim();
        let invalid = || NpyError::InvalidValue {
            dtype: dtype.to_string(),
            text: text.to_owned(),
        };
        let value = match dtype {
            DType::Bool => match s {
                "true" | "True" | "1" => Value::Bool(true),
                "false" | "False" | "0" => Value::Bool(false),
                _ => return Err(invalid()),
            },
            DType::I8 => Value::I8(s.parse().map_err(|_| invalid())?),
            DType::I16 => Value::I16(s.parse().map_err(|_| invalid())?),
            DType::I32 => Value::I32(s.parse().map_err(|_| invalid())?),
            DType::I64 => Value::I64(s.parse().map_err(|_| invalid())?),
            DType::U8 => Value::U8(s.parse().map_err(|_| invalid())?),
            DType::U16 => Value::U16(s.parse().map_err(|_| invalid())?),
            DType::U32 => Value::U32(s.parse().map_err(|_| invalid())?),
            DType::U64 => Value::U64(s.parse().map_err(|_| invalid())?),
            DType::F32 => Value::F32(s.parse().map_err(|_| invalid())?),
            DType::F64 => Value::F64(s.parse().map_err(|_| invalid())?),
            DType::C64 => Value::C64(s.parse().map_err(|_| invalid())?),
            DType::C128 => Value::C128(s.parse().map_err(|_| invalid())?),
        };
        Ok(value)
    }
}

fn scalar_dtype<T: Scalar>(_: &T) -> DType {
    T::DTYPE
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),+) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )+
    };
}

value_from!(
    bool => Bool, i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
    f32 => F32, f64 => F64, Complex32 => C64, Complex64 => C128
);
