//! npystream writes NumPy `.npy` files one record at a time, without
//! knowing the final element count up front.
//!
//! The header is reserved for the largest possible count when the file is
//! opened and patched in place with the real count when the stream closes.
#![deny(missing_docs)]

extern crate byteorder;
extern crate num_complex;
#[macro_use]
extern crate log;

/// stream buffering
pub mod buffer;
/// options fixed at open time
pub mod config;
/// scalar types and their numpy codes
pub mod dtype;
/// error type
pub mod error;
/// .npy header rendering and patching
pub mod header;
/// field offsets inside a record
pub mod layout;
/// types that can be appended
pub mod record;
/// the streaming writer
pub mod stream;

pub use crate::config::{Placeholder, StreamConfig};
pub use crate::dtype::{DType, Scalar, Value};
pub use crate::error::{NpyError, Result};
pub use crate::header::MemoryOrder;
pub use crate::layout::{Field, Layout};
pub use crate::record::Record;
pub use crate::stream::{NpyStream, NpyWriter};
pub use num_complex::{Complex32, Complex64};
