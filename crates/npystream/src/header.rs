//!
//! Header codec for the .npy format, version 1.0
//!
//!
//! File Spec:
//! Offset 00: ([u8; 6]) magic value 0x93 `NUMPY`
//! Offset 06: (u8) major version, 1
//! Offset 07: (u8) minor version, 0
//! Offset 08: (u16, little endian) dictionary length `L`
//! Offset 10: ([u8; L]) ASCII dictionary, space padded, ends in `\n`,
//!            `10 + L` is a multiple of 16
//! Offset 10 + L: -- records --
//!
//!
//! Dictionary:
//!     {'descr': '<f8', 'fortran_order': False, 'shape': (3,), }
//!     {'descr': [('a', '<i4'), ('b', '<f4')], 'fortran_order': False, 'shape': (3,), }
//!
//! A streamed file first gets a placeholder header rendered for `u64::MAX`
//! elements. Any real count has at most as many digits, so the final header
//! is padded up to the placeholder's length by `patch` and overwrites it in
//! place.

use std::iter;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{NpyError, Result};
use crate::layout::Layout;

/// `\x93NUMPY`
pub static MAGIC_VALUE: &[u8] = &[0x93, 0x4E, 0x55, 0x4D, 0x50, 0x59];
/// format version 1.0
pub static FORMAT_VERSION: &[u8] = &[0x01, 0x00];
/// magic value, version and length field
pub const PREAMBLE_LEN: usize = 10;
const LEN_OFFSET: usize = 8;
const ALIGNMENT: usize = 16;

#[cfg(not(any(target_endian = "little", target_endian = "big")))]
compile_error!("mixed-endian targets are not supported");

/// byte order marker put in front of every type code
#[cfg(target_endian = "little")]
pub const NATIVE_ENDIAN_SYMBOL: char = '<';
/// byte order marker put in front of every type code
#[cfg(target_endian = "big")]
pub const NATIVE_ENDIAN_SYMBOL: char = '>';

/// Storage order flag written as `fortran_order`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemoryOrder {
    /// row major, `'fortran_order': False`
    C,
    /// column major, `'fortran_order': True`
    Fortran,
}

impl MemoryOrder {
    #[allow(non_upper_case_globals)]
    /// alias of `C`
    pub const RowMajor: MemoryOrder = MemoryOrder::C;
    #[allow(non_upper_case_globals)]
    /// alias of `Fortran`
    pub const ColumnMajor: MemoryOrder = MemoryOrder::Fortran;

    fn literal(self) -> &'static str {
        match self {
            MemoryOrder::C => "False",
            MemoryOrder::Fortran => "True",
        }
    }
}

impl Default for MemoryOrder {
    fn default() -> Self {
        MemoryOrder::C
    }
}

/// header for an array of one unlabeled scalar type
pub fn render_single(
    shape: &[u64],
    dtype_code: char,
    byte_size: usize,
    order: MemoryOrder,
) -> Result<Vec<u8>> {
    let mut dict = String::with_capacity(128);
    dict.push_str(&format!(
        "{{'descr': '{}{}{}', ",
        NATIVE_ENDIAN_SYMBOL, dtype_code, byte_size
    ));
    write_tail(&mut dict, shape, order);
    finalize(dict)
}

/// header for an array of labeled records, fields in the given order
pub fn render_structured<S: AsRef<str>>(
    shape: &[u64],
    labels: &[S],
    dtype_codes: &[char],
    byte_sizes: &[usize],
    order: MemoryOrder,
) -> Result<Vec<u8>> {
    if labels.len() != dtype_codes.len() || dtype_codes.len() != byte_sizes.len() {
        return Err(NpyError::LayoutMismatch {
            labels: labels.len(),
            fields: dtype_codes.len(),
        });
    }

    let mut dict = String::with_capacity(128 + 16 * labels.len());
    dict.push_str("{'descr': [");
    let fields = labels.iter().zip(dtype_codes).zip(byte_sizes);
    for (i, ((label, code), size)) in fields.enumerate() {
        if i > 0 {
            dict.push_str(", ");
        }
        dict.push_str(&format!(
            "('{}', '{}{}{}')",
            label.as_ref(),
            NATIVE_ENDIAN_SYMBOL,
            code,
            size
        ));
    }
    if labels.len() == 1 {
        dict.push(',');
    }
    dict.push_str("], ");
    write_tail(&mut dict, shape, order);
    finalize(dict)
}

/// Renders the header matching `layout`.
pub fn render(layout: &Layout, shape: &[u64], order: MemoryOrder) -> Result<Vec<u8>> {
    let fields = layout.fields();
    if layout.is_structured() {
        let codes: Vec<char> = fields.iter().map(|f| f.dtype.code()).collect();
        let sizes: Vec<usize> = fields.iter().map(|f| f.dtype.size()).collect();
        render_structured(shape, &layout.labels(), &codes, &sizes, order)
    } else {
        let dtype = fields[0].dtype;
        render_single(shape, dtype.code(), dtype.size(), order)
    }
}

/// Pads `header` with spaces in front of its final newline until it is
/// exactly `header_end_pos` bytes long, then fixes up the length field.
///
/// Panics if `header` is already longer: the placeholder reservation is
/// broken and writing would clobber records.
pub fn patch(header_end_pos: usize, mut header: Vec<u8>) -> Vec<u8> {
    assert!(
        header.len() <= header_end_pos && header.len() > PREAMBLE_LEN,
        "rendered header of {} bytes does not fit the {} reserved",
        header.len(),
        header_end_pos
    );
    let missing = header_end_pos - header.len();
    let newline = header.len() - 1;
    header.splice(newline..newline, iter::repeat(b' ').take(missing));

    let dict_len = header.len() - PREAMBLE_LEN;
    assert!(dict_len <= u16::MAX as usize, "patched dictionary overflows length field");
    LittleEndian::write_u16(&mut header[LEN_OFFSET..PREAMBLE_LEN], dict_len as u16);
    header
}

fn write_tail(dict: &mut String, shape: &[u64], order: MemoryOrder) {
    dict.push_str(&format!("'fortran_order': {}, 'shape': (", order.literal()));
    for (i, extent) in shape.iter().enumerate() {
        if i > 0 {
            dict.push_str(", ");
        }
        dict.push_str(&extent.to_string());
    }
    if shape.len() == 1 {
        dict.push(',');
    }
    dict.push_str("), }");
}

/// pad so that the preamble plus dictionary is a multiple of 16, end in newline
fn finalize(dict: String) -> Result<Vec<u8>> {
    let mut dict = dict.into_bytes();
    let padding = ALIGNMENT - (PREAMBLE_LEN + dict.len()) % ALIGNMENT;
    dict.extend(iter::repeat(b' ').take(padding));
    if let Some(last) = dict.last_mut() {
        *last = b'\n';
    }

    if dict.len() > u16::MAX as usize {
        return Err(NpyError::HeaderTooLarge(dict.len()));
    }

    let mut header = Vec::with_capacity(PREAMBLE_LEN + dict.len());
    header.extend_from_slice(MAGIC_VALUE);
    header.extend_from_slice(FORMAT_VERSION);
    let mut len = [0u8; 2];
    LittleEndian::write_u16(&mut len, dict.len() as u16);
    header.extend_from_slice(&len);
    header.extend_from_slice(&dict);
    Ok(header)
}
