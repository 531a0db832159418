use std::collections::HashSet;
use std::fmt;
use std::ops::Range;

use crate::dtype::DType;
use crate::error::{NpyError, Result};

/// One column of a record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    /// name in the structured dtype, `None` for a plain scalar array
    pub label: Option<String>,
    /// storage type
    pub dtype: DType,
    /// byte offset inside one serialized record
    pub offset: usize,
}

impl Field {
    /// bytes of this field inside a record
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.dtype.size()
    }
}

/// Ordered fields of one record, packed without padding.
///
/// Fixed for the lifetime of a stream: built once, then only read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<Field>,
    stride: usize,
    structured: bool,
}

impl Layout {
    /// unlabeled single scalar, written as `'descr': '<f8'`
    pub fn single(dtype: DType) -> Layout {
        Layout {
            fields: vec![Field {
                label: None,
                dtype,
                offset: 0,
            }],
            stride: dtype.size(),
            structured: false,
        }
    }

    /// labeled fields, written as `'descr': [('a', '<i4'), ...]`
    pub fn structured<S: AsRef<str>>(labels: &[S], dtypes: &[DType]) -> Result<Layout> {
        if labels.len() != dtypes.len() || dtypes.is_empty() {
            return Err(NpyError::LayoutMismatch {
                labels: labels.len(),
                fields: dtypes.len(),
            });
        }

        let mut fields = Vec::with_capacity(dtypes.len());
        let mut seen = HashSet::with_capacity(dtypes.len());
        let mut offset = 0;
        for (label, &dtype) in labels.iter().zip(dtypes) {
            let label = label.as_ref();
            check_label(label)?;
            // numpy refuses a dtype naming the same field twice
            if !seen.insert(label) {
                return Err(NpyError::InvalidLabel(label.to_owned()));
            }
            fields.push(Field {
                label: Some(label.to_owned()),
                dtype,
                offset,
            });
            offset += dtype.size();
        }

        Ok(Layout {
            fields,
            stride: offset,
            structured: true,
        })
    }

    /// A lone dtype becomes a plain scalar array, several are labeled `f0, f1, ...`
    pub fn implicit(dtypes: &[DType]) -> Result<Layout> {
        match dtypes {
            [] => Err(NpyError::LayoutMismatch {
                labels: 0,
                fields: 0,
            }),
            [dtype] => Ok(Layout::single(*dtype)),
            _ => Layout::structured(&default_labels(dtypes.len()), dtypes),
        }
    }

    /// all fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// bytes per record
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// whether the header lists labeled fields
    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// storage types in field order
    pub fn dtypes(&self) -> Vec<DType> {
        self.fields.iter().map(|f| f.dtype).collect()
    }

    /// field labels, empty for an unstructured layout
    pub fn labels(&self) -> Vec<&str> {
        self.fields.iter().filter_map(|f| f.label.as_deref()).collect()
    }

    /// number of whole records that fit into `target_bytes`, at least one
    pub fn buffer_capacity(&self, target_bytes: usize) -> usize {
        std::cmp::max(1, target_bytes / self.stride)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if !self.structured {
            return write!(f, "{}", self.fields[0].dtype);
        }
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.label.as_deref().unwrap_or(""), field.dtype)?;
        }
        write!(f, ")")
    }
}

/// `f0, f1, ...`, the labels numpy gives unnamed tuple fields
pub fn default_labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("f{}", i)).collect()
}

/// label must survive being quoted inside the python literal
fn check_label(label: &str) -> Result<()> {
    let bad = label
        .chars()
        .any(|c| !c.is_ascii() || c == '\'' || c == '\\' || c.is_ascii_control());
    if bad {
        Err(NpyError::InvalidLabel(label.to_owned()))
    } else {
        Ok(())
    }
}
