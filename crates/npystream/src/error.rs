use std::error;
use std::fmt;
use std::io;

/// Errors raised while building a layout, rendering a header or writing records
#[derive(Debug)]
pub enum NpyError {
    /// label, dtype and size lists disagree in length (or are empty)
    LayoutMismatch {
        /// number of labels supplied
        labels: usize,
        /// number of fields in the record type
        fields: usize,
    },
    /// rendered dictionary does not fit the 16 bit length field
    HeaderTooLarge(usize),
    /// an appended record does not match the declared layout
    TypeMismatch {
        /// layout of the stream
        expected: String,
        /// what was handed in
        found: String,
    },
    /// type descriptor that cannot be written
    UnsupportedType(String),
    /// label that cannot be embedded in the header dictionary
    InvalidLabel(String),
    /// text that does not parse as the requested dtype
    InvalidValue {
        /// dtype the text was parsed as
        dtype: String,
        /// offending input
        text: String,
    },
    /// underlying write or seek failed
    Io(io::Error),
}
use self::NpyError::*;

impl error::Error for NpyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for NpyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            LayoutMismatch { labels, fields } => write!(
                f,
                "LayoutMismatch: {} labels for {} fields",
                labels, fields
            ),
            HeaderTooLarge(len) => write!(
                f,
                "HeaderTooLarge: dictionary of {} bytes exceeds {}",
                len,
                u16::MAX
            ),
            TypeMismatch { ref expected, ref found } => {
                write!(f, "TypeMismatch: expected {}, found {}", expected, found)
            }
            UnsupportedType(ref descr) => write!(f, "UnsupportedType: {}", descr),
            InvalidLabel(ref label) => write!(f, "InvalidLabel: {:?}", label),
            InvalidValue { ref dtype, ref text } => {
                write!(f, "InvalidValue: {:?} is not a valid {}", text, dtype)
            }
            Io(ref err) => write!(f, "IOFailure: {}", err),
        }
    }
}

impl From<io::Error> for NpyError {
    fn from(err: io::Error) -> Self {
        NpyError::Io(err)
    }
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, NpyError>;
