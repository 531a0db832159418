use num_complex::{Complex32, Complex64};

use crate::dtype::{DType, Scalar};
use crate::layout::Field;

/// A fixed-layout element that can be appended to a stream.
///
/// Scalars are one-field records, tuples of scalars are structured records
/// with one field per tuple member.
pub trait Record {
    /// storage type of every field, in order
    fn dtypes() -> Vec<DType>;

    /// Copies each field into `out` at the offsets from `fields`.
    /// `out` is exactly one record stride long.
    fn write_record(&self, fields: &[Field], out: &mut [u8]);
}

macro_rules! scalar_record {
    ($($ty:ty),+) => {
        $(
            impl Record for $ty {
                fn dtypes() -> Vec<DType> {
                    vec![<$ty as Scalar>::DTYPE]
                }

                #[inline]
                fn write_record(&self, fields: &[Field], out: &mut [u8]) {
                    self.write_ne(&mut out[fields[0].range()]);
                }
            }
        )+
    };
}

scalar_record!(bool, i8, i16, i32, i64, u8, u16, u32, u64, f32, f64, Complex32, Complex64);

macro_rules! tuple_record {
    ($($idx:tt $name:ident),+) => {
        impl<$($name: Scalar),+> Record for ($($name,)+) {
            fn dtypes() -> Vec<DType> {
                vec![$($name::DTYPE),+]
            }

            #[inline]
            fn write_record(&self, fields: &[Field], out: &mut [u8]) {
                $(
                    self.$idx.write_ne(&mut out[fields[$idx].range()]);
                )+
            }
        }
    };
}

tuple_record!(0 A);
tuple_record!(0 A, 1 B);
tuple_record!(0 A, 1 B, 2 C);
tuple_record!(0 A, 1 B, 2 C, 3 D);
tuple_record!(0 A, 1 B, 2 C, 3 D, 4 E);
tuple_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F);
tuple_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G);
tuple_record!(0 A, 1 B, 2 C, 3 D, 4 E, 5 F, 6 G, 7 H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Layout;

    fn serialize<R: Record>(record: &R) -> Vec<u8> {
        let layout = Layout::implicit(&R::dtypes()).unwrap();
        let mut out = vec![0xff; layout.stride()];
        record.write_record(layout.fields(), &mut out);
        out
    }

    #[test]
    fn should_describe_tuples() {
        assert_eq!(<(i32, f32)>::dtypes(), vec![DType::I32, DType::F32]);
        assert_eq!(<(u8,)>::dtypes(), vec![DType::U8]);
        assert_eq!(f64::dtypes(), vec![DType::F64]);
        assert_eq!(
            <(bool, i8, i16, i64, u16, u32, u64, Complex64)>::dtypes().len(),
            8
        );
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn should_write_fields_at_offsets() {
        assert_eq!(serialize(&(7i32, 2.5f32)), vec![7, 0, 0, 0, 0, 0, 0x20, 0x40]);
        assert_eq!(serialize(&(1u8, 2u16, true)), vec![1, 2, 0, 1]);
        assert_eq!(serialize(&-1i16), vec![0xff, 0xff]);
    }
}
