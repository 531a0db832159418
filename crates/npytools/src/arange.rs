use std::path::Path;

use npystream::{DType, Layout, NpyStream, Record, Scalar, StreamConfig};

use crate::convert::Result;

/// values handed to the stream per block write
const BLOCK_LEN: usize = 4096;

/// Writes `start, start + step, ...` up to but excluding `stop`, same
/// length rule as `numpy.arange`.
pub fn arange(
    output: &Path,
    start: f64,
    stop: f64,
    step: f64,
    dtype: DType,
    config: &StreamConfig,
) -> Result<u64> {
    if step == 0.0 || !step.is_finite() {
        return Err(format!("invalid step {}", step).into());
    }
    if !start.is_finite() || !stop.is_finite() {
        return Err(format!("range bounds must be finite, got {} to {}", start, stop).into());
    }
    let len = ((stop - start) / step).ceil().max(0.0);
    if len >= i64::MAX as f64 {
        return Err(format!("range of {} values is too long", len).into());
    }
    let len = len as u64;

    match dtype {
        DType::I32 => {
            check_bounds(start, step, len, i32::MIN as f64, i32::MAX as f64, dtype)?;
            write_range(output, start, step, len, config, |x| x as i32)
        }
        DType::I64 => {
            check_bounds(start, step, len, i64::MIN as f64, i64::MAX as f64, dtype)?;
            write_range(output, start, step, len, config, |x| x as i64)
        }
        DType::F32 => write_range(output, start, step, len, config, |x| x as f32),
        DType::F64 => write_range(output, start, step, len, config, |x| x),
        other => Err(format!("arange does not support {}", other).into()),
    }
}

/// first and last value must be representable in `dtype`
fn check_bounds(start: f64, step: f64, len: u64, min: f64, max: f64, dtype: DType) -> Result<()> {
    if len == 0 {
        return Ok(());
    }
    let last = start + (len - 1) as f64 * step;
    for &value in &[start, last] {
        if value < min || value > max {
            return Err(format!("{} does not fit in {}", value, dtype).into());
        }
    }
    Ok(())
}

fn write_range<T, F>(
    output: &Path,
    start: f64,
    step: f64,
    len: u64,
    config: &StreamConfig,
    cast: F,
) -> Result<u64>
where
    T: Scalar + Record,
    F: Fn(f64) -> T,
{
    let layout = Layout::single(T::DTYPE);
    let mut stream = NpyStream::<T>::create_with_layout(output, layout, config)?;
    info!("writing {} values of {} to {}", len, T::DTYPE, output.display());

    let mut block = Vec::with_capacity(BLOCK_LEN);
    for i in 0..len {
        block.push(cast(start + i as f64 * step));
        if block.len() == BLOCK_LEN {
            stream.append_block(&block)?;
            block.clear();
        }
    }
    stream.append_block(&block)?;

    let count = stream.values_written();
    stream.close()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    #[cfg(target_endian = "little")]
    fn should_write_stepped_ints() {
        let dir = TempDir::new("npytools").unwrap();
        let out = dir.path().join("range.npy");
        let count = arange(&out, 0.0, 10.0, 3.0, DType::I32, &StreamConfig::default()).unwrap();
        assert_eq!(count, 4);

        let bytes = fs::read(&out).unwrap();
        assert_eq!(
            &bytes[bytes.len() - 16..],
            &[0, 0, 0, 0, 3, 0, 0, 0, 6, 0, 0, 0, 9, 0, 0, 0]
        );
    }

    #[test]
    fn should_span_several_blocks() {
        let dir = TempDir::new("npytools").unwrap();
        let out = dir.path().join("long.npy");
        let n = BLOCK_LEN as f64 * 2.5;
        let count = arange(&out, 0.0, n, 1.0, DType::F64, &StreamConfig::default()).unwrap();
        assert_eq!(count, n as u64);
        let len = fs::metadata(&out).unwrap().len();
        assert_eq!(len, 96 + count * 8);
    }

    #[test]
    fn should_reject_bad_arguments() {
        let dir = TempDir::new("npytools").unwrap();
        let out = dir.path().join("bad.npy");
        let config = StreamConfig::default();
        assert!(arange(&out, 0.0, 1.0, 0.0, DType::F64, &config).is_err());
        assert!(arange(&out, 0.0, 1.0, 0.1, DType::C64, &config).is_err());
        assert!(arange(&out, 0.0, f64::INFINITY, 1.0, DType::F64, &config).is_err());
        assert!(arange(&out, f64::NAN, 10.0, 1.0, DType::I64, &config).is_err());
        assert!(arange(&out, 0.0, f64::NAN, 1.0, DType::F32, &config).is_err());
        assert!(arange(&out, 0.0, 1e300, 1.0, DType::F64, &config).is_err());
        let err = arange(&out, 2147483640.0, 2147483660.0, 1.0, DType::I32, &config).unwrap_err();
        assert!(err.to_string().contains("does not fit in i4"));
        assert!(arange(&out, -3e9, 0.0, 1e9, DType::I32, &config).is_err());
        assert!(!out.exists());

        let count = arange(&out, 2147483640.0, 2147483660.0, 1.0, DType::I64, &config).unwrap();
        assert_eq!(count, 20);

        let count = arange(&out, 5.0, 1.0, 1.0, DType::I64, &config).unwrap();
        assert_eq!(count, 0);
    }
}
