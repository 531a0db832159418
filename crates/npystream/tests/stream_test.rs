extern crate npystream;
extern crate tempdir;

use std::fs;
use std::path::{Path, PathBuf};

use npystream::{
    Complex64, DType, Layout, MemoryOrder, NpyError, NpyStream, NpyWriter, StreamConfig, Value,
};
use tempdir::TempDir;

struct Header {
    len: usize,
    dict: String,
}

fn read_header(bytes: &[u8]) -> Header {
    assert_eq!(&bytes[..8], b"\x93NUMPY\x01\x00");
    let dict_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    let len = 10 + dict_len;
    assert_eq!(len % 16, 0);
    assert_eq!(bytes[len - 1], b'\n');
    Header {
        len,
        dict: String::from_utf8(bytes[10..len].to_vec()).unwrap(),
    }
}

fn declared_count(dict: &str) -> u64 {
    let start = dict.find("'shape': (").unwrap() + "'shape': (".len();
    let end = start + dict[start..].find(',').unwrap();
    dict[start..end].parse().unwrap()
}

fn tmp_file(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn read(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

#[test]
#[cfg(target_endian = "little")]
fn should_write_three_doubles() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "doubles.npy");

    let mut stream = NpyStream::<f64>::create(&path).unwrap();
    stream.append(&1.0).unwrap();
    stream.append(&2.0).unwrap();
    stream.append(&3.0).unwrap();
    stream.close().unwrap();

    let bytes = read(&path);
    let header = read_header(&bytes);
    assert_eq!(
        header.dict.trim_end(),
        "{'descr': '<f8', 'fortran_order': False, 'shape': (3,), }"
    );
    let mut data = vec![];
    for v in &[1.0f64, 2.0, 3.0] {
        data.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(&bytes[header.len..], &data[..]);
}

#[test]
#[cfg(target_endian = "little")]
fn should_write_labeled_record() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "structured.npy");

    let mut stream = NpyStream::<(i32, f32)>::create_with_labels(&path, &["a", "b"]).unwrap();
    stream.append(&(7, 2.5)).unwrap();
    stream.close().unwrap();

    let bytes = read(&path);
    let header = read_header(&bytes);
    assert!(header
        .dict
        .starts_with("{'descr': [('a', '<i4'), ('b', '<f4')], 'fortran_order': False, 'shape': (1,), }"));
    assert_eq!(&bytes[header.len..], &[0x07, 0, 0, 0, 0, 0, 0x20, 0x40]);
}

#[test]
fn should_declare_count_and_size() {
    let dir = TempDir::new("npystream").unwrap();
    for &k in &[0usize, 1, 20, 21, 22, 100, 1000] {
        let path = tmp_file(&dir, &format!("count-{}.npy", k));
        let mut stream = NpyStream::<(u8, i64, f32)>::create(&path).unwrap();
        let reserved = stream.header_end_pos();
        stream
            .append_range((0..k).map(|i| (i as u8, -(i as i64), i as f32 / 2.0)))
            .unwrap();
        assert_eq!(stream.values_written(), k as u64);
        stream.close().unwrap();

        let bytes = read(&path);
        let header = read_header(&bytes);
        assert_eq!(declared_count(&header.dict), k as u64);
        assert_eq!(header.len, reserved);
        assert_eq!(bytes.len(), reserved + k * 13);
    }
}

#[test]
fn should_keep_header_length_for_every_count() {
    let layout = Layout::single(DType::U16);
    let config = StreamConfig::default();
    let mut previous = None;
    for k in 0..300u16 {
        let cursor = std::io::Cursor::new(vec![]);
        let mut writer = NpyWriter::new(cursor, layout.clone(), &config).unwrap();
        let reserved = writer.header_end_pos();
        for i in 0..k {
            writer.append_values(&[Value::U16(i)]).unwrap();
        }
        let bytes = writer.close().unwrap().into_inner();
        let header = read_header(&bytes);
        assert_eq!(header.len, reserved);
        assert_eq!(declared_count(&header.dict), k as u64);
        if let Some(prev) = previous {
            assert_eq!(prev, reserved);
        }
        previous = Some(reserved);
    }
}

#[test]
fn should_flush_idempotently() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "flush.npy");

    let mut stream = NpyStream::<i32>::create(&path).unwrap();
    stream.append_range(vec![1, 2, 3, 4, 5]).unwrap();
    stream.flush().unwrap();
    let first = read(&path);
    assert_eq!(first.len(), stream.header_end_pos() + 5 * 4);

    stream.flush().unwrap();
    assert_eq!(read(&path), first);
    stream.close().unwrap();
}

#[test]
fn should_reject_label_count_without_creating_file() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "mismatch.npy");

    match NpyStream::<(i32, f32, u8)>::create_with_labels(&path, &["a", "b"]) {
        Err(NpyError::LayoutMismatch { labels: 2, fields: 3 }) => (),
        other => panic!("unexpected {:?}", other.map(|s| s.values_written())),
    }
    assert!(!path.exists());
}

#[test]
fn should_reject_oversized_header_without_creating_file() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "wide.npy");

    let layout = Layout::implicit(&vec![DType::F64; 6000]).unwrap();
    match NpyWriter::create(&path, layout, &StreamConfig::default()) {
        Err(NpyError::HeaderTooLarge(_)) => (),
        other => panic!("unexpected {:?}", other.map(|w| w.header_end_pos())),
    }
    assert!(!path.exists());
}

#[test]
#[cfg(target_endian = "little")]
fn should_mark_little_endian() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "endian.npy");

    let mut stream = NpyStream::<(u32, i16, f64, Complex64)>::create(&path).unwrap();
    stream
        .append(&(1, -2, 0.5, Complex64::new(1.0, 0.0)))
        .unwrap();
    stream.close().unwrap();

    let bytes = read(&path);
    let header = read_header(&bytes);
    assert!(header.dict.starts_with(
        "{'descr': [('f0', '<u4'), ('f1', '<i2'), ('f2', '<f8'), ('f3', '<c16')], "
    ));
    assert_eq!(&bytes[header.len..header.len + 4], &[1, 0, 0, 0]);
    assert_eq!(bytes.len(), header.len + 4 + 2 + 8 + 16);
}

#[test]
fn should_write_fortran_flag() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "fortran.npy");

    let config = StreamConfig {
        memory_order: MemoryOrder::Fortran,
        ..StreamConfig::default()
    };
    let stream = NpyStream::<bool>::create_with_layout(&path, Layout::single(DType::Bool), &config)
        .unwrap();
    stream.close().unwrap();

    let header = read_header(&read(&path));
    assert!(header.dict.contains("'fortran_order': True"));
    assert!(header.dict.contains("b1'"));
    assert_eq!(declared_count(&header.dict), 0);
}

#[test]
fn should_finalize_file_on_drop() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "dropped.npy");

    {
        let mut stream = NpyStream::<u64>::create(&path).unwrap();
        stream.append_block(&[10, 20, 30, 40]).unwrap();
        stream.append(&50).unwrap();
    }

    let bytes = read(&path);
    let header = read_header(&bytes);
    assert_eq!(declared_count(&header.dict), 5);
    assert_eq!(bytes.len(), header.len + 5 * 8);
}

#[test]
fn should_stream_dynamic_values() {
    let dir = TempDir::new("npystream").unwrap();
    let path = tmp_file(&dir, "dynamic.npy");

    let layout = Layout::structured(&["id", "ok"], &[DType::U32, DType::Bool]).unwrap();
    let mut writer = NpyWriter::create(&path, layout, &StreamConfig::default()).unwrap();
    for i in 0..70u32 {
        writer
            .append_values(&[Value::U32(i), Value::Bool(i % 2 == 0)])
            .unwrap();
    }
    match writer.append_values(&[Value::U64(1), Value::Bool(true)]) {
        Err(NpyError::TypeMismatch { .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
    writer.close().unwrap();

    let bytes = read(&path);
    let header = read_header(&bytes);
    assert_eq!(declared_count(&header.dict), 70);
    assert_eq!(bytes.len(), header.len + 70 * 5);
}
