//! Streaming writer: placeholder header, buffered records, header patch.
//!
//! Open
//!     render header for `u64::MAX` records, write it (zeroed or as is)
//! Append
//!     serialize into the record buffer, drain it to the file when full
//! Close
//!     drain, render header for the real count, pad to the reserved
//!     length, overwrite bytes `[0, header_end_pos)`
//!
//! Close happens exactly once, either through `close()` or when the handle
//! is dropped.

use std::borrow::Borrow;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::Path;

use crate::buffer::RecordBuffer;
use crate::config::{Placeholder, StreamConfig};
use crate::dtype::{Scalar, Value};
use crate::error::{NpyError, Result};
use crate::header::{self, MemoryOrder};
use crate::layout::Layout;
use crate::record::Record;

/// everything from the length field on is zeroed in a `Placeholder::Zeroed` header
const ZEROED_FROM: usize = 8;

/// Untyped .npy stream. Records are checked against the layout at runtime.
///
/// `inner` must be positioned at offset 0, the header is written there.
#[derive(Debug)]
pub struct NpyWriter<W: Write + Seek> {
    inner: Option<W>,
    layout: Layout,
    memory_order: MemoryOrder,
    buffer: RecordBuffer,
    values_written: u64,
    header_end_pos: usize,
}

fn placeholder_header(layout: &Layout, config: &StreamConfig) -> Result<Vec<u8>> {
    let mut header = header::render(layout, &[u64::MAX], config.memory_order)?;
    if config.placeholder == Placeholder::Zeroed {
        for b in header[ZEROED_FROM..].iter_mut() {
            *b = 0;
        }
    }
    Ok(header)
}

impl NpyWriter<File> {
    /// Creates (or truncates) the file at `path`.
    ///
    /// The header is rendered before the file is touched, so a layout that
    /// cannot be written leaves nothing behind.
    pub fn create<P: AsRef<Path>>(path: P, layout: Layout, config: &StreamConfig) -> Result<Self> {
        let header = placeholder_header(&layout, config)?;
        let file = File::create(path.as_ref())?;
        debug!(
            "opened {} for {} records, reserved {} header bytes",
            path.as_ref().display(),
            layout,
            header.len()
        );
        NpyWriter::start(file, layout, config, header)
    }
}

impl<W: Write + Seek> NpyWriter<W> {
    /// Starts a stream on an already opened writer.
    pub fn new(inner: W, layout: Layout, config: &StreamConfig) -> Result<Self> {
        let header = placeholder_header(&layout, config)?;
        NpyWriter::start(inner, layout, config, header)
    }

    fn start(mut inner: W, layout: Layout, config: &StreamConfig, header: Vec<u8>) -> Result<Self> {
        inner.write_all(&header)?;
        let capacity = layout.buffer_capacity(config.buffer_bytes);
        Ok(NpyWriter {
            inner: Some(inner),
            buffer: RecordBuffer::new(layout.stride(), capacity),
            layout,
            memory_order: config.memory_order,
            values_written: 0,
            header_end_pos: header.len(),
        })
    }

    /// field layout of every record
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// records appended so far, buffered ones included
    pub fn values_written(&self) -> u64 {
        self.values_written
    }

    /// offset of the first record
    pub fn header_end_pos(&self) -> usize {
        self.header_end_pos
    }

    /// records waiting in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Serializes one record into the next buffer slot.
    pub(crate) fn append_with<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnOnce(&Layout, &mut [u8]),
    {
        // left over from a failed drain
        if self.buffer.is_full() {
            self.flush_buffer()?;
        }
        fill(&self.layout, self.buffer.slot_mut());
        self.values_written += 1;
        if self.buffer.commit() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Appends one record given as dynamically typed values, one per field.
    pub fn append_values(&mut self, values: &[Value]) -> Result<()> {
        let fields = self.layout.fields();
        let matches = values.len() == fields.len()
            && values.iter().zip(fields).all(|(v, f)| v.dtype() == f.dtype);
        if !matches {
            let found: Vec<String> = values.iter().map(|v| v.dtype().to_string()).collect();
            return Err(NpyError::TypeMismatch {
                expected: self.layout.to_string(),
                found: format!("({})", found.join(", ")),
            });
        }

        self.append_with(|layout, slot| {
            for (value, field) in values.iter().zip(layout.fields()) {
                value.write_ne(&mut slot[field.range()]);
            }
        })
    }

    /// Appends one record that is already serialized in native byte order.
    pub fn append_bytes(&mut self, record: &[u8]) -> Result<()> {
        if record.len() != self.layout.stride() {
            return Err(NpyError::TypeMismatch {
                expected: format!("{} ({} bytes)", self.layout, self.layout.stride()),
                found: format!("{} bytes", record.len()),
            });
        }
        self.append_with(|_, slot| slot.copy_from_slice(record))
    }

    /// Writes serialized records of a single-field layout straight to the
    /// file, bypassing the record buffer.
    pub fn append_block_bytes(&mut self, block: &[u8]) -> Result<()> {
        let stride = self.layout.stride();
        if self.layout.fields().len() != 1 || block.len() % stride != 0 {
            return Err(NpyError::TypeMismatch {
                expected: format!("whole {} values", self.layout),
                found: format!("{} bytes", block.len()),
            });
        }
        self.write_block(block, (block.len() / stride) as u64)
    }

    pub(crate) fn write_block(&mut self, block: &[u8], count: u64) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        self.flush_buffer()?;
        if let Some(wtr) = self.inner.as_mut() {
            wtr.write_all(block)?;
        }
        self.values_written += count;
        trace!("wrote block of {} records", count);
        Ok(())
    }

    /// Pushes buffered records to the underlying writer. No-op when empty.
    pub fn flush(&mut self) -> Result<()> {
        self.flush_buffer()?;
        if let Some(wtr) = self.inner.as_mut() {
            wtr.flush()?;
        }
        Ok(())
    }

    fn flush_buffer(&mut self) -> Result<()> {
        if let Some(wtr) = self.inner.as_mut() {
            let drained = self.buffer.drain_to(wtr)?;
            if drained > 0 {
                trace!("flushed {} buffered records", drained);
            }
        }
        Ok(())
    }

    /// Flushes, writes the final header and hands back the writer.
    pub fn close(mut self) -> Result<W> {
        match self.inner.take() {
            Some(mut wtr) => {
                self.finish(&mut wtr)?;
                Ok(wtr)
            }
            None => Err(io::Error::new(io::ErrorKind::Other, "stream already closed").into()),
        }
    }

    fn finish(&mut self, wtr: &mut W) -> Result<()> {
        self.buffer.drain_to(wtr)?;
        let header = header::render(&self.layout, &[self.values_written], self.memory_order)?;
        let header = header::patch(self.header_end_pos, header);
        wtr.seek(SeekFrom::Start(0))?;
        wtr.write_all(&header)?;
        wtr.seek(SeekFrom::End(0))?;
        wtr.flush()?;
        debug!(
            "finalized header for {} records of {}",
            self.values_written, self.layout
        );
        Ok(())
    }
}

impl<W: Write + Seek> Drop for NpyWriter<W> {
    fn drop(&mut self) {
        // the writer is taken out first so a failed finalize is not retried
        if let Some(mut wtr) = self.inner.take() {
            debug!("finalizing dropped stream of {} records", self.values_written);
            if let Err(err) = self.finish(&mut wtr) {
                error!("failed to finalize .npy header: {}", err);
            }
        }
    }
}

/// Typed .npy stream of `R` records.
///
/// ```no_run
/// # fn main() -> npystream::Result<()> {
/// use npystream::NpyStream;
///
/// let mut stream = NpyStream::<(i32, f32)>::create_with_labels("out.npy", &["a", "b"])?;
/// stream.append(&(7, 2.5))?;
/// stream.close()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NpyStream<R: Record, W: Write + Seek = File> {
    writer: NpyWriter<W>,
    _record: PhantomData<fn(&R)>,
}

impl<R: Record> NpyStream<R, File> {
    /// Scalars become a plain array, tuples get the labels `f0, f1, ...`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let layout = Layout::implicit(&R::dtypes())?;
        Self::create_with_layout(path, layout, &StreamConfig::default())
    }

    /// structured array with one label per field
    pub fn create_with_labels<P: AsRef<Path>, S: AsRef<str>>(path: P, labels: &[S]) -> Result<Self> {
        let layout = Layout::structured(labels, &R::dtypes())?;
        Self::create_with_layout(path, layout, &StreamConfig::default())
    }

    /// `layout` must list exactly the dtypes of `R`
    pub fn create_with_layout<P: AsRef<Path>>(
        path: P,
        layout: Layout,
        config: &StreamConfig,
    ) -> Result<Self> {
        check_layout::<R>(&layout)?;
        Ok(NpyStream {
            writer: NpyWriter::create(path, layout, config)?,
            _record: PhantomData,
        })
    }
}

impl<R: Record, W: Write + Seek> NpyStream<R, W> {
    /// see `create`
    pub fn new(inner: W) -> Result<Self> {
        let layout = Layout::implicit(&R::dtypes())?;
        Self::with_layout(inner, layout, &StreamConfig::default())
    }

    /// see `create_with_labels`
    pub fn with_labels<S: AsRef<str>>(inner: W, labels: &[S]) -> Result<Self> {
        let layout = Layout::structured(labels, &R::dtypes())?;
        Self::with_layout(inner, layout, &StreamConfig::default())
    }

    /// see `create_with_layout`
    pub fn with_layout(inner: W, layout: Layout, config: &StreamConfig) -> Result<Self> {
        check_layout::<R>(&layout)?;
        Ok(NpyStream {
            writer: NpyWriter::new(inner, layout, config)?,
            _record: PhantomData,
        })
    }

    /// appends one record
    pub fn append(&mut self, record: &R) -> Result<()> {
        self.writer
            .append_with(|layout, slot| record.write_record(layout.fields(), slot))
    }

    /// Appends every record of `records`, one at a time.
    pub fn append_range<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Borrow<R>,
    {
        for record in records {
            self.append(record.borrow())?;
        }
        Ok(())
    }

    /// see `NpyWriter::flush`
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }

    /// see `NpyWriter::close`
    pub fn close(self) -> Result<W> {
        self.writer.close()
    }

    /// field layout of every record
    pub fn layout(&self) -> &Layout {
        self.writer.layout()
    }

    /// records appended so far
    pub fn values_written(&self) -> u64 {
        self.writer.values_written()
    }

    /// offset of the first record
    pub fn header_end_pos(&self) -> usize {
        self.writer.header_end_pos()
    }
}

impl<T: Scalar + Record, W: Write + Seek> NpyStream<T, W> {
    /// Writes a contiguous block of scalars past the record buffer.
    /// Anything already buffered is flushed first.
    pub fn append_block(&mut self, block: &[T]) -> Result<()> {
        let size = T::DTYPE.size();
        let mut bytes = vec![0u8; block.len() * size];
        for (value, out) in block.iter().zip(bytes.chunks_exact_mut(size)) {
            value.write_ne(out);
        }
        self.writer.write_block(&bytes, block.len() as u64)
    }
}

fn check_layout<R: Record>(layout: &Layout) -> Result<()> {
    let dtypes = R::dtypes();
    if layout.dtypes() != dtypes {
        let found: Vec<String> = dtypes.iter().map(|d| d.to_string()).collect();
        return Err(NpyError::TypeMismatch {
            expected: layout.to_string(),
            found: format!("({})", found.join(", ")),
        });
    }
    Ok(())
}
