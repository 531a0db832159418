use std::io::{self, Write};

/// Fixed number of record-sized slots, drained to a writer when full.
///
/// Bytes are copied in verbatim, nothing is interpreted.
#[derive(Debug)]
pub struct RecordBuffer {
    bytes: Vec<u8>,
    stride: usize,
    capacity: usize,
    len: usize,
}

impl RecordBuffer {
    /// room for `capacity` records of `stride` bytes each
    pub fn new(stride: usize, capacity: usize) -> RecordBuffer {
        let capacity = std::cmp::max(1, capacity);
        RecordBuffer {
            bytes: vec![0; stride * capacity],
            stride,
            capacity,
            len: 0,
        }
    }

    /// the next free slot, zeroed
    ///
    /// Only valid while `!is_full()`. Nothing is counted until `commit`.
    pub fn slot_mut(&mut self) -> &mut [u8] {
        let start = self.len * self.stride;
        let slot = &mut self.bytes[start..start + self.stride];
        for b in slot.iter_mut() {
            *b = 0;
        }
        slot
    }

    /// marks the slot handed out by `slot_mut` as filled, returns whether
    /// the buffer is now full
    pub fn commit(&mut self) -> bool {
        debug_assert!(self.len < self.capacity);
        self.len += 1;
        self.is_full()
    }

    /// records currently held
    pub fn len(&self) -> usize {
        self.len
    }

    /// maximum records held before a drain
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// whether no records are held
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// whether every slot is filled
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// filled part of the buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len * self.stride]
    }

    /// Writes the filled slots and empties the buffer. On error the records
    /// stay buffered.
    pub fn drain_to<W: Write + ?Sized>(&mut self, wtr: &mut W) -> io::Result<usize> {
        if self.is_empty() {
            return Ok(0);
        }
        let drained = self.len;
        wtr.write_all(self.as_bytes())?;
        self.len = 0;
        Ok(drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fill_and_drain() {
        let mut buf = RecordBuffer::new(2, 3);
        let mut out = vec![];
        for i in 0..3u8 {
            buf.slot_mut().copy_from_slice(&[i, i + 10]);
            let full = buf.commit();
            assert_eq!(full, i == 2);
        }
        assert_eq!(buf.drain_to(&mut out).unwrap(), 3);
        assert_eq!(out, vec![0, 10, 1, 11, 2, 12]);
        assert!(buf.is_empty());
    }

    #[test]
    fn should_skip_empty_drain() {
        let mut buf = RecordBuffer::new(4, 8);
        let mut out: Vec<u8> = vec![];
        assert_eq!(buf.drain_to(&mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn should_hand_out_zeroed_slots() {
        let mut buf = RecordBuffer::new(2, 1);
        buf.slot_mut().copy_from_slice(&[0xff, 0xff]);
        // not committed, the slot is reused
        assert_eq!(&*buf.slot_mut(), &[0u8, 0][..]);
        assert_eq!(buf.capacity(), 1);
    }

    #[test]
    fn should_keep_records_when_write_fails() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "broken pipe"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut buf = RecordBuffer::new(1, 4);
        buf.slot_mut()[0] = 7;
        buf.commit();
        assert!(buf.drain_to(&mut Broken).is_err());
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.as_bytes(), &[7]);
    }
}
