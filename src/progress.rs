//! Byte-based progress reporting for the input stream.

use std::io::Read;

/// A reader wrapper that reports the running byte count after every read.
///
/// The count is of bytes pulled from the underlying file, so it tracks the
/// on-disk size even when a decompressor sits on top.
pub struct ProgressReader<R: Read, F: Fn(u64)> {
    reader: R,
    callback: F,
    bytes_read: u64,
}

impl<R: Read, F: Fn(u64)> ProgressReader<R, F> {
    pub fn new(reader: R, callback: F) -> Self {
        Self {
            reader,
            callback,
            bytes_read: 0,
        }
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read, F: Fn(u64)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.reader.read(buf)?;
        self.bytes_read += n as u64;
        (self.callback)(self.bytes_read);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_reports_cumulative_bytes() {
        let seen = Rc::new(Cell::new(0));
        let seen_cb = seen.clone();
        let mut reader = ProgressReader::new(&b"CREATE TABLE t (\n);\n"[..], move |n| seen_cb.set(n));

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(reader.bytes_read(), 20);
        assert_eq!(seen.get(), 20);
    }
}
