/// Bounds-checked little-endian reader over an in-memory byte slice.
#[derive(Debug)]
pub struct MemoryBuffer<'a> {
    data: &'a [u8],
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unexpected end of data: wanted {wanted} bytes at offset {offset}, {remaining} left")]
pub struct EndOfData {
    pub wanted: usize,
    pub offset: usize,
    pub remaining: usize,
}

impl<'a> MemoryBuffer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        MemoryBuffer { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], EndOfData> {
        if len > self.remaining() {
            return Err(EndOfData {
                wanted: len,
                offset: self.position,
                remaining: self.remaining(),
            });
        }

        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, EndOfData> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_file_id(&mut self) -> Result<[u8; 4], EndOfData> {
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Reads a NUL-terminated string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<String, EndOfData> {
        let rest = &self.data[self.position..];
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            return Err(EndOfData {
                wanted: rest.len() + 1,
                offset: self.position,
                remaining: rest.len(),
            });
        };

        let text = String::from_utf8_lossy(&rest[..end]).into_owned();
        self.position += end + 1;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_past_end_fail_without_moving() {
        let data = [1, 0, 0, 0, 2];
        let mut buf = MemoryBuffer::new(&data);

        assert_eq!(buf.read_u32(), Ok(1));
        let err = buf.read_u32().unwrap_err();
        assert_eq!(err.wanted, 4);
        assert_eq!(err.remaining, 1);
        assert_eq!(buf.position(), 4);
    }

    #[test]
    fn cstrings_need_a_terminator() {
        let mut buf = MemoryBuffer::new(b"abc\0def");
        assert_eq!(buf.read_cstring().unwrap(), "abc");
        assert!(buf.read_cstring().is_err());
        assert_eq!(buf.remaining(), 3);
    }
}
