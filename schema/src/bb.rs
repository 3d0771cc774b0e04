/// A byte buffer meant for reading.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_idl_schema::ByteBuffer::new(&[0xAC, 0x02, 0xFE, 0xFF]);
/// assert_eq!(bb.read_var_uint64(), Ok(300));
/// assert_eq!(bb.read_i16(), Ok(-2));
/// assert!(bb.is_at_end());
/// ```
///
pub struct ByteBuffer<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> ByteBuffer<'a> {
    /// Create a new ByteBuffer that wraps the provided byte slice. The lifetime
    /// of the returned ByteBuffer must not outlive the lifetime of the byte
    /// slice.
    pub fn new(data: &'a [u8]) -> ByteBuffer<'a> {
        ByteBuffer { data, index: 0 }
    }

    /// Like [new](#method.new) but starts reading at `index`. An index past
    /// the end is allowed and simply leaves nothing to read.
    pub fn new_at(data: &'a [u8], index: usize) -> ByteBuffer<'a> {
        ByteBuffer { data, index }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.index)
    }

    pub fn is_at_end(&self) -> bool {
        self.index >= self.data.len()
    }

    /// Try to read a byte starting at the current index.
    pub fn read_byte(&mut self) -> Result<u8, ()> {
        if self.is_at_end() {
            Err(())
        } else {
            let value = self.data[self.index];
            self.index += 1;
            Ok(value)
        }
    }

    /// Try to read `len` bytes starting at the current index. Nothing is
    /// consumed when fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        if len > self.remaining() {
            Err(())
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    /// Try to read an unsigned LEB128 varint starting at the current index.
    /// Fails on truncation and on encodings that do not fit in 64 bits.
    pub fn read_var_uint64(&mut self) -> Result<u64, ()> {
        let mut shift: u32 = 0;
        let mut result: u64 = 0;

        loop {
            let byte = self.read_byte()?;
            let payload = (byte & 127) as u64;

            if shift == 63 && payload > 1 {
                return Err(());
            }
            result |= payload << shift;

            if (byte & 128) == 0 {
                return Ok(result);
            }

            shift += 7;
            if shift > 63 {
                return Err(());
            }
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ()> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, ()> {
        self.read_byte()
    }

    pub fn read_i8(&mut self) -> Result<i8, ()> {
        Ok(i8::from_le_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, ()> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, ()> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, ()> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ()> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    /// Try to read a little-endian IEEE-754 single starting at the current index.
    pub fn read_f32(&mut self) -> Result<f32, ()> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Try to read a little-endian IEEE-754 double starting at the current index.
    pub fn read_f64(&mut self) -> Result<f64, ()> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }
}

#[test]
fn read_byte() {
    let read = |bytes| ByteBuffer::new(bytes).read_byte();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_bytes() {
    let read = |bytes, len| ByteBuffer::new(bytes).read_bytes(len);
    assert_eq!(read(&[], 0), Ok(vec![].as_slice()));
    assert_eq!(read(&[], 1), Err(()));
    assert_eq!(read(&[0], 1), Ok(vec![0].as_slice()));
    assert_eq!(read(&[0], 2), Err(()));

    let mut bb = ByteBuffer::new(&[1, 2, 3, 4, 5]);
    assert_eq!(bb.read_bytes(3), Ok(vec![1, 2, 3].as_slice()));
    assert_eq!(bb.read_bytes(3), Err(()));
    assert_eq!(bb.index(), 3);
    assert_eq!(bb.read_bytes(2), Ok(vec![4, 5].as_slice()));
    assert!(bb.is_at_end());
}

#[test]
fn read_var_uint64() {
    let read = |bytes| ByteBuffer::new(bytes).read_var_uint64();
    assert_eq!(read(&[]), Err(()));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[1]), Ok(1));
    assert_eq!(read(&[127]), Ok(127));
    assert_eq!(read(&[128]), Err(()));
    assert_eq!(read(&[128, 1]), Ok(128));
    assert_eq!(read(&[0xAC, 0x02]), Ok(300));
    assert_eq!(read(&[255, 255, 255, 255, 15]), Ok(4294967295));
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]),
        Ok(u64::MAX)
    );
    assert_eq!(
        read(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02]),
        Err(())
    );
    assert_eq!(
        read(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00]),
        Err(())
    );
}

#[test]
fn read_fixed_width() {
    let mut bb = ByteBuffer::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x80]);
    assert_eq!(bb.read_i8(), Ok(-1));
    assert_eq!(bb.read_u8(), Ok(255));
    assert_eq!(bb.read_u16(), Ok(65535));
    assert_eq!(bb.read_i32(), Ok(i32::MIN + 255));
    assert!(bb.is_at_end());

    let mut bb = ByteBuffer::new(&[0x01, 0x00, 0x00]);
    assert_eq!(bb.read_u32(), Err(()));
    assert_eq!(bb.remaining(), 3);
    assert_eq!(bb.read_i16(), Ok(1));
}

#[test]
fn read_floats() {
    let mut bb = ByteBuffer::new(&[0x00, 0x00, 0xC0, 0x3F]);
    assert_eq!(bb.read_f32(), Ok(1.5));
    let bytes = 0.1f64.to_le_bytes();
    assert_eq!(ByteBuffer::new(&bytes).read_f64(), Ok(0.1));
    assert_eq!(ByteBuffer::new(&bytes[..7]).read_f64(), Err(()));
}

#[test]
fn read_past_end() {
    let bb = ByteBuffer::new_at(&[1, 2], 5);
    assert_eq!(bb.remaining(), 0);
    assert!(bb.is_at_end());
}

/// A byte buffer meant for writing.
///
/// Example usage:
///
/// ```
/// let mut bb = brine_idl_schema::ByteBufferMut::new();
/// bb.write_var_uint64(300);
/// bb.write_fixed_int(-2, 2);
/// assert_eq!(bb.data(), [0xAC, 0x02, 0xFE, 0xFF]);
/// ```
///
#[derive(Default)]
pub struct ByteBufferMut {
    data: Vec<u8>,
}

impl ByteBufferMut {
    /// Creates an empty ByteBufferMut ready for writing.
    pub fn new() -> ByteBufferMut {
        ByteBufferMut { data: vec![] }
    }

    /// Creates an empty ByteBufferMut with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> ByteBufferMut {
        ByteBufferMut {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Consumes this buffer and returns the underlying backing store. Use this
    /// to get the data out when you're done writing to the buffer.
    pub fn data(self) -> Vec<u8> {
        self.data
    }

    /// Returns the number of bytes written so far.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a boolean value to the end of the buffer.
    pub fn write_bool(&mut self, value: bool) {
        self.data.push(if value { 1 } else { 0 });
    }

    /// Write a byte to the end of the buffer.
    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Write a raw byte slice to the end of the buffer.
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.data.extend_from_slice(value);
    }

    /// Write an unsigned LEB128 varint to the end of the buffer.
    pub fn write_var_uint64(&mut self, mut value: u64) {
        loop {
            let byte = value as u8 & 127;
            value >>= 7;

            if value == 0 {
                self.write_byte(byte);
                return;
            }

            self.write_byte(byte | 128);
        }
    }

    /// Number of bytes [write_var_uint64](#method.write_var_uint64) uses for
    /// `value`.
    pub fn var_uint64_len(value: u64) -> usize {
        let bits = 64 - value.leading_zeros() as usize;
        bits.max(1).div_ceil(7)
    }

    /// Write the low `width` bytes of `value` in little-endian two's
    /// complement. `width` must be at most 8.
    pub fn write_fixed_int(&mut self, value: i64, width: usize) {
        let bytes = value.to_le_bytes();
        self.data.extend_from_slice(&bytes[..width.min(bytes.len())]);
    }

    /// Write a little-endian IEEE-754 single to the end of the buffer.
    pub fn write_f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian IEEE-754 double to the end of the buffer.
    pub fn write_f64(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
fn write_once(cb: fn(&mut ByteBufferMut)) -> Vec<u8> {
    let mut bb = ByteBufferMut::new();
    cb(&mut bb);
    bb.data()
}

#[test]
fn write_bool() {
    assert_eq!(write_once(|bb| bb.write_bool(false)), [0]);
    assert_eq!(write_once(|bb| bb.write_bool(true)), [1]);
}

#[test]
fn write_bytes() {
    let mut bb = ByteBufferMut::new();
    bb.write_bytes(&[1, 2, 3]);
    bb.write_bytes(&[]);
    bb.write_bytes(&[4, 5]);
    assert_eq!(bb.len(), 5);
    assert_eq!(bb.data(), [1, 2, 3, 4, 5]);
}

#[test]
fn write_var_uint64() {
    assert_eq!(write_once(|bb| bb.write_var_uint64(0)), [0]);
    assert_eq!(write_once(|bb| bb.write_var_uint64(127)), [127]);
    assert_eq!(write_once(|bb| bb.write_var_uint64(128)), [128, 1]);
    assert_eq!(write_once(|bb| bb.write_var_uint64(300)), [0xAC, 0x02]);
    assert_eq!(
        write_once(|bb| bb.write_var_uint64(4294967295)),
        [255, 255, 255, 255, 15]
    );
    assert_eq!(
        write_once(|bb| bb.write_var_uint64(u64::MAX)),
        [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
    );
}

#[test]
fn var_uint64_len() {
    for value in [0, 1, 127, 128, 300, 16383, 16384, 4294967295, u64::MAX] {
        assert_eq!(
            ByteBufferMut::var_uint64_len(value),
            write_once_with(value, |bb, v| bb.write_var_uint64(v)).len()
        );
    }
    assert_eq!(ByteBufferMut::var_uint64_len(u64::MAX), 10);
}

#[cfg(test)]
fn write_once_with(value: u64, cb: fn(&mut ByteBufferMut, u64)) -> Vec<u8> {
    let mut bb = ByteBufferMut::with_capacity(10);
    cb(&mut bb, value);
    bb.data()
}

#[test]
fn write_fixed_int() {
    assert_eq!(write_once(|bb| bb.write_fixed_int(3, 1)), [3]);
    assert_eq!(write_once(|bb| bb.write_fixed_int(-1, 1)), [0xFF]);
    assert_eq!(write_once(|bb| bb.write_fixed_int(-2, 2)), [0xFE, 0xFF]);
    assert_eq!(write_once(|bb| bb.write_fixed_int(65535, 2)), [0xFF, 0xFF]);
    assert_eq!(
        write_once(|bb| bb.write_fixed_int(0x0102_0304, 4)),
        [0x04, 0x03, 0x02, 0x01]
    );
}

#[test]
fn write_floats() {
    assert_eq!(write_once(|bb| bb.write_f32(1.5)), [0x00, 0x00, 0xC0, 0x3F]);
    assert_eq!(write_once(|bb| bb.write_f64(1.0)), [0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
}
