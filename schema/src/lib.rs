//! Shared building blocks for the Brine IDL codec: the compiled schema model,
//! the dynamic [Value](enum.Value.html) tree that gets encoded, and the byte
//! buffers that implement the wire primitives (LEB128 varints and
//! little-endian fixed-width numbers).
//!
//! ```
//! use brine_idl_schema::*;
//!
//! let mut bb = ByteBufferMut::new();
//! bb.write_fixed_int(3, 1);
//! bb.write_bool(true);
//! bb.write_var_uint64(2);
//! bb.write_bytes(b"hi");
//! assert_eq!(bb.data(), [0x03, 0x01, 0x02, 0x68, 0x69]);
//! ```

pub mod bb;
pub mod schema;
pub mod value;

pub use bb::*;
pub use schema::*;
pub use value::*;
