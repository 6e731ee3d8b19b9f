//! # Core Value Codec
//!
//! The tagged value model and its binary encoding.
//!
//! ## Components
//! - **Buffer**: bounds-checked read cursor over borrowed bytes
//! - **Field**: one tagged value; containers own their children
//! - **Registry**: type code → decoder table, frozen after construction
//! - **SFSObject / SFSArray**: builder and accessor API over containers
//!
//! ## Wire Format
//! ```text
//! [TypeCode(1)] [Payload(N)]
//! ```
//! All integers are big-endian. Floats follow [`FloatOrder`](crate::config::FloatOrder).
//!
//! ## Security
//! - Every read is bounds-checked before the cursor moves
//! - Array counts are validated against the remaining input before allocating
//! - Container nesting is capped by `CodecConfig::max_depth`

pub mod array;
pub mod buffer;
pub mod convert;
pub mod decode;
pub mod field;
pub mod object;
pub mod registry;
pub(crate) mod scalar;
pub mod type_code;

pub use array::SFSArray;
pub use buffer::Buffer;
pub use convert::FromField;
pub use decode::decode;
pub use field::Field;
pub use object::SFSObject;
pub use registry::{DecodeContext, DecodeFn, Registry, RegistryBuilder};
pub use scalar::{MAX_U16_LEN, MAX_U32_LEN};
pub use type_code::TypeCode;
