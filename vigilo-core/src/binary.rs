pub mod macros;

mod deserialization;
mod deserializer;
mod error;

pub use deserialization::*;
pub use deserializer::*;
pub use error::*;
