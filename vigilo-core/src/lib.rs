pub mod binary;
pub mod primitive;
pub mod string;

pub use binary::{
    deserialize, Deserialize, Deserializer, Error, ErrorKind, ResultContextExt, Strictness,
};

pub extern crate uuid;
