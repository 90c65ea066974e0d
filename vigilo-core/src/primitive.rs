use std::{fmt, io::Read};

use crate::binary::{Deserialize, Deserializer, Error, ResultContextExt};

/// 32-bit Unreal `UBOOL`. Any nonzero value reads as true.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Bool32(u32);

impl From<bool> for Bool32 {
    fn from(value: bool) -> Self {
        Self(value as u32)
    }
}

impl From<Bool32> for bool {
    fn from(value: Bool32) -> Self {
        value.0 != 0
    }
}

impl Deserialize for Bool32 {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let underlying = deserializer
            .deserialize::<u32>()
            .context("cannot deserialize Bool32")?;
        Ok(Self(underlying))
    }
}

impl fmt::Debug for Bool32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&bool::from(*self), f)
    }
}

impl fmt::Display for Bool32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&bool::from(*self), f)
    }
}
