use std::{fmt, io::Read, num::NonZeroU32};

use vigilo_core::binary::{Deserialize, Deserializer, Error, ResultContextExt};

/// A cross-reference between package objects, serialized as a signed 32-bit
/// integer: positive values are 1-based indices into the export table,
/// negative values are 1-based indices into the import table (negated), and
/// zero means no reference. References may point forward, so they are only
/// validated once the whole header is loaded.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageObjectIndex {
    Import(NonZeroU32),
    None,
    Export(NonZeroU32),
}

impl PackageObjectIndex {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for PackageObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(i) => write!(f, "Import({i})"),
            Self::None => write!(f, "None"),
            Self::Export(i) => write!(f, "Export({i})"),
        }
    }
}

impl Deserialize for PackageObjectIndex {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let index = deserializer
            .deserialize::<i32>()
            .context("cannot deserialize package object index")?;
        Ok(match NonZeroU32::new(index.unsigned_abs()) {
            None => Self::None,
            Some(magnitude) if index < 0 => Self::Import(magnitude),
            Some(magnitude) => Self::Export(magnitude),
        })
    }
}
