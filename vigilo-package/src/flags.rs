use std::io::Read;

use bitflags::bitflags;
use vigilo_core::binary::{Deserialize, Deserializer, Error, ResultContextExt};

bitflags! {
    /// `UObject` flags, carried by both name-table entries and exports.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjectFlags: u64 {
        const DEFAULT        = 0x0000000000000200;
        const TRANSACTIONAL  = 0x0000000100000000;
        const PUBLIC         = 0x0000000400000000;
        const TRANSIENT      = 0x0000400000000000;
        const STANDALONE     = 0x0008000000000000;
        const NOT_FOR_CLIENT = 0x0010000000000000;
        const NOT_FOR_SERVER = 0x0020000000000000;
        const NOT_FOR_EDIT   = 0x0040000000000000;
    }
}

/// On disk the two halves are swapped: the high dword comes first.
impl Deserialize for ObjectFlags {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let high = deserializer
            .deserialize::<u32>()
            .context("cannot deserialize object flags (high half)")?;
        let low = deserializer
            .deserialize::<u32>()
            .context("cannot deserialize object flags (low half)")?;
        Ok(Self::from_bits_retain(((high as u64) << 32) | low as u64))
    }
}
