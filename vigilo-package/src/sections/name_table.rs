use std::io::{Read, Seek};

use tracing::debug;
use vigilo_core::{
    binary::{Deserializer, Error, ResultContextExt},
    deserialize_structure,
    string::UnrealString,
};

use crate::flags::ObjectFlags;

use super::Summary;

/// One entry of the package-global name table. All identifiers elsewhere in
/// the header are indices into this table.
#[derive(Debug, Clone)]
pub struct NameTableEntry {
    pub name: UnrealString,
    pub flags: ObjectFlags,
}

deserialize_structure! {
    type NameTableEntry {
        name,
        flags,
    }
}

impl Summary {
    pub fn read_name_table(
        &self,
        deserializer: &mut Deserializer<impl Read + Seek>,
    ) -> Result<Vec<NameTableEntry>, Error> {
        debug!(
            "Reading name table ({} names at {:08x})",
            self.name_count, self.name_offset
        );
        deserializer.detour(self.name_offset as u64, |deserializer| {
            let mut names = Vec::with_capacity(self.name_count as usize);
            for i in 0..self.name_count {
                names.push(
                    deserializer
                        .deserialize()
                        .with_context(|| format!("cannot deserialize name {i}"))?,
                );
            }
            Ok(names)
        })
    }
}
