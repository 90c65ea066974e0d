use std::io::{Read, Seek};

use tracing::debug;
use uuid::Uuid;
use vigilo_core::binary::{Deserialize, Deserializer, Error, ResultContextExt};

use crate::{flags::ObjectFlags, index::PackageObjectIndex, name::NameReference};

use super::Summary;

/// An object defined and owned by this package. The 1-based position in the
/// export table is the positive-index addressing space for object
/// references.
#[derive(Debug, Clone)]
pub struct ObjectExport {
    pub class: PackageObjectIndex,
    pub super_class: PackageObjectIndex,
    pub owner: PackageObjectIndex,
    pub name: NameReference,
    pub archetype: PackageObjectIndex,
    pub object_flags: ObjectFlags,
    pub serial_size: u32,
    pub serial_offset: u32,
    pub export_flags: u32,
    pub net_object_count: u32,
    pub uuid: Uuid,
    /// Meaning unknown; preserved verbatim.
    pub unknown: u32,
    pub net_unknown: Vec<u32>,
}

impl Deserialize for ObjectExport {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let class = deserializer.deserialize().context("cannot read class")?;
        let super_class = deserializer
            .deserialize()
            .context("cannot read super class")?;
        let owner = deserializer.deserialize().context("cannot read owner")?;
        let name = deserializer.deserialize().context("cannot read name")?;
        let archetype = deserializer
            .deserialize()
            .context("cannot read archetype")?;
        let object_flags = deserializer
            .deserialize()
            .context("cannot read object flags")?;
        let serial_size = deserializer
            .deserialize()
            .context("cannot read serial size")?;
        let serial_offset = deserializer
            .deserialize()
            .context("cannot read serial offset")?;
        let export_flags = deserializer
            .deserialize()
            .context("cannot read export flags")?;
        // This count is data, but it also sizes the net_unknown array that
        // follows the uuid.
        let net_object_count: u32 = deserializer
            .deserialize()
            .context("cannot read net object count")?;
        let uuid = deserializer.deserialize().context("cannot read uuid")?;
        let unknown = deserializer
            .deserialize()
            .context("cannot read trailing unknown")?;
        let mut net_unknown = Vec::with_capacity(net_object_count as usize);
        for i in 0..net_object_count {
            net_unknown.push(
                deserializer
                    .deserialize()
                    .with_context(|| format!("cannot read net object entry {i}"))?,
            );
        }
        Ok(Self {
            class,
            super_class,
            owner,
            name,
            archetype,
            object_flags,
            serial_size,
            serial_offset,
            export_flags,
            net_object_count,
            uuid,
            unknown,
            net_unknown,
        })
    }
}

impl Summary {
    pub fn read_export_table(
        &self,
        deserializer: &mut Deserializer<impl Read + Seek>,
    ) -> Result<Vec<ObjectExport>, Error> {
        debug!(
            "Reading export table ({} exports at {:08x})",
            self.export_count, self.export_offset
        );
        deserializer.detour(self.export_offset as u64, |deserializer| {
            let mut exports = Vec::with_capacity(self.export_count as usize);
            for i in 0..self.export_count {
                exports.push(
                    deserializer
                        .deserialize()
                        .with_context(|| format!("cannot deserialize export {i}"))?,
                );
            }
            Ok(exports)
        })
    }
}
