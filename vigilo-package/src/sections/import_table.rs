use std::io::{Read, Seek};

use tracing::debug;
use vigilo_core::{
    binary::{Deserializer, Error, ResultContextExt},
    deserialize_structure,
};

use crate::{index::PackageObjectIndex, name::NameReference};

use super::Summary;

/// An object defined in another package. The 1-based position in the import
/// table is the negative-index addressing space for object references.
#[derive(Debug, Clone)]
pub struct ObjectImport {
    pub package_name: NameReference,
    pub class_name: NameReference,
    pub owner: PackageObjectIndex,
    pub name: NameReference,
}

deserialize_structure! {
    type ObjectImport {
        package_name,
        class_name,
        owner,
        name,
    }
}

impl Summary {
    pub fn read_import_table(
        &self,
        deserializer: &mut Deserializer<impl Read + Seek>,
    ) -> Result<Vec<ObjectImport>, Error> {
        debug!(
            "Reading import table ({} imports at {:08x})",
            self.import_count, self.import_offset
        );
        deserializer.detour(self.import_offset as u64, |deserializer| {
            let mut imports = Vec::with_capacity(self.import_count as usize);
            for i in 0..self.import_count {
                imports.push(
                    deserializer
                        .deserialize()
                        .with_context(|| format!("cannot deserialize import {i}"))?,
                );
            }
            Ok(imports)
        })
    }
}
