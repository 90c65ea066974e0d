use std::{fmt, io::Read};

use vigilo_core::{
    binary::{Deserialize, Deserializer, Error, ErrorKind, ResultContextExt},
    deserialize_bitflags,
    string::UnrealString,
};

use crate::PACKAGE_MAGIC;

/// The fixed part of the package header: identification fields followed by
/// the name/export/import table counts and absolute offsets, in the order
/// they appear on disk.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub signature: u32,
    pub file_version: u16,
    pub licensee_version: u16,
    pub header_size: u32,
    pub package_group: UnrealString,
    pub package_flags: PackageFlags,

    pub name_count: u32,
    pub name_offset: u32,
    pub export_count: u32,
    pub export_offset: u32,
    pub import_count: u32,
    pub import_offset: u32,
}

impl Deserialize for Summary {
    fn deserialize(deserializer: &mut Deserializer<impl Read>) -> Result<Self, Error> {
        let signature = deserializer
            .deserialize::<u32>()
            .context("cannot read package signature")?;
        if signature != PACKAGE_MAGIC {
            return Err(ErrorKind::InvalidSignature.make(format!(
                "expected package signature {PACKAGE_MAGIC:08x}, got {signature:08x}"
            )));
        }
        Ok(Self {
            signature,
            file_version: deserializer
                .deserialize()
                .context("cannot read file version")?,
            licensee_version: deserializer
                .deserialize()
                .context("cannot read licensee version")?,
            header_size: deserializer
                .deserialize()
                .context("cannot read header size")?,
            package_group: deserializer
                .deserialize()
                .context("cannot read package group")?,
            package_flags: deserializer
                .deserialize()
                .context("cannot read package flags")?,
            name_count: deserializer.deserialize().context("cannot read name count")?,
            name_offset: deserializer
                .deserialize()
                .context("cannot read name table offset")?,
            export_count: deserializer
                .deserialize()
                .context("cannot read export count")?,
            export_offset: deserializer
                .deserialize()
                .context("cannot read export table offset")?,
            import_count: deserializer
                .deserialize()
                .context("cannot read import count")?,
            import_offset: deserializer
                .deserialize()
                .context("cannot read import table offset")?,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version={}/{}, Group={}, Flags={:?}",
            self.file_version, self.licensee_version, self.package_group, self.package_flags
        )
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PackageFlags: u32 {
        const ALLOW_DOWNLOAD   = 0x00000001;
        const CLIENT_OPTIONAL  = 0x00000002;
        const SERVER_SIDE_ONLY = 0x00000004;
        const COOKED           = 0x00000008;
        const INSECURE         = 0x00000010;
        const ENCRYPTED        = 0x00000020;
        const REQUIRED         = 0x00008000;
        const MAP              = 0x00020000;
        const SCRIPT           = 0x00200000;
        const DEBUG            = 0x00400000;
        const IMPORTS          = 0x00800000;
        const COMPRESSED       = 0x02000000;
        const FULLY_COMPRESSED = 0x04000000;
        const NO_EXPORTS_DATA  = 0x20000000;
        const STRIPPED         = 0x40000000;
        const PROTECTED        = 0x80000000;
    }
}

deserialize_bitflags!(PackageFlags);

impl Summary {
    pub fn is_debug(&self) -> bool {
        self.package_flags.contains(PackageFlags::DEBUG)
    }

    pub fn is_map(&self) -> bool {
        self.package_flags.contains(PackageFlags::MAP)
    }
}
