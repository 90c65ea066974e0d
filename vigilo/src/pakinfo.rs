use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use clap::Subcommand;
use tracing::{debug, info};
use vigilo_core::binary::Deserializer;
use vigilo_package::{PackageHeader, Referenceable};

#[derive(Clone, Copy, Subcommand)]
pub enum PackageInfoPart {
    /// Dump the package summary (version, group, flags, table layout).
    Summary,

    /// Dump the global name table.
    Names,
    /// Dump the object export table.
    Exports,
    /// Dump the object import table.
    Imports,
}

pub fn package_info(filename: &Path, what: PackageInfoPart) -> anyhow::Result<()> {
    info!(?filename, "Opening package");
    let reader = BufReader::new(File::open(filename)?);
    let mut deserializer = Deserializer::new(reader)?;

    debug!("Reading header");
    let header = PackageHeader::read(&mut deserializer).context("cannot read package header")?;

    match what {
        PackageInfoPart::Summary => {
            println!("{}", header.summary);
            println!("{:#?}", header.summary);
        }
        PackageInfoPart::Names => {
            for (i, entry) in header.names.iter().enumerate() {
                println!("{i:6} {:?} (0x{:016x})", entry.name, entry.flags.bits());
            }
        }
        PackageInfoPart::Exports => {
            for (i, export) in header.exports.iter().enumerate() {
                let class = header
                    .target(export.class)
                    .map(|class| header.object_path(class))
                    .unwrap_or_else(|| "Class".to_owned());
                println!(
                    "{:6} {} ({class}, {} bytes at {:08x})",
                    i + 1,
                    header.object_path(Referenceable::Export(export)),
                    export.serial_size,
                    export.serial_offset,
                );
            }
        }
        PackageInfoPart::Imports => {
            for (i, import) in header.imports.iter().enumerate() {
                println!(
                    "{:6} {} ({} from {})",
                    -((i + 1) as i64),
                    header.object_path(Referenceable::Import(import)),
                    header.name_text(import.class_name).unwrap_or_default(),
                    header.name_text(import.package_name).unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}
