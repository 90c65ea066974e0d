use std::io::{Read, Seek};

use tracing::debug;
use vigilo_core::binary::{Deserializer, Error, ErrorKind, ResultContextExt};

use crate::{
    index::PackageObjectIndex,
    name::NameReference,
    sections::{NameTableEntry, ObjectExport, ObjectImport, Summary},
};

/// A fully loaded package header: the summary plus the three tables, with
/// every cross-reference checked against the table bounds.
#[derive(Debug, Clone)]
pub struct PackageHeader {
    pub summary: Summary,
    pub names: Vec<NameTableEntry>,
    pub exports: Vec<ObjectExport>,
    pub imports: Vec<ObjectImport>,
}

/// A resolved object reference: either side of the export/import split.
#[derive(Debug, Clone, Copy)]
pub enum Referenceable<'a> {
    Export(&'a ObjectExport),
    Import(&'a ObjectImport),
}

impl PackageHeader {
    /// Reads and links a package header. The tables live at absolute offsets
    /// recorded in the summary and are read via detours; references may
    /// point forward, so linking only happens once all tables are in
    /// memory. Any failure aborts the whole read.
    pub fn read(deserializer: &mut Deserializer<impl Read + Seek>) -> Result<Self, Error> {
        let summary = deserializer
            .deserialize::<Summary>()
            .context("cannot read package summary")?;
        debug!(%summary, "Read package summary");
        let names = summary
            .read_name_table(deserializer)
            .context("cannot read name table")?;
        let exports = summary
            .read_export_table(deserializer)
            .context("cannot read export table")?;
        let imports = summary
            .read_import_table(deserializer)
            .context("cannot read import table")?;
        let header = Self {
            summary,
            names,
            exports,
            imports,
        };
        header.link().context("cannot link object references")?;
        Ok(header)
    }

    /// The resolution pass. After this succeeds, every [`target`] and
    /// [`name_text`] lookup over the header's own references is total.
    ///
    /// [`target`]: Self::target
    /// [`name_text`]: Self::name_text
    fn link(&self) -> Result<(), Error> {
        for (i, export) in self.exports.iter().enumerate() {
            for (field, index) in [
                ("class", export.class),
                ("super class", export.super_class),
                ("owner", export.owner),
                ("archetype", export.archetype),
            ] {
                self.check_object_index(index)
                    .with_context(|| format!("export {i} has an invalid {field} reference"))?;
            }
            self.check_name_reference(export.name)
                .with_context(|| format!("export {i} has an invalid name"))?;
        }
        for (i, import) in self.imports.iter().enumerate() {
            self.check_object_index(import.owner)
                .with_context(|| format!("import {i} has an invalid owner reference"))?;
            for (field, name) in [
                ("package name", import.package_name),
                ("class name", import.class_name),
                ("name", import.name),
            ] {
                self.check_name_reference(name)
                    .with_context(|| format!("import {i} has an invalid {field}"))?;
            }
        }
        Ok(())
    }

    fn check_object_index(&self, index: PackageObjectIndex) -> Result<(), Error> {
        let in_range = match index {
            PackageObjectIndex::None => true,
            PackageObjectIndex::Export(n) => (n.get() as usize) <= self.exports.len(),
            PackageObjectIndex::Import(n) => (n.get() as usize) <= self.imports.len(),
        };
        if in_range {
            Ok(())
        } else {
            Err(ErrorKind::Deserialize.make(format!(
                "object reference {index:?} is out of range ({} exports, {} imports)",
                self.exports.len(),
                self.imports.len()
            )))
        }
    }

    fn check_name_reference(&self, name: NameReference) -> Result<(), Error> {
        if (name.index as usize) < self.names.len() {
            Ok(())
        } else {
            Err(ErrorKind::Deserialize.make(format!(
                "name reference {} is out of range ({} names)",
                name.index,
                self.names.len()
            )))
        }
    }

    /// Resolves an object reference to the record it addresses, or `None`
    /// for the null reference.
    pub fn target(&self, index: PackageObjectIndex) -> Option<Referenceable<'_>> {
        match index {
            PackageObjectIndex::None => None,
            PackageObjectIndex::Export(n) => self
                .exports
                .get(n.get() as usize - 1)
                .map(Referenceable::Export),
            PackageObjectIndex::Import(n) => self
                .imports
                .get(n.get() as usize - 1)
                .map(Referenceable::Import),
        }
    }

    /// Resolves a name reference to its display string, including the
    /// numeric suffix.
    pub fn name_text(&self, name: NameReference) -> Option<String> {
        self.names
            .get(name.index as usize)
            .map(|entry| name.apply_suffix(entry.name.as_str()))
    }

    /// The dotted display form of an object: its owner's display form,
    /// recursively, then its own name.
    pub fn object_path(&self, object: Referenceable<'_>) -> String {
        let (owner, name) = match object {
            Referenceable::Export(export) => (export.owner, export.name),
            Referenceable::Import(import) => (import.owner, import.name),
        };
        let text = self
            .name_text(name)
            .unwrap_or_else(|| format!("<invalid name {}>", name.index));
        match self.target(owner) {
            Some(owner_object) => format!("{}.{text}", self.object_path(owner_object)),
            None => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PACKAGE_MAGIC;
    use vigilo_core::binary::Deserializer;

    #[derive(Default)]
    struct Buf(Vec<u8>);

    impl Buf {
        fn u16(&mut self, value: u16) -> &mut Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn u32(&mut self, value: u32) -> &mut Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn i32(&mut self, value: i32) -> &mut Self {
            self.0.extend_from_slice(&value.to_le_bytes());
            self
        }

        fn string(&mut self, text: &str) -> &mut Self {
            self.u32(text.len() as u32 + 1);
            self.0.extend_from_slice(text.as_bytes());
            self.0.push(0);
            self
        }

        fn flags64(&mut self, high: u32, low: u32) -> &mut Self {
            self.u32(high).u32(low)
        }
    }

    struct TestExport {
        class: i32,
        owner: i32,
        name: (u32, u32),
    }

    struct TestImport {
        owner: i32,
        name: (u32, u32),
    }

    const SUMMARY_LEN: u32 = 49; // with package group "None"

    fn build_package(
        names: &[&str],
        exports: &[TestExport],
        imports: &[TestImport],
    ) -> Vec<u8> {
        let mut name_table = Buf::default();
        for name in names {
            name_table.string(name).flags64(0x0007_0010, 0);
        }
        let mut export_table = Buf::default();
        for export in exports {
            export_table
                .i32(export.class)
                .i32(0) // super class
                .i32(export.owner)
                .u32(export.name.0)
                .u32(export.name.1)
                .i32(0) // archetype
                .flags64(0x0000_0004, 0x0000_0200)
                .u32(64) // serial size
                .u32(0x400) // serial offset
                .u32(0) // export flags
                .u32(0); // net object count
            export_table.0.extend_from_slice(&[0; 16]); // uuid
            export_table.u32(0); // unknown
        }
        let mut import_table = Buf::default();
        for import in imports {
            import_table
                .u32(0)
                .u32(0) // package name
                .u32(0)
                .u32(0) // class name
                .i32(import.owner)
                .u32(import.name.0)
                .u32(import.name.1);
        }

        let name_offset = SUMMARY_LEN;
        let export_offset = name_offset + name_table.0.len() as u32;
        let import_offset = export_offset + export_table.0.len() as u32;

        let mut package = Buf::default();
        package.u32(PACKAGE_MAGIC).u16(843).u16(93).u32(import_offset);
        package.string("None");
        package.u32(0x0008); // COOKED
        package.u32(names.len() as u32).u32(name_offset);
        package.u32(exports.len() as u32).u32(export_offset);
        package.u32(imports.len() as u32).u32(import_offset);
        assert_eq!(package.0.len() as u32, SUMMARY_LEN);

        package.0.extend_from_slice(&name_table.0);
        package.0.extend_from_slice(&export_table.0);
        package.0.extend_from_slice(&import_table.0);
        package.0
    }

    fn read(buffer: &[u8]) -> Result<PackageHeader, Error> {
        PackageHeader::read(&mut Deserializer::from_buffer(buffer))
    }

    #[test]
    fn minimal_package_reads_and_links() {
        let buffer = build_package(
            &["Rocket"],
            &[TestExport {
                class: 0,
                owner: 0,
                name: (0, 0),
            }],
            &[],
        );
        let header = read(&buffer).unwrap();

        assert_eq!(header.summary.signature, PACKAGE_MAGIC);
        assert_eq!(header.summary.file_version, 843);
        assert_eq!(header.summary.licensee_version, 93);
        assert_eq!(header.summary.header_size, header.summary.import_offset);
        assert_eq!(header.summary.package_group.as_str(), "None");
        assert_eq!(
            header.summary.package_flags,
            crate::sections::PackageFlags::COOKED
        );
        assert_eq!(header.exports.len(), 1);
        assert!(header.imports.is_empty());

        // Owner resolves to none, so the display form is the bare name.
        let export = Referenceable::Export(&header.exports[0]);
        assert_eq!(header.object_path(export), "Rocket");
        assert!(header.target(header.exports[0].owner).is_none());
    }

    #[test]
    fn owner_chains_render_dotted_paths() {
        let buffer = build_package(
            &["Rocket", "Bar"],
            &[
                TestExport {
                    class: 0,
                    owner: 0,
                    name: (0, 0),
                },
                TestExport {
                    class: -1,
                    owner: 1,
                    name: (1, 0),
                },
            ],
            &[TestImport {
                owner: 0,
                name: (0, 0),
            }],
        );
        let header = read(&buffer).unwrap();

        let child = Referenceable::Export(&header.exports[1]);
        assert_eq!(header.object_path(child), "Rocket.Bar");

        // A positive reference resolves into the export table, a negative
        // one into the import table.
        match header.target(header.exports[1].owner).unwrap() {
            Referenceable::Export(export) => {
                assert!(std::ptr::eq(export, &header.exports[0]));
            }
            Referenceable::Import(_) => panic!("owner should resolve to an export"),
        }
        match header.target(header.exports[1].class).unwrap() {
            Referenceable::Import(import) => {
                assert!(std::ptr::eq(import, &header.imports[0]));
            }
            Referenceable::Export(_) => panic!("class should resolve to an import"),
        }
    }

    #[test]
    fn name_suffixes_render_as_n_minus_one() {
        let buffer = build_package(
            &["Foo", "Bar"],
            &[TestExport {
                class: 0,
                owner: 0,
                name: (1, 3),
            }],
            &[],
        );
        let header = read(&buffer).unwrap();
        assert_eq!(header.name_text(header.exports[0].name).unwrap(), "Bar_2");
        assert_eq!(
            header
                .name_text(NameReference {
                    index: 1,
                    suffix: 0
                })
                .unwrap(),
            "Bar"
        );
    }

    #[test]
    fn flipped_signature_fails_without_panicking() {
        let mut buffer = build_package(&["Rocket"], &[], &[]);
        buffer[..4].copy_from_slice(&0xDEADBEEFu32.to_le_bytes());
        let error = read(&buffer).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidSignature);
    }

    #[test]
    fn out_of_range_reference_aborts_the_read() {
        let buffer = build_package(
            &["Rocket"],
            &[TestExport {
                class: 0,
                owner: 5,
                name: (0, 0),
            }],
            &[],
        );
        let error = read(&buffer).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Deserialize);
        assert!(error.to_string().contains("out of range"));
    }

    #[test]
    fn net_object_count_sizes_the_trailing_array() {
        let mut export = Buf::default();
        export
            .i32(0)
            .i32(0)
            .i32(0)
            .u32(0)
            .u32(0)
            .i32(0)
            .flags64(0, 0)
            .u32(0)
            .u32(0)
            .u32(0)
            .u32(2); // net object count
        export.0.extend_from_slice(&[0; 16]);
        export.u32(7).u32(0xAA).u32(0xBB);

        let export = vigilo_core::binary::deserialize::<ObjectExport>(&export.0).unwrap();
        assert_eq!(export.net_object_count, 2);
        assert_eq!(export.unknown, 7);
        assert_eq!(export.net_unknown, vec![0xAA, 0xBB]);
    }
}
