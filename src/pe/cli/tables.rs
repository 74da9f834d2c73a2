//! The `#~` tables stream.
//!
//! The stream header fixes the decode geometry for every row that follows:
//! `heap_sizes` picks 2- or 4-byte heap indices, and the row counts decide
//! the width of simple and coded table indices. Widths are computed once and
//! reused across every row of every table.

use std::collections::BTreeMap;

use log::debug;
use scroll::Pread;

use super::index::CodedIndex;
use super::rows::*;
use crate::error::{self, Error};

/// `heap_sizes` bit: `#Strings` indices are 4 bytes
pub const HEAP_SIZES_WIDE_STRINGS: u8 = 0x01;
/// `heap_sizes` bit: `#GUID` indices are 4 bytes
pub const HEAP_SIZES_WIDE_GUID: u8 = 0x02;
/// `heap_sizes` bit: `#Blob` indices are 4 bytes
pub const HEAP_SIZES_WIDE_BLOB: u8 = 0x04;

/// A simple table index is 4 bytes once the table has more rows than this.
const WIDE_INDEX_THRESHOLD: u32 = 0xffff;

/// The fixed 24-byte header of the `#~` stream.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct TablesHeader {
    pub reserved0: u32,
    pub major_version: u8,
    pub minor_version: u8,
    /// Heap-index width bits, see the `HEAP_SIZES_*` constants
    pub heap_sizes: u8,
    pub reserved1: u8,
    /// Bitmask of the tables present in the stream
    pub valid_tables: u64,
    /// Bitmask of the tables that are sorted
    pub sorted_tables: u64,
}

pub const SIZEOF_TABLES_HEADER: usize = 24;

/// Decode geometry shared by every row decoder: heap widths and the row
/// count of each of the 64 possible tables.
#[derive(Debug, Clone)]
pub(crate) struct RowCtx {
    /// File position of the stream, for error offsets
    base: usize,
    wide_strings: bool,
    wide_guid: bool,
    wide_blob: bool,
    row_counts: [u32; 64],
}

impl RowCtx {
    fn new(header: &TablesHeader, base: usize) -> Self {
        RowCtx {
            base,
            wide_strings: header.heap_sizes & HEAP_SIZES_WIDE_STRINGS != 0,
            wide_guid: header.heap_sizes & HEAP_SIZES_WIDE_GUID != 0,
            wide_blob: header.heap_sizes & HEAP_SIZES_WIDE_BLOB != 0,
            row_counts: [0; 64],
        }
    }

    pub(crate) fn row_count(&self, id: TableId) -> u32 {
        self.row_counts[id as usize]
    }

    pub(crate) fn u8(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u8> {
        bytes
            .gread(offset)
            .map_err(Error::truncated_at(self.base + *offset))
    }

    pub(crate) fn u16(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u16> {
        bytes
            .gread_with(offset, scroll::LE)
            .map_err(Error::truncated_at(self.base + *offset))
    }

    pub(crate) fn u32(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
        bytes
            .gread_with(offset, scroll::LE)
            .map_err(Error::truncated_at(self.base + *offset))
    }

    fn read_index(&self, wide: bool, bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
        if wide {
            self.u32(bytes, offset)
        } else {
            Ok(self.u16(bytes, offset)? as u32)
        }
    }

    pub(crate) fn strings_index(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
        self.read_index(self.wide_strings, bytes, offset)
    }

    pub(crate) fn guid_index(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
        self.read_index(self.wide_guid, bytes, offset)
    }

    pub(crate) fn blob_index(&self, bytes: &[u8], offset: &mut usize) -> error::Result<u32> {
        self.read_index(self.wide_blob, bytes, offset)
    }

    fn table_index_wide(&self, id: TableId) -> bool {
        self.row_count(id) > WIDE_INDEX_THRESHOLD
    }

    /// A coded index of a family with a k-bit tag goes wide once any
    /// candidate table has more rows than fit in the remaining 16 - k bits.
    fn coded_index_wide(&self, family: CodedIndex) -> bool {
        let threshold = 1u32 << (16 - family.tag_bits());
        family
            .candidates()
            .iter()
            .flatten()
            .any(|&id| self.row_count(id) > threshold)
    }

    pub(crate) fn table_index(
        &self,
        id: TableId,
        bytes: &[u8],
        offset: &mut usize,
    ) -> error::Result<u32> {
        self.read_index(self.table_index_wide(id), bytes, offset)
    }

    pub(crate) fn coded_index(
        &self,
        family: CodedIndex,
        bytes: &[u8],
        offset: &mut usize,
    ) -> error::Result<u32> {
        self.read_index(self.coded_index_wide(family), bytes, offset)
    }
}

/// The decoded tables stream.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct CliTables {
    pub header: TablesHeader,
    /// The tables named by `valid_tables`, in ascending bit order
    pub valid_table_ids: Vec<TableId>,
    /// Row counts, parallel to `valid_table_ids`
    pub row_counts: Vec<u32>,
    tables: BTreeMap<TableId, Rows>,
}

macro_rules! typed_rows {
    ($($fn_name:ident => $variant:ident($row:ty);)*) => {
        $(
            /// Typed row slice, when the table is present.
            #[inline]
            pub fn $fn_name(&self) -> Option<&[$row]> {
                match self.tables.get(&TableId::$variant) {
                    Some(Rows::$variant(rows)) => Some(rows),
                    _ => None,
                }
            }
        )*
    };
}

impl CliTables {
    /// Decodes a whole `#~` stream; `base` is its file position, used only
    /// for error offsets.
    pub fn parse(bytes: &[u8], base: usize) -> error::Result<Self> {
        let offset = &mut 0;
        let header = TablesHeader {
            reserved0: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(base))?,
            major_version: bytes.gread(offset).map_err(Error::truncated_at(base + *offset))?,
            minor_version: bytes.gread(offset).map_err(Error::truncated_at(base + *offset))?,
            heap_sizes: bytes.gread(offset).map_err(Error::truncated_at(base + *offset))?,
            reserved1: bytes.gread(offset).map_err(Error::truncated_at(base + *offset))?,
            valid_tables: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(base + *offset))?,
            sorted_tables: bytes.gread_with(offset, scroll::LE).map_err(Error::truncated_at(base + *offset))?,
        };
        debug!(
            "tables stream v{}.{} heap_sizes {:#x} valid {:#018x}",
            header.major_version, header.minor_version, header.heap_sizes, header.valid_tables
        );

        // an unknown bit is fatal: rows of unknown shape have unknown sizes,
        // so no later table could be located either
        let mut valid_table_ids = Vec::new();
        for bit in 0..64u8 {
            if header.valid_tables & (1u64 << bit) != 0 {
                let id = TableId::from_u8(bit)
                    .ok_or(Error::UnknownTable { offset: base + 8, table: bit })?;
                valid_table_ids.push(id);
            }
        }

        let mut ctx = RowCtx::new(&header, base);
        let mut row_counts = Vec::with_capacity(valid_table_ids.len());
        for &id in &valid_table_ids {
            let count = bytes
                .gread_with::<u32>(offset, scroll::LE)
                .map_err(Error::truncated_at(base + *offset))?;
            ctx.row_counts[id as usize] = count;
            row_counts.push(count);
        }

        let mut tables = BTreeMap::new();
        for (&id, &count) in valid_table_ids.iter().zip(row_counts.iter()) {
            let rows = Self::parse_rows(id, count, bytes, offset, &ctx)?;
            tables.insert(id, rows);
        }

        Ok(CliTables { header, valid_table_ids, row_counts, tables })
    }

    fn parse_rows(
        id: TableId,
        count: u32,
        bytes: &[u8],
        offset: &mut usize,
        ctx: &RowCtx,
    ) -> error::Result<Rows> {
        macro_rules! rows {
            ($variant:ident, $row:ty) => {{
                let mut rows = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    rows.push(<$row>::parse(bytes, offset, ctx)?);
                }
                Rows::$variant(rows)
            }};
        }
        Ok(match id {
            TableId::Module => rows!(Module, ModuleRow),
            TableId::TypeRef => rows!(TypeRef, TypeRefRow),
            TableId::TypeDef => rows!(TypeDef, TypeDefRow),
            TableId::Field => rows!(Field, FieldRow),
            TableId::MethodDef => rows!(MethodDef, MethodDefRow),
            TableId::Param => rows!(Param, ParamRow),
            TableId::InterfaceImpl => rows!(InterfaceImpl, InterfaceImplRow),
            TableId::MemberRef => rows!(MemberRef, MemberRefRow),
            TableId::Constant => rows!(Constant, ConstantRow),
            TableId::CustomAttribute => rows!(CustomAttribute, CustomAttributeRow),
            TableId::FieldMarshal => rows!(FieldMarshal, FieldMarshalRow),
            TableId::DeclSecurity => rows!(DeclSecurity, DeclSecurityRow),
            TableId::ClassLayout => rows!(ClassLayout, ClassLayoutRow),
            TableId::FieldLayout => rows!(FieldLayout, FieldLayoutRow),
            TableId::StandAloneSig => rows!(StandAloneSig, StandAloneSigRow),
            TableId::EventMap => rows!(EventMap, EventMapRow),
            TableId::Event => rows!(Event, EventRow),
            TableId::PropertyMap => rows!(PropertyMap, PropertyMapRow),
            TableId::Property => rows!(Property, PropertyRow),
            TableId::MethodSemantics => rows!(MethodSemantics, MethodSemanticsRow),
            TableId::MethodImpl => rows!(MethodImpl, MethodImplRow),
            TableId::ModuleRef => rows!(ModuleRef, ModuleRefRow),
            TableId::TypeSpec => rows!(TypeSpec, TypeSpecRow),
            TableId::ImplMap => rows!(ImplMap, ImplMapRow),
            TableId::FieldRva => rows!(FieldRva, FieldRvaRow),
            TableId::Assembly => rows!(Assembly, AssemblyRow),
            TableId::AssemblyProcessor => rows!(AssemblyProcessor, AssemblyProcessorRow),
            TableId::AssemblyOs => rows!(AssemblyOs, AssemblyOsRow),
            TableId::AssemblyRef => rows!(AssemblyRef, AssemblyRefRow),
            TableId::AssemblyRefProcessor => {
                rows!(AssemblyRefProcessor, AssemblyRefProcessorRow)
            }
            TableId::AssemblyRefOs => rows!(AssemblyRefOs, AssemblyRefOsRow),
            TableId::File => rows!(File, FileRow),
            TableId::ExportedType => rows!(ExportedType, ExportedTypeRow),
            TableId::ManifestResource => rows!(ManifestResource, ManifestResourceRow),
            TableId::NestedClass => rows!(NestedClass, NestedClassRow),
            TableId::GenericParam => rows!(GenericParam, GenericParamRow),
            TableId::MethodSpec => rows!(MethodSpec, MethodSpecRow),
            TableId::GenericParamConstraint => {
                rows!(GenericParamConstraint, GenericParamConstraintRow)
            }
        })
    }

    /// The rows of `id`, when present.
    pub fn rows(&self, id: TableId) -> Option<&Rows> {
        self.tables.get(&id)
    }

    /// Declared row count of `id`; zero when the table is absent.
    pub fn row_count(&self, id: TableId) -> u32 {
        self.valid_table_ids
            .iter()
            .position(|&t| t == id)
            .map(|i| self.row_counts[i])
            .unwrap_or(0)
    }

    typed_rows! {
        modules => Module(ModuleRow);
        type_refs => TypeRef(TypeRefRow);
        type_defs => TypeDef(TypeDefRow);
        fields => Field(FieldRow);
        method_defs => MethodDef(MethodDefRow);
        params => Param(ParamRow);
        interface_impls => InterfaceImpl(InterfaceImplRow);
        member_refs => MemberRef(MemberRefRow);
        constants => Constant(ConstantRow);
        custom_attributes => CustomAttribute(CustomAttributeRow);
        field_marshals => FieldMarshal(FieldMarshalRow);
        decl_securities => DeclSecurity(DeclSecurityRow);
        class_layouts => ClassLayout(ClassLayoutRow);
        field_layouts => FieldLayout(FieldLayoutRow);
        stand_alone_sigs => StandAloneSig(StandAloneSigRow);
        event_maps => EventMap(EventMapRow);
        events => Event(EventRow);
        property_maps => PropertyMap(PropertyMapRow);
        properties => Property(PropertyRow);
        method_semantics => MethodSemantics(MethodSemanticsRow);
        method_impls => MethodImpl(MethodImplRow);
        module_refs => ModuleRef(ModuleRefRow);
        type_specs => TypeSpec(TypeSpecRow);
        impl_maps => ImplMap(ImplMapRow);
        field_rvas => FieldRva(FieldRvaRow);
        assemblies => Assembly(AssemblyRow);
        assembly_processors => AssemblyProcessor(AssemblyProcessorRow);
        assembly_oses => AssemblyOs(AssemblyOsRow);
        assembly_refs => AssemblyRef(AssemblyRefRow);
        assembly_ref_processors => AssemblyRefProcessor(AssemblyRefProcessorRow);
        assembly_ref_oses => AssemblyRefOs(AssemblyRefOsRow);
        files => File(FileRow);
        exported_types => ExportedType(ExportedTypeRow);
        manifest_resources => ManifestResource(ManifestResourceRow);
        nested_classes => NestedClass(NestedClassRow);
        generic_params => GenericParam(GenericParamRow);
        method_specs => MethodSpec(MethodSpecRow);
        generic_param_constraints => GenericParamConstraint(GenericParamConstraintRow);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream_header(heap_sizes: u8, valid: u64, counts: &[u32]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.push(2); // major_version
        bytes.push(0); // minor_version
        bytes.push(heap_sizes);
        bytes.push(1); // reserved1
        bytes.extend_from_slice(&valid.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        for count in counts {
            bytes.extend_from_slice(&count.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn empty_valid_mask_decodes_to_no_tables() {
        let bytes = stream_header(0, 0, &[]);
        let tables = CliTables::parse(&bytes, 0).unwrap();
        assert!(tables.valid_table_ids.is_empty());
        assert!(tables.row_counts.is_empty());
        assert!(tables.modules().is_none());
        assert_eq!(tables.row_count(TableId::Module), 0);
    }

    #[test]
    fn unknown_valid_bit_is_fatal() {
        let bytes = stream_header(0, 1 << 0x3f, &[1]);
        assert_eq!(
            CliTables::parse(&bytes, 0x100),
            Err(Error::UnknownTable { offset: 0x108, table: 0x3f })
        );
    }

    #[test]
    fn method_def_row_is_sixteen_bytes_with_wide_strings() {
        // heap_sizes 0x01: wide #Strings, narrow #Blob; all row counts small,
        // so param_list stays narrow: 4 + 2 + 2 + 4 + 2 + 2 = 16 bytes
        let mut bytes = stream_header(HEAP_SIZES_WIDE_STRINGS, 1 << 0x06, &[1]);
        bytes.extend_from_slice(&0x2050u32.to_le_bytes()); // rva
        bytes.extend_from_slice(&3u16.to_le_bytes()); // impl_flags
        bytes.extend_from_slice(&0x86u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&0x0001_0002u32.to_le_bytes()); // name, wide
        bytes.extend_from_slice(&0x000au16.to_le_bytes()); // signature, narrow
        bytes.extend_from_slice(&1u16.to_le_bytes()); // param_list, narrow
        let expected_len = SIZEOF_TABLES_HEADER + 4 + 16;
        assert_eq!(bytes.len(), expected_len);
        let tables = CliTables::parse(&bytes, 0).unwrap();
        let methods = tables.method_defs().unwrap();
        assert_eq!(
            methods,
            &[MethodDefRow {
                rva: 0x2050,
                impl_flags: 3,
                flags: 0x86,
                name: 0x0001_0002,
                signature: 0x000a,
                param_list: 1,
            }]
        );
    }

    #[test]
    fn large_table_widens_simple_indices() {
        // 0x10000 Param rows force MethodDef::param_list to 4 bytes
        let mut bytes =
            stream_header(0, (1 << 0x06) | (1 << 0x08), &[1, 0x0001_0000]);
        bytes.extend_from_slice(&0u32.to_le_bytes()); // rva
        bytes.extend_from_slice(&0u16.to_le_bytes()); // impl_flags
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&1u16.to_le_bytes()); // name, narrow
        bytes.extend_from_slice(&2u16.to_le_bytes()); // signature, narrow
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes()); // param_list, wide
        bytes.extend(std::iter::repeat(0u8).take(0x10000 * 6)); // Param rows
        let tables = CliTables::parse(&bytes, 0).unwrap();
        assert_eq!(tables.method_defs().unwrap()[0].param_list, 0x0001_0000);
        assert_eq!(tables.params().unwrap().len(), 0x10000);
    }

    #[test]
    fn coded_index_width_uses_tag_adjusted_threshold() {
        // HasConstant has a 2-bit tag, so 0x4001 Property rows (> 2^14)
        // widen Constant::parent even though a simple Property index would
        // still be narrow
        let valid = (1u64 << 0x0b) | (1 << 0x17);
        let mut bytes = stream_header(0, valid, &[1, 0x4001]);
        bytes.push(0x08); // type_ (ELEMENT_TYPE_I4)
        bytes.push(0);
        bytes.extend_from_slice(&0x0001_0002u32.to_le_bytes()); // parent, wide
        bytes.extend_from_slice(&5u16.to_le_bytes()); // value
        bytes.extend(std::iter::repeat(0u8).take(0x4001 * 6)); // Property rows
        let tables = CliTables::parse(&bytes, 0).unwrap();
        let constant = &tables.constants().unwrap()[0];
        assert_eq!(constant.parent, 0x0001_0002);
        assert_eq!(constant.value, 5);
    }

    #[test]
    fn truncated_rows_report_stream_offset() {
        let mut bytes = stream_header(0, 1 << 0x00, &[1]);
        bytes.extend_from_slice(&0u16.to_le_bytes()); // generation only
        let base = 0x400;
        match CliTables::parse(&bytes, base) {
            Err(Error::Truncated { offset }) => {
                assert_eq!(offset, base + SIZEOF_TABLES_HEADER + 4 + 2)
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }
}
