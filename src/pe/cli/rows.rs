//! Typed rows for the metadata tables.
//!
//! Every index column is held raw: heap indices are offsets into their heap,
//! table indices are 1-based rows, and coded indices still carry their tag
//! in the low bits (resolve them with
//! [`CodedIndex::decode`](super::index::CodedIndex::decode)).

use super::index::CodedIndex;
use super::tables::RowCtx;
use crate::error;

/// Id of a metadata table, as numbered by the `valid_tables` bitmask.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
#[repr(u8)]
pub enum TableId {
    Module = 0x00,
    TypeRef = 0x01,
    TypeDef = 0x02,
    Field = 0x04,
    MethodDef = 0x06,
    Param = 0x08,
    InterfaceImpl = 0x09,
    MemberRef = 0x0a,
    Constant = 0x0b,
    CustomAttribute = 0x0c,
    FieldMarshal = 0x0d,
    DeclSecurity = 0x0e,
    ClassLayout = 0x0f,
    FieldLayout = 0x10,
    StandAloneSig = 0x11,
    EventMap = 0x12,
    Event = 0x14,
    PropertyMap = 0x15,
    Property = 0x17,
    MethodSemantics = 0x18,
    MethodImpl = 0x19,
    ModuleRef = 0x1a,
    TypeSpec = 0x1b,
    ImplMap = 0x1c,
    FieldRva = 0x1d,
    Assembly = 0x20,
    AssemblyProcessor = 0x21,
    AssemblyOs = 0x22,
    AssemblyRef = 0x23,
    AssemblyRefProcessor = 0x24,
    AssemblyRefOs = 0x25,
    File = 0x26,
    ExportedType = 0x27,
    ManifestResource = 0x28,
    NestedClass = 0x29,
    GenericParam = 0x2a,
    MethodSpec = 0x2b,
    GenericParamConstraint = 0x2c,
}

impl TableId {
    /// All known table ids, in ascending numeric order.
    pub const ALL: [TableId; 38] = [
        TableId::Module,
        TableId::TypeRef,
        TableId::TypeDef,
        TableId::Field,
        TableId::MethodDef,
        TableId::Param,
        TableId::InterfaceImpl,
        TableId::MemberRef,
        TableId::Constant,
        TableId::CustomAttribute,
        TableId::FieldMarshal,
        TableId::DeclSecurity,
        TableId::ClassLayout,
        TableId::FieldLayout,
        TableId::StandAloneSig,
        TableId::EventMap,
        TableId::Event,
        TableId::PropertyMap,
        TableId::Property,
        TableId::MethodSemantics,
        TableId::MethodImpl,
        TableId::ModuleRef,
        TableId::TypeSpec,
        TableId::ImplMap,
        TableId::FieldRva,
        TableId::Assembly,
        TableId::AssemblyProcessor,
        TableId::AssemblyOs,
        TableId::AssemblyRef,
        TableId::AssemblyRefProcessor,
        TableId::AssemblyRefOs,
        TableId::File,
        TableId::ExportedType,
        TableId::ManifestResource,
        TableId::NestedClass,
        TableId::GenericParam,
        TableId::MethodSpec,
        TableId::GenericParamConstraint,
    ];

    pub fn from_u8(id: u8) -> Option<TableId> {
        TableId::ALL.iter().copied().find(|&t| t as u8 == id)
    }
}

/// The Module table (0x00).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ModuleRow {
    /// Reserved, shall be 0
    pub generation: u16,
    pub name: u32,
    /// The module version identifier, a 1-based `#GUID` index
    pub mvid: u32,
    pub enc_id: u32,
    pub enc_base_id: u32,
}

/// The TypeRef table (0x01).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct TypeRefRow {
    /// `ResolutionScope` coded index
    pub resolution_scope: u32,
    pub type_name: u32,
    pub type_namespace: u32,
}

/// The TypeDef table (0x02).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct TypeDefRow {
    pub flags: u32,
    pub type_name: u32,
    pub type_namespace: u32,
    /// `TypeDefOrRef` coded index
    pub extends: u32,
    /// Start of this type's run in the Field table
    pub field_list: u32,
    /// Start of this type's run in the MethodDef table
    pub method_list: u32,
}

/// The Field table (0x04).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FieldRow {
    pub flags: u16,
    pub name: u32,
    pub signature: u32,
}

/// The MethodDef table (0x06).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MethodDefRow {
    pub rva: u32,
    pub impl_flags: u16,
    pub flags: u16,
    pub name: u32,
    pub signature: u32,
    /// Start of this method's run in the Param table
    pub param_list: u32,
}

/// The Param table (0x08).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ParamRow {
    pub flags: u16,
    pub sequence: u16,
    pub name: u32,
}

/// The InterfaceImpl table (0x09).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct InterfaceImplRow {
    pub class: u32,
    /// `TypeDefOrRef` coded index
    pub interface: u32,
}

/// The MemberRef table (0x0A).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MemberRefRow {
    /// `MemberRefParent` coded index
    pub class: u32,
    pub name: u32,
    pub signature: u32,
}

/// The Constant table (0x0B).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ConstantRow {
    /// Element type of the constant
    pub type_: u8,
    pub padding: u8,
    /// `HasConstant` coded index
    pub parent: u32,
    pub value: u32,
}

/// The CustomAttribute table (0x0C).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct CustomAttributeRow {
    /// `HasCustomAttribute` coded index
    pub parent: u32,
    /// `CustomAttributeType` coded index
    pub type_: u32,
    pub value: u32,
}

/// The FieldMarshal table (0x0D).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FieldMarshalRow {
    /// `HasFieldMarshal` coded index
    pub parent: u32,
    pub native_type: u32,
}

/// The DeclSecurity table (0x0E).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct DeclSecurityRow {
    pub action: u16,
    /// `HasDeclSecurity` coded index
    pub parent: u32,
    pub permission_set: u32,
}

/// The ClassLayout table (0x0F).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ClassLayoutRow {
    pub packing_size: u16,
    pub class_size: u32,
    pub parent: u32,
}

/// The FieldLayout table (0x10).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FieldLayoutRow {
    pub offset: u32,
    pub field: u32,
}

/// The StandAloneSig table (0x11).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct StandAloneSigRow {
    pub signature: u32,
}

/// The EventMap table (0x12).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct EventMapRow {
    pub parent: u32,
    pub event_list: u32,
}

/// The Event table (0x14).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct EventRow {
    pub event_flags: u16,
    pub name: u32,
    /// `TypeDefOrRef` coded index
    pub event_type: u32,
}

/// The PropertyMap table (0x15).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct PropertyMapRow {
    pub parent: u32,
    pub property_list: u32,
}

/// The Property table (0x17).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct PropertyRow {
    pub flags: u16,
    pub name: u32,
    pub type_: u32,
}

/// The MethodSemantics table (0x18).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MethodSemanticsRow {
    pub semantics: u16,
    pub method: u32,
    /// `HasSemantics` coded index
    pub association: u32,
}

/// The MethodImpl table (0x19).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MethodImplRow {
    pub class: u32,
    /// `MethodDefOrRef` coded index
    pub method_body: u32,
    /// `MethodDefOrRef` coded index
    pub method_declaration: u32,
}

/// The ModuleRef table (0x1A).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ModuleRefRow {
    pub name: u32,
}

/// The TypeSpec table (0x1B).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct TypeSpecRow {
    pub signature: u32,
}

/// The ImplMap table (0x1C).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ImplMapRow {
    pub mapping_flags: u16,
    /// `MemberForwarded` coded index
    pub member_forwarded: u32,
    pub import_name: u32,
    pub import_scope: u32,
}

/// The FieldRVA table (0x1D).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FieldRvaRow {
    pub rva: u32,
    pub field: u32,
}

/// The Assembly table (0x20).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyRow {
    pub hash_alg_id: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    pub flags: u32,
    pub public_key: u32,
    pub name: u32,
    pub culture: u32,
}

/// The AssemblyProcessor table (0x21); ignored by the CLI.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyProcessorRow {
    pub processor: u32,
}

/// The AssemblyOS table (0x22); ignored by the CLI.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyOsRow {
    pub os_platform_id: u32,
    pub os_major_version: u32,
    pub os_minor_version: u32,
}

/// The AssemblyRef table (0x23).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyRefRow {
    pub major_version: u16,
    pub minor_version: u16,
    pub build_number: u16,
    pub revision_number: u16,
    pub flags: u32,
    pub public_key_or_token: u32,
    pub name: u32,
    pub culture: u32,
    pub hash_value: u32,
}

/// The AssemblyRefProcessor table (0x24); ignored by the CLI.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyRefProcessorRow {
    pub processor: u32,
    pub assembly_ref: u32,
}

/// The AssemblyRefOS table (0x25); ignored by the CLI.
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct AssemblyRefOsRow {
    pub os_platform_id: u32,
    pub os_major_version: u32,
    pub os_minor_version: u32,
    pub assembly_ref: u32,
}

/// The File table (0x26).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct FileRow {
    pub flags: u32,
    pub name: u32,
    pub hash_value: u32,
}

/// The ExportedType table (0x27).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ExportedTypeRow {
    pub flags: u32,
    /// A TypeDef hint in another module; always 4 bytes
    pub typedef_id: u32,
    pub type_name: u32,
    pub type_namespace: u32,
    /// `Implementation` coded index
    pub implementation: u32,
}

/// The ManifestResource table (0x28).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct ManifestResourceRow {
    pub offset: u32,
    pub flags: u32,
    pub name: u32,
    /// `Implementation` coded index
    pub implementation: u32,
}

/// The NestedClass table (0x29).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct NestedClassRow {
    pub nested_class: u32,
    pub enclosing_class: u32,
}

/// The GenericParam table (0x2A).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct GenericParamRow {
    /// Index of the parameter, numbered left to right from zero
    pub number: u16,
    pub flags: u16,
    /// `TypeOrMethodDef` coded index
    pub owner: u32,
    pub name: u32,
}

/// The MethodSpec table (0x2B).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct MethodSpecRow {
    /// `MethodDefOrRef` coded index
    pub method: u32,
    pub instantiation: u32,
}

/// The GenericParamConstraint table (0x2C).
#[derive(Debug, PartialEq, Copy, Clone, Default)]
pub struct GenericParamConstraintRow {
    pub owner: u32,
    /// `TypeDefOrRef` coded index
    pub constraint: u32,
}

impl ModuleRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ModuleRow {
            generation: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            mvid: ctx.guid_index(bytes, offset)?,
            enc_id: ctx.guid_index(bytes, offset)?,
            enc_base_id: ctx.guid_index(bytes, offset)?,
        })
    }
}

impl TypeRefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(TypeRefRow {
            resolution_scope: ctx.coded_index(CodedIndex::ResolutionScope, bytes, offset)?,
            type_name: ctx.strings_index(bytes, offset)?,
            type_namespace: ctx.strings_index(bytes, offset)?,
        })
    }
}

impl TypeDefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(TypeDefRow {
            flags: ctx.u32(bytes, offset)?,
            type_name: ctx.strings_index(bytes, offset)?,
            type_namespace: ctx.strings_index(bytes, offset)?,
            extends: ctx.coded_index(CodedIndex::TypeDefOrRef, bytes, offset)?,
            field_list: ctx.table_index(TableId::Field, bytes, offset)?,
            method_list: ctx.table_index(TableId::MethodDef, bytes, offset)?,
        })
    }
}

impl FieldRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(FieldRow {
            flags: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            signature: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl MethodDefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(MethodDefRow {
            rva: ctx.u32(bytes, offset)?,
            impl_flags: ctx.u16(bytes, offset)?,
            flags: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            signature: ctx.blob_index(bytes, offset)?,
            param_list: ctx.table_index(TableId::Param, bytes, offset)?,
        })
    }
}

impl ParamRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ParamRow {
            flags: ctx.u16(bytes, offset)?,
            sequence: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
        })
    }
}

impl InterfaceImplRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(InterfaceImplRow {
            class: ctx.table_index(TableId::TypeDef, bytes, offset)?,
            interface: ctx.coded_index(CodedIndex::TypeDefOrRef, bytes, offset)?,
        })
    }
}

impl MemberRefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(MemberRefRow {
            class: ctx.coded_index(CodedIndex::MemberRefParent, bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            signature: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl ConstantRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ConstantRow {
            type_: ctx.u8(bytes, offset)?,
            padding: ctx.u8(bytes, offset)?,
            parent: ctx.coded_index(CodedIndex::HasConstant, bytes, offset)?,
            value: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl CustomAttributeRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(CustomAttributeRow {
            parent: ctx.coded_index(CodedIndex::HasCustomAttribute, bytes, offset)?,
            type_: ctx.coded_index(CodedIndex::CustomAttributeType, bytes, offset)?,
            value: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl FieldMarshalRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(FieldMarshalRow {
            parent: ctx.coded_index(CodedIndex::HasFieldMarshal, bytes, offset)?,
            native_type: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl DeclSecurityRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(DeclSecurityRow {
            action: ctx.u16(bytes, offset)?,
            parent: ctx.coded_index(CodedIndex::HasDeclSecurity, bytes, offset)?,
            permission_set: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl ClassLayoutRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ClassLayoutRow {
            packing_size: ctx.u16(bytes, offset)?,
            class_size: ctx.u32(bytes, offset)?,
            parent: ctx.table_index(TableId::TypeDef, bytes, offset)?,
        })
    }
}

impl FieldLayoutRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(FieldLayoutRow {
            offset: ctx.u32(bytes, offset)?,
            field: ctx.table_index(TableId::Field, bytes, offset)?,
        })
    }
}

impl StandAloneSigRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(StandAloneSigRow { signature: ctx.blob_index(bytes, offset)? })
    }
}

impl EventMapRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(EventMapRow {
            parent: ctx.table_index(TableId::TypeDef, bytes, offset)?,
            event_list: ctx.table_index(TableId::Event, bytes, offset)?,
        })
    }
}

impl EventRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(EventRow {
            event_flags: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            event_type: ctx.coded_index(CodedIndex::TypeDefOrRef, bytes, offset)?,
        })
    }
}

impl PropertyMapRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(PropertyMapRow {
            parent: ctx.table_index(TableId::TypeDef, bytes, offset)?,
            property_list: ctx.table_index(TableId::Property, bytes, offset)?,
        })
    }
}

impl PropertyRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(PropertyRow {
            flags: ctx.u16(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            type_: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl MethodSemanticsRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(MethodSemanticsRow {
            semantics: ctx.u16(bytes, offset)?,
            method: ctx.table_index(TableId::MethodDef, bytes, offset)?,
            association: ctx.coded_index(CodedIndex::HasSemantics, bytes, offset)?,
        })
    }
}

impl MethodImplRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(MethodImplRow {
            class: ctx.table_index(TableId::TypeDef, bytes, offset)?,
            method_body: ctx.coded_index(CodedIndex::MethodDefOrRef, bytes, offset)?,
            method_declaration: ctx.coded_index(CodedIndex::MethodDefOrRef, bytes, offset)?,
        })
    }
}

impl ModuleRefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ModuleRefRow { name: ctx.strings_index(bytes, offset)? })
    }
}

impl TypeSpecRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(TypeSpecRow { signature: ctx.blob_index(bytes, offset)? })
    }
}

impl ImplMapRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ImplMapRow {
            mapping_flags: ctx.u16(bytes, offset)?,
            member_forwarded: ctx.coded_index(CodedIndex::MemberForwarded, bytes, offset)?,
            import_name: ctx.strings_index(bytes, offset)?,
            import_scope: ctx.table_index(TableId::ModuleRef, bytes, offset)?,
        })
    }
}

impl FieldRvaRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(FieldRvaRow {
            rva: ctx.u32(bytes, offset)?,
            field: ctx.table_index(TableId::Field, bytes, offset)?,
        })
    }
}

impl AssemblyRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyRow {
            hash_alg_id: ctx.u32(bytes, offset)?,
            major_version: ctx.u16(bytes, offset)?,
            minor_version: ctx.u16(bytes, offset)?,
            build_number: ctx.u16(bytes, offset)?,
            revision_number: ctx.u16(bytes, offset)?,
            flags: ctx.u32(bytes, offset)?,
            public_key: ctx.blob_index(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            culture: ctx.strings_index(bytes, offset)?,
        })
    }
}

impl AssemblyProcessorRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyProcessorRow { processor: ctx.u32(bytes, offset)? })
    }
}

impl AssemblyOsRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyOsRow {
            os_platform_id: ctx.u32(bytes, offset)?,
            os_major_version: ctx.u32(bytes, offset)?,
            os_minor_version: ctx.u32(bytes, offset)?,
        })
    }
}

impl AssemblyRefRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyRefRow {
            major_version: ctx.u16(bytes, offset)?,
            minor_version: ctx.u16(bytes, offset)?,
            build_number: ctx.u16(bytes, offset)?,
            revision_number: ctx.u16(bytes, offset)?,
            flags: ctx.u32(bytes, offset)?,
            public_key_or_token: ctx.blob_index(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            culture: ctx.strings_index(bytes, offset)?,
            hash_value: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl AssemblyRefProcessorRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyRefProcessorRow {
            processor: ctx.u32(bytes, offset)?,
            assembly_ref: ctx.table_index(TableId::AssemblyRef, bytes, offset)?,
        })
    }
}

impl AssemblyRefOsRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(AssemblyRefOsRow {
            os_platform_id: ctx.u32(bytes, offset)?,
            os_major_version: ctx.u32(bytes, offset)?,
            os_minor_version: ctx.u32(bytes, offset)?,
            assembly_ref: ctx.table_index(TableId::AssemblyRef, bytes, offset)?,
        })
    }
}

impl FileRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(FileRow {
            flags: ctx.u32(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            hash_value: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl ExportedTypeRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ExportedTypeRow {
            flags: ctx.u32(bytes, offset)?,
            typedef_id: ctx.u32(bytes, offset)?,
            type_name: ctx.strings_index(bytes, offset)?,
            type_namespace: ctx.strings_index(bytes, offset)?,
            implementation: ctx.coded_index(CodedIndex::Implementation, bytes, offset)?,
        })
    }
}

impl ManifestResourceRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(ManifestResourceRow {
            offset: ctx.u32(bytes, offset)?,
            flags: ctx.u32(bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
            implementation: ctx.coded_index(CodedIndex::Implementation, bytes, offset)?,
        })
    }
}

impl NestedClassRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(NestedClassRow {
            nested_class: ctx.table_index(TableId::TypeDef, bytes, offset)?,
            enclosing_class: ctx.table_index(TableId::TypeDef, bytes, offset)?,
        })
    }
}

impl GenericParamRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(GenericParamRow {
            number: ctx.u16(bytes, offset)?,
            flags: ctx.u16(bytes, offset)?,
            owner: ctx.coded_index(CodedIndex::TypeOrMethodDef, bytes, offset)?,
            name: ctx.strings_index(bytes, offset)?,
        })
    }
}

impl MethodSpecRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(MethodSpecRow {
            method: ctx.coded_index(CodedIndex::MethodDefOrRef, bytes, offset)?,
            instantiation: ctx.blob_index(bytes, offset)?,
        })
    }
}

impl GenericParamConstraintRow {
    pub(crate) fn parse(bytes: &[u8], offset: &mut usize, ctx: &RowCtx) -> error::Result<Self> {
        Ok(GenericParamConstraintRow {
            owner: ctx.table_index(TableId::GenericParam, bytes, offset)?,
            constraint: ctx.coded_index(CodedIndex::TypeDefOrRef, bytes, offset)?,
        })
    }
}

/// The rows of one decoded table.
#[derive(Debug, PartialEq, Clone)]
pub enum Rows {
    Module(Vec<ModuleRow>),
    TypeRef(Vec<TypeRefRow>),
    TypeDef(Vec<TypeDefRow>),
    Field(Vec<FieldRow>),
    MethodDef(Vec<MethodDefRow>),
    Param(Vec<ParamRow>),
    InterfaceImpl(Vec<InterfaceImplRow>),
    MemberRef(Vec<MemberRefRow>),
    Constant(Vec<ConstantRow>),
    CustomAttribute(Vec<CustomAttributeRow>),
    FieldMarshal(Vec<FieldMarshalRow>),
    DeclSecurity(Vec<DeclSecurityRow>),
    ClassLayout(Vec<ClassLayoutRow>),
    FieldLayout(Vec<FieldLayoutRow>),
    StandAloneSig(Vec<StandAloneSigRow>),
    EventMap(Vec<EventMapRow>),
    Event(Vec<EventRow>),
    PropertyMap(Vec<PropertyMapRow>),
    Property(Vec<PropertyRow>),
    MethodSemantics(Vec<MethodSemanticsRow>),
    MethodImpl(Vec<MethodImplRow>),
    ModuleRef(Vec<ModuleRefRow>),
    TypeSpec(Vec<TypeSpecRow>),
    ImplMap(Vec<ImplMapRow>),
    FieldRva(Vec<FieldRvaRow>),
    Assembly(Vec<AssemblyRow>),
    AssemblyProcessor(Vec<AssemblyProcessorRow>),
    AssemblyOs(Vec<AssemblyOsRow>),
    AssemblyRef(Vec<AssemblyRefRow>),
    AssemblyRefProcessor(Vec<AssemblyRefProcessorRow>),
    AssemblyRefOs(Vec<AssemblyRefOsRow>),
    File(Vec<FileRow>),
    ExportedType(Vec<ExportedTypeRow>),
    ManifestResource(Vec<ManifestResourceRow>),
    NestedClass(Vec<NestedClassRow>),
    GenericParam(Vec<GenericParamRow>),
    MethodSpec(Vec<MethodSpecRow>),
    GenericParamConstraint(Vec<GenericParamConstraintRow>),
}

impl Rows {
    pub fn len(&self) -> usize {
        match self {
            Rows::Module(v) => v.len(),
            Rows::TypeRef(v) => v.len(),
            Rows::TypeDef(v) => v.len(),
            Rows::Field(v) => v.len(),
            Rows::MethodDef(v) => v.len(),
            Rows::Param(v) => v.len(),
            Rows::InterfaceImpl(v) => v.len(),
            Rows::MemberRef(v) => v.len(),
            Rows::Constant(v) => v.len(),
            Rows::CustomAttribute(v) => v.len(),
            Rows::FieldMarshal(v) => v.len(),
            Rows::DeclSecurity(v) => v.len(),
            Rows::ClassLayout(v) => v.len(),
            Rows::FieldLayout(v) => v.len(),
            Rows::StandAloneSig(v) => v.len(),
            Rows::EventMap(v) => v.len(),
            Rows::Event(v) => v.len(),
            Rows::PropertyMap(v) => v.len(),
            Rows::Property(v) => v.len(),
            Rows::MethodSemantics(v) => v.len(),
            Rows::MethodImpl(v) => v.len(),
            Rows::ModuleRef(v) => v.len(),
            Rows::TypeSpec(v) => v.len(),
            Rows::ImplMap(v) => v.len(),
            Rows::FieldRva(v) => v.len(),
            Rows::Assembly(v) => v.len(),
            Rows::AssemblyProcessor(v) => v.len(),
            Rows::AssemblyOs(v) => v.len(),
            Rows::AssemblyRef(v) => v.len(),
            Rows::AssemblyRefProcessor(v) => v.len(),
            Rows::AssemblyRefOs(v) => v.len(),
            Rows::File(v) => v.len(),
            Rows::ExportedType(v) => v.len(),
            Rows::ManifestResource(v) => v.len(),
            Rows::NestedClass(v) => v.len(),
            Rows::GenericParam(v) => v.len(),
            Rows::MethodSpec(v) => v.len(),
            Rows::GenericParamConstraint(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ids_round_trip() {
        for id in TableId::ALL {
            assert_eq!(TableId::from_u8(id as u8), Some(id));
        }
        assert_eq!(TableId::from_u8(0x03), None);
        assert_eq!(TableId::from_u8(0x2d), None);
        assert_eq!(TableId::from_u8(0x3f), None);
    }
}
