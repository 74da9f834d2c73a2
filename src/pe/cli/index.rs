//! Coded indices and metadata tokens.
//!
//! A coded index multiplexes several tables into one column: the low `k`
//! bits pick a table out of the family's fixed candidate vector and the
//! upper bits are the 1-based row index within that table. Row index 0 means
//! "no target".

use core::fmt;

use super::rows::TableId;
use crate::error::{self, Error};

use TableId::*;

/// The coded-index families of the `#~` stream.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum CodedIndex {
    TypeDefOrRef,
    HasConstant,
    HasCustomAttribute,
    HasFieldMarshal,
    HasDeclSecurity,
    MemberRefParent,
    HasSemantics,
    MethodDefOrRef,
    MemberForwarded,
    Implementation,
    CustomAttributeType,
    ResolutionScope,
    TypeOrMethodDef,
}

impl CodedIndex {
    /// Number of low bits used for the tag.
    pub fn tag_bits(self) -> u32 {
        match self {
            CodedIndex::TypeDefOrRef => 2,
            CodedIndex::HasConstant => 2,
            CodedIndex::HasCustomAttribute => 5,
            CodedIndex::HasFieldMarshal => 1,
            CodedIndex::HasDeclSecurity => 2,
            CodedIndex::MemberRefParent => 3,
            CodedIndex::HasSemantics => 1,
            CodedIndex::MethodDefOrRef => 1,
            CodedIndex::MemberForwarded => 1,
            CodedIndex::Implementation => 2,
            CodedIndex::CustomAttributeType => 3,
            CodedIndex::ResolutionScope => 2,
            CodedIndex::TypeOrMethodDef => 1,
        }
    }

    /// Candidate tables in tag order; `None` marks a reserved tag value.
    ///
    /// ECMA-335 lists a "Permission" table at `HasCustomAttribute` tag 8
    /// that exists nowhere else in the standard, and reserves
    /// `CustomAttributeType` tags 0, 1 and 4; all of those decode as
    /// invalid.
    pub fn candidates(self) -> &'static [Option<TableId>] {
        match self {
            CodedIndex::TypeDefOrRef => &[Some(TypeDef), Some(TypeRef), Some(TypeSpec)],
            CodedIndex::HasConstant => &[Some(Field), Some(Param), Some(Property)],
            CodedIndex::HasCustomAttribute => &[
                Some(MethodDef),
                Some(Field),
                Some(TypeRef),
                Some(TypeDef),
                Some(Param),
                Some(InterfaceImpl),
                Some(MemberRef),
                Some(Module),
                None,
                Some(Property),
                Some(Event),
                Some(StandAloneSig),
                Some(ModuleRef),
                Some(TypeSpec),
                Some(Assembly),
                Some(AssemblyRef),
                Some(File),
                Some(ExportedType),
                Some(ManifestResource),
                Some(GenericParam),
                Some(GenericParamConstraint),
                Some(MethodSpec),
            ],
            CodedIndex::HasFieldMarshal => &[Some(Field), Some(Param)],
            CodedIndex::HasDeclSecurity => &[Some(TypeDef), Some(MethodDef), Some(Assembly)],
            CodedIndex::MemberRefParent => &[
                Some(TypeDef),
                Some(TypeRef),
                Some(ModuleRef),
                Some(MethodDef),
                Some(TypeSpec),
            ],
            CodedIndex::HasSemantics => &[Some(Event), Some(Property)],
            CodedIndex::MethodDefOrRef => &[Some(MethodDef), Some(MemberRef)],
            CodedIndex::MemberForwarded => &[Some(Field), Some(MethodDef)],
            CodedIndex::Implementation => &[Some(File), Some(AssemblyRef), Some(ExportedType)],
            CodedIndex::CustomAttributeType => {
                &[None, None, Some(MethodDef), Some(MemberRef), None]
            }
            CodedIndex::ResolutionScope => {
                &[Some(Module), Some(ModuleRef), Some(AssemblyRef), Some(TypeRef)]
            }
            CodedIndex::TypeOrMethodDef => &[Some(TypeDef), Some(MethodDef)],
        }
    }

    /// Resolves a raw coded index into its target table and 1-based row.
    pub fn decode(self, raw: u32) -> error::Result<(TableId, u32)> {
        self.decode_at(raw, 0)
    }

    /// As [`CodedIndex::decode`], reporting `offset` on failure.
    pub(crate) fn decode_at(self, raw: u32, offset: usize) -> error::Result<(TableId, u32)> {
        let bits = self.tag_bits();
        let tag = raw & ((1 << bits) - 1);
        match self.candidates().get(tag as usize) {
            Some(Some(table)) => Ok((*table, raw >> bits)),
            _ => Err(Error::InvalidCodedTag { offset, tag }),
        }
    }
}

/// A 32-bit metadata token: table id in the high byte, 1-based row index in
/// the low 24 bits.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub struct Token(pub u32);

impl Token {
    pub fn new(table: TableId, row: u32) -> Self {
        Token(((table as u32) << 24) | (row & 0x00ff_ffff))
    }

    /// The target table, when the high byte names a known one.
    pub fn table(self) -> Option<TableId> {
        TableId::from_u8((self.0 >> 24) as u8)
    }

    /// The 1-based row index.
    pub fn row(self) -> u32 {
        self.0 & 0x00ff_ffff
    }
}

impl fmt::Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_constant_decodes_property() {
        assert_eq!(
            CodedIndex::HasConstant.decode(0x0000_0012),
            Ok((TableId::Property, 4))
        );
    }

    #[test]
    fn has_constant_rejects_tag_three() {
        assert_eq!(
            CodedIndex::HasConstant.decode(0x0000_0013),
            Err(Error::InvalidCodedTag { offset: 0, tag: 3 })
        );
    }

    #[test]
    fn has_custom_attribute_reserves_tag_eight() {
        assert_eq!(
            CodedIndex::HasCustomAttribute.decode(8),
            Err(Error::InvalidCodedTag { offset: 0, tag: 8 })
        );
        assert_eq!(
            CodedIndex::HasCustomAttribute.decode(21 | (7 << 5)),
            Ok((TableId::MethodSpec, 7))
        );
        assert_eq!(
            CodedIndex::HasCustomAttribute.decode(22),
            Err(Error::InvalidCodedTag { offset: 0, tag: 22 })
        );
    }

    #[test]
    fn custom_attribute_type_only_allows_method_tags() {
        for tag in [0u32, 1, 4, 5, 6, 7] {
            assert_eq!(
                CodedIndex::CustomAttributeType.decode(tag),
                Err(Error::InvalidCodedTag { offset: 0, tag })
            );
        }
        assert_eq!(
            CodedIndex::CustomAttributeType.decode(2 | (3 << 3)),
            Ok((TableId::MethodDef, 3))
        );
        assert_eq!(
            CodedIndex::CustomAttributeType.decode(3),
            Ok((TableId::MemberRef, 0))
        );
    }

    #[test]
    fn resolution_scope_row_zero_means_no_target() {
        assert_eq!(
            CodedIndex::ResolutionScope.decode(0),
            Ok((TableId::Module, 0))
        );
    }

    #[test]
    fn tokens_round_trip() {
        let token = Token::new(TableId::MethodDef, 0x1234);
        assert_eq!(token.0, 0x0600_1234);
        assert_eq!(token.table(), Some(TableId::MethodDef));
        assert_eq!(token.row(), 0x1234);
        assert_eq!(token.to_string(), "0x06001234");
    }
}
