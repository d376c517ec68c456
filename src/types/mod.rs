//! Type descriptor model
//!
//! A [`Type`] describes what a runtime value is: its kind (base integer,
//! reference, struct, union, enum, typedef, string or void), its size, an
//! attribute set, an identity and an indirection depth.
//!
//! # Identity
//!
//! - Base types carry one of eight canonical [`BaseIdx`] identities
//!   (signed/unsigned × char/short/int/long long). The identity alone fixes
//!   size and signedness; a 4-byte `long` shares the `int` identity and an
//!   8-byte `long` shares the `long long` one.
//! - Composites carry a [`CompositeId`] handed out by the [`TypeRegistry`].
//!   Two declarations of the same tag name compare equal through the
//!   registry's interned name keys.
//!
//! # References
//!
//! A reference keeps the pointee's size, attributes and identity and records
//! the pointee's kind in [`Type::pointee`]. Popping the last level of
//! indirection restores the pointee kind.

mod attr;
mod builder;
mod parse;
mod registry;

pub use attr::{Keyword, KeywordClass, TypeAttr};
pub use builder::{new_base_type, resolve_canonical_index, TypeBuilder};
pub use registry::{CompositeDef, CompositeId, Member, TypeRegistry};

use smallvec::SmallVec;

pub use crate::interpreter::constants::MAX_ARRAY_RANK;

/// Array dimension extents, outermost first
pub type Dims = SmallVec<[usize; MAX_ARRAY_RANK]>;

/// Kind of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Base,
    Ref,
    Struct,
    Union,
    Enum,
    Typedef,
    String,
    Void,
}

impl TypeKind {
    /// Struct, union, enum or typedef: kinds compared by identity
    pub fn is_composite(self) -> bool {
        matches!(
            self,
            TypeKind::Struct | TypeKind::Union | TypeKind::Enum | TypeKind::Typedef
        )
    }

    /// Struct or union: kinds whose values are byte blobs with members
    pub fn is_aggregate(self) -> bool {
        matches!(self, TypeKind::Struct | TypeKind::Union)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            TypeKind::Base => "base",
            TypeKind::Ref => "reference",
            TypeKind::Struct => "struct",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::Typedef => "typedef",
            TypeKind::String => "string",
            TypeKind::Void => "void",
        }
    }
}

/// The eight canonical base-type identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseIdx {
    SignedChar,
    UnsignedChar,
    SignedShort,
    UnsignedShort,
    SignedInt,
    UnsignedInt,
    SignedLongLong,
    UnsignedLongLong,
}

impl BaseIdx {
    pub fn size(self) -> usize {
        match self {
            BaseIdx::SignedChar | BaseIdx::UnsignedChar => 1,
            BaseIdx::SignedShort | BaseIdx::UnsignedShort => 2,
            BaseIdx::SignedInt | BaseIdx::UnsignedInt => 4,
            BaseIdx::SignedLongLong | BaseIdx::UnsignedLongLong => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BaseIdx::SignedChar
                | BaseIdx::SignedShort
                | BaseIdx::SignedInt
                | BaseIdx::SignedLongLong
        )
    }

    /// Identity for a byte size and sign; `None` for sizes other than 1/2/4/8
    pub fn from_size(size: usize, signed: bool) -> Option<Self> {
        let idx = match (size, signed) {
            (1, true) => BaseIdx::SignedChar,
            (1, false) => BaseIdx::UnsignedChar,
            (2, true) => BaseIdx::SignedShort,
            (2, false) => BaseIdx::UnsignedShort,
            (4, true) => BaseIdx::SignedInt,
            (4, false) => BaseIdx::UnsignedInt,
            (8, true) => BaseIdx::SignedLongLong,
            (8, false) => BaseIdx::UnsignedLongLong,
            _ => return None,
        };
        Some(idx)
    }

    /// Attribute set that resolves back to this identity
    pub fn to_attr(self) -> TypeAttr {
        let size = match self.size() {
            1 => TypeAttr::CHAR,
            2 => TypeAttr::SHORT,
            4 => TypeAttr::INT,
            _ => TypeAttr::LONG_LONG,
        };
        let sign = if self.is_signed() {
            TypeAttr::SIGNED
        } else {
            TypeAttr::UNSIGNED
        };
        size | sign
    }
}

/// Identity of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeIdx {
    #[default]
    None,
    Base(BaseIdx),
    Composite(CompositeId),
}

/// Type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    /// Size in bytes; the pointee size for references
    pub size: usize,
    pub attr: TypeAttr,
    pub idx: TypeIdx,
    /// 0 = value, 1 = `*`, 2 = `**`, ...
    pub ref_depth: u32,
    /// Kind of the pointee when `ref_depth > 0`
    pub pointee: TypeKind,
    /// Present only for array types
    pub dims: Option<Dims>,
}

impl Type {
    /// Base type for a canonical identity
    pub fn base(idx: BaseIdx) -> Self {
        Type {
            kind: TypeKind::Base,
            size: idx.size(),
            attr: idx.to_attr(),
            idx: TypeIdx::Base(idx),
            ref_depth: 0,
            pointee: TypeKind::Base,
            dims: None,
        }
    }

    pub fn void() -> Self {
        Type {
            kind: TypeKind::Void,
            size: 0,
            attr: TypeAttr::VOID,
            idx: TypeIdx::None,
            ref_depth: 0,
            pointee: TypeKind::Void,
            dims: None,
        }
    }

    pub fn string() -> Self {
        Type {
            kind: TypeKind::String,
            size: 0,
            attr: TypeAttr::empty(),
            idx: TypeIdx::None,
            ref_depth: 0,
            pointee: TypeKind::String,
            dims: None,
        }
    }

    /// Composite type with a registry identity
    pub fn composite(kind: TypeKind, id: CompositeId, size: usize) -> Self {
        Type {
            kind,
            size,
            attr: TypeAttr::empty(),
            idx: TypeIdx::Composite(id),
            ref_depth: 0,
            pointee: kind,
            dims: None,
        }
    }

    /// A bare `struct`, `union` or `enum` with no tag and no members
    pub fn anonymous(kind: TypeKind) -> Self {
        Type {
            kind,
            size: 0,
            attr: TypeAttr::empty(),
            idx: TypeIdx::None,
            ref_depth: 0,
            pointee: kind,
            dims: None,
        }
    }

    pub fn with_pointer(mut self) -> Self {
        self.push_ref(1);
        self
    }

    pub fn with_array(mut self, extent: usize) -> Self {
        self.dims.get_or_insert_with(Dims::new).push(extent);
        self
    }

    pub fn with_attr(mut self, attr: TypeAttr) -> Self {
        self.attr |= attr;
        self
    }

    /// Add `n` levels of indirection
    pub fn push_ref(&mut self, n: u32) {
        if self.kind == TypeKind::Ref {
            self.ref_depth += n;
        } else {
            self.ref_depth = n;
            if n > 0 {
                self.pointee = self.kind;
                self.kind = TypeKind::Ref;
            }
        }
    }

    /// Remove `n` levels of indirection; at depth 0 the pointee kind returns
    pub fn pop_ref(&mut self, n: u32) {
        if self.ref_depth == 0 {
            return;
        }
        self.ref_depth = self.ref_depth.saturating_sub(n);
        if self.ref_depth == 0 {
            self.kind = self.pointee;
        }
    }

    /// Fold the storage-class bits of `other` into this type
    pub fn add_storage(&mut self, other: &Type) {
        self.attr |= other.attr.storage();
    }

    pub fn is_ref(&self) -> bool {
        self.kind == TypeKind::Ref
    }

    pub fn is_void(&self) -> bool {
        self.attr.contains(TypeAttr::VOID)
    }

    pub fn is_array(&self) -> bool {
        self.dims.is_some()
    }

    /// Signedness of a value of this type. Addresses are never signed.
    pub fn is_signed(&self) -> bool {
        self.kind != TypeKind::Ref && self.attr.contains(TypeAttr::SIGNED)
    }

    pub fn base_idx(&self) -> Option<BaseIdx> {
        match self.idx {
            TypeIdx::Base(idx) => Some(idx),
            _ => None,
        }
    }

    pub fn composite_id(&self) -> Option<CompositeId> {
        match self.idx {
            TypeIdx::Composite(id) => Some(id),
            _ => None,
        }
    }

    /// Same canonical base identity
    pub fn same_base(&self, other: &Type) -> bool {
        self.kind == TypeKind::Base && other.kind == TypeKind::Base && self.idx == other.idx
    }
}
