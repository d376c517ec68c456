//! Composite declarations: structs, unions, enums and typedefs.
//!
//! The registry hands out a [`CompositeId`] per declaration. Member layouts
//! are supplied by the caller (they normally come from debug information of
//! the inspected target), so offsets and sizes are taken as given. Lookups by
//! member name go through a per-declaration hash index.

use std::fmt::Write as _;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::target::TargetProfile;

use super::attr::{Keyword, TypeAttr};
use super::{Type, TypeIdx, TypeKind};

/// Identity of one composite declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeId(u32);

/// Interned tag name; two declarations with the same key are the same type
/// as far as compatibility checks are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NameKey(u32);

/// One struct or union member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub ty: Type,
    /// Byte offset from the start of the enclosing composite
    pub offset: usize,
    /// Size in bytes; for bitfields, the size of the containing unit
    pub size: usize,
    /// Bitfield width, 0 for ordinary members
    pub nbits: u32,
    /// Bit offset of a bitfield within its container
    pub fbit: u32,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: Type, offset: usize, size: usize) -> Self {
        Member {
            name: name.into(),
            ty,
            offset,
            size,
            nbits: 0,
            fbit: 0,
        }
    }

    /// A bitfield of `nbits` bits starting `fbit` bits into a `size`-byte
    /// container at `offset`
    pub fn bitfield(
        name: impl Into<String>,
        ty: Type,
        offset: usize,
        size: usize,
        nbits: u32,
        fbit: u32,
    ) -> Self {
        Member {
            name: name.into(),
            ty,
            offset,
            size,
            nbits,
            fbit,
        }
    }

    #[inline]
    pub fn is_bitfield(&self) -> bool {
        self.nbits > 0
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        self.ty.is_array()
    }
}

/// A registered composite declaration
#[derive(Debug, Clone)]
pub struct CompositeDef {
    kind: TypeKind,
    name: Option<String>,
    name_key: Option<NameKey>,
    size: usize,
    members: Vec<Rc<Member>>,
    index: FxHashMap<String, usize>,
    enumerators: Vec<(String, i64)>,
    target: Option<Type>,
}

impl CompositeDef {
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn members(&self) -> &[Rc<Member>] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Rc<Member>> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    pub fn enumerators(&self) -> &[(String, i64)] {
        &self.enumerators
    }

    /// Aliased type of a typedef
    pub fn target(&self) -> Option<&Type> {
        self.target.as_ref()
    }

    /// No members and no size: declared through a pointer only
    pub fn is_incomplete(&self) -> bool {
        self.size == 0 && self.members.is_empty()
    }
}

/// Every composite known to a session
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    defs: Vec<CompositeDef>,
    name_keys: FxHashMap<String, NameKey>,
    /// Latest declaration per (kind, tag)
    by_name: FxHashMap<(TypeKind, NameKey), CompositeId>,
    enumerators: FxHashMap<String, (CompositeId, i64)>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, name: &str) -> NameKey {
        if let Some(&key) = self.name_keys.get(name) {
            return key;
        }
        let key = NameKey(self.name_keys.len() as u32);
        self.name_keys.insert(name.to_string(), key);
        key
    }

    fn push(&mut self, mut def: CompositeDef) -> CompositeId {
        let id = CompositeId(self.defs.len() as u32);
        if let Some(name) = def.name.clone() {
            let key = self.intern(&name);
            def.name_key = Some(key);
            self.by_name.insert((def.kind, key), id);
        }
        tracing::debug!(
            kind = def.kind.keyword(),
            name = def.name.as_deref().unwrap_or("<anonymous>"),
            size = def.size,
            members = def.members.len(),
            "declared composite"
        );
        self.defs.push(def);
        id
    }

    /// Declare a struct or union with an explicit member layout.
    /// A later declaration with the same tag shadows earlier ones.
    pub fn declare_composite(
        &mut self,
        kind: TypeKind,
        name: Option<&str>,
        size: usize,
        members: Vec<Member>,
    ) -> Type {
        let members: Vec<Rc<Member>> = members.into_iter().map(Rc::new).collect();
        let index = members
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let id = self.push(CompositeDef {
            kind,
            name: name.map(str::to_string),
            name_key: None,
            size,
            members,
            index,
            enumerators: Vec::new(),
            target: None,
        });
        Type::composite(kind, id, size)
    }

    pub fn declare_struct(&mut self, name: &str, size: usize, members: Vec<Member>) -> Type {
        self.declare_composite(TypeKind::Struct, Some(name), size, members)
    }

    pub fn declare_union(&mut self, name: &str, size: usize, members: Vec<Member>) -> Type {
        self.declare_composite(TypeKind::Union, Some(name), size, members)
    }

    /// Declare an enumeration. Enumerators become visible by name; values of
    /// an enum type are 4-byte unsigned integers.
    pub fn declare_enum(&mut self, name: Option<&str>, enumerators: Vec<(String, i64)>) -> Type {
        let id = self.push(CompositeDef {
            kind: TypeKind::Enum,
            name: name.map(str::to_string),
            name_key: None,
            size: 4,
            members: Vec::new(),
            index: FxHashMap::default(),
            enumerators: enumerators.clone(),
            target: None,
        });
        for (enumerator, value) in enumerators {
            self.enumerators.insert(enumerator, (id, value));
        }
        let mut t = Type::composite(TypeKind::Enum, id, 4);
        t.attr = TypeAttr::UNSIGNED | TypeAttr::INT | TypeAttr::ENUM;
        t
    }

    /// Declare `typedef <target> name`
    pub fn declare_typedef(&mut self, name: &str, target: Type) -> CompositeId {
        self.push(CompositeDef {
            kind: TypeKind::Typedef,
            name: Some(name.to_string()),
            name_key: None,
            size: target.size,
            members: Vec::new(),
            index: FxHashMap::default(),
            enumerators: Vec::new(),
            target: Some(target),
        })
    }

    /// Declare an incomplete struct/union/enum unless the tag already exists
    pub fn declare_opaque(&mut self, kind: TypeKind, name: &str) -> Type {
        if let Some(t) = self.lookup(kind, name) {
            return t;
        }
        self.declare_composite(kind, Some(name), 0, Vec::new())
    }

    /// Latest declaration of `kind` tagged `name`
    pub fn lookup(&self, kind: TypeKind, name: &str) -> Option<Type> {
        let key = self.name_keys.get(name)?;
        let id = *self.by_name.get(&(kind, *key))?;
        let def = self.def(id)?;
        let mut t = Type::composite(kind, id, def.size);
        if kind == TypeKind::Enum {
            t.attr = TypeAttr::UNSIGNED | TypeAttr::INT | TypeAttr::ENUM;
        }
        Some(t)
    }

    /// Aliased type of typedef `name`
    pub fn typedef(&self, name: &str) -> Option<&Type> {
        let key = self.name_keys.get(name)?;
        let id = self.by_name.get(&(TypeKind::Typedef, *key))?;
        self.def(*id)?.target()
    }

    pub fn def(&self, id: CompositeId) -> Option<&CompositeDef> {
        self.defs.get(id.0 as usize)
    }

    /// Declaration behind a composite type, references included
    pub fn def_of(&self, t: &Type) -> Option<&CompositeDef> {
        t.composite_id().and_then(|id| self.def(id))
    }

    /// Member `name` of the struct or union `t` (or the one `t` points to)
    pub fn member(&self, t: &Type, name: &str) -> Option<Rc<Member>> {
        self.def_of(t)?.member(name).cloned()
    }

    /// Value and declaring enum of an enumerator
    pub fn enumerator(&self, name: &str) -> Option<(CompositeId, i64)> {
        self.enumerators.get(name).copied()
    }

    /// Same declaration, or same kind and tag declared twice
    pub fn same_composite(&self, a: TypeIdx, b: TypeIdx) -> bool {
        if a == b {
            return true;
        }
        let (TypeIdx::Composite(a), TypeIdx::Composite(b)) = (a, b) else {
            return false;
        };
        match (self.def(a), self.def(b)) {
            (Some(da), Some(db)) => {
                da.kind == db.kind && da.name_key.is_some() && da.name_key == db.name_key
            }
            _ => false,
        }
    }

    /// Render a type the way a C declaration would spell it
    pub fn type_name(&self, profile: &TargetProfile, t: &Type) -> String {
        let mut out = String::new();
        let mut inner = t.clone();
        inner.pop_ref(t.ref_depth);

        match inner.kind {
            TypeKind::Base | TypeKind::Void => out.push_str(&base_name(profile, inner.attr)),
            TypeKind::String => out.push_str("string"),
            TypeKind::Ref => {}
            kind => {
                let def = self.def_of(&inner);
                if kind == TypeKind::Typedef {
                    out.push_str(def.and_then(CompositeDef::name).unwrap_or("typedef"));
                } else {
                    out.push_str(kind.keyword());
                    if let Some(name) = def.and_then(CompositeDef::name) {
                        out.push(' ');
                        out.push_str(name);
                    }
                }
            }
        }

        if t.ref_depth > 0 {
            out.push(' ');
            for _ in 0..t.ref_depth {
                out.push('*');
            }
        }
        if let Some(dims) = &t.dims {
            for extent in dims {
                let _ = write!(out, "[{}]", extent);
            }
        }
        out
    }
}

/// Keyword spelling of a base attribute set. The sign is spelled only where
/// it differs from the default for the size class.
fn base_name(profile: &TargetProfile, attr: TypeAttr) -> String {
    let default_signed = if attr.contains(TypeAttr::CHAR) {
        profile.default_signed()
    } else {
        true
    };
    let has_other_size = attr.intersects(
        TypeAttr::CHAR | TypeAttr::SHORT | TypeAttr::LONG | TypeAttr::LONG_LONG,
    );

    let words: Vec<&str> = Keyword::ALL
        .iter()
        .filter(|kw| match kw {
            Keyword::Signed => attr.contains(TypeAttr::SIGNED) && !default_signed,
            Keyword::Unsigned => attr.contains(TypeAttr::UNSIGNED) && default_signed,
            Keyword::Int => attr.contains(TypeAttr::INT) && !has_other_size,
            kw => attr.contains(kw.attr()),
        })
        .map(|kw| kw.as_str())
        .collect();

    if words.is_empty() {
        "int".to_string()
    } else {
        words.join(" ")
    }
}
