//! Runtime value representation
//!
//! This module defines [`Value`], an instance of a [`Type`] together with its
//! data and where that data came from.
//!
//! # Payloads
//!
//! - [`Payload::Scalar`]: base integers, enums and references, held as the
//!   raw storage bits (zero above the storage size)
//! - [`Payload::Blob`]: a struct/union held by value, owned exclusively
//! - [`Payload::Array`]: array storage shared between every value that
//!   aliases it
//! - [`Payload::Str`]: an interpreter string
//!
//! # Ownership
//!
//! Cloning a value deep-copies an owned blob but shares array storage; the
//! number of values sharing an array is observable through
//! [`Value::array_refs`]. Storage is released when the last owner drops.
//!
//! # Lvalues
//!
//! A value produced by member access carries a [`MemberBinding`]: the member
//! it came from, a weak handle to the local blob it was read from and the
//! remote base address. Assigning through the value writes back to both.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::interpreter::errors::{ErrorKind, RuntimeError};
use crate::target::TargetProfile;
use crate::types::{
    resolve_canonical_index, BaseIdx, Member, Type, TypeAttr, TypeBuilder, TypeIdx, TypeKind,
};

use super::convert::{mask_to, sign_extend};
use super::Address;

/// Locally held byte storage
pub type LocalBuf = Rc<RefCell<Vec<u8>>>;

/// Data carried by a value
#[derive(Debug)]
pub enum Payload {
    Scalar(u64),
    Blob(LocalBuf),
    Array(LocalBuf),
    Str(Rc<str>),
}

impl Payload {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Payload::Scalar(_) => "scalar",
            Payload::Blob(_) => "struct value",
            Payload::Array(_) => "array",
            Payload::Str(_) => "string",
        }
    }
}

impl Clone for Payload {
    fn clone(&self) -> Self {
        match self {
            Payload::Scalar(raw) => Payload::Scalar(*raw),
            Payload::Blob(buf) => Payload::Blob(Rc::new(RefCell::new(buf.borrow().clone()))),
            Payload::Array(buf) => Payload::Array(Rc::clone(buf)),
            Payload::Str(s) => Payload::Str(Rc::clone(s)),
        }
    }
}

/// Where an lvalue produced by member access writes back to
#[derive(Debug, Clone)]
pub struct MemberBinding {
    pub member: Rc<Member>,
    /// Blob of the value the member was read from, while it is alive
    pub local: Option<Weak<RefCell<Vec<u8>>>>,
    /// Target address of the enclosing composite
    pub remote: Option<Address>,
}

impl MemberBinding {
    /// The local blob, if the base value still exists
    pub fn local_buf(&self) -> Option<LocalBuf> {
        self.local.as_ref().and_then(Weak::upgrade)
    }

    /// Target address of the member itself
    pub fn remote_addr(&self) -> Option<Address> {
        self.remote
            .map(|base| base.wrapping_add(self.member.offset as u64))
    }
}

/// A runtime value
#[derive(Debug, Clone)]
pub struct Value {
    pub(crate) ty: Type,
    pub(crate) payload: Payload,
    pub(crate) mem: Option<Address>,
    pub(crate) lvalue: Option<MemberBinding>,
}

impl Value {
    /// A scalar of the profile's native type
    pub fn scalar(profile: &TargetProfile, raw: u64) -> Self {
        Self::from_raw(profile, TypeBuilder::native(profile).finish(), raw)
    }

    /// A scalar of one of the canonical base types
    pub fn with_index(raw: u64, idx: BaseIdx) -> Self {
        Value {
            ty: Type::base(idx),
            payload: Payload::Scalar(mask_to(idx.size(), raw)),
            mem: None,
            lvalue: None,
        }
    }

    /// A scalar of type `ty`; `raw` is cut to the type's storage size
    pub fn from_raw(profile: &TargetProfile, ty: Type, raw: u64) -> Self {
        let size = profile.type_size(&ty);
        Value {
            ty,
            payload: Payload::Scalar(mask_to(size, raw)),
            mem: None,
            lvalue: None,
        }
    }

    /// A pointer to `pointee` holding `address`
    pub fn reference(profile: &TargetProfile, pointee: Type, address: Address) -> Self {
        Self::from_raw(profile, pointee.with_pointer(), address)
    }

    /// A struct/union held by value
    pub fn composite(ty: Type, bytes: Vec<u8>) -> Self {
        Value {
            ty,
            payload: Payload::Blob(Rc::new(RefCell::new(bytes))),
            mem: None,
            lvalue: None,
        }
    }

    /// A value backed by shared array storage
    pub fn array(ty: Type, bytes: Vec<u8>) -> Self {
        Value {
            ty,
            payload: Payload::Array(Rc::new(RefCell::new(bytes))),
            mem: None,
            lvalue: None,
        }
    }

    pub fn string(s: &str) -> Self {
        Value {
            ty: Type::string(),
            payload: Payload::Str(Rc::from(s)),
            mem: None,
            lvalue: None,
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Target address this value was read from
    pub fn mem(&self) -> Option<Address> {
        self.mem
    }

    pub fn binding(&self) -> Option<&MemberBinding> {
        self.lvalue.as_ref()
    }

    pub fn is_lvalue(&self) -> bool {
        self.lvalue.is_some()
    }

    /// Raw storage bits of a scalar
    pub fn raw(&self) -> Option<u64> {
        match self.payload {
            Payload::Scalar(raw) => Some(raw),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(s) => Some(&**s),
            _ => None,
        }
    }

    /// Scalar widened to 64 bits, sign-extended for signed types
    pub fn as_u64(&self) -> Result<u64, RuntimeError> {
        Ok(self.as_i64()? as u64)
    }

    pub fn as_i64(&self) -> Result<i64, RuntimeError> {
        let raw = self.expect_raw()?;
        if self.ty.is_signed() {
            Ok(sign_extend(self.ty.size, raw))
        } else {
            Ok(raw as i64)
        }
    }

    pub(crate) fn expect_raw(&self) -> Result<u64, RuntimeError> {
        self.raw().ok_or_else(|| {
            ErrorKind::NotScalar {
                got: self.payload.kind_name(),
            }
            .into()
        })
    }

    pub(crate) fn set_raw(&mut self, raw: u64) {
        self.payload = Payload::Scalar(raw);
    }

    pub fn has_array(&self) -> bool {
        matches!(self.payload, Payload::Array(_))
    }

    /// Number of values sharing this value's array storage (0 without one)
    pub fn array_refs(&self) -> usize {
        match &self.payload {
            Payload::Array(buf) => Rc::strong_count(buf),
            _ => 0,
        }
    }

    /// Local byte storage of a struct/union or array value
    pub fn local_buf(&self) -> Option<&LocalBuf> {
        match &self.payload {
            Payload::Blob(buf) | Payload::Array(buf) => Some(buf),
            _ => None,
        }
    }

    /// Copy of the locally held bytes
    pub fn bytes(&self) -> Option<Vec<u8>> {
        self.local_buf().map(|buf| buf.borrow().clone())
    }

    /// Replace this value's contents with `src`.
    ///
    /// The previous storage is released. Array storage is shared with `src`,
    /// anything else is duplicated. The type is taken from `src` except that
    /// a `void` destination stays `void`. The lvalue binding is kept.
    pub fn assign(&mut self, src: &Value) -> Result<(), RuntimeError> {
        if self.has_array() && src.has_array() {
            return Err(ErrorKind::ArrayOverride.into());
        }
        let void = self.ty.attr & TypeAttr::VOID;
        self.payload = src.payload.clone();
        self.ty = src.ty.clone();
        self.ty.attr |= void;
        self.mem = src.mem;
        Ok(())
    }

    /// Byte image of a scalar in target byte order, sized by its storage
    pub fn scalar_bytes(&self, profile: &TargetProfile) -> Result<SmallVec<[u8; 8]>, RuntimeError> {
        let raw = self.expect_raw()?;
        match profile.type_size(&self.ty) {
            size @ (1 | 2 | 4 | 8) => Ok(profile.byte_order().encode(raw, size)),
            size => Err(ErrorKind::UnaddressableScalar { size }.into()),
        }
    }

    /// Record the target address this value lives at
    pub fn set_mem_addr(&mut self, address: Address) {
        self.mem = Some(address);
    }

    /// Turn an unsigned base value into the signed variant of the same size
    pub fn make_signed(&mut self, profile: &TargetProfile) {
        self.ty.attr.remove(TypeAttr::UNSIGNED);
        self.ty.attr.insert(TypeAttr::SIGNED);
        if self.ty.kind == TypeKind::Base {
            let (idx, size) = resolve_canonical_index(profile, self.ty.attr);
            self.ty.idx = TypeIdx::Base(idx);
            self.ty.size = size;
        }
    }

    pub(crate) fn clear_binding(&mut self) {
        self.lvalue = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ByteOrder;

    fn p32() -> TargetProfile {
        TargetProfile::new(4, true, ByteOrder::Little).unwrap()
    }

    #[test]
    fn test_scalar_uses_native_type() {
        let v = Value::scalar(&p32(), 0x1_0000_0005);
        assert_eq!(v.ty().base_idx(), Some(BaseIdx::SignedInt));
        assert_eq!(v.raw(), Some(5));

        let p64 = TargetProfile::new(8, false, ByteOrder::Little).unwrap();
        let v = Value::scalar(&p64, u64::MAX);
        assert_eq!(v.ty().base_idx(), Some(BaseIdx::UnsignedLongLong));
        assert_eq!(v.as_u64().unwrap(), u64::MAX);
    }

    #[test]
    fn test_signed_widening() {
        let v = Value::with_index(0xFF, BaseIdx::SignedChar);
        assert_eq!(v.as_i64().unwrap(), -1);
        let v = Value::with_index(0xFF, BaseIdx::UnsignedChar);
        assert_eq!(v.as_i64().unwrap(), 255);
    }

    #[test]
    fn test_clone_shares_arrays_and_copies_blobs() {
        let arr = Value::array(Type::base(BaseIdx::SignedInt).with_array(2), vec![0; 8]);
        assert_eq!(arr.array_refs(), 1);
        let alias = arr.clone();
        assert_eq!(arr.array_refs(), 2);
        drop(alias);
        assert_eq!(arr.array_refs(), 1);

        let blob = Value::composite(Type::anonymous(TypeKind::Struct), vec![1, 2]);
        let copy = blob.clone();
        copy.local_buf().unwrap().borrow_mut()[0] = 9;
        assert_eq!(blob.bytes().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_assign_array_over_array_fails() {
        let ty = Type::base(BaseIdx::SignedInt).with_array(1);
        let mut dst = Value::array(ty.clone(), vec![0; 4]);
        let src = Value::array(ty, vec![1; 4]);
        let err = dst.assign(&src).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ArrayOverride);
    }

    #[test]
    fn test_assign_keeps_void() {
        let mut dst = Value::from_raw(&p32(), Type::void(), 0);
        let src = Value::with_index(7, BaseIdx::SignedInt);
        dst.assign(&src).unwrap();
        assert!(dst.ty().is_void());
        assert_eq!(dst.raw(), Some(7));
    }

    #[test]
    fn test_scalar_bytes() {
        let v = Value::with_index(0x0102, BaseIdx::UnsignedShort);
        assert_eq!(v.scalar_bytes(&p32()).unwrap().as_slice(), &[0x02, 0x01]);

        let odd = Value::from_raw(&p32(), Type::anonymous(TypeKind::Struct), 0);
        assert_eq!(
            odd.scalar_bytes(&p32()).unwrap_err().kind(),
            &ErrorKind::UnaddressableScalar { size: 0 }
        );
    }

    #[test]
    fn test_make_signed() {
        let mut v = Value::with_index(0xFFFF, BaseIdx::UnsignedShort);
        v.make_signed(&p32());
        assert_eq!(v.ty().base_idx(), Some(BaseIdx::SignedShort));
        assert_eq!(v.as_i64().unwrap(), -1);
    }
}
