//! Casts and assignment compatibility
//!
//! This module decides whether a value of one type may flow into a slot of
//! another, and performs the C conversion when it may:
//!
//! - [`Engine::cast`]: explicit `(type)value`
//! - [`Engine::check_and_convert`]: implicit conversion on assignment and
//!   argument binding
//!
//! # Compatibility Rules
//!
//! - base ← base, base ← enum, enum ← base: truncate or extend, keep the
//!   destination's type
//! - ref ← ref: either side `void`, or same depth and pointee (same
//!   declaration for composite pointees, same size otherwise); a `void`
//!   side never changes the destination's pointer type
//! - struct/union/enum/typedef ← same kind: same declaration or same tag
//! - string ← string: always
//! - ref ← literal `0`: null pointer, destination keeps its type
//!
//! Everything else is an invalid conversion.

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{ErrorKind, RuntimeError, SourceLocation};
use crate::memory::convert::truncate_or_extend;
use crate::memory::{MemoryAccess, Value};
use crate::types::{Type, TypeKind};

#[inline]
fn is_integral(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::Base | TypeKind::Enum)
}

impl<M: MemoryAccess> Engine<M> {
    /// Cast `value` to `target`.
    ///
    /// The bits are truncated or extended from the old storage size to the
    /// new one using the operand's own signedness. The result is an rvalue.
    pub fn cast(
        &self,
        mut value: Value,
        target: &Type,
        location: SourceLocation,
    ) -> Result<Value, RuntimeError> {
        if target.kind == TypeKind::String {
            return Err(RuntimeError::new(ErrorKind::CastToString).at(location));
        }
        let operand_ok = matches!(
            value.ty.kind,
            TypeKind::Base | TypeKind::Ref | TypeKind::Enum
        );
        let target_ok = matches!(
            target.kind,
            TypeKind::Base | TypeKind::Ref | TypeKind::Enum
        );
        if !operand_ok || !target_ok {
            return Err(RuntimeError::new(ErrorKind::InvalidTypecast).at(location));
        }

        let raw = value.expect_raw().map_err(|e| e.at(location))?;
        let from = self.profile().type_size(&value.ty);
        let to = self.profile().type_size(target);
        let converted = truncate_or_extend(from, to, raw, value.ty.is_signed());

        tracing::debug!(
            from = %self.type_name(&value.ty),
            to = %self.type_name(target),
            raw,
            converted,
            "cast"
        );

        value.ty = target.clone();
        value.set_raw(converted);
        value.clear_binding();
        Ok(value)
    }

    /// Convert `src` into `dst` if the types are compatible
    pub fn check_and_convert(&self, dst: &mut Value, src: &Value) -> Result<(), RuntimeError> {
        let (dk, sk) = (dst.ty.kind, src.ty.kind);

        match (dk, sk) {
            (TypeKind::Base, TypeKind::Base) => self.convert_integral(dst, src),

            (TypeKind::Ref, TypeKind::Ref) => {
                if dst.ty.is_void() || src.ty.is_void() {
                    let ty = dst.ty.clone();
                    dst.assign(src)?;
                    dst.ty = ty;
                    return Ok(());
                }
                if dst.ty.ref_depth != src.ty.ref_depth || dst.ty.pointee != src.ty.pointee {
                    return Err(ErrorKind::InvalidConversion.into());
                }
                if dst.ty.pointee.is_composite() {
                    if !self.registry().same_composite(dst.ty.idx, src.ty.idx) {
                        return Err(ErrorKind::InvalidConversion.into());
                    }
                    return dst.assign(src);
                }
                if dst.ty.size != src.ty.size {
                    return Err(ErrorKind::InvalidConversion.into());
                }
                let ty = dst.ty.clone();
                dst.assign(src)?;
                dst.ty = ty;
                Ok(())
            }

            (d, s) if d == s && d.is_composite() => {
                if !self.registry().same_composite(dst.ty.idx, src.ty.idx) {
                    return Err(ErrorKind::InvalidConversion.into());
                }
                dst.assign(src)
            }

            (TypeKind::String, TypeKind::String) => dst.assign(src),

            (d, s) if is_integral(d) && is_integral(s) => self.convert_integral(dst, src),

            (TypeKind::Ref, TypeKind::Base) if src.raw() == Some(0) => {
                dst.set_raw(0);
                dst.mem = src.mem;
                Ok(())
            }

            _ => Err(ErrorKind::InvalidConversion.into()),
        }
    }

    /// Truncate or extend `src` into `dst`, keeping the destination's type
    fn convert_integral(&self, dst: &mut Value, src: &Value) -> Result<(), RuntimeError> {
        let raw = src.expect_raw()?;
        let from = self.profile().type_size(&src.ty);
        let to = self.profile().type_size(&dst.ty);
        let converted = truncate_or_extend(from, to, raw, src.ty.is_signed());

        let ty = dst.ty.clone();
        dst.assign(src)?;
        dst.ty = ty;
        dst.set_raw(converted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryImage;
    use crate::target::{ByteOrder, TargetProfile};
    use crate::types::{BaseIdx, TypeAttr};

    fn engine() -> Engine<MemoryImage> {
        let profile = TargetProfile::new(8, true, ByteOrder::Little).unwrap();
        Engine::new(profile, MemoryImage::new())
    }

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn test_cast_sign_and_width() {
        let engine = engine();
        let v = Value::with_index(0xFFFF_FFFF, BaseIdx::UnsignedInt);

        let signed = engine
            .cast(v, &Type::base(BaseIdx::SignedInt), loc())
            .unwrap();
        assert_eq!(signed.as_i64().unwrap(), -1);

        let byte = engine
            .cast(signed, &Type::base(BaseIdx::SignedChar), loc())
            .unwrap();
        assert_eq!(byte.raw(), Some(0xFF));
        assert_eq!(byte.as_i64().unwrap(), -1);

        let wide = engine
            .cast(byte, &Type::base(BaseIdx::UnsignedLongLong), loc())
            .unwrap();
        assert_eq!(wide.raw(), Some(u64::MAX));
    }

    #[test]
    fn test_cast_errors_carry_location() {
        let engine = engine();
        let v = Value::with_index(1, BaseIdx::SignedInt);
        let err = engine
            .cast(v.clone(), &Type::string(), SourceLocation::new(2, 5))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::CastToString);
        assert_eq!(err.location(), Some(&SourceLocation::new(2, 5)));

        let s = Value::string("abc");
        let err = engine
            .cast(s, &Type::base(BaseIdx::SignedInt), loc())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidTypecast);
    }

    #[test]
    fn test_cast_pointer_to_integer() {
        let engine = engine();
        let p = Value::reference(engine.profile(), Type::void(), 0xFFFF_8000_0000_1000);
        let n = engine
            .cast(p, &Type::base(BaseIdx::UnsignedInt), loc())
            .unwrap();
        assert_eq!(n.raw(), Some(0x0000_1000));
    }

    #[test]
    fn test_integral_keeps_destination_type() {
        let engine = engine();
        let mut dst = Value::with_index(0, BaseIdx::SignedInt);
        let src = Value::with_index(0x1_0000_0002, BaseIdx::SignedLongLong);
        engine.check_and_convert(&mut dst, &src).unwrap();
        assert_eq!(dst.ty().base_idx(), Some(BaseIdx::SignedInt));
        assert_eq!(dst.raw(), Some(2));
    }

    #[test]
    fn test_integral_extends_with_source_sign() {
        let engine = engine();
        let mut dst = Value::with_index(0, BaseIdx::UnsignedInt);
        engine
            .check_and_convert(&mut dst, &Value::with_index(0xFF, BaseIdx::SignedChar))
            .unwrap();
        assert_eq!(dst.raw(), Some(0xFFFF_FFFF));
        assert_eq!(dst.ty().base_idx(), Some(BaseIdx::UnsignedInt));

        // an unsigned source zero-extends into a signed slot
        let mut dst = Value::with_index(0, BaseIdx::SignedLongLong);
        engine
            .check_and_convert(&mut dst, &Value::with_index(0xFF, BaseIdx::UnsignedChar))
            .unwrap();
        assert_eq!(dst.as_i64().unwrap(), 0xFF);
    }

    #[test]
    fn test_void_side_keeps_destination_pointer_type() {
        let mut engine = engine();
        let node = engine.registry_mut().declare_struct("node", 8, Vec::new());
        let profile = *engine.profile();

        let mut typed = Value::reference(&profile, node.clone(), 0);
        let void_ptr = Value::reference(&profile, Type::void(), 0x2000);
        engine.check_and_convert(&mut typed, &void_ptr).unwrap();
        assert_eq!(typed.ty(), &node.clone().with_pointer());
        assert_eq!(typed.raw(), Some(0x2000));

        let mut untyped = Value::reference(&profile, Type::void(), 0);
        let node_ptr = Value::reference(&profile, node, 0x3000);
        engine.check_and_convert(&mut untyped, &node_ptr).unwrap();
        assert!(untyped.ty().is_void());
        assert_eq!(untyped.raw(), Some(0x3000));
    }

    #[test]
    fn test_enum_base_interconvert() {
        let mut engine = engine();
        let e = engine
            .registry_mut()
            .declare_enum(Some("state"), vec![("A".to_string(), 1)]);
        let mut slot = Value::from_raw(engine.profile(), e.clone(), 0);
        engine
            .check_and_convert(&mut slot, &Value::with_index(3, BaseIdx::SignedChar))
            .unwrap();
        assert_eq!(slot.ty().kind, TypeKind::Enum);
        assert!(slot.ty().attr.contains(TypeAttr::ENUM));
        assert_eq!(slot.raw(), Some(3));

        let mut n = Value::with_index(0, BaseIdx::SignedShort);
        engine.check_and_convert(&mut n, &slot).unwrap();
        assert_eq!(n.ty().base_idx(), Some(BaseIdx::SignedShort));
        assert_eq!(n.raw(), Some(3));
    }

    #[test]
    fn test_string_into_int_fails() {
        let engine = engine();
        let mut dst = Value::with_index(0, BaseIdx::SignedInt);
        let err = engine
            .check_and_convert(&mut dst, &Value::string("x"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidConversion);
    }
}
