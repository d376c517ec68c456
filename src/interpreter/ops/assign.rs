//! Assignment through member lvalues
//!
//! [`Engine::store`] is the assignment entry point: it converts the source
//! into the target's type and, when the target came from a member access,
//! commits the result back to where the member lives.
//!
//! # Write-back
//!
//! - Bitfields: the container is read, the field replaced and the container
//!   written back, so neighbouring fields are untouched
//! - Structs/unions: the member's bytes are overwritten with the new blob
//! - Scalars: the value is truncated or extended to the member's size
//!
//! Writes go to the local blob the member was read from (while it is still
//! alive) and to target memory (when the member has a target address).

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{ErrorKind, RuntimeError};
use crate::memory::bitfield::insert_bitfield;
use crate::memory::convert::truncate_or_extend;
use crate::memory::value::LocalBuf;
use crate::memory::{MemberBinding, MemoryAccess, Value};
use crate::types::{Member, TypeKind};

use super::access::local_span;

/// Overwrite a member's bytes inside a local blob
fn write_local(buf: &LocalBuf, member: &Member, bytes: &[u8]) -> Result<(), RuntimeError> {
    let mut data = buf.borrow_mut();
    let available = data.len();
    let span = member
        .offset
        .checked_add(bytes.len())
        .and_then(|end| data.get_mut(member.offset..end));
    match span {
        Some(dst) => {
            dst.copy_from_slice(bytes);
            Ok(())
        }
        None => Err(ErrorKind::MemberOutOfBounds {
            member: member.name.clone(),
            offset: member.offset,
            size: bytes.len(),
            available,
        }
        .into()),
    }
}

impl<M: MemoryAccess> Engine<M> {
    /// Assign `src` to `target`, writing back through its member binding.
    ///
    /// `target` is only updated once the write-back has succeeded.
    pub fn store(&mut self, target: &mut Value, src: &Value) -> Result<(), RuntimeError> {
        let mut converted = target.clone();
        self.check_and_convert(&mut converted, src)?;
        if let Some(binding) = converted.binding().cloned() {
            self.assign_to_member(&binding, &converted)?;
        }
        *target = converted;
        Ok(())
    }

    /// Commit `value` to the member described by `binding`
    pub fn assign_to_member(
        &mut self,
        binding: &MemberBinding,
        value: &Value,
    ) -> Result<(), RuntimeError> {
        let member = binding.member.as_ref();
        let local = binding.local_buf();
        let remote = binding.remote_addr();

        tracing::debug!(
            member = %member.name,
            local = local.is_some(),
            remote = ?remote,
            "member write-back"
        );

        if member.is_bitfield() {
            if !matches!(value.ty.kind, TypeKind::Base | TypeKind::Enum) {
                return Err(ErrorKind::InvalidBitfieldAssignment.into());
            }
            let new_bits = value.expect_raw()?;
            let size = member.size;
            let order = self.profile().byte_order();
            let update = |container: u64| {
                insert_bitfield(container, new_bits, member.nbits, member.fbit, size, order)
            };

            if let Some(buf) = &local {
                let current = order.decode(&local_span(buf, member, size)?);
                write_local(buf, member, &order.encode(update(current), size))?;
            }
            if let Some(address) = remote {
                let current = order.decode(&self.read_remote(address, size)?);
                self.write_remote(address, &order.encode(update(current), size))?;
            }
            return Ok(());
        }

        self.check_member_type(member, value)?;

        let bytes = if member.ty.kind.is_aggregate() {
            let bytes = value.bytes().ok_or(ErrorKind::IncompatibleAssignment)?;
            if bytes.len() != member.size {
                return Err(ErrorKind::MemberSizeMismatch {
                    member: member.name.clone(),
                    expected: member.size,
                    got: bytes.len(),
                }
                .into());
            }
            bytes
        } else {
            let size = self.profile().type_size(&member.ty);
            let raw = value.expect_raw()?;
            let from = self.profile().type_size(&value.ty);
            let converted = truncate_or_extend(from, size, raw, value.ty.is_signed());
            self.profile().byte_order().encode(converted, size).to_vec()
        };

        if let Some(buf) = &local {
            write_local(buf, member, &bytes)?;
        }
        if let Some(address) = remote {
            self.write_remote(address, &bytes)?;
        }
        Ok(())
    }

    /// Kinds, pointee kinds and composite identities must agree
    fn check_member_type(&self, member: &Member, value: &Value) -> Result<(), RuntimeError> {
        let (mt, vt) = (&member.ty, &value.ty);
        let incompatible = mt.kind != vt.kind
            || (mt.kind == TypeKind::Ref && mt.pointee != vt.pointee)
            || ((mt.kind.is_composite()
                || (mt.kind == TypeKind::Ref && mt.pointee.is_composite()))
                && !self.registry().same_composite(mt.idx, vt.idx));
        if incompatible {
            return Err(ErrorKind::IncompatibleAssignment.into());
        }
        Ok(())
    }
}
