//! Member access: `value.member` and `pointer->member`
//!
//! A direct access reads from the struct value held locally; an indirect
//! access reads target memory at the pointer's value plus the member offset.
//! What comes back depends on the member:
//!
//! - nested struct/union: a fresh blob holding a copy of the member's bytes
//! - bitfield: the extracted field, never addressable on its own
//! - array: no data, just the member's address typed as a pointer to the
//!   element type so indexing can resolve lazily
//! - scalar of 1, 2, 4 or 8 bytes: the decoded integer
//!
//! Every result except arrays is an lvalue bound to the member, so a later
//! store writes back to the local blob and/or target memory it came from.

use std::rc::Rc;

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{ErrorKind, RuntimeError, SourceLocation};
use crate::memory::bitfield::extract_bitfield;
use crate::memory::value::LocalBuf;
use crate::memory::{Address, MemberBinding, MemoryAccess, Value};
use crate::types::{Member, TypeKind};

/// `.` or `->`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDirection {
    Direct,
    Indirect,
}

/// One member access as written in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberAccess {
    pub name: String,
    pub direction: AccessDirection,
    pub location: SourceLocation,
}

impl MemberAccess {
    /// `base.name`
    pub fn direct(name: impl Into<String>, location: SourceLocation) -> Self {
        MemberAccess {
            name: name.into(),
            direction: AccessDirection::Direct,
            location,
        }
    }

    /// `base->name`
    pub fn indirect(name: impl Into<String>, location: SourceLocation) -> Self {
        MemberAccess {
            name: name.into(),
            direction: AccessDirection::Indirect,
            location,
        }
    }
}

/// Copy `len` bytes of `member` out of a local blob
pub(crate) fn local_span(
    buf: &LocalBuf,
    member: &Member,
    len: usize,
) -> Result<Vec<u8>, RuntimeError> {
    let data = buf.borrow();
    member
        .offset
        .checked_add(len)
        .and_then(|end| data.get(member.offset..end))
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            ErrorKind::MemberOutOfBounds {
                member: member.name.clone(),
                offset: member.offset,
                size: len,
                available: data.len(),
            }
            .into()
        })
}

impl<M: MemoryAccess> Engine<M> {
    /// Resolve `base.name` or `base->name`
    #[tracing::instrument(
        level = "debug",
        skip(self, base, access),
        fields(member = %access.name, direction = ?access.direction)
    )]
    pub fn member_access(
        &mut self,
        base: &Value,
        access: &MemberAccess,
    ) -> Result<Value, RuntimeError> {
        self.resolve_member(base, access)
            .map_err(|err| err.at(access.location))
    }

    fn resolve_member(
        &mut self,
        base: &Value,
        access: &MemberAccess,
    ) -> Result<Value, RuntimeError> {
        let name = access.name.as_str();
        let ty = base.ty();

        if ty.ref_depth > 1 {
            return Err(ErrorKind::TooManyIndirections {
                member: name.to_string(),
            }
            .into());
        }

        // local blob for `.`, target address of the composite for both
        let (local, remote): (Option<LocalBuf>, Option<Address>) = match access.direction {
            AccessDirection::Direct => {
                if !ty.kind.is_aggregate() {
                    return Err(ErrorKind::InvalidDirectAccess.into());
                }
                let buf = base
                    .local_buf()
                    .cloned()
                    .ok_or(ErrorKind::InvalidDirectAccess)?;
                (Some(buf), base.mem())
            }
            AccessDirection::Indirect => {
                if ty.kind != TypeKind::Ref || !ty.pointee.is_aggregate() {
                    return Err(ErrorKind::InvalidIndirectAccess.into());
                }
                (None, Some(base.expect_raw()?))
            }
        };

        let member = self.lookup_member(ty, name)?;
        let member_addr = remote.map(|addr| addr.wrapping_add(member.offset as u64));
        tracing::debug!(
            offset = member.offset,
            size = member.size,
            nbits = member.nbits,
            "resolved member"
        );

        let mut value = if member.is_array() {
            let address = member_addr.ok_or_else(|| ErrorKind::UnaddressableArray {
                member: member.name.clone(),
            })?;
            let mut ty = member.ty.clone();
            ty.push_ref(1);
            return Ok(Value::from_raw(self.profile(), ty, address));
        } else if member.is_bitfield() {
            let container_size = member.size;
            if !matches!(container_size, 1 | 2 | 4 | 8) {
                return Err(ErrorKind::UnsupportedMemberSize {
                    member: member.name.clone(),
                    size: container_size,
                }
                .into());
            }
            let bytes = self.fetch_member(local.as_ref(), member_addr, &member, container_size)?;
            let order = self.profile().byte_order();
            let raw = extract_bitfield(
                order.decode(&bytes),
                member.nbits,
                member.fbit,
                container_size,
                member.ty.is_signed(),
                self.profile().type_size(&member.ty),
                order,
            );
            Value::from_raw(self.profile(), member.ty.clone(), raw)
        } else if member.ty.kind.is_aggregate() {
            let bytes = self.fetch_member(local.as_ref(), member_addr, &member, member.size)?;
            let mut value = Value::composite(member.ty.clone(), bytes);
            value.mem = member_addr;
            value
        } else {
            let size = self.profile().type_size(&member.ty);
            if !matches!(size, 1 | 2 | 4 | 8) {
                return Err(ErrorKind::UnsupportedMemberSize {
                    member: member.name.clone(),
                    size,
                }
                .into());
            }
            let bytes = self.fetch_member(local.as_ref(), member_addr, &member, size)?;
            let raw = self.profile().byte_order().decode(&bytes);
            let mut value = Value::from_raw(self.profile(), member.ty.clone(), raw);
            value.mem = member_addr;
            value
        };

        value.lvalue = Some(MemberBinding {
            local: local.as_ref().map(Rc::downgrade),
            remote,
            member,
        });
        Ok(value)
    }

    /// Bytes of a member from the local blob when there is one, else from
    /// target memory
    fn fetch_member(
        &self,
        local: Option<&LocalBuf>,
        address: Option<Address>,
        member: &Member,
        len: usize,
    ) -> Result<Vec<u8>, RuntimeError> {
        match (local, address) {
            (Some(buf), _) => local_span(buf, member, len),
            (None, Some(address)) => Ok(self.read_remote(address, len)?),
            (None, None) => Err(ErrorKind::InvalidDirectAccess.into()),
        }
    }
}
