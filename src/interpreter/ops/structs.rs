use std::rc::Rc;

use crate::interpreter::engine::Engine;
use crate::interpreter::errors::{ErrorKind, RuntimeError};
use crate::memory::MemoryAccess;
use crate::types::{Member, Type, TypeKind};

impl<M: MemoryAccess> Engine<M> {
    /// Find member `name` of the struct/union `ty` (or the one `ty` points to)
    #[inline]
    pub(crate) fn lookup_member(
        &mut self,
        ty: &Type,
        name: &str,
    ) -> Result<Rc<Member>, RuntimeError> {
        let unknown = || ErrorKind::UnknownMember {
            member: name.to_string(),
        };
        let id = ty.composite_id().ok_or_else(unknown)?;

        // Check cache first
        let cache_key = (id, name.to_string());
        if let Some(member) = self.member_cache.get(&cache_key) {
            return Ok(Rc::clone(member));
        }

        let member = self.registry().member(ty, name).ok_or_else(unknown)?;
        self.member_cache.insert(cache_key, Rc::clone(&member));
        Ok(member)
    }

    /// Byte size of member `field` of type `ty`, arrays included
    pub(crate) fn storage_size(&self, field: &str, ty: &Type) -> Result<usize, RuntimeError> {
        let elem = self.profile().type_size(ty);
        let size = match &ty.dims {
            Some(dims) => dims
                .iter()
                .try_fold(elem, |size, &extent| size.checked_mul(extent)),
            None => Some(elem),
        };
        size.ok_or_else(|| {
            ErrorKind::MemberTooLarge {
                member: field.to_string(),
            }
            .into()
        })
    }

    /// Declare a struct whose fields are laid out back to back,
    /// with no padding or alignment
    pub fn declare_packed_struct(
        &mut self,
        name: &str,
        fields: Vec<(String, Type)>,
    ) -> Result<Type, RuntimeError> {
        let mut offset: usize = 0;
        let mut members = Vec::with_capacity(fields.len());
        for (field, ty) in fields {
            let size = self.storage_size(&field, &ty)?;
            let end = offset
                .checked_add(size)
                .ok_or_else(|| ErrorKind::MemberTooLarge {
                    member: field.clone(),
                })?;
            members.push(Member::new(field, ty, offset, size));
            offset = end;
        }
        Ok(self
            .registry_mut()
            .declare_composite(TypeKind::Struct, Some(name), offset, members))
    }
}
