// Session engine: profile, registry, memory backend and diagnostics

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::interpreter::errors::{Diagnostics, RuntimeError, SourceLocation};
use crate::memory::{Address, MemoryAccess, MemoryError, Value};
use crate::target::TargetProfile;
use crate::types::{
    new_base_type, CompositeId, Keyword, Member, Type, TypeAttr, TypeKind, TypeRegistry,
};

/// The engine an expression evaluator works against
pub struct Engine<M: MemoryAccess> {
    /// Target description, fixed for the session
    profile: TargetProfile,

    /// Struct, union, enum and typedef declarations
    registry: TypeRegistry,

    /// Target memory backend
    memory: M,

    /// Warnings and reported errors
    diagnostics: Diagnostics,

    /// Resolved members by (composite, name)
    pub(crate) member_cache: FxHashMap<(CompositeId, String), Rc<Member>>,
}

impl<M: MemoryAccess> Engine<M> {
    /// Create an engine for a target
    pub fn new(profile: TargetProfile, memory: M) -> Self {
        tracing::debug!(
            word_size = profile.word_size(),
            default_signed = profile.default_signed(),
            byte_order = ?profile.byte_order(),
            "engine created"
        );
        Engine {
            profile,
            registry: TypeRegistry::new(),
            memory,
            diagnostics: Diagnostics::new(),
            member_cache: FxHashMap::default(),
        }
    }

    /// Create an engine over an existing set of declarations
    pub fn with_registry(profile: TargetProfile, memory: M, registry: TypeRegistry) -> Self {
        let mut engine = Self::new(profile, memory);
        engine.registry = registry;
        engine
    }

    pub fn profile(&self) -> &TargetProfile {
        &self.profile
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Give back the memory backend
    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Build a base type from declaration keywords
    pub fn base_type(&mut self, keywords: &[Keyword]) -> Result<Type, RuntimeError> {
        new_base_type(&self.profile, keywords, &mut self.diagnostics)
    }

    /// Parse a type name such as `unsigned long` or `struct task *`
    pub fn parse_type(&mut self, text: &str) -> Result<Type, RuntimeError> {
        self.registry
            .parse_type(&self.profile, text, &mut self.diagnostics)
    }

    pub fn type_name(&self, t: &Type) -> String {
        self.registry.type_name(&self.profile, t)
    }

    /// A scalar of the native type
    pub fn scalar(&self, raw: u64) -> Value {
        Value::scalar(&self.profile, raw)
    }

    /// Value of an enumerator, typed as its enumeration
    pub fn enumerator(&self, name: &str) -> Option<Value> {
        let (id, value) = self.registry.enumerator(name)?;
        let mut ty = Type::composite(TypeKind::Enum, id, 4);
        ty.attr = TypeAttr::UNSIGNED | TypeAttr::INT | TypeAttr::ENUM;
        Some(Value::from_raw(&self.profile, ty, value as u64))
    }

    /// Run `f` as one top-level evaluation.
    ///
    /// This is the single recovery point: an error escaping `f` gets
    /// `location` attached (unless it already carries one), is recorded in
    /// the diagnostics and returned.
    pub fn recover<T, F>(&mut self, location: SourceLocation, f: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&mut Self) -> Result<T, RuntimeError>,
    {
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                let err = err.at(location);
                self.diagnostics.report(&err);
                Err(err)
            }
        }
    }

    pub(crate) fn read_remote(
        &self,
        address: Address,
        len: usize,
    ) -> Result<Vec<u8>, MemoryError> {
        tracing::trace!(address = format_args!("0x{:x}", address), len, "remote read");
        self.memory.read(address, len)
    }

    pub(crate) fn write_remote(
        &mut self,
        address: Address,
        bytes: &[u8],
    ) -> Result<(), MemoryError> {
        tracing::trace!(
            address = format_args!("0x{:x}", address),
            len = bytes.len(),
            "remote write"
        );
        self.memory.write(address, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::errors::ErrorKind;
    use crate::memory::MemoryImage;
    use crate::target::ByteOrder;
    use crate::types::BaseIdx;

    fn engine() -> Engine<MemoryImage> {
        let profile = TargetProfile::new(8, true, ByteOrder::Little).unwrap();
        Engine::new(profile, MemoryImage::new())
    }

    #[test]
    fn test_recover_records_error() {
        let mut engine = engine();
        let result: Result<(), _> = engine.recover(SourceLocation::new(4, 2), |e| {
            e.parse_type("struct nope")?;
            Ok(())
        });
        let err = result.unwrap_err();
        assert_eq!(err.location(), Some(&SourceLocation::new(4, 2)));
        assert_eq!(engine.diagnostics().errors().len(), 1);
    }

    #[test]
    fn test_recover_passes_success() {
        let mut engine = engine();
        let t = engine
            .recover(SourceLocation::new(1, 1), |e| e.parse_type("unsigned char"))
            .unwrap();
        assert_eq!(t.base_idx(), Some(BaseIdx::UnsignedChar));
        assert!(engine.diagnostics().errors().is_empty());
    }

    #[test]
    fn test_enumerator_value() {
        let mut engine = engine();
        engine
            .registry_mut()
            .declare_enum(Some("state"), vec![("STOPPED".to_string(), 4)]);
        let v = engine.enumerator("STOPPED").unwrap();
        assert_eq!(v.ty().kind, TypeKind::Enum);
        assert_eq!(v.raw(), Some(4));
        assert!(engine.enumerator("RUNNING").is_none());
    }

    #[test]
    fn test_remote_read_failure() {
        let engine = engine();
        let err = engine.read_remote(0xdead, 4).unwrap_err();
        assert_eq!(
            RuntimeError::from(err).kind(),
            &ErrorKind::Memory(MemoryError::Unmapped {
                address: 0xdead,
                len: 4
            })
        );
    }
}
