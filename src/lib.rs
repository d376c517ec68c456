//! # Introduction
//!
//! ctinspect is the type and value engine of a C-expression interpreter that
//! evaluates expressions against the memory of another process or a frozen
//! image of one. Expressions name C types (structs, unions, enums, typedefs,
//! pointers, integers, bitfields) and read or write either values held by the
//! interpreter or bytes of the inspected target.
//!
//! ## Pipeline
//!
//! ```text
//! declarations → TypeRegistry ─┐
//! type names   → parse_type  ──┼→ Engine → member access / casts / stores
//! target memory (MemoryAccess) ┘
//! ```
//!
//! 1. [`target`]: the [`TargetProfile`](target::TargetProfile) describing the
//!    inspected target (word size, default `char` sign, byte order).
//! 2. [`types`]: type descriptors, the C keyword combination rules and the
//!    registry of composite declarations.
//! 3. [`memory`]: runtime [`Value`](memory::Value)s, the
//!    [`MemoryAccess`](memory::MemoryAccess) backend interface, integer and
//!    bitfield conversion.
//! 4. [`interpreter`]: the [`Engine`](interpreter::engine::Engine) with member
//!    access, write-back, casts, conversion checks and string reads, plus
//!    errors and diagnostics.
//!
//! ## Example
//!
//! ```
//! use ctinspect::interpreter::engine::Engine;
//! use ctinspect::interpreter::errors::SourceLocation;
//! use ctinspect::interpreter::ops::MemberAccess;
//! use ctinspect::memory::{MemoryImage, Value};
//! use ctinspect::target::{ByteOrder, TargetProfile};
//! use ctinspect::types::{BaseIdx, Member, Type};
//!
//! let mut image = MemoryImage::new();
//! image.map(0x1000, vec![42, 0, 0, 0]).unwrap();
//!
//! let profile = TargetProfile::new(8, true, ByteOrder::Little).unwrap();
//! let mut engine = Engine::new(profile, image);
//! let task = engine.registry_mut().declare_struct(
//!     "task",
//!     4,
//!     vec![Member::new("pid", Type::base(BaseIdx::SignedInt), 0, 4)],
//! );
//!
//! let ptr = Value::reference(engine.profile(), task, 0x1000);
//! let pid = engine
//!     .member_access(&ptr, &MemberAccess::indirect("pid", SourceLocation::new(1, 1)))
//!     .unwrap();
//! assert_eq!(pid.as_i64().unwrap(), 42);
//! ```

pub mod interpreter;
pub mod memory;
pub mod target;
pub mod types;

pub use interpreter::engine::Engine;
pub use interpreter::errors::{ErrorKind, RuntimeError, SourceLocation};
pub use memory::{MemoryAccess, MemoryImage, Value};
pub use target::{ByteOrder, TargetProfile};
pub use types::{Type, TypeKind, TypeRegistry};
