// Integration tests for member access and write-back against target memory

use ctinspect::interpreter::engine::Engine;
use ctinspect::interpreter::errors::{ErrorKind, SourceLocation};
use ctinspect::interpreter::ops::MemberAccess;
use ctinspect::memory::{MemoryAccess, MemoryImage, Value};
use ctinspect::target::{ByteOrder, TargetProfile};
use ctinspect::types::{BaseIdx, Member, Type, TypeKind};
use pretty_assertions::assert_eq;

fn loc(line: usize) -> SourceLocation {
    SourceLocation::new(line, 1)
}

/// `struct S { unsigned a:3; int b; }` with `a` in bits 5..8 of byte 0
fn bitfield_engine() -> (Engine<MemoryImage>, Type) {
    let mut image = MemoryImage::new();
    let mut data = vec![0u8; 8];
    data[0] = 0b1010_0000;
    data[4..8].copy_from_slice(&1234i32.to_le_bytes());
    image.map(0x1000, data).expect("map");

    let profile = TargetProfile::new(8, true, ByteOrder::Little).expect("profile");
    let mut engine = Engine::new(profile, image);
    let s = engine.registry_mut().declare_struct(
        "S",
        8,
        vec![
            Member::bitfield("a", Type::base(BaseIdx::UnsignedInt), 0, 1, 3, 5),
            Member::new("b", Type::base(BaseIdx::SignedInt), 4, 4),
        ],
    );
    (engine, s)
}

#[test]
fn test_bitfield_read_write_through_pointer() {
    let (mut engine, s) = bitfield_engine();
    let p = Value::reference(engine.profile(), s, 0x1000);
    let access = MemberAccess::indirect("a", loc(1));

    let mut a = engine.member_access(&p, &access).expect("read a");
    assert_eq!(a.as_u64().unwrap(), 5);

    engine
        .store(&mut a, &Value::with_index(2, BaseIdx::SignedInt))
        .expect("store a");

    let a = engine.member_access(&p, &access).expect("re-read a");
    assert_eq!(a.as_u64().unwrap(), 2);

    // bits 0..5 untouched, field now 0b010
    assert_eq!(engine.memory().read(0x1000, 1).unwrap(), vec![0b0100_0000]);

    let b = engine
        .member_access(&p, &MemberAccess::indirect("b", loc(2)))
        .expect("read b");
    assert_eq!(b.as_i64().unwrap(), 1234);
}

#[test]
fn test_nested_struct_then_direct_access() {
    let mut image = MemoryImage::new();
    let mut data = vec![0u8; 16];
    data[8..12].copy_from_slice(&7u32.to_le_bytes());
    data[12..16].copy_from_slice(&9u32.to_le_bytes());
    image.map(0x2000, data).unwrap();

    let profile = TargetProfile::new(8, true, ByteOrder::Little).unwrap();
    let mut engine = Engine::new(profile, image);
    let point = engine.declare_packed_struct(
        "point",
        vec![
            ("x".to_string(), Type::base(BaseIdx::UnsignedInt)),
            ("y".to_string(), Type::base(BaseIdx::UnsignedInt)),
        ],
    )
    .unwrap();
    let outer = engine.registry_mut().declare_struct(
        "outer",
        16,
        vec![
            Member::new("id", Type::base(BaseIdx::UnsignedLongLong), 0, 8),
            Member::new("pos", point, 8, 8),
        ],
    );

    let p = Value::reference(engine.profile(), outer, 0x2000);
    let pos = engine
        .member_access(&p, &MemberAccess::indirect("pos", loc(1)))
        .unwrap();
    assert_eq!(pos.ty().kind, TypeKind::Struct);
    assert_eq!(pos.mem(), Some(0x2008));

    let mut y = engine
        .member_access(&pos, &MemberAccess::direct("y", loc(2)))
        .unwrap();
    assert_eq!(y.as_u64().unwrap(), 9);
    assert_eq!(y.mem(), Some(0x200c));

    // a member of a fetched copy writes both the copy and the target
    engine
        .store(&mut y, &Value::with_index(11, BaseIdx::UnsignedInt))
        .unwrap();
    assert_eq!(engine.memory().read(0x200c, 4).unwrap(), vec![11, 0, 0, 0]);
    assert_eq!(&pos.bytes().unwrap()[4..8], &[11, 0, 0, 0]);
}

#[test]
fn test_store_after_local_copy_dropped() {
    let (mut engine, s) = bitfield_engine();
    let bytes = engine.memory().read(0x1000, 8).unwrap();
    let mut local = Value::composite(s, bytes);
    local.set_mem_addr(0x1000);

    let mut b = engine
        .member_access(&local, &MemberAccess::direct("b", loc(1)))
        .unwrap();
    drop(local);

    // the blob is gone, target memory is still written
    engine
        .store(&mut b, &Value::with_index(-1i64 as u64, BaseIdx::SignedLongLong))
        .unwrap();
    assert_eq!(engine.memory().read(0x1004, 4).unwrap(), vec![0xFF; 4]);
}

#[test]
fn test_frozen_image_rejects_store() {
    let (engine, s) = bitfield_engine();
    let profile = *engine.profile();
    let registry = engine.registry().clone();
    let image = engine.into_memory().frozen();
    let mut engine = Engine::with_registry(profile, image, registry);

    let p = Value::reference(engine.profile(), s, 0x1000);
    let mut b = engine
        .member_access(&p, &MemberAccess::indirect("b", loc(1)))
        .unwrap();
    let err = engine
        .store(&mut b, &Value::with_index(1, BaseIdx::SignedInt))
        .unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Memory(_)));
}

#[test]
fn test_errors_reach_recovery_boundary() {
    let (mut engine, s) = bitfield_engine();
    let p = Value::reference(engine.profile(), s, 0x1000);

    let result = engine.recover(loc(10), |e| {
        e.member_access(&p, &MemberAccess::indirect("missing", loc(3)))
    });
    let err = result.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid member name specified : missing at line 3, column 1"
    );
    assert_eq!(engine.diagnostics().errors().len(), 1);
}

#[test]
fn test_parse_and_render_types() {
    let (mut engine, _) = bitfield_engine();
    let t = engine.parse_type("struct S **").unwrap();
    assert_eq!(engine.type_name(&t), "struct S **");

    let t = engine.parse_type("unsigned long").unwrap();
    assert_eq!(engine.type_name(&t), "unsigned long");
    assert_eq!(t.size, 8);

    let err = engine.parse_type("union U").unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::UnknownComposite {
            kind: TypeKind::Union,
            name: "U".to_string()
        }
    );
}
