// Casts, implicit conversions and value ownership

use ctinspect::interpreter::engine::Engine;
use ctinspect::interpreter::errors::{ErrorKind, SourceLocation};
use ctinspect::memory::{MemoryImage, Value};
use ctinspect::target::{ByteOrder, TargetProfile};
use ctinspect::types::{BaseIdx, Keyword, Member, Type};
use pretty_assertions::assert_eq;

fn engine(word_size: usize) -> Engine<MemoryImage> {
    let profile = TargetProfile::new(word_size, true, ByteOrder::Little).expect("profile");
    Engine::new(profile, MemoryImage::new())
}

fn here() -> SourceLocation {
    SourceLocation::new(1, 1)
}

#[test]
fn test_cast_chain_unsigned_to_signed_byte() {
    let engine = engine(8);
    let v = Value::with_index(0xFFFF_FFFF, BaseIdx::UnsignedInt);
    assert_eq!(v.as_i64().unwrap(), 0xFFFF_FFFF);

    let v = engine
        .cast(v, &Type::base(BaseIdx::SignedInt), here())
        .unwrap();
    assert_eq!(v.as_i64().unwrap(), -1);

    let v = engine
        .cast(v, &Type::base(BaseIdx::SignedChar), here())
        .unwrap();
    assert_eq!(v.raw(), Some(0xFF));
    assert_eq!(v.as_i64().unwrap(), -1);
}

#[test]
fn test_long_width_follows_target() {
    let mut narrow = engine(4);
    let mut wide = engine(8);
    let t4 = narrow.base_type(&[Keyword::Unsigned, Keyword::Long]).unwrap();
    let t8 = wide.base_type(&[Keyword::Unsigned, Keyword::Long]).unwrap();
    assert_eq!(t4.size, 4);
    assert_eq!(t8.size, 8);

    // the same cast truncates on one target and not on the other
    let big = Value::with_index(0x1_0000_0001, BaseIdx::UnsignedLongLong);
    assert_eq!(narrow.cast(big.clone(), &t4, here()).unwrap().raw(), Some(1));
    assert_eq!(wide.cast(big, &t8, here()).unwrap().raw(), Some(0x1_0000_0001));
}

#[test]
fn test_keyword_matrix_warnings() {
    let mut engine = engine(4);
    let t = engine.base_type(&[Keyword::Short, Keyword::Long]).unwrap();
    assert_eq!(t.size, 2);
    assert_eq!(engine.diagnostics().warnings().len(), 1);

    let t = engine.base_type(&[Keyword::Long, Keyword::Long]).unwrap();
    assert_eq!(t.base_idx(), Some(BaseIdx::SignedLongLong));

    let t = engine.base_type(&[Keyword::Unsigned, Keyword::Char]).unwrap();
    assert_eq!(t.base_idx(), Some(BaseIdx::UnsignedChar));

    let err = engine
        .base_type(&[Keyword::Unsigned, Keyword::Signed])
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidSpecifierCombination);
}

#[test]
fn test_pointer_compatibility() {
    let mut engine = engine(8);
    let a = engine.registry_mut().declare_struct("A", 4, Vec::new());
    let b = engine.registry_mut().declare_struct("B", 4, Vec::new());
    let profile = *engine.profile();

    // void * into any pointer
    let mut dst = Value::reference(&profile, a.clone(), 0);
    let void_ptr = Value::reference(&profile, Type::void(), 0x1000);
    engine.check_and_convert(&mut dst, &void_ptr).unwrap();
    assert_eq!(dst.raw(), Some(0x1000));

    // struct B * into struct A *
    let mut dst = Value::reference(&profile, a.clone(), 0);
    let b_ptr = Value::reference(&profile, b, 0x2000);
    let err = engine.check_and_convert(&mut dst, &b_ptr).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidConversion);

    // literal 0 into any pointer keeps the pointer type
    let mut dst = Value::reference(&profile, a.clone(), 0x3000);
    engine
        .check_and_convert(&mut dst, &Value::with_index(0, BaseIdx::SignedInt))
        .unwrap();
    assert_eq!(dst.raw(), Some(0));
    assert!(dst.ty().is_ref());

    // but no other integer
    let err = engine
        .check_and_convert(&mut dst, &Value::with_index(4, BaseIdx::SignedInt))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::InvalidConversion);

    // int * into short * differ in pointee size
    let mut dst = Value::reference(&profile, Type::base(BaseIdx::SignedShort), 0);
    let src = Value::reference(&profile, Type::base(BaseIdx::SignedInt), 8);
    assert!(engine.check_and_convert(&mut dst, &src).is_err());
}

#[test]
fn test_redeclared_struct_is_compatible() {
    let mut engine = engine(8);
    let first = engine.registry_mut().declare_struct(
        "task",
        4,
        vec![Member::new("pid", Type::base(BaseIdx::SignedInt), 0, 4)],
    );
    let second = engine.registry_mut().declare_struct(
        "task",
        4,
        vec![Member::new("pid", Type::base(BaseIdx::SignedInt), 0, 4)],
    );
    let mut dst = Value::composite(first, vec![0; 4]);
    let src = Value::composite(second, vec![1, 0, 0, 0]);
    engine.check_and_convert(&mut dst, &src).unwrap();
    assert_eq!(dst.bytes().unwrap(), vec![1, 0, 0, 0]);

    // the copy is private to the destination
    src.local_buf().unwrap().borrow_mut()[0] = 5;
    assert_eq!(dst.bytes().unwrap()[0], 1);
}

#[test]
fn test_array_sharing_rules() {
    let ty = Type::base(BaseIdx::SignedInt).with_array(4);
    let arr = Value::array(ty.clone(), vec![0; 16]);

    // clone into a non-array destination shares the storage
    let mut dst = Value::with_index(0, BaseIdx::SignedInt);
    dst.assign(&arr).unwrap();
    assert!(dst.has_array());
    assert!(arr.array_refs() >= 2);

    arr.local_buf().unwrap().borrow_mut()[0] = 3;
    assert_eq!(dst.bytes().unwrap()[0], 3);

    // an array cannot replace another array
    let mut other = Value::array(ty, vec![0; 16]);
    let err = other.assign(&arr).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::ArrayOverride);

    drop(dst);
    assert_eq!(arr.array_refs(), 1);
}

#[test]
fn test_string_cast_and_conversion() {
    let engine = engine(8);
    let err = engine
        .cast(Value::with_index(1, BaseIdx::SignedInt), &Type::string(), here())
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot cast to a 'string' at line 1, column 1");

    let mut s = Value::string("old");
    engine.check_and_convert(&mut s, &Value::string("new")).unwrap();
    assert_eq!(s.as_str(), Some("new"));
}
