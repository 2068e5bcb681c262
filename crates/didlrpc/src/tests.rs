use crate::*;
use didlpack::Label;
use didlpack::Limits;
use didlpack::Principal;
use didlpack::TypeEnv;
use didlpack::Value;
use didlpack::WireType;
use num_bigint::BigInt;
use num_bigint::BigUint;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn fields() -> FieldMap {
    FieldMap::default()
}

fn infer(h: &Host) -> Result<String> {
    Ok(infer_type(h, &fields())?.to_string())
}

// ============================================================================
//  INFERENCE
// ============================================================================

#[test]
fn test_infer_scalars() -> Result<()> {
    assert_eq!(infer(&Host::from(true))?, "bool");
    assert_eq!(infer(&Host::from("hi"))?, "text");
    assert_eq!(infer(&Host::from(7u16))?, "nat16");
    assert_eq!(infer(&Host::from(-7i64))?, "int64");
    assert_eq!(infer(&Host::Nat(BigUint::from(1u32)))?, "nat");
    assert_eq!(infer(&Host::Int(BigInt::from(-1)))?, "int");
    assert_eq!(infer(&Host::from(1.5f64))?, "float64");
    assert_eq!(infer(&Host::Blob(vec![1, 2]))?, "vec nat8");
    assert_eq!(infer(&Host::Null)?, "null");
    assert_eq!(infer(&Host::Principal(Principal::anonymous()))?, "principal");
    assert_eq!(infer(&Host::Service(Principal::anonymous()))?, "service {}");
    Ok(())
}

#[test]
fn test_infer_optionals() -> Result<()> {
    assert_eq!(infer(&Host::none())?, "opt null");
    assert_eq!(infer(&Host::some("x"))?, "opt text");
    Ok(())
}

#[test]
fn test_infer_lists() -> Result<()> {
    assert_eq!(infer(&Host::List(vec![]))?, "vec empty");
    assert_eq!(infer(&Host::from(vec![Host::from(1u8), Host::from(2u8)]))?, "vec nat8");
    // An absent optional widens to the element type of its neighbours.
    let list = Host::from(vec![Host::none(), Host::some(1u8)]);
    assert_eq!(infer(&list)?, "vec opt nat8");
    let nested = Host::from(vec![Host::List(vec![]), Host::from(vec![Host::from("a")])]);
    assert_eq!(infer(&nested)?, "vec vec text");
    Ok(())
}

#[test]
fn test_infer_mixed_list_fails() {
    let list = Host::from(vec![Host::from(1u8), Host::from("a")]);
    let err = infer_type(&list, &fields()).unwrap_err();
    assert!(matches!(err, Error::UnknownValueType(_)));
}

#[test]
fn test_infer_record() -> Result<()> {
    let h = Host::map([("foo", Host::from("baz")), ("bar", Host::Int(BigInt::from(42)))]);
    assert_eq!(infer(&h)?, "record {4895187:int; 5097222:text}");
    Ok(())
}

#[test]
fn test_infer_variant_from_map() -> Result<()> {
    let h = Host::map([("ok", Host::some(1u8)), ("err", Host::none())]);
    assert_eq!(infer(&h)?, "variant {24860:nat8; 5048165:null}");

    // Two present optionals make a record of optionals instead.
    let h = Host::map([("ok", Host::some(1u8)), ("err", Host::some("x"))]);
    assert_eq!(infer(&h)?, "record {24860:opt nat8; 5048165:opt text}");
    Ok(())
}

#[test]
fn test_infer_tagged_choice() -> Result<()> {
    assert_eq!(infer(&Host::variant("ok", Host::Null))?, "variant {24860:null}");
    Ok(())
}

#[test]
fn test_infer_list_of_choices_merges_arms() -> Result<()> {
    let list = Host::from(vec![
        Host::variant("a", 1u8),
        Host::variant("b", Host::Null),
        Host::variant("a", 2u8),
    ]);
    assert_eq!(infer(&list)?, "vec variant {97:nat8; 98:null}");
    assert!(marshal(&[list]).is_ok());

    let clash = Host::from(vec![Host::variant("a", 1u8), Host::variant("a", "x")]);
    assert!(matches!(infer_type(&clash, &fields()), Err(Error::UnknownValueType(_))));
    Ok(())
}

#[test]
fn test_infer_func_fails() {
    let func = Host::Func(didlpack::FuncRef {
        principal: Principal::anonymous(),
        method: "greet".into(),
    });
    let err = infer_type(&func, &fields()).unwrap_err();
    assert!(matches!(err, Error::UnknownValueType(_)));
}

#[test]
fn test_infer_too_deep_fails() {
    let mut h = Host::Null;
    for _ in 0..100 {
        h = Host::some(h);
    }
    assert!(matches!(infer_type(&h, &fields()), Err(Error::UnknownValueType(_))));
}

// ============================================================================
//  ZERO VALUES
// ============================================================================

#[test]
fn test_zero_values() -> Result<()> {
    let env = TypeEnv::new();
    assert_eq!(zero_value(&WireType::bool(), &env)?, Value::Bool(false));
    assert_eq!(zero_value(&WireType::text(), &env)?, Value::Text(String::new()));
    assert_eq!(zero_value(&WireType::opt(WireType::nat()), &env)?, Value::none());
    assert_eq!(zero_value(&WireType::vec(WireType::nat8()), &env)?, Value::Blob(vec![]));
    assert_eq!(zero_value(&WireType::vec(WireType::text()), &env)?, Value::Vec(vec![]));
    assert_eq!(
        zero_value(&WireType::principal(), &env)?,
        Value::Principal(Principal::management())
    );

    let ty = WireType::record([("a", WireType::nat()), ("b", WireType::opt(WireType::text()))]);
    assert_eq!(
        zero_value(&ty, &env)?,
        Value::record([("a", Value::Nat(BigUint::default())), ("b", Value::none())])
    );
    Ok(())
}

#[test]
fn test_zero_empty_fails() {
    let err = zero_value(&WireType::empty(), &TypeEnv::new()).unwrap_err();
    assert_eq!(err, Error::UnknownType("empty".into()));
}

#[test]
fn test_zero_variant_skips_recursive_arm() -> Result<()> {
    let mut env = TypeEnv::new();
    let tree = env.define(|this| {
        WireType::variant([("a", WireType::vec(this)), ("b", WireType::null())])
    });
    assert_eq!(zero_value(&tree, &env)?, Value::variant("b", Value::Null));
    Ok(())
}

#[test]
fn test_zero_recursive_list() -> Result<()> {
    let mut env = TypeEnv::new();
    let list = env.define(|this| {
        WireType::record([("head", WireType::nat8()), ("tail", WireType::opt(this))])
    });
    let v = zero_value(&list, &env)?;
    assert_eq!(v.field("head"), Some(&Value::Nat8(0)));
    assert_eq!(v.field("tail"), Some(&Value::none()));
    Ok(())
}

// ============================================================================
//  FIELD MAPPING
// ============================================================================

#[test]
fn test_normalize() {
    assert_eq!(normalize("Foo"), "foo");
    assert_eq!(normalize("fooBar"), "fooBar");
    assert_eq!(normalize(""), "");
}

#[test]
fn test_field_map_labels() {
    let map = FieldMap::new().rename("userName", "name");
    assert_eq!(map.wire_label("userName"), Label::Named("name".into()));
    assert_eq!(map.wire_label("Foo").id(), 5097222);
    assert_eq!(map.wire_label("4895187"), Label::Id(4895187));

    assert_eq!(map.host_name(&Label::Id(1224700491)), "userName");
    assert_eq!(map.host_name(&Label::Named("bar".into())), "bar");
    assert_eq!(map.host_name(&Label::Id(4895187)), "4895187");
}

#[test]
fn test_field_map_declare() {
    let map = FieldMap::new().declare(["foo", "bar"]);
    assert_eq!(map.host_name(&Label::Id(5097222)), "foo");
    assert_eq!(map.host_name(&Label::Id(4895187)), "bar");
}

// ============================================================================
//  CONVERSION
// ============================================================================

#[test]
fn test_from_host_numbers() -> Result<()> {
    let env = TypeEnv::new();
    let f = fields();
    assert_eq!(from_host(&WireType::nat(), &Host::from(5u8), &env, &f)?, Value::Nat(BigUint::from(5u32)));
    assert_eq!(from_host(&WireType::int(), &Host::from(-5i32), &env, &f)?, Value::Int(BigInt::from(-5)));
    assert_eq!(from_host(&WireType::nat16(), &Host::from(300u32), &env, &f)?, Value::Nat16(300));
    assert_eq!(from_host(&WireType::float64(), &Host::from(0.5f32), &env, &f)?, Value::Float64(0.5));

    let err = from_host(&WireType::nat8(), &Host::from(300u16), &env, &f).unwrap_err();
    assert_eq!(err, Error::TypeMismatch { expected: "nat8".into(), found: "u16".into() });
    let err = from_host(&WireType::nat(), &Host::from(-1i32), &env, &f).unwrap_err();
    assert_eq!(err, Error::TypeMismatch { expected: "nat".into(), found: "i32".into() });
    Ok(())
}

#[test]
fn test_from_host_shape_mismatch() {
    let err = from_host(&WireType::text(), &Host::from(true), &TypeEnv::new(), &fields()).unwrap_err();
    assert_eq!(err, Error::TypeMismatch { expected: "text".into(), found: "bool".into() });
}

#[test]
fn test_from_host_opt() -> Result<()> {
    let env = TypeEnv::new();
    let ty = WireType::opt(WireType::text());
    assert_eq!(from_host(&ty, &Host::none(), &env, &fields())?, Value::none());
    assert_eq!(from_host(&ty, &Host::Null, &env, &fields())?, Value::none());
    let expected = Value::some(Value::Text("x".into()));
    assert_eq!(from_host(&ty, &Host::some("x"), &env, &fields())?, expected);
    assert_eq!(from_host(&ty, &Host::from("x"), &env, &fields())?, expected);
    Ok(())
}

#[test]
fn test_from_host_record_fields() -> Result<()> {
    let env = TypeEnv::new();
    let ty = WireType::record([
        ("name", WireType::text()),
        ("age", WireType::opt(WireType::nat8())),
    ]);

    let v = from_host(&ty, &Host::map([("Name", Host::from("al"))]), &env, &fields())?;
    assert_eq!(v.field("name"), Some(&Value::Text("al".into())));
    assert_eq!(v.field("age"), Some(&Value::none()));

    let err = from_host(&ty, &Host::map::<&str>([]), &env, &fields()).unwrap_err();
    assert_eq!(err, Error::MissingField("name".into()));

    let extra = Host::map([("name", Host::from("al")), ("email", Host::from("a@b"))]);
    let err = from_host(&ty, &extra, &env, &fields()).unwrap_err();
    assert_eq!(err, Error::UnknownField("email".into()));
    Ok(())
}

#[test]
fn test_from_host_rejects_keys_naming_one_field() {
    let ty = WireType::record([("foo", WireType::text())]);
    let h = Host::map([("Foo", Host::from("a")), ("foo", Host::from("b"))]);
    let err = from_host(&ty, &h, &TypeEnv::new(), &fields()).unwrap_err();
    assert_eq!(err, Error::DuplicateField("foo".into()));
}

#[test]
fn test_from_host_tuple() -> Result<()> {
    let ty = WireType::tuple([WireType::nat8(), WireType::text()]);
    let h = Host::from(vec![Host::from(1u8), Host::from("x")]);
    let v = from_host(&ty, &h, &TypeEnv::new(), &fields())?;
    assert_eq!(v, Value::tuple([Value::Nat8(1), Value::Text("x".into())]));
    assert_eq!(to_host(&ty, &v, &TypeEnv::new(), &fields())?, h);
    Ok(())
}

#[test]
fn test_from_host_variant() -> Result<()> {
    let env = TypeEnv::new();
    let ty = WireType::variant([("ok", WireType::nat8()), ("err", WireType::text())]);

    let v = from_host(&ty, &Host::variant("ok", 1u8), &env, &fields())?;
    assert_eq!(v, Value::variant("ok", Value::Nat8(1)));

    let map = Host::map([("ok", Host::none()), ("err", Host::some("bad"))]);
    assert_eq!(from_host(&ty, &map, &env, &fields())?, Value::variant("err", Value::Text("bad".into())));

    let err = from_host(&ty, &Host::variant("maybe", Host::Null), &env, &fields()).unwrap_err();
    assert_eq!(err, Error::UnknownVariant("maybe".into()));
    Ok(())
}

#[test]
fn test_from_host_variant_needs_one_arm() {
    let env = TypeEnv::new();
    let ty = WireType::variant([("ok", WireType::nat8()), ("err", WireType::text())]);

    let both = Host::map([("ok", Host::some(1u8)), ("err", Host::some("bad"))]);
    let err = from_host(&ty, &both, &env, &fields()).unwrap_err();
    assert_eq!(err, Error::AmbiguousVariant { populated: 2 });

    let neither = Host::map([("ok", Host::none()), ("err", Host::none())]);
    let err = from_host(&ty, &neither, &env, &fields()).unwrap_err();
    assert_eq!(err, Error::AmbiguousVariant { populated: 0 });
}

#[test]
fn test_from_host_variant_bare_tag() -> Result<()> {
    let ty = WireType::variant([("ok", WireType::null()), ("err", WireType::text())]);
    let v = from_host(&ty, &Host::from("ok"), &TypeEnv::new(), &fields())?;
    assert_eq!(v, Value::variant("ok", Value::Null));
    Ok(())
}

#[test]
fn test_to_host_mismatch() {
    let err = to_host(&WireType::text(), &Value::Bool(true), &TypeEnv::new(), &fields()).unwrap_err();
    assert_eq!(err, Error::TypeMismatch { expected: "text".into(), found: "bool".into() });
}

#[test]
fn test_to_host_shapes() -> Result<()> {
    let env = TypeEnv::new();
    let f = fields();
    assert_eq!(to_host(&WireType::nat16(), &Value::Nat16(9), &env, &f)?, Host::U16(9));
    assert_eq!(
        to_host(&WireType::vec(WireType::nat8()), &Value::Blob(vec![1]), &env, &f)?,
        Host::Blob(vec![1])
    );
    let ty = WireType::variant([("ok", WireType::null())]);
    assert_eq!(
        to_host(&ty, &Value::variant("ok", Value::Null), &env, &f)?,
        Host::variant("ok", Host::Null)
    );
    Ok(())
}

#[test]
fn test_to_host_fills_left_out_fields() -> Result<()> {
    let sent = WireType::record([("a", WireType::nat8())]);
    let bytes = didlpack::encode(&[sent], &[Value::record([("a", Value::Nat8(1))])])?;

    let declared = WireType::record([
        ("a", WireType::nat8()),
        ("b", WireType::opt(WireType::text())),
        ("c", WireType::null()),
        ("d", WireType::reserved()),
    ]);
    let env = TypeEnv::new();
    let out = unmarshal_typed(&bytes, &[declared], &env, &fields(), Limits::default())?;
    assert_eq!(
        out,
        vec![Host::map([
            ("a", Host::from(1u8)),
            ("b", Host::none()),
            ("c", Host::Null),
            ("d", Host::Reserved),
        ])]
    );

    let strict = WireType::record([("a", WireType::nat8()), ("e", WireType::text())]);
    let err = unmarshal_typed(&bytes, &[strict], &env, &fields(), Limits::default()).unwrap_err();
    assert_eq!(err, Error::MissingField("e".into()));
    Ok(())
}

// ============================================================================
//  MARSHALLING
// ============================================================================

#[test]
fn test_marshal_record() -> Result<()> {
    let h = Host::map([("foo", Host::from("baz")), ("bar", Host::Int(BigInt::from(42)))]);
    let bytes = marshal(&[h])?;
    assert_eq!(hex(&bytes), "4449444c016c02d3e3aa027c868eb7027101002a0362617a");

    // Without names, decoded fields are keyed by id.
    let out = unmarshal(&bytes)?;
    assert_eq!(
        out,
        vec![Host::map([
            ("4895187", Host::Int(BigInt::from(42))),
            ("5097222", Host::from("baz")),
        ])]
    );

    let named = FieldMap::new().declare(["foo", "bar"]);
    let out = unmarshal_with(&bytes, &named, Limits::default())?;
    assert_eq!(out[0].field("foo")?, &Host::from("baz"));
    assert_eq!(out[0].field("bar")?, &Host::Int(BigInt::from(42)));
    Ok(())
}

#[test]
fn test_marshal_nat64_zero() -> Result<()> {
    assert_eq!(hex(&marshal(&[Host::from(0u64)])?), "4449444c0001780000000000000000");
    Ok(())
}

#[test]
fn test_marshal_rename_round_trip() -> Result<()> {
    let map = FieldMap::new().rename("userName", "name");
    let h = Host::map([("userName", Host::from("al"))]);
    assert_eq!(
        infer_type(&h, &map)?.to_string(),
        "record {1224700491:text}"
    );
    let bytes = marshal_with(std::slice::from_ref(&h), &map)?;
    assert_eq!(unmarshal_with(&bytes, &map, Limits::default())?, vec![h]);
    Ok(())
}

#[test]
fn test_marshal_typed_too_few() {
    let err = marshal_typed(
        &[WireType::text(), WireType::nat()],
        &TypeEnv::new(),
        &[Host::from("x")],
        &fields(),
    )
    .unwrap_err();
    assert_eq!(err, Error::Codec(didlpack::Error::TooFewValues { types: 2, values: 1 }));
}

#[test]
fn test_marshal_typed_recursive() -> Result<()> {
    let mut env = TypeEnv::new();
    let list = env.define(|this| {
        WireType::record([("head", WireType::nat8()), ("tail", WireType::opt(this))])
    });
    let h = Host::map([
        ("head", Host::from(1u8)),
        ("tail", Host::some(Host::map([("head", Host::from(2u8))]))),
    ]);
    let bytes = marshal_typed(std::slice::from_ref(&list), &env, &[h], &fields())?;
    let out = unmarshal_typed(&bytes, &[list], &env, &fields(), Limits::default())?;

    let expected = Host::map([
        ("head", Host::from(1u8)),
        (
            "tail",
            Host::some(Host::map([("head", Host::from(2u8)), ("tail", Host::none())])),
        ),
    ]);
    assert_eq!(out, vec![expected]);
    Ok(())
}

#[test]
fn test_unmarshal_reports_codec_errors() {
    let err = unmarshal(&[]).unwrap_err();
    assert_eq!(err, Error::Codec(didlpack::Error::NoMagic(0)));
}
