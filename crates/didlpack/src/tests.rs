use crate::*;
use num_bigint::BigInt;
use num_bigint::BigUint;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn unhex(s: &str) -> Vec<u8> {
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

fn roundtrip(ty: WireType, v: Value) -> Result<Message> {
    let bytes = encode(&[ty.clone()], &[v.clone()])?;
    let msg = decode(&bytes)?;
    assert_eq!(msg.types[0].to_string(), ty.to_string());
    assert_eq!(msg.values, vec![v]);
    Ok(msg)
}

// ============================================================================
//  WIRE VECTORS
// ============================================================================

#[test]
fn test_nat64_zero() -> Result<()> {
    let bytes = encode(&[WireType::nat64()], &[Value::Nat64(0)])?;
    assert_eq!(hex(&bytes), "4449444c0001780000000000000000");
    Ok(())
}

#[test]
fn test_record_fields_sorted_by_hash() -> Result<()> {
    let ty = WireType::record([("foo", WireType::text()), ("bar", WireType::int())]);
    let v = Value::record([
        ("foo", Value::Text("baz".into())),
        ("bar", Value::Int(BigInt::from(42))),
    ]);
    let bytes = encode(&[ty.clone()], &[v.clone()])?;
    assert_eq!(hex(&bytes), "4449444c016c02d3e3aa027c868eb7027101002a0362617a");
    assert_eq!(ty.to_string(), "record {4895187:int; 5097222:text}");

    let msg = decode(&bytes)?;
    assert_eq!(msg.values, vec![v]);
    Ok(())
}

#[test]
fn test_decode_opt_null_absent() -> Result<()> {
    let msg = decode(&unhex("4449444c016e7f010000"))?;
    assert_eq!(msg.types[0].to_string(), "opt null");
    assert_eq!(msg.values, vec![Value::none()]);
    Ok(())
}

#[test]
fn test_decode_opt_nat_present() -> Result<()> {
    let msg = decode(&unhex("4449444c016e7d01000101"))?;
    assert_eq!(msg.types[0].to_string(), "opt nat");
    assert_eq!(msg.values, vec![Value::some(Value::Nat(BigUint::from(1u32)))]);
    Ok(())
}

#[test]
fn test_variant_ok_roundtrip() -> Result<()> {
    let ty = WireType::variant([("ok", WireType::null())]);
    let msg = roundtrip(ty, Value::variant("ok", Value::Null))?;
    assert_eq!(msg.types[0].to_string(), "variant {24860:null}");
    Ok(())
}

#[test]
fn test_empty_input() {
    let err = decode(&[]).unwrap_err();
    assert_eq!(err, Error::NoMagic(0));
    assert!(err.is_format());
    assert!(err.to_string().contains("empty input"));
}

// ============================================================================
//  TYPE TABLE
// ============================================================================

#[test]
fn test_registration_is_idempotent() -> Result<()> {
    let env = TypeEnv::new();
    let mut table = TypeTable::new(&env);
    let nats = WireType::vec(WireType::nat());

    assert_eq!(table.register(&WireType::text())?, -15);
    assert_eq!(table.register(&nats)?, 0);
    assert_eq!(table.register(&WireType::vec(WireType::nat()))?, 0);
    assert_eq!(table.len(), 1);

    let rec = WireType::record([("a", nats.clone())]);
    assert_eq!(rec.describe(&mut table)?, 1);
    assert_eq!(rec.describe(&mut table)?, 1);
    assert_eq!(table.len(), 2);
    Ok(())
}

#[test]
fn test_subtypes_registered_first() -> Result<()> {
    let env = TypeEnv::new();
    let mut table = TypeTable::new(&env);
    let ty = WireType::opt(WireType::vec(WireType::bool()));
    assert_eq!(table.register(&ty)?, 1);

    let mut out = Vec::new();
    table.write_to(&mut out);
    assert_eq!(hex(&out), "026d7e6e00");
    Ok(())
}

#[test]
fn test_field_order_independent_of_insertion() {
    let a = WireType::record([("foo", WireType::text()), ("bar", WireType::int())]);
    let b = WireType::record([("bar", WireType::int()), ("foo", WireType::text())]);
    assert_eq!(a.to_string(), b.to_string());

    let TypeKind::Record(fields) = a.kind() else { panic!("not a record") };
    let ids: Vec<u32> = fields.iter().map(|f| f.label.id()).collect();
    assert_eq!(ids, vec![field_hash("bar"), field_hash("foo")]);
}

#[test]
fn test_duplicate_field_ids_rejected() {
    let ty = WireType::record([
        (Label::from("a"), WireType::nat()),
        (Label::Id(97), WireType::text()),
    ]);
    let err = encode(&[ty], &[Value::record([("a", Value::Nat(BigUint::from(1u32)))])]).unwrap_err();
    assert_eq!(err, Error::FieldOrder { previous: 97, next: 97 });
}

#[test]
fn test_service_method_must_be_func() {
    let ty = WireType::service([("m", WireType::nat())]);
    let err = encode(&[ty], &[Value::Service(Principal::anonymous())]).unwrap_err();
    assert_eq!(err, Error::NotAFunction("m".into()));
}

// ============================================================================
//  RECURSION
// ============================================================================

#[test]
fn test_recursive_list_roundtrip() -> Result<()> {
    let mut env = TypeEnv::new();
    let node = env.define(|this| WireType::record([("next", WireType::opt(this))]));
    let v = Value::record([(
        "next",
        Value::some(Value::record([("next", Value::none())])),
    )]);

    let bytes = encode_with_env(&env, &[node], &[v.clone()])?;
    let msg = decode(&bytes)?;
    assert_eq!(msg.types[0].to_string(), "record {1224901875:opt rec0}");
    assert_eq!(msg.values, vec![v]);

    let again = encode_with_env(&msg.env, &msg.types, &msg.values)?;
    assert_eq!(again, bytes);
    Ok(())
}

#[test]
fn test_forward_reference() -> Result<()> {
    let msg = decode(&unhex("4449444c026e016c00010000"))?;
    assert_eq!(msg.types[0].to_string(), "opt record {}");
    assert_eq!(msg.values, vec![Value::none()]);
    Ok(())
}

#[test]
fn test_unresolvable_cycle() {
    let err = decode(&unhex("4449444c016c0161000100")).unwrap_err();
    assert_eq!(err, Error::Unresolved(1));
    assert!(err.to_string().contains("failed to resolve all types"));
}

#[test]
fn test_mutual_recursion_through_variant() -> Result<()> {
    // 0: variant {a: 1; b: null}, 1: record {a: 0}
    let bytes = unhex("4449444c026b026101627f6c01610001000001");
    let msg = decode(&bytes)?;
    assert_eq!(msg.env.len(), 2);
    assert_eq!(
        msg.values[0],
        Value::variant("a", Value::record([("a", Value::variant("b", Value::Null))]))
    );
    Ok(())
}

/// A table where every record names the previous one twice: the unfolded type
/// doubles in size per level while the message grows linearly.
fn doubling_table(levels: usize) -> Vec<u8> {
    let mut bytes = encoder::MAGIC.to_vec();
    leb128::encode_u64(levels as u64 + 1, &mut bytes);
    for i in 0..levels {
        let child = if i == 0 { Opcode::Nat8.code() } else { i as i64 - 1 };
        leb128::encode_i64(Opcode::Record.code(), &mut bytes);
        leb128::encode_u64(2, &mut bytes);
        for id in 0..2 {
            leb128::encode_u64(id, &mut bytes);
            leb128::encode_i64(child, &mut bytes);
        }
    }
    leb128::encode_i64(Opcode::Opt.code(), &mut bytes);
    leb128::encode_i64(levels as i64 - 1, &mut bytes);
    leb128::encode_i64(1, &mut bytes);
    leb128::encode_i64(levels as i64, &mut bytes);
    bytes.push(0x00);
    bytes
}

#[test]
fn test_shared_subtrees_stay_linear() -> Result<()> {
    let bytes = doubling_table(40);
    let msg = decode(&bytes)?;

    let text = msg.types[0].to_string();
    assert!(text.starts_with("opt record {0:record {0:record {0:"));
    assert!(text.ends_with("..."));
    assert!(text.len() <= MAX_TYPE_TEXT_LEN + 3);

    let again = encode_with_env(&msg.env, &msg.types, &msg.values)?;
    assert_eq!(again, bytes);
    Ok(())
}

#[test]
fn test_equal_types_share_a_slot() -> Result<()> {
    let env = TypeEnv::new();
    let mut table = TypeTable::new(&env);
    let pair = |ty: WireType| WireType::record([("a", ty.clone()), ("b", ty)]);
    let a = pair(pair(WireType::opt(WireType::nat())));
    let b = pair(pair(WireType::opt(WireType::nat())));
    assert_eq!(table.register(&a)?, 2);
    assert_eq!(table.register(&b)?, 2);
    assert_eq!(table.len(), 3);
    Ok(())
}

// ============================================================================
//  VALUES
// ============================================================================

#[test]
fn test_numbers_roundtrip() -> Result<()> {
    roundtrip(WireType::nat(), Value::Nat(BigUint::from(u64::MAX) * BigUint::from(10u32)))?;
    roundtrip(WireType::int(), Value::Int(BigInt::from(i64::MIN) * BigInt::from(3)))?;
    roundtrip(WireType::int8(), Value::Int8(-128))?;
    roundtrip(WireType::nat16(), Value::Nat16(u16::MAX))?;
    roundtrip(WireType::int32(), Value::Int32(-7))?;
    roundtrip(WireType::float32(), Value::Float32(1.5))?;
    roundtrip(WireType::float64(), Value::Float64(-0.25))?;
    Ok(())
}

#[test]
fn test_blob_and_vec_nat8_agree() -> Result<()> {
    let ty = WireType::vec(WireType::nat8());
    let as_blob = encode(&[ty.clone()], &[Value::Blob(vec![1, 2, 3])])?;
    let as_vec = encode(
        &[ty],
        &[Value::Vec(vec![Value::Nat8(1), Value::Nat8(2), Value::Nat8(3)])],
    )?;
    assert_eq!(as_blob, as_vec);
    assert_eq!(decode(&as_vec)?.values, vec![Value::Blob(vec![1, 2, 3])]);
    Ok(())
}

#[test]
fn test_tuple_text_form() -> Result<()> {
    let ty = WireType::tuple([WireType::nat8(), WireType::text()]);
    assert_eq!(ty.to_string(), "record {0:nat8; 1:text}");
    roundtrip(ty, Value::tuple([Value::Nat8(7), Value::Text("x".into())]))?;
    Ok(())
}

#[test]
fn test_missing_opt_field_encodes_absent() -> Result<()> {
    let ty = WireType::record([("a", WireType::nat8()), ("b", WireType::opt(WireType::nat8()))]);
    let bytes = encode(&[ty], &[Value::record([("a", Value::Nat8(1))])])?;
    let msg = decode(&bytes)?;
    assert_eq!(msg.values[0].field("b"), Some(&Value::none()));
    Ok(())
}

#[test]
fn test_record_shape_errors() {
    let ty = WireType::record([("a", WireType::nat8())]);

    let err = encode(&[ty.clone()], &[Value::Record(Vec::new())]).unwrap_err();
    assert_eq!(err, Error::MissingField(Label::from("a")));
    assert_eq!(err.kind(), ErrorKind::EncodeValue);

    let extra = Value::record([("a", Value::Nat8(1)), ("b", Value::Nat8(2))]);
    let err = encode(&[ty.clone()], &[extra]).unwrap_err();
    assert_eq!(err, Error::UnexpectedField(Label::from("b")));

    let err = encode(&[ty], &[Value::Nat8(1)]).unwrap_err();
    assert!(matches!(err, Error::ValueMismatch { found: "nat8", .. }));
}

#[test]
fn test_unknown_variant_arm() {
    let ty = WireType::variant([("ok", WireType::null())]);
    let err = encode(&[ty], &[Value::variant("err", Value::Null)]).unwrap_err();
    assert_eq!(err, Error::UnknownVariantArm(Label::from("err")));
}

#[test]
fn test_value_count() -> Result<()> {
    let err = encode(&[WireType::nat8(), WireType::nat8()], &[Value::Nat8(1)]).unwrap_err();
    assert_eq!(err, Error::TooFewValues { types: 2, values: 1 });

    let one = encode(&[WireType::nat8()], &[Value::Nat8(1)])?;
    let extra = encode(&[WireType::nat8()], &[Value::Nat8(1), Value::Nat8(2)])?;
    assert_eq!(one, extra);
    Ok(())
}

#[test]
fn test_empty_has_no_values() {
    let err = encode(&[WireType::empty()], &[Value::Null]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodeValue);

    let err = decode(&unhex("4449444c000171")).unwrap_err();
    assert_eq!(err, Error::UnexpectedEnd);
    let err = decode(&unhex("4449444c00016f")).unwrap_err();
    assert_eq!(err, Error::EmptyValue);
}

#[test]
fn test_references_roundtrip() -> Result<()> {
    let canister = Principal::from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x30, 0x00, 0x01, 0x01, 0x01])?;
    roundtrip(WireType::principal(), Value::Principal(canister.clone()))?;

    let greet = WireType::func(vec![WireType::text()], vec![WireType::nat()], vec![Mode::Query]);
    assert_eq!(greet.to_string(), "func (text) -> (nat) query");
    roundtrip(
        greet.clone(),
        Value::Func(FuncRef { principal: canister.clone(), method: "greet".into() }),
    )?;

    let service = WireType::service([("greet", greet)]);
    assert_eq!(service.to_string(), "service {\"greet\":func (text) -> (nat) query}");
    roundtrip(service, Value::Service(canister))?;
    Ok(())
}

#[test]
fn test_principal_too_long() {
    assert!(Principal::from_slice(&[0xab; 29]).is_ok());
    assert_eq!(Principal::from_slice(&[0xab; 30]), Err(Error::PrincipalTooLong(30)));
}

// ============================================================================
//  MALFORMED INPUT
// ============================================================================

#[test]
fn test_wrong_magic() {
    assert_eq!(decode(b"DIDM\x00\x00"), Err(Error::WrongMagic(*b"DIDM")));
    assert_eq!(decode(b"DID"), Err(Error::NoMagic(3)));
}

#[test]
fn test_trailing_bytes() {
    let mut bytes = unhex("4449444c0001780000000000000000");
    bytes.push(0x00);
    let err = decode(&bytes).unwrap_err();
    assert_eq!(err, Error::TrailingBytes(1));
    assert!(err.to_string().contains("too long"));
}

#[test]
fn test_truncated_value() {
    assert_eq!(decode(&unhex("4449444c00017800")), Err(Error::UnexpectedEnd));
}

#[test]
fn test_invalid_opcodes() {
    // A primitive opcode cannot open a table entry.
    assert_eq!(decode(&unhex("4449444c017f0000")), Err(Error::InvalidOpcode(-1)));
    // -30 is outside the opcode range.
    assert_eq!(decode(&unhex("4449444c000162")), Err(Error::InvalidOpcode(-30)));
    assert_eq!(decode(&unhex("4449444c000105")), Err(Error::TypeIndexOutOfRange(5)));
    assert_eq!(decode(&unhex("4449444c016e050100")), Err(Error::TypeIndexOutOfRange(5)));
}

#[test]
fn test_field_order_violation() {
    // record {98: nat; 97: nat}
    let err = decode(&unhex("4449444c016c02627d617d0100")).unwrap_err();
    assert_eq!(err, Error::FieldOrder { previous: 98, next: 97 });
}

#[test]
fn test_invalid_tags() {
    assert_eq!(decode(&unhex("4449444c00017e02")), Err(Error::InvalidBool(2)));
    assert_eq!(decode(&unhex("4449444c016e7e010002")), Err(Error::InvalidOptTag(2)));
    assert_eq!(decode(&unhex("4449444c00017101ff")), Err(Error::InvalidUtf8));
    assert_eq!(decode(&unhex("4449444c00016800")), Err(Error::InvalidReferenceTag(0)));
}

#[test]
fn test_invalid_discriminant() -> Result<()> {
    let ty = WireType::variant([("ok", WireType::null())]);
    let mut bytes = encode(&[ty], &[Value::variant("ok", Value::Null)])?;
    if let Some(last) = bytes.last_mut() {
        *last = 0x05;
    }
    assert_eq!(decode(&bytes), Err(Error::InvalidDiscriminant { index: 5, arms: 1 }));
    Ok(())
}

// ============================================================================
//  LIMITS
// ============================================================================

fn nested_opt(depth: usize) -> (WireType, Value) {
    let mut ty = WireType::nat8();
    let mut v = Value::Nat8(9);
    for _ in 0..depth {
        ty = WireType::opt(ty);
        v = Value::some(v);
    }
    (ty, v)
}

#[test]
fn test_depth_limit() -> Result<()> {
    let (ty, v) = nested_opt(70);
    let err = encode(&[ty.clone()], &[v.clone()]).unwrap_err();
    assert_eq!(err, Error::LimitExceeded(Limit::Depth));

    let env = TypeEnv::new();
    let mut enc = Encoder::with_limits(&env, Limits::default().with_max_depth(100));
    enc.message(&[ty], &[v])?;
    let bytes = enc.into_bytes();
    assert_eq!(decode(&bytes), Err(Error::LimitExceeded(Limit::Depth)));
    assert!(decode_with_limits(&bytes, Limits::default().with_max_depth(100)).is_ok());
    Ok(())
}

#[test]
fn test_value_count_limit() {
    // vec null with 5000 elements and no element bytes.
    let bytes = unhex("4449444c016d7f01008827");
    let limits = Limits::default().with_max_values(1000);
    let err = decode_with_limits(&bytes, limits).unwrap_err();
    assert_eq!(err, Error::LimitExceeded(Limit::Values));
}

#[test]
fn test_resolve_pass_limit() -> Result<()> {
    // Each slot names the next, so one slot resolves per pass.
    let bytes = unhex("4449444c036e016e026e7d010000");
    let msg = decode(&bytes)?;
    assert_eq!(msg.types[0].to_string(), "opt opt opt nat");

    let limits = Limits::default().with_max_resolve_passes(2);
    let err = decode_with_limits(&bytes, limits).unwrap_err();
    assert_eq!(err, Error::LimitExceeded(Limit::ResolvePasses));
    assert!(err.is_format());
    Ok(())
}

#[test]
fn test_size_limits() {
    let bytes = unhex("4449444c026e7d6e7e0101");
    let limits = Limits::default().with_max_table_len(1);
    assert_eq!(decode_with_limits(&bytes, limits), Err(Error::LimitExceeded(Limit::TableLen)));

    let limits = Limits::default().with_max_message_len(4);
    assert_eq!(decode_with_limits(&bytes, limits), Err(Error::LimitExceeded(Limit::MessageLen)));

    let limits = Limits::default().with_max_args(0);
    assert_eq!(
        decode_with_limits(&unhex("4449444c00017f"), limits),
        Err(Error::LimitExceeded(Limit::Args))
    );
}
