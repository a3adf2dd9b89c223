//! Contract tests for the reference engine.
//!
//! The harness trusts these behaviors: key requirements, depth accounting,
//! slot layout, key switching, and context release.

use she_engine::reference::{
    Ciphertext, Fault, FaultPlan, ReferenceContext, ReferenceFactory, SecretKey,
};
use she_engine::{
    CiphertextOps, ContextFactory, CryptoContext, CryptoParams, EncodingTechnique, EngineError,
    KeySwitchTechnique, Metadata, MultiplicationTechnique, PlaintextValue, ScalingTechnique,
    SchemeFamily, SecretKeyDist, SecretKeyMaterial, SecurityLevel,
};

fn params(scheme: SchemeFamily, ring_dimension: usize, plaintext_modulus: u64) -> CryptoParams {
    CryptoParams {
        scheme,
        ring_dimension,
        multiplicative_depth: 2,
        scaling_mod_size: 59,
        digit_size: 4,
        batch_size: 16,
        secret_key_dist: SecretKeyDist::UniformTernary,
        max_relinearization_degree: 2,
        first_mod_size: 60,
        security_level: SecurityLevel::NotSet,
        key_switch_technique: KeySwitchTechnique::Bv,
        scaling_technique: ScalingTechnique::FixedManual,
        num_large_digits: 0,
        plaintext_modulus,
        standard_deviation: 3.19,
        eval_add_count: 0,
        eval_mult_count: 0,
        key_switch_count: 0,
        multiplication_technique: MultiplicationTechnique::HpsPOverQLeveled,
        encoding_technique: EncodingTechnique::Standard,
    }
}

fn context(p: &CryptoParams) -> ReferenceContext {
    ReferenceFactory::with_seed(7).generate_context(p).unwrap()
}

fn decrypt_packed(cc: &ReferenceContext, sk: &SecretKey, ct: &Ciphertext, len: usize) -> Vec<i64> {
    let mut pt = cc.decrypt(sk, ct).unwrap();
    pt.set_length(len);
    pt.packed_values().unwrap()
}

// ═══════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn rejects_non_power_of_two_ring() {
    let p = params(SchemeFamily::Bgvrns, 24, 65537);
    let err = ReferenceFactory::new().generate_context(&p).unwrap_err();
    assert!(matches!(err, EngineError::InvalidParameters(_)));
}

#[test]
fn rejects_ring_too_small_for_security_level() {
    let mut p = params(SchemeFamily::Bgvrns, 1024, 65537);
    p.security_level = SecurityLevel::Classic128;
    let err = ReferenceFactory::new().generate_context(&p).unwrap_err();
    assert!(err.to_string().contains("HEStd_128_classic"), "{err}");
}

#[test]
fn identical_parameters_reuse_live_context_until_release() {
    let factory = ReferenceFactory::with_seed(1);
    let p = params(SchemeFamily::Bgvrns, 256, 65537);
    let a = factory.generate_context(&p).unwrap();
    let kp = a.key_gen().unwrap();
    a.eval_at_index_key_gen(&kp.secret_key, &[1]).unwrap();

    let b = factory.generate_context(&p).unwrap();
    assert_eq!(a.id(), b.id());
    assert_eq!(b.eval_key_count(), 1, "cached context carries earlier keys");
    assert_eq!(factory.live_contexts(), 1);

    factory.release_all_contexts();
    assert!(a.is_released());
    assert_eq!(a.eval_key_count(), 0);
    assert_eq!(factory.live_contexts(), 0);
    assert!(matches!(a.key_gen(), Err(EngineError::ContextReleased)));

    let c = factory.generate_context(&p).unwrap();
    assert_ne!(c.id(), a.id());
    assert_eq!(c.eval_key_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════════
// Evaluation contracts
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn multiplication_needs_relinearization_key() {
    let cc = context(&params(SchemeFamily::Bgvrns, 256, 65537));
    let kp = cc.key_gen().unwrap();
    let pt = cc.make_packed_plaintext(&[1, 2, 3]).unwrap();
    let ct = cc.encrypt(&kp.public_key, &pt).unwrap();
    assert!(matches!(cc.eval_mult(&ct, &ct), Err(EngineError::MissingEvalKey(_))));

    cc.eval_mult_key_gen(&kp.secret_key).unwrap();
    let sq = cc.eval_mult(&ct, &ct).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &sq, 3), vec![1, 4, 9]);
    // plaintext multiplication needs no key
    assert!(cc.eval_mult_plain(&ct, &pt).is_ok());
}

#[test]
fn depth_is_enforced() {
    let mut p = params(SchemeFamily::Bfvrns, 256, 65537);
    p.multiplicative_depth = 1;
    let cc = context(&p);
    let kp = cc.key_gen().unwrap();
    cc.eval_mult_key_gen(&kp.secret_key).unwrap();
    let ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&[2]).unwrap())
        .unwrap();
    let sq = cc.eval_mult(&ct, &ct).unwrap();
    assert_eq!(ct.depth(), 0);
    assert_eq!(sq.depth(), 1);
    let err = cc.eval_mult(&sq, &ct).unwrap_err();
    assert_eq!(err, EngineError::DepthExhausted { needed: 2, limit: 1 });
}

#[test]
fn compound_operator_failure_is_reported() {
    let cc = context(&params(SchemeFamily::Bgvrns, 256, 65537));
    let kp = cc.key_gen().unwrap();
    let mut ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&[3]).unwrap())
        .unwrap();
    let other = ct.clone();
    let err = ct.mul_assign_op(&other).unwrap_err();
    assert!(matches!(err, EngineError::MissingEvalKey(_)));
    ct.add_assign_op(&other).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &ct, 1), vec![6]);
}

#[test]
fn rotation_needs_a_key_per_offset() {
    let cc = context(&params(SchemeFamily::Bgvrns, 256, 65537));
    let kp = cc.key_gen().unwrap();
    cc.eval_at_index_key_gen(&kp.secret_key, &[3]).unwrap();
    let input: Vec<i64> = (1..=16).collect();
    let ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&input).unwrap())
        .unwrap();
    let left = cc.eval_at_index(&ct, 3).unwrap();
    let expected: Vec<i64> = (4..=16).chain([0, 0, 0]).collect();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &left, 16), expected);
    assert!(matches!(cc.eval_at_index(&ct, -3), Err(EngineError::MissingEvalKey(_))));
    assert!(cc.eval_at_index(&ct, 0).is_ok());
}

#[test]
fn wrapped_rotation_fault_differs_from_zero_fill() {
    let factory =
        ReferenceFactory::with_seed(3).with_faults(FaultPlan::none().with(Fault::WrapRotations));
    let cc = factory
        .generate_context(&params(SchemeFamily::Bgvrns, 256, 65537))
        .unwrap();
    let kp = cc.key_gen().unwrap();
    cc.eval_at_index_key_gen(&kp.secret_key, &[3]).unwrap();
    let input: Vec<i64> = (1..=16).collect();
    let ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&input).unwrap())
        .unwrap();
    let left = cc.eval_at_index(&ct, 3).unwrap();
    assert_eq!(&decrypt_packed(&cc, &kp.secret_key, &left, 16)[13..], &[1, 2, 3]);
}

#[test]
fn summation_windows() {
    let mut p = params(SchemeFamily::Bfvrns, 1024, 65537);
    p.batch_size = 1024;
    let cc = context(&p);
    let kp = cc.key_gen().unwrap();
    let input: Vec<i64> = (0..1024).map(|i| (i % 8) as i64 + 1).collect();
    let ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&input).unwrap())
        .unwrap();
    assert!(matches!(cc.eval_sum(&ct, 2), Err(EngineError::MissingEvalKey(_))));
    cc.eval_sum_key_gen(&kp.secret_key).unwrap();

    let w1 = cc.eval_sum(&ct, 1).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &w1, 8), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    let w2 = cc.eval_sum(&ct, 2).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &w2, 8), vec![3, 5, 7, 9, 11, 13, 15, 9]);
    let all = cc.eval_sum(&ct, 1024).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &all, 4), vec![36 * 128; 4]);
    assert!(cc.eval_sum(&ct, 3).is_err());
    assert!(cc.eval_sum(&ct, 2048).is_err());
}

#[test]
fn merge_requires_negative_rotation_keys() {
    let cc = context(&params(SchemeFamily::Bgvrns, 256, 65537));
    let kp = cc.key_gen().unwrap();
    let cts: Vec<_> = [5, 6, 7]
        .iter()
        .map(|&v| {
            cc.encrypt(&kp.public_key, &cc.make_packed_plaintext(&[v, 0, 0]).unwrap())
                .unwrap()
        })
        .collect();
    assert!(matches!(cc.eval_merge(&cts), Err(EngineError::MissingEvalKey(_))));
    cc.eval_at_index_key_gen(&kp.secret_key, &[-1, -2]).unwrap();
    let err = cc.eval_merge(&cts).unwrap_err();
    assert!(matches!(&err, EngineError::MissingEvalKey(m) if m.contains("index -3")), "{err}");
    cc.eval_at_index_key_gen(&kp.secret_key, &[-3]).unwrap();
    let merged = cc.eval_merge(&cts).unwrap();
    assert_eq!(decrypt_packed(&cc, &kp.secret_key, &merged, 5), vec![5, 6, 7, 0, 0]);
}

#[test]
fn metadata_follows_left_operand() {
    let cc = context(&params(SchemeFamily::Bgvrns, 256, 65537));
    let kp = cc.key_gen().unwrap();
    let pt = cc.make_packed_plaintext(&[1]).unwrap();
    let mut a = cc.encrypt(&kp.public_key, &pt).unwrap();
    let mut b = a.clone();
    a.set_metadata("tag", "left");
    b.set_metadata("tag", "right");
    let sum = cc.eval_add(&a, &b).unwrap();
    assert_eq!(sum.metadata("tag"), Some("left"));
    let diff = cc.eval_sub(&b, &a).unwrap();
    assert_eq!(diff.metadata("tag"), Some("right"));
}

// ═══════════════════════════════════════════════════════════════════════
// Keys
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn key_switch_and_mod_reduce_round_trip() {
    let mut p = params(SchemeFamily::Bgvrns, 1024, 256);
    p.multiplicative_depth = 1;
    let cc = context(&p);
    let kp1 = cc.key_gen().unwrap();
    let mut kp2 = cc.key_gen().unwrap();
    let pt = cc.make_string_plaintext("round trip").unwrap();
    let ct = cc.encrypt(&kp1.public_key, &pt).unwrap();

    assert_ne!(kp1.secret_key.key_id(), kp2.secret_key.key_id());
    assert!(matches!(cc.decrypt(&kp2.secret_key, &ct), Err(EngineError::KeyMismatch(_))));
    let hint = cc.key_switch_gen(&kp1.secret_key, &kp2.secret_key).unwrap();
    // BV: ceil(59 / 4) digits per tower over two towers
    assert_eq!(hint.digits(), 30);
    let mut switched = cc.key_switch(&ct, &hint).unwrap();
    let text = cc.decrypt(&kp2.secret_key, &switched).unwrap().string_value().unwrap();
    assert_eq!(text, "round trip");

    cc.mod_reduce_in_place(&mut switched).unwrap();
    assert_eq!(switched.towers(), 1);
    kp2.secret_key.drop_last_element().unwrap();
    assert_eq!(kp2.secret_key.tower_count(), 1);
    let text = cc.decrypt(&kp2.secret_key, &switched).unwrap().string_value().unwrap();
    assert_eq!(text, "round trip");

    // a truncated key cannot open a full-tower ciphertext
    let full = cc.key_switch(&ct, &hint).unwrap();
    assert!(matches!(cc.decrypt(&kp2.secret_key, &full), Err(EngineError::KeyMismatch(_))));
}

#[test]
fn mod_reduce_is_noop_in_auto_modes_and_unsupported_for_bfv() {
    let mut p = params(SchemeFamily::Bgvrns, 256, 65537);
    p.scaling_technique = ScalingTechnique::FlexibleAuto;
    let cc = context(&p);
    let kp = cc.key_gen().unwrap();
    let mut ct = cc
        .encrypt(&kp.public_key, &cc.make_packed_plaintext(&[1]).unwrap())
        .unwrap();
    cc.mod_reduce_in_place(&mut ct).unwrap();
    assert_eq!(ct.towers(), 3);

    let bfv = context(&params(SchemeFamily::Bfvrns, 256, 65537));
    let kp = bfv.key_gen().unwrap();
    let mut ct = bfv
        .encrypt(&kp.public_key, &bfv.make_packed_plaintext(&[1]).unwrap())
        .unwrap();
    assert!(matches!(bfv.mod_reduce_in_place(&mut ct), Err(EngineError::Unsupported(_))));
}

#[test]
fn operands_from_different_contexts_are_rejected() {
    let factory = ReferenceFactory::with_seed(9);
    let a = factory.generate_context(&params(SchemeFamily::Bgvrns, 256, 65537)).unwrap();
    let b = factory.generate_context(&params(SchemeFamily::Bfvrns, 256, 65537)).unwrap();
    let kp = a.key_gen().unwrap();
    let ct = a
        .encrypt(&kp.public_key, &a.make_packed_plaintext(&[1]).unwrap())
        .unwrap();
    assert!(matches!(b.eval_add(&ct, &ct), Err(EngineError::KeyMismatch(_))));
    assert!(matches!(b.decrypt(&kp.secret_key, &ct), Err(EngineError::KeyMismatch(_))));
}
