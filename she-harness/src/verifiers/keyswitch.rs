//! Key switching, with and without a following modulus reduction.

use she_engine::{CryptoContext, EngineResult, PlaintextValue, SecretKeyMaterial};

use crate::checks::CheckLog;

/// String message; 31 bytes so it fits one coefficient per byte.
pub const MESSAGE: &str = "I am good, what are you?! 32 ch";

fn decrypt_text<C: CryptoContext>(
    cc: &C,
    sk: &C::SecretKey,
    ct: &C::Ciphertext,
    len: usize,
) -> EngineResult<String> {
    let mut pt = cc.decrypt(sk, ct)?;
    pt.set_length(len);
    pt.string_value()
}

/// Encrypt under one key, switch to a second key, decrypt under the second.
pub fn verify_key_switch<C: CryptoContext>(cc: &C, log: &mut CheckLog) -> EngineResult<()> {
    let pt = cc.make_string_plaintext(MESSAGE)?;
    let kp1 = cc.key_gen()?;
    let ct = cc.encrypt(&kp1.public_key, &pt)?;

    let kp2 = cc.key_gen()?;
    let hint = cc.key_switch_gen(&kp1.secret_key, &kp2.secret_key)?;
    let switched = cc.key_switch(&ct, &hint)?;

    let text = decrypt_text(cc, &kp2.secret_key, &switched, pt.len())?;
    log.expect_text("KeySwitch", &pt.string_value()?, &text);
    Ok(())
}

/// Key switch, drop a modulus tower, and drop the matching key tower.
pub fn verify_key_switch_mod_reduce<C: CryptoContext>(
    cc: &C,
    log: &mut CheckLog,
) -> EngineResult<()> {
    let pt = cc.make_string_plaintext(MESSAGE)?;
    let kp1 = cc.key_gen()?;
    let ct = cc.encrypt(&kp1.public_key, &pt)?;

    let kp2 = cc.key_gen()?;
    let hint = cc.key_switch_gen(&kp1.secret_key, &kp2.secret_key)?;
    let mut switched = cc.key_switch(&ct, &hint)?;

    let original = pt.string_value()?;
    let text = decrypt_text(cc, &kp2.secret_key, &switched, pt.len())?;
    log.expect_text("KeySwitch", &original, &text);

    cc.mod_reduce_in_place(&mut switched)?;
    let mut sk2 = kp2.secret_key.clone();
    sk2.drop_last_element()?;
    let text = decrypt_text(cc, &sk2, &switched, pt.len())?;
    log.expect_text("KeySwitch + ModReduce", &original, &text);
    Ok(())
}
