//! Payment integrity verifier
//!
//! A gateway callback is adversarial input until its HMAC-SHA256 signature
//! over `"{order_id}|{payment_id}"` checks out. This module only answers
//! "is this authentic"; recording the payment is the caller's job.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn signing_payload(order_id: &str, payment_id: &str) -> String {
    format!("{order_id}|{payment_id}")
}

fn mac(order_id: &str, payment_id: &str, secret: &str) -> Result<HmacSha256, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(signing_payload(order_id, payment_id).as_bytes());
    Ok(mac)
}

/// Hex-encoded signature the gateway is expected to send
pub fn sign(order_id: &str, payment_id: &str, secret: &str) -> Result<String, InvalidLength> {
    let mac = mac(order_id, payment_id, secret)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Length of a hex-encoded HMAC-SHA256 digest
const SIGNATURE_LEN: usize = 64;

/// Only the exact form [`sign`] produces is accepted: 64 lowercase hex digits
fn is_canonical_hex(signature: &str) -> bool {
    signature.len() == SIGNATURE_LEN
        && signature
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Constant-time check of `signature` (hex) against the expected HMAC
///
/// Mismatch, upper-case or padded hex, and a wrong-length signature are all
/// plain `false`.
pub fn verify(order_id: &str, payment_id: &str, signature: &str, secret: &str) -> bool {
    if !is_canonical_hex(signature) {
        return false;
    }
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    match mac(order_id, payment_id, secret) {
        Ok(mac) => mac.verify_slice(&sig_bytes).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_key_secret";

    /// Replace the character at `idx` with a different one from the same alphabet
    fn mutate(s: &str, idx: usize) -> String {
        s.char_indices()
            .map(|(i, c)| {
                if i != idx {
                    c
                } else if c == '0' {
                    '1'
                } else if c.is_ascii_hexdigit() && c != 'f' {
                    'f'
                } else {
                    '0'
                }
            })
            .collect()
    }

    #[test]
    fn bad_signature_is_false() {
        assert!(!verify("order_1", "pay_1", "badsig", SECRET));
    }

    #[test]
    fn genuine_signature_is_true() {
        let sig = sign("order_1", "pay_1", SECRET).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify("order_1", "pay_1", &sig, SECRET));
    }

    #[test]
    fn case_altered_signature_is_false() {
        let sig = sign("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1", "pay_1", &sig.to_uppercase(), SECRET));

        let (idx, c) = sig
            .char_indices()
            .find(|(_, c)| c.is_ascii_lowercase())
            .unwrap();
        let mut flipped = sig.clone();
        flipped.replace_range(idx..idx + 1, &c.to_ascii_uppercase().to_string());
        assert_ne!(flipped, sig);
        assert!(!verify("order_1", "pay_1", &flipped, SECRET));
    }

    #[test]
    fn padded_signature_is_false() {
        let sig = sign("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1", "pay_1", &format!(" {sig}"), SECRET));
        assert!(!verify("order_1", "pay_1", &format!("{sig}\n"), SECRET));
        assert!(!verify("order_1", "pay_1", &format!("{sig}00"), SECRET));
    }

    #[test]
    fn wrong_secret_is_false() {
        let sig = sign("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1", "pay_1", &sig, "other_secret"));
    }

    #[test]
    fn any_single_character_mutation_flips_the_result() {
        let order_id = "order_Nk3Xz9";
        let payment_id = "pay_Qm28Lp";
        let sig = sign(order_id, payment_id, SECRET).unwrap();

        for i in 0..order_id.len() {
            assert!(!verify(&mutate(order_id, i), payment_id, &sig, SECRET), "order_id[{i}]");
        }
        for i in 0..payment_id.len() {
            assert!(!verify(order_id, &mutate(payment_id, i), &sig, SECRET), "payment_id[{i}]");
        }
        for i in 0..sig.len() {
            assert!(!verify(order_id, payment_id, &mutate(&sig, i), SECRET), "signature[{i}]");
            let upper: String = sig
                .char_indices()
                .map(|(j, c)| if j == i { c.to_ascii_uppercase() } else { c })
                .collect();
            if upper != sig {
                assert!(!verify(order_id, payment_id, &upper, SECRET), "signature[{i}] case");
            }
        }
    }

    #[test]
    fn separator_is_part_of_the_payload() {
        let sig = sign("order_1", "pay_1", SECRET).unwrap();
        assert!(!verify("order_1|", "pay_1", &sig, SECRET));
        assert!(!verify("order_", "1|pay_1", &sig, SECRET));
        assert!(!verify("", "", "", SECRET));
    }
}
