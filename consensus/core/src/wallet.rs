use crate::Signature;
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use xdag_hashes::Hash;

/// The signing capability consumed from the wallet collaborator: key
/// storage and encryption-at-rest live elsewhere, the core only needs a
/// digest signer and its public key.
pub trait Signer {
    fn public_key(&self) -> PublicKey;

    /// Signs a 32-byte digest, returning the compact `r ‖ s` form.
    fn sign(&self, digest: Hash) -> Signature;
}

impl Signer for SecretKey {
    fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(SECP256K1, self)
    }

    fn sign(&self, digest: Hash) -> Signature {
        let message = Message::from_digest(*digest.as_bytes());
        SECP256K1.sign_ecdsa(&message, self).serialize_compact()
    }
}

/// Verifies a compact signature over a 32-byte digest. Malformed r/s
/// encodings verify as false rather than erroring: on the wire they are
/// indistinguishable from any other non-verifying signature.
pub fn verify(key: &PublicKey, digest: Hash, signature: &Signature) -> bool {
    let Ok(mut sig) = secp256k1::ecdsa::Signature::from_compact(signature) else {
        return false;
    };
    // Peers running other implementations may emit high-s signatures
    sig.normalize_s();
    let message = Message::from_digest(*digest.as_bytes());
    SECP256K1.verify_ecdsa(&message, &sig, key).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xdag_hashes::hash_twice;

    #[test]
    fn test_sign_verify_round_trip() {
        let (secret, public) = secp256k1::generate_keypair(&mut rand::thread_rng());
        let digest = hash_twice(b"message");
        let signature = secret.sign(digest);
        assert!(verify(&public, digest, &signature));
        assert!(!verify(&public, hash_twice(b"other message"), &signature));

        let (_, other_public) = secp256k1::generate_keypair(&mut rand::thread_rng());
        assert!(!verify(&other_public, digest, &signature));
    }

    #[test]
    fn test_garbage_signature_is_false() {
        let (_, public) = secp256k1::generate_keypair(&mut rand::thread_rng());
        let digest = hash_twice(b"message");
        assert!(!verify(&public, digest, &[0xffu8; 64]));
    }
}
