//! EdDSA over BabyJubJub with a MiMC-7 challenge.

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr as Scalar};
use ark_ff::{BigInteger, PrimeField};
use sha3::{Digest, Keccak512};

use crate::error::CryptoError;
use crate::hasher::multi_hash;
use crate::keys::{PrivateKey, PublicKey};

/// Signature `(R8, S)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r8: EdwardsAffine,
    pub s: Scalar,
}

fn challenge(r8: &EdwardsAffine, public_key: &EdwardsAffine, message_hash: Fr) -> Scalar {
    let hm = multi_hash(&[r8.x, r8.y, public_key.x, public_key.y, message_hash]);
    Scalar::from_le_bytes_mod_order(&hm.into_bigint().to_bytes_le())
}

/// Non-identity point of the prime-order subgroup.
fn is_valid_point(point: &EdwardsAffine) -> bool {
    !point.is_zero() && point.is_on_curve() && point.is_in_correct_subgroup_assuming_on_curve()
}

pub fn sign(private_key: &PrivateKey, message_hash: Fr) -> Signature {
    let expanded = private_key.expand();
    let secret = private_key.scalar();
    let public_key = private_key.public_key();

    let mut hasher = Keccak512::new();
    hasher.update(&expanded[32..]);
    hasher.update(message_hash.into_bigint().to_bytes_le());
    let nonce = Scalar::from_le_bytes_mod_order(hasher.finalize().as_slice());

    let r8 = (EdwardsAffine::generator() * nonce).into_affine();
    let hm = challenge(&r8, public_key.point(), message_hash);

    Signature {
        r8,
        s: nonce + hm * secret,
    }
}

/// Check `S * G == R8 + hm * A`. Malformed inputs yield `false`.
pub fn verify(public_key: &PublicKey, signature: &Signature, message_hash: Fr) -> bool {
    if !is_valid_point(&signature.r8) || !is_valid_point(public_key.point()) {
        return false;
    }

    let hm = challenge(&signature.r8, public_key.point(), message_hash);
    let lhs = EdwardsAffine::generator() * signature.s;
    let rhs = signature.r8.into_group() + *public_key.point() * hm;
    lhs == rhs
}

pub fn verify_checked(
    public_key: &PublicKey,
    signature: &Signature,
    message_hash: Fr,
) -> Result<(), CryptoError> {
    if verify(public_key, signature, message_hash) {
        Ok(())
    } else {
        Err(CryptoError::SignatureInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use ark_ff::One;
    use rand::{rngs::StdRng, SeedableRng};

    fn message_hash() -> Fr {
        let msg: Vec<Fr> = [3u64, 4, 5, 32767].iter().map(|v| Fr::from(*v)).collect();
        multi_hash(&msg)
    }

    #[test]
    fn test_sign_and_verify() {
        let mut rng = StdRng::seed_from_u64(5);
        let keypair = Keypair::random(&mut rng);
        let signature = sign(&keypair.private_key, message_hash());

        assert!(verify(&keypair.public_key, &signature, message_hash()));
        assert!(verify_checked(&keypair.public_key, &signature, message_hash()).is_ok());
    }

    #[test]
    fn test_signing_is_deterministic() {
        let keypair = Keypair::new(PrivateKey::from_bytes([9u8; 32]));
        assert_eq!(
            sign(&keypair.private_key, message_hash()),
            sign(&keypair.private_key, message_hash())
        );
    }

    #[test]
    fn test_wrong_public_key_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let signer = Keypair::random(&mut rng);
        let other = Keypair::random(&mut rng);
        let signature = sign(&signer.private_key, message_hash());

        assert!(!verify(&other.public_key, &signature, message_hash()));
        assert_eq!(
            verify_checked(&other.public_key, &signature, message_hash()),
            Err(CryptoError::SignatureInvalid)
        );
    }

    #[test]
    fn test_forged_identity_key_rejected() {
        // With A = identity the challenge term vanishes, so S = r, R8 = r*G
        // would satisfy the equation for any message.
        let identity = PublicKey::from_point_unchecked(EdwardsAffine::zero());
        let nonce = Scalar::from(123456789u64);
        let forged = Signature {
            r8: (EdwardsAffine::generator() * nonce).into_affine(),
            s: nonce,
        };

        for message in [Fr::one(), Fr::from(42u64), multi_hash(&[Fr::from(7u64)])] {
            assert!(!verify(&identity, &forged, message));
            assert_eq!(
                verify_checked(&identity, &forged, message),
                Err(CryptoError::SignatureInvalid)
            );
        }
    }

    #[test]
    fn test_identity_r8_rejected() {
        let mut rng = StdRng::seed_from_u64(11);
        let keypair = Keypair::random(&mut rng);
        let mut signature = sign(&keypair.private_key, message_hash());
        signature.r8 = EdwardsAffine::zero();

        assert!(!verify(&keypair.public_key, &signature, message_hash()));
    }

    #[test]
    fn test_replay_on_other_message_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        let keypair = Keypair::random(&mut rng);
        let signature = sign(&keypair.private_key, message_hash());

        assert!(!verify(&keypair.public_key, &signature, message_hash() + Fr::one()));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let mut rng = StdRng::seed_from_u64(9);
        let keypair = Keypair::random(&mut rng);
        let mut signature = sign(&keypair.private_key, message_hash());
        signature.s += Scalar::one();

        assert!(!verify(&keypair.public_key, &signature, message_hash()));
    }

    #[test]
    fn test_off_curve_r8_rejected() {
        let mut rng = StdRng::seed_from_u64(10);
        let keypair = Keypair::random(&mut rng);
        let mut signature = sign(&keypair.private_key, message_hash());
        signature.r8 = EdwardsAffine::new_unchecked(Fr::from(1u64), Fr::from(1u64));

        assert!(!verify(&keypair.public_key, &signature, message_hash()));
    }
}
