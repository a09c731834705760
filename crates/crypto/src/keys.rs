//! BabyJubJub key pairs and Diffie-Hellman shared keys.
//!
//! BabyJubJub is the twisted Edwards curve whose base field is the BN254
//! scalar field, so public-key coordinates and shared keys are ordinary
//! `Fr` values that fit in tree leaves and circuit inputs.

use std::fmt;

use ark_bn254::Fr;
use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, Fr as Scalar};
use ark_ff::PrimeField;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha3::{Digest, Keccak512};

use crate::error::CryptoError;

/// Length of a serialized private key.
pub const PRIVATE_KEY_BYTES: usize = 32;

/// Raw private key material. The curve scalar is derived from it on demand.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey([u8; PRIVATE_KEY_BYTES]);

impl PrivateKey {
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; PRIVATE_KEY_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; PRIVATE_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PRIVATE_KEY_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(input: &str) -> Result<Self, CryptoError> {
        let decoded =
            hex::decode(input).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        let bytes: [u8; PRIVATE_KEY_BYTES] = decoded.try_into().map_err(|v: Vec<u8>| {
            CryptoError::InvalidPrivateKey(format!(
                "expected {} bytes, got {}",
                PRIVATE_KEY_BYTES,
                v.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Keccak-512 expansion of the key; the low half yields the signing
    /// scalar, the high half seeds signature nonces.
    pub(crate) fn expand(&self) -> [u8; 64] {
        let mut expanded = [0u8; 64];
        expanded.copy_from_slice(Keccak512::digest(self.0).as_slice());
        expanded
    }

    /// The clamped secret scalar.
    pub fn scalar(&self) -> Scalar {
        let expanded = self.expand();
        let mut head = [0u8; 32];
        head.copy_from_slice(&expanded[..32]);
        head[0] &= 0xF8;
        head[31] &= 0x7F;
        head[31] |= 0x40;
        Scalar::from_le_bytes_mod_order(&head)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey((EdwardsAffine::generator() * self.scalar()).into_affine())
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// A point of the prime-order subgroup of BabyJubJub.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey(EdwardsAffine);

impl PublicKey {
    /// Build a key from affine coordinates, rejecting the identity and points
    /// off the curve or outside the prime-order subgroup.
    pub fn from_coordinates(x: Fr, y: Fr) -> Result<Self, CryptoError> {
        let point = EdwardsAffine::new_unchecked(x, y);
        if point.is_zero()
            || !point.is_on_curve()
            || !point.is_in_correct_subgroup_assuming_on_curve()
        {
            return Err(CryptoError::InvalidPoint);
        }
        Ok(Self(point))
    }

    #[cfg(test)]
    pub(crate) fn from_point_unchecked(point: EdwardsAffine) -> Self {
        Self(point)
    }

    pub fn x(&self) -> Fr {
        self.0.x
    }

    pub fn y(&self) -> Fr {
        self.0.y
    }

    pub fn coordinates(&self) -> [Fr; 2] {
        [self.0.x, self.0.y]
    }

    pub fn point(&self) -> &EdwardsAffine {
        &self.0
    }
}

/// A private key with its public key.
#[derive(Clone, Debug)]
pub struct Keypair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl Keypair {
    pub fn new(private_key: PrivateKey) -> Self {
        let public_key = private_key.public_key();
        Self {
            private_key,
            public_key,
        }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(PrivateKey::random(rng))
    }
}

/// Fresh private key from the operating system RNG.
pub fn random_private_key() -> PrivateKey {
    PrivateKey::random(&mut OsRng)
}

pub fn private_to_public_key(private_key: &PrivateKey) -> PublicKey {
    private_key.public_key()
}

/// Shared key: x-coordinate of `scalar(sk) * pk`.
///
/// `ecdh(sk_a, pk_b) == ecdh(sk_b, pk_a)` for matching key pairs.
pub fn ecdh(private_key: &PrivateKey, public_key: &PublicKey) -> Fr {
    (public_key.0 * private_key.scalar()).into_affine().x
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_public_key_is_deterministic() {
        let sk = PrivateKey::from_bytes([7u8; 32]);
        assert_eq!(private_to_public_key(&sk), private_to_public_key(&sk));
    }

    #[test]
    fn test_public_key_is_valid_point() {
        let mut rng = StdRng::seed_from_u64(1);
        let pk = Keypair::random(&mut rng).public_key;
        let parsed = PublicKey::from_coordinates(pk.x(), pk.y()).unwrap();
        assert_eq!(parsed, pk);
    }

    #[test]
    fn test_rejects_point_off_curve() {
        let result = PublicKey::from_coordinates(Fr::from(1u64), Fr::from(1u64));
        assert_eq!(result, Err(CryptoError::InvalidPoint));
    }

    #[test]
    fn test_rejects_identity() {
        // (0, 1) is the neutral element; no private key maps to it.
        let result = PublicKey::from_coordinates(Fr::zero(), Fr::one());
        assert_eq!(result, Err(CryptoError::InvalidPoint));
    }

    #[test]
    fn test_ecdh_symmetric() {
        let mut rng = StdRng::seed_from_u64(2);
        let alice = Keypair::random(&mut rng);
        let bob = Keypair::random(&mut rng);

        let shared_ab = ecdh(&alice.private_key, &bob.public_key);
        let shared_ba = ecdh(&bob.private_key, &alice.public_key);
        assert_eq!(shared_ab, shared_ba);

        let carol = Keypair::random(&mut rng);
        assert_ne!(shared_ab, ecdh(&carol.private_key, &bob.public_key));
    }

    #[test]
    fn test_hex_roundtrip() {
        let sk = random_private_key();
        let parsed = PrivateKey::from_hex(&sk.to_hex()).unwrap();
        assert_eq!(parsed, sk);
        assert!(PrivateKey::from_hex("abcd").is_err());
        assert!(PrivateKey::from_hex("zz").is_err());
    }

    #[test]
    fn test_scalar_is_clamped_before_reduction() {
        let a = PrivateKey::from_bytes([0u8; 32]);
        let b = PrivateKey::from_bytes([1u8; 32]);
        assert_ne!(a.scalar(), b.scalar());
        assert!(!a.scalar().is_zero());
    }
}
