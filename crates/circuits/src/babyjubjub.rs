//! BabyJubJub key derivation, ECDH and EdDSA verification in-circuit.
//!
//! Points are `EdwardsVar`s over the BN254 scalar field, so coordinates,
//! shared keys and message hashes are ordinary `FpVar<Fr>`s. Secret scalars
//! enter as little-endian witness bits; deriving them from private key bytes
//! (Keccak-512 expansion and clamping) happens outside the circuit.

use accumulator_crypto::{PublicKey, Signature};
use ark_bn254::Fr;
use ark_ec::AffineRepr;
use ark_ed_on_bn254::{constraints::EdwardsVar, EdwardsAffine, Fr as Scalar};
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{boolean::Boolean, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};

use crate::gadgets::multi_hash_var;

/// Bit length of a subgroup scalar.
pub const SCALAR_BITS: usize = Scalar::MODULUS_BIT_SIZE as usize;

/// Allocate `scalar` as `SCALAR_BITS` little-endian witness bits. `None`
/// allocates the same shape without an assignment.
pub fn scalar_bits_witness(
    cs: ConstraintSystemRef<Fr>,
    scalar: Option<Scalar>,
) -> Result<Vec<Boolean<Fr>>, SynthesisError> {
    let bits = scalar.map(|s| s.into_bigint().to_bits_le());
    (0..SCALAR_BITS)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                bits.as_ref()
                    .map(|b| b[i])
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

/// Allocate a public key as a witness point of the prime-order subgroup.
pub fn public_key_witness(
    cs: ConstraintSystemRef<Fr>,
    public_key: Option<&PublicKey>,
) -> Result<EdwardsVar, SynthesisError> {
    EdwardsVar::new_witness(cs, || {
        public_key
            .map(|pk| pk.point().into_group())
            .ok_or(SynthesisError::AssignmentMissing)
    })
}

fn generator() -> EdwardsVar {
    EdwardsVar::constant(EdwardsAffine::generator().into_group())
}

/// `scalar * G`, the public key of a secret scalar.
pub fn derive_public_key_var(scalar_bits: &[Boolean<Fr>]) -> Result<EdwardsVar, SynthesisError> {
    generator().scalar_mul_le(scalar_bits.iter())
}

/// Shared key: x-coordinate of `scalar * public_key`.
pub fn ecdh_var(
    scalar_bits: &[Boolean<Fr>],
    public_key: &EdwardsVar,
) -> Result<FpVar<Fr>, SynthesisError> {
    Ok(public_key.scalar_mul_le(scalar_bits.iter())?.x)
}

/// Circuit variable representation of a signature `(R8, S)`.
#[derive(Clone)]
pub struct SignatureVar {
    pub r8: EdwardsVar,
    /// `S` as little-endian bits
    pub s: Vec<Boolean<Fr>>,
}

impl SignatureVar {
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        signature: Option<&Signature>,
    ) -> Result<Self, SynthesisError> {
        let r8 = EdwardsVar::new_witness(cs.clone(), || {
            signature
                .map(|sig| sig.r8.into_group())
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let s = scalar_bits_witness(cs, signature.map(|sig| sig.s))?;
        Ok(Self { r8, s })
    }
}

/// `S * G == R8 + hm * A` with `hm = multiHash([R8.x, R8.y, A.x, A.y, M])`,
/// and neither `A` nor `R8` the identity.
///
/// The challenge is used with all of its bits; since `A` has prime order this
/// equals the native reduction of `hm` modulo the subgroup order.
pub fn verify_signature_var(
    public_key: &EdwardsVar,
    signature: &SignatureVar,
    message_hash: &FpVar<Fr>,
) -> Result<Boolean<Fr>, SynthesisError> {
    let hm = multi_hash_var(&[
        signature.r8.x.clone(),
        signature.r8.y.clone(),
        public_key.x.clone(),
        public_key.y.clone(),
        message_hash.clone(),
    ])?;
    let hm_bits = hm.to_bits_le()?;

    let lhs = generator().scalar_mul_le(signature.s.iter())?;
    let rhs = signature.r8.clone() + public_key.scalar_mul_le(hm_bits.iter())?;

    let identity = EdwardsVar::zero();
    Boolean::kary_and(&[
        lhs.is_eq(&rhs)?,
        public_key.is_neq(&identity)?,
        signature.r8.is_neq(&identity)?,
    ])
}
