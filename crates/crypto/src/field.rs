//! Conversions between integers, decimal strings and field elements.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use crate::error::CryptoError;

/// The BN254 scalar field order, as used by the contract and the circuits.
pub const SNARK_FIELD_SIZE: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// The field order as a big integer.
pub fn modulus() -> BigUint {
    BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
}

/// Reduce an arbitrary non-negative integer modulo the field order.
pub fn reduce(value: &BigUint) -> Fr {
    Fr::from_le_bytes_mod_order(&value.to_bytes_le())
}

/// Canonical integer representative of a field element.
pub fn to_biguint(value: &Fr) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Decimal representation, matching what the contract and circuit inputs use.
pub fn to_decimal(value: &Fr) -> String {
    to_biguint(value).to_str_radix(10)
}

/// Parse a canonical decimal field element.
///
/// Values `>= p` are rejected rather than reduced, so a malformed snapshot
/// cannot silently alias another value.
pub fn from_decimal(input: &str) -> Result<Fr, CryptoError> {
    let value = BigUint::parse_bytes(input.as_bytes(), 10)
        .ok_or_else(|| CryptoError::MalformedFieldElement(input.to_string()))?;
    if value >= modulus() {
        return Err(CryptoError::MalformedFieldElement(input.to_string()));
    }
    Ok(reduce(&value))
}
