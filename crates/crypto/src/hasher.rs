//! Pluggable multi-input hashing over the BN254 scalar field.

use std::fmt;
use std::sync::Arc;

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::Zero;
use mimc7::mimc7_multi_hash;

/// A deterministic, collision-resistant compression of field elements.
///
/// Inputs are `Fr` values and therefore already reduced modulo `p`; callers
/// holding raw integers go through [`crate::field::reduce`] first.
pub trait FieldHasher: Clone + fmt::Debug + Send + Sync {
    /// Compress an arbitrary number of elements into one.
    fn hash_many(&self, values: &[Fr]) -> Fr;

    /// Ordered pair hash; the tree relies on `H(a, b) != H(b, a)` to encode
    /// left/right position.
    fn hash_left_right(&self, left: Fr, right: Fr) -> Fr {
        self.hash_many(&[left, right])
    }
}

/// MiMC-7 multi-hash with a zero key, the hash shared with the verifier
/// contract and the circuits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Mimc7;

impl FieldHasher for Mimc7 {
    fn hash_many(&self, values: &[Fr]) -> Fr {
        mimc7_multi_hash(values, Fr::zero())
    }
}

/// `multiHash` with the canonical hasher.
pub fn multi_hash(values: &[Fr]) -> Fr {
    Mimc7.hash_many(values)
}

/// `hashLeftRight` with the canonical hasher.
pub fn hash_left_right(left: Fr, right: Fr) -> Fr {
    Mimc7.hash_left_right(left, right)
}

/// Poseidon sponge hasher (rate 2, capacity 1).
#[derive(Clone)]
pub struct Poseidon {
    config: Arc<PoseidonConfig<Fr>>,
}

impl Poseidon {
    pub fn new() -> Self {
        Self::with_config(poseidon_config())
    }

    pub fn with_config(config: PoseidonConfig<Fr>) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &PoseidonConfig<Fr> {
        &self.config
    }
}

impl Default for Poseidon {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Poseidon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poseidon")
            .field("full_rounds", &self.config.full_rounds)
            .field("partial_rounds", &self.config.partial_rounds)
            .finish_non_exhaustive()
    }
}

impl FieldHasher for Poseidon {
    fn hash_many(&self, values: &[Fr]) -> Fr {
        let inputs = values.to_vec();
        let mut sponge = PoseidonSponge::new(&self.config);
        sponge.absorb(&inputs);
        sponge.squeeze_field_elements::<Fr>(1)[0]
    }
}

/// Poseidon configuration for BN254.
/// Rate: 2, Capacity: 1, Full rounds: 8, Partial rounds: 57
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let full_rounds = 8;
    let partial_rounds = 57;
    let alpha = 5;
    let rate = 2;

    let (ark, mds) = generate_poseidon_parameters(rate, full_rounds, partial_rounds);

    PoseidonConfig::new(
        full_rounds,
        partial_rounds,
        alpha,
        mds,
        ark,
        rate,
        1, // capacity
    )
}

// Deterministic constants; a deployment pairing this hasher with a contract
// must load the contract's own table through `Poseidon::with_config`.
fn generate_poseidon_parameters(
    rate: usize,
    full_rounds: usize,
    partial_rounds: usize,
) -> (Vec<Vec<Fr>>, Vec<Vec<Fr>>) {
    let width = rate + 1;
    let total_rounds = full_rounds + partial_rounds;

    let ark = (0..total_rounds)
        .map(|round| {
            (0..width)
                .map(|i| {
                    let seed = ((round * width + i + 1) as u64).wrapping_mul(0x9e3779b97f4a7c15);
                    Fr::from(seed)
                })
                .collect()
        })
        .collect();

    let mds = (0..width)
        .map(|i| {
            (0..width)
                .map(|j| if i == j { Fr::from(2u64) } else { Fr::from(1u64) })
                .collect()
        })
        .collect();

    (ark, mds)
}
