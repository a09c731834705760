//! Native MiMC-7 evaluation.

use ark_bn254::Fr;
use ark_ff::Field;

use crate::constants::round_constants;

#[inline]
fn pow7(t: Fr) -> Fr {
    let t2 = t.square();
    let t4 = t2.square();
    t4 * t2 * t
}

/// Keyed MiMC-7 permutation.
///
/// Round 0 computes `(x + k)^7`, every later round `(r + k + c[i])^7`; the
/// output is `r + k`.
pub fn mimc7_hash(x: Fr, k: Fr) -> Fr {
    let constants = round_constants();
    let mut r = pow7(x + k);
    for c in &constants[1..] {
        r = pow7(r + k + c);
    }
    r + k
}

/// Multi-input MiMC-7: `r = key; r = r + a + mimc7_hash(a, r)` for each `a`.
pub fn mimc7_multi_hash(values: &[Fr], key: Fr) -> Fr {
    values
        .iter()
        .fold(key, |r, value| r + value + mimc7_hash(*value, r))
}
