//! MiMC-7 R1CS gadgets.
//!
//! Each round costs four multiplication constraints (`t^2`, `t^4`, `t^6`,
//! `t^7`), so one keyed hash costs `4 * ROUNDS` constraints when its inputs
//! are witnesses.

use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::constants::round_constants;

fn pow7_var(t: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let t2 = t.square()?;
    let t4 = t2.square()?;
    let t6 = &t4 * &t2;
    Ok(&t6 * t)
}

/// Keyed MiMC-7 permutation in-circuit.
pub fn mimc7_hash_var(x: &FpVar<Fr>, k: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let constants = round_constants();
    let mut r = pow7_var(&(x + k))?;
    for c in &constants[1..] {
        let t = &r + k + FpVar::constant(*c);
        r = pow7_var(&t)?;
    }
    Ok(&r + k)
}

/// Multi-input MiMC-7 in-circuit.
pub fn mimc7_multi_hash_var(
    values: &[FpVar<Fr>],
    key: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut r = key.clone();
    for value in values {
        let h = mimc7_hash_var(value, &r)?;
        r = &r + value + h;
    }
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ROUNDS;
    use crate::hash::{mimc7_hash, mimc7_multi_hash};
    use ark_ff::UniformRand;
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_hash_var_matches_native() {
        let x = Fr::from(32767u64);
        let k = Fr::from(1337u64);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let x_var = FpVar::new_witness(cs.clone(), || Ok(x)).unwrap();
        let k_var = FpVar::new_witness(cs.clone(), || Ok(k)).unwrap();

        let out = mimc7_hash_var(&x_var, &k_var).unwrap();
        assert_eq!(out.value().unwrap(), mimc7_hash(x, k));
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), 4 * ROUNDS);
    }

    #[test]
    fn test_multi_hash_var_matches_native() {
        let mut rng = StdRng::seed_from_u64(7);
        let values: Vec<Fr> = (0..5).map(|_| Fr::rand(&mut rng)).collect();

        let cs = ConstraintSystem::<Fr>::new_ref();
        let vars: Vec<FpVar<Fr>> = values
            .iter()
            .map(|v| FpVar::new_witness(cs.clone(), || Ok(*v)).unwrap())
            .collect();

        let out = mimc7_multi_hash_var(&vars, &FpVar::zero()).unwrap();
        let expected = mimc7_multi_hash(&values, Fr::from(0u64));

        let expected_var = FpVar::new_input(cs.clone(), || Ok(expected)).unwrap();
        out.enforce_equal(&expected_var).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_wrong_output_unsatisfied() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x_var = FpVar::new_witness(cs.clone(), || Ok(Fr::from(1u64))).unwrap();
        let out = mimc7_hash_var(&x_var, &FpVar::zero()).unwrap();

        let wrong = FpVar::new_input(cs.clone(), || Ok(Fr::from(2u64))).unwrap();
        out.enforce_equal(&wrong).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
