//! Leaf payload decryption in-circuit.

use accumulator_crypto::Ciphertext;
use ark_bn254::Fr;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use mimc7::mimc7_hash_var;

use crate::gadgets::multi_hash_var;

/// Circuit variable representation of a ciphertext.
#[derive(Clone)]
pub struct CiphertextVar {
    pub iv: FpVar<Fr>,
    pub data: Vec<FpVar<Fr>>,
}

impl CiphertextVar {
    pub fn new_witness(
        cs: ConstraintSystemRef<Fr>,
        ciphertext: &Ciphertext,
    ) -> Result<Self, SynthesisError> {
        let iv = FpVar::new_witness(cs.clone(), || Ok(ciphertext.iv()))?;
        let data = ciphertext
            .data()
            .iter()
            .map(|c| FpVar::new_witness(cs.clone(), || Ok(*c)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { iv, data })
    }

    /// `[iv, data...]`, the order leaf hashes are taken over.
    pub fn to_field_vars(&self) -> Vec<FpVar<Fr>> {
        let mut fields = Vec::with_capacity(self.data.len() + 1);
        fields.push(self.iv.clone());
        fields.extend(self.data.iter().cloned());
        fields
    }
}

/// Recover the plaintext and enforce that it hashes back to the iv, so a
/// wrong shared key leaves the system unsatisfied.
pub fn decrypt_var(
    ciphertext: &CiphertextVar,
    shared_key: &FpVar<Fr>,
) -> Result<Vec<FpVar<Fr>>, SynthesisError> {
    let plaintext = ciphertext
        .data
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let counter = &ciphertext.iv + FpVar::constant(Fr::from(i as u64));
            Ok(c - mimc7_hash_var(shared_key, &counter)?)
        })
        .collect::<Result<Vec<_>, SynthesisError>>()?;

    multi_hash_var(&plaintext)?.enforce_equal(&ciphertext.iv)?;
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use accumulator_crypto::{ecdh, encrypt, FieldHasher, Keypair, Mimc7};
    use ark_relations::r1cs::ConstraintSystem;
    use rand::{rngs::StdRng, SeedableRng};

    fn message() -> Vec<Fr> {
        [3u64, 4, 5, 32767].iter().map(|v| Fr::from(*v)).collect()
    }

    #[test]
    fn test_decrypt_var_recovers_plaintext() {
        let mut rng = StdRng::seed_from_u64(31);
        let sender = Keypair::random(&mut rng);
        let recipient = Keypair::random(&mut rng);
        let ciphertext = encrypt(&message(), &sender.private_key, &recipient.public_key);
        let shared = ecdh(&recipient.private_key, &sender.public_key);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let ct_var = CiphertextVar::new_witness(cs.clone(), &ciphertext).unwrap();
        let key_var = FpVar::new_witness(cs.clone(), || Ok(shared)).unwrap();

        let plaintext = decrypt_var(&ct_var, &key_var).unwrap();
        let values: Vec<Fr> = plaintext.iter().map(|p| p.value().unwrap()).collect();
        assert_eq!(values, message());
        assert!(cs.is_satisfied().unwrap());

        let leaf = multi_hash_var(&ct_var.to_field_vars()).unwrap();
        assert_eq!(
            leaf.value().unwrap(),
            Mimc7.hash_many(&ciphertext.to_fields())
        );
    }

    #[test]
    fn test_wrong_key_unsatisfied() {
        let mut rng = StdRng::seed_from_u64(32);
        let sender = Keypair::random(&mut rng);
        let recipient = Keypair::random(&mut rng);
        let outsider = Keypair::random(&mut rng);
        let ciphertext = encrypt(&message(), &sender.private_key, &recipient.public_key);
        let wrong = ecdh(&outsider.private_key, &sender.public_key);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let ct_var = CiphertextVar::new_witness(cs.clone(), &ciphertext).unwrap();
        let key_var = FpVar::new_witness(cs.clone(), || Ok(wrong)).unwrap();

        decrypt_var(&ct_var, &key_var).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
