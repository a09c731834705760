//! Keystream encryption of field-element messages.
//!
//! `iv = multiHash(message)` and `data[i] = message[i] + mimc7(key, iv + i)`.
//! The iv doubles as an integrity tag: after decryption the plaintext must
//! hash back to it.

use ark_bn254::Fr;
use mimc7::mimc7_hash;

use crate::error::CryptoError;
use crate::hasher::multi_hash;
use crate::keys::{ecdh, PrivateKey, PublicKey};

/// Encrypted message: the iv followed by one element per plaintext element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ciphertext {
    iv: Fr,
    data: Vec<Fr>,
}

impl Ciphertext {
    pub fn new(iv: Fr, data: Vec<Fr>) -> Self {
        Self { iv, data }
    }

    pub fn iv(&self) -> Fr {
        self.iv
    }

    pub fn data(&self) -> &[Fr] {
        &self.data
    }

    /// Flattened `[iv, data...]` form, as fed to circuits and leaf hashes.
    pub fn to_fields(&self) -> Vec<Fr> {
        let mut fields = Vec::with_capacity(self.data.len() + 1);
        fields.push(self.iv);
        fields.extend_from_slice(&self.data);
        fields
    }

    pub fn from_fields(fields: &[Fr]) -> Result<Self, CryptoError> {
        let (iv, data) = fields.split_first().ok_or(CryptoError::DecryptionFailure)?;
        Ok(Self::new(*iv, data.to_vec()))
    }
}

fn keystream(shared_key: Fr, iv: Fr, i: usize) -> Fr {
    mimc7_hash(shared_key, iv + Fr::from(i as u64))
}

/// Encrypt `message` to `recipient` with the key shared between `sender`
/// and `recipient`.
pub fn encrypt(message: &[Fr], sender: &PrivateKey, recipient: &PublicKey) -> Ciphertext {
    encrypt_with_key(message, ecdh(sender, recipient))
}

pub fn encrypt_with_key(message: &[Fr], shared_key: Fr) -> Ciphertext {
    let iv = multi_hash(message);
    let data = message
        .iter()
        .enumerate()
        .map(|(i, m)| *m + keystream(shared_key, iv, i))
        .collect();
    Ciphertext::new(iv, data)
}

/// Decrypt with a shared key; fails when the plaintext does not hash back to
/// the iv (wrong key or tampered ciphertext).
pub fn decrypt(ciphertext: &Ciphertext, shared_key: Fr) -> Result<Vec<Fr>, CryptoError> {
    let plaintext: Vec<Fr> = ciphertext
        .data
        .iter()
        .enumerate()
        .map(|(i, c)| *c - keystream(shared_key, ciphertext.iv, i))
        .collect();

    if multi_hash(&plaintext) != ciphertext.iv {
        return Err(CryptoError::DecryptionFailure);
    }
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use rand::{rngs::StdRng, SeedableRng};

    fn message() -> Vec<Fr> {
        [3u64, 4, 5, 32767].iter().map(|v| Fr::from(*v)).collect()
    }

    #[test]
    fn test_roundtrip_with_ecdh() {
        let mut rng = StdRng::seed_from_u64(11);
        let alice = Keypair::random(&mut rng);
        let bob = Keypair::random(&mut rng);

        let ciphertext = encrypt(&message(), &alice.private_key, &bob.public_key);
        let shared = ecdh(&bob.private_key, &alice.public_key);

        assert_eq!(decrypt(&ciphertext, shared).unwrap(), message());
    }

    #[test]
    fn test_ciphertext_hides_message() {
        let ciphertext = encrypt_with_key(&message(), Fr::from(42u64));
        assert_ne!(ciphertext.data(), message().as_slice());
        assert_eq!(ciphertext.data().len(), message().len());
    }

    #[test]
    fn test_wrong_key_fails() {
        let ciphertext = encrypt_with_key(&message(), Fr::from(42u64));
        assert_eq!(
            decrypt(&ciphertext, Fr::from(43u64)),
            Err(CryptoError::DecryptionFailure)
        );
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let ciphertext = encrypt_with_key(&message(), Fr::from(42u64));
        let mut fields = ciphertext.to_fields();
        fields[2] += Fr::from(1u64);
        let tampered = Ciphertext::from_fields(&fields).unwrap();
        assert!(decrypt(&tampered, Fr::from(42u64)).is_err());
    }

    #[test]
    fn test_empty_message() {
        let ciphertext = encrypt_with_key(&[], Fr::from(1u64));
        assert_eq!(ciphertext.to_fields().len(), 1);
        assert!(decrypt(&ciphertext, Fr::from(1u64)).unwrap().is_empty());
        assert!(Ciphertext::from_fields(&[]).is_err());
    }
}
