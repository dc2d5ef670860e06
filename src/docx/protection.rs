use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use sha2::{Digest, Sha512};

use super::model::PasswordHash;

pub const HASH_ALGORITHM: &str = "SHA-512";
pub const SPIN_COUNT: u32 = 100_000;
const SALT_LEN: usize = 16;

impl PasswordHash {
    /// Hashes `password` with a fresh random salt.
    pub fn new(password: &str) -> Self {
        let salt: [u8; SALT_LEN] = rand::thread_rng().r#gen();
        Self::with_salt(password, &salt, SPIN_COUNT)
    }

    pub fn with_salt(password: &str, salt: &[u8], spin_count: u32) -> Self {
        let hash = iterate_hash(password, salt, spin_count);
        Self {
            algorithm_name: HASH_ALGORITHM.to_string(),
            hash_value: STANDARD.encode(hash),
            salt_value: STANDARD.encode(salt),
            spin_count,
        }
    }

    pub fn matches(&self, password: &str) -> bool {
        if self.algorithm_name != HASH_ALGORITHM {
            return false;
        }
        let Ok(salt) = STANDARD.decode(self.salt_value.as_bytes()) else {
            return false;
        };
        STANDARD.encode(iterate_hash(password, &salt, self.spin_count)) == self.hash_value
    }
}

/// H0 = SHA-512(salt || UTF-16LE(password)); Hn = SHA-512(Hn-1 || n as u32 LE).
fn iterate_hash(password: &str, salt: &[u8], spin_count: u32) -> Vec<u8> {
    let encoded: Vec<u8> = password.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut hash = Sha512::new().chain_update(salt).chain_update(&encoded).finalize();
    for iteration in 0..spin_count {
        hash = Sha512::new()
            .chain_update(hash)
            .chain_update(iteration.to_le_bytes())
            .finalize();
    }
    hash.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_salt_same_hash() {
        let a = PasswordHash::with_salt("secret", b"0123456789abcdef", 10);
        let b = PasswordHash::with_salt("secret", b"0123456789abcdef", 10);
        assert_eq!(a, b);
        assert_eq!(a.algorithm_name, "SHA-512");
        assert_eq!(STANDARD.decode(&a.hash_value).expect("base64").len(), 64);
    }

    #[test]
    fn matches_only_the_original_password() {
        let hash = PasswordHash::with_salt("secret", b"saltsaltsaltsalt", 50);
        assert!(hash.matches("secret"));
        assert!(!hash.matches("Secret"));
    }

    #[test]
    fn fresh_salts_differ() {
        let a = PasswordHash::new("secret");
        let b = PasswordHash::new("secret");
        assert_ne!(a.salt_value, b.salt_value);
        assert_ne!(a.hash_value, b.hash_value);
        assert_eq!(a.spin_count, SPIN_COUNT);
    }
}
