//! Secret strength validation
//!
//! Rejects weak session-signing secrets at start-up instead of signing
//! tokens with them.

use crate::jwt::MIN_SECRET_LENGTH;

const RECOMMENDED_SECRET_LENGTH: usize = 64;
const MIN_ENTROPY_BITS_PER_BYTE: f64 = 3.5;

/// Secret strength classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrength {
    /// Refuse to start
    Weak,
    /// Usable, log a warning
    Acceptable,
    Strong,
}

/// Classify a secret by length, Shannon entropy and obvious patterns
pub fn validate_secret_strength(secret: &str) -> SecretStrength {
    let bytes = secret.as_bytes();

    if bytes.len() < MIN_SECRET_LENGTH {
        return SecretStrength::Weak;
    }

    let entropy = shannon_entropy(bytes);
    if entropy < MIN_ENTROPY_BITS_PER_BYTE || is_single_repeated_byte(bytes) {
        return SecretStrength::Weak;
    }

    if bytes.len() >= RECOMMENDED_SECRET_LENGTH && entropy >= 4.5 {
        SecretStrength::Strong
    } else {
        SecretStrength::Acceptable
    }
}

/// Bits per byte (0-8 scale)
fn shannon_entropy(data: &[u8]) -> f64 {
    let mut freq = [0u32; 256];
    for &byte in data {
        freq[byte as usize] += 1;
    }

    let len = data.len() as f64;
    freq.iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

fn is_single_repeated_byte(data: &[u8]) -> bool {
    data.windows(2).all(|pair| pair[0] == pair[1])
}
