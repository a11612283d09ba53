// ABOUTME: Cryptographically secure random string generation for token values
// ABOUTME: Unbiased sampling from a configurable ASCII alphabet using the OS RNG

use rand::rngs::OsRng;
use rand::RngCore;
use tether_core::{validate_alphabet, validate_token_length, DEFAULT_ALPHABET};

use crate::error::{TokenError, TokenResult};

/// Bytes drawn from the randomness source per refill
const RANDOM_BUFFER_LEN: usize = 64;

/// Produces unpredictable fixed-length strings from a validated alphabet
#[derive(Debug, Clone)]
pub struct RandomStringGenerator {
    alphabet: Vec<u8>,
}

impl Default for RandomStringGenerator {
    fn default() -> Self {
        Self {
            alphabet: DEFAULT_ALPHABET.as_bytes().to_vec(),
        }
    }
}

impl RandomStringGenerator {
    pub fn new(alphabet: &str) -> TokenResult<Self> {
        validate_alphabet(alphabet)?;
        Ok(Self {
            alphabet: alphabet.as_bytes().to_vec(),
        })
    }

    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// Generate a string of exactly `length` characters from the OS RNG
    pub fn generate(&self, length: usize) -> TokenResult<String> {
        self.generate_with(&mut OsRng, length)
    }

    /// Generate from an explicit source.
    ///
    /// A failing source is an error, never a fallback to something weaker.
    pub fn generate_with<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        length: usize,
    ) -> TokenResult<String> {
        validate_token_length(length)?;

        let size = self.alphabet.len();
        // Bytes at or above this bound are rejected so every character is equally likely
        let accept_below = 256 - (256 % size);

        let mut value = String::with_capacity(length);
        let mut buffer = [0u8; RANDOM_BUFFER_LEN];

        while value.len() < length {
            rng.try_fill_bytes(&mut buffer).map_err(|e| {
                tracing::error!("Randomness source unavailable: {}", e);
                TokenError::Generation(format!("randomness source unavailable: {}", e))
            })?;

            for &byte in buffer.iter() {
                let byte = byte as usize;
                if byte < accept_below {
                    value.push(self.alphabet[byte % size] as char);
                    if value.len() == length {
                        break;
                    }
                }
            }
        }

        Ok(value)
    }
}
