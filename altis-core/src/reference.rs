use std::collections::HashSet;

use altis_shared::{BookingReference, ReferenceFormatError};
use rand::Rng;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("No free booking reference after {attempts} attempts ({active} active)")]
    Exhausted { attempts: u32, active: usize },

    #[error(transparent)]
    Malformed(#[from] ReferenceFormatError),
}

/// Draws uniformly random booking references, retrying on collision with the
/// caller's set of active references.
///
/// Retries are bounded. With 36^8 codes a collision is already unlikely, so
/// hitting the bound means the active set is close to the whole space or the
/// random source is broken; both are configuration faults.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceGenerator {
    max_attempts: u32,
}

impl ReferenceGenerator {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn generate(
        &self,
        active: &HashSet<BookingReference>,
    ) -> Result<BookingReference, ReferenceError> {
        self.generate_with(&mut rand::thread_rng(), active)
    }

    pub fn generate_with<R: Rng>(
        &self,
        rng: &mut R,
        active: &HashSet<BookingReference>,
    ) -> Result<BookingReference, ReferenceError> {
        if active.len() as u64 >= BookingReference::code_space() {
            return Err(ReferenceError::Exhausted {
                attempts: 0,
                active: active.len(),
            });
        }

        for attempt in 1..=self.max_attempts {
            let candidate = BookingReference::new(draw_code(rng))?;
            if !active.contains(&candidate) {
                return Ok(candidate);
            }
            tracing::debug!(attempt, "Booking reference collision, drawing again");
        }

        tracing::error!(
            attempts = self.max_attempts,
            active = active.len(),
            "Booking reference space exhausted"
        );
        Err(ReferenceError::Exhausted {
            attempts: self.max_attempts,
            active: active.len(),
        })
    }
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

fn draw_code<R: Rng>(rng: &mut R) -> String {
    let alphabet = BookingReference::ALPHABET;
    (0..BookingReference::LEN)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
