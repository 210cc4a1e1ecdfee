//! Noise sampling and error-bound calibration
//!
//! Three noise classes are used by the protocol:
//! 1. small centered noise in [-3, 3], for share splitting and the public element `a`
//! 2. bounded error in [-ζ, ζ], where ζ is calibrated from (q, n), for honest "allow" ballots
//! 3. oversized decoy noise with magnitude in [q/3, q/3 + q/4), which is the veto "tell"
use crate::{
    arithmetics::{Polynomial, Ring},
    AvpError, Result,
};
use digest::Digest;
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha20Rng};
use sha3::Sha3_256;
use std::time::{SystemTime, UNIX_EPOCH};

/// Magnitude bound of small centered noise
pub const SMALL_NOISE_BOUND: i64 = 3;

/// Solve n²ζ² + nζ - q/8 = 0 for the larger root and return floor(ζ).
///
/// With every honest participant contributing error at most ζ per coefficient, the aggregate
/// error stays far below the decode threshold q/4. A bound of 2 or less makes honest errors too
/// predictable, so the parameter pair is rejected.
pub fn calibrate_bound(modulus: i64, participants: usize) -> Result<i64> {
    let infeasible = |bound: i64| AvpError::InfeasibleParameters {
        modulus,
        participants,
        bound,
    };
    if participants == 0 {
        return Err(infeasible(0));
    }
    let b = participants as f64;
    let a = b * b;
    let c = -(modulus as f64) / 8.0;
    let disc = b * b - 4.0 * a * c;
    let zeta = (-b + disc.sqrt()) / (2.0 * a);
    let bound = zeta.floor() as i64;
    if bound <= 2 {
        return Err(infeasible(bound));
    }
    return Ok(bound);
}

/// The largest participant count whose calibrated bound is still acceptable; 0 if none is.
/// The bound shrinks monotonically in n, so the sweep stops at the first failure.
pub fn max_participants(modulus: i64) -> usize {
    let mut participants = 0;
    while calibrate_bound(modulus, participants + 1).is_ok() {
        participants += 1;
    }
    return participants;
}

/// A per-process source of randomness threaded explicitly through share generation and vote
/// encoding
pub struct NoiseSampler {
    rng: ChaCha20Rng,
}

impl NoiseSampler {
    /// Deterministic sampler, mostly for tests and reproducible simulations
    pub fn from_seed(seed: [u8; 32]) -> Self {
        return Self {
            rng: ChaCha20Rng::from_seed(seed),
        };
    }

    /// Seed from the participant id, the process id and the current time, hashed together so
    /// that processes started in the same instant still diverge
    pub fn for_party(id: usize) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or(0);
        let mut hasher = Sha3_256::new();
        hasher.update(b"avp-noise-seed");
        hasher.update((id as u64).to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&hasher.finalize());
        return Self::from_seed(seed);
    }

    /// One coefficient drawn uniformly from [-3, 3]
    pub fn small_noise(&mut self) -> i64 {
        return self
            .rng
            .gen_range(-SMALL_NOISE_BOUND..=SMALL_NOISE_BOUND);
    }

    pub fn small_poly(&mut self, ring: &Ring) -> Polynomial {
        let coeffs = (0..ring.get_degree())
            .map(|_| self.small_noise())
            .collect::<Vec<i64>>();
        return ring.from_signed(&coeffs);
    }

    /// Every coefficient drawn uniformly from [-ζ, ζ] with ζ = calibrate_bound(q, n)
    pub fn error_poly(&mut self, ring: &Ring, participants: usize) -> Result<Polynomial> {
        let bound = calibrate_bound(ring.get_modulus(), participants)?;
        let coeffs = (0..ring.get_degree())
            .map(|_| self.rng.gen_range(-bound..=bound))
            .collect::<Vec<i64>>();
        return Ok(ring.from_signed(&coeffs));
    }

    /// Every coefficient has magnitude in [q/3, q/3 + q/4) and a uniformly random sign
    pub fn high_noise_poly(&mut self, ring: &Ring) -> Polynomial {
        let q = ring.get_modulus();
        let low = q / 3;
        let span = (q / 4).max(1);
        let coeffs = (0..ring.get_degree())
            .map(|_| {
                let magnitude = self.rng.gen_range(low..low + span);
                if self.rng.gen_bool(0.5) {
                    magnitude
                } else {
                    -magnitude
                }
            })
            .collect::<Vec<i64>>();
        return ring.from_signed(&coeffs);
    }
}
