//! Ballot encoding
//!
//! An allowing participant publishes the structured sample `a·x + e` with calibrated error `e`.
//! A vetoing participant publishes decoy noise that has nothing to do with `a` or `x`; in the
//! aggregate its missing `a·x` term no longer cancels and the decoy dominates every coefficient.
use crate::{
    arithmetics::{Polynomial, Ring},
    noise::NoiseSampler,
    store::{publish, Key, SharedStore},
    AvpError, Result,
};
use std::fmt;
use tracing::info;

/// A participant's private bit
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Vote {
    Allow,
    Veto,
}

impl TryFrom<u8> for Vote {
    type Error = AvpError;

    fn try_from(bit: u8) -> Result<Self> {
        return match bit {
            0 => Ok(Vote::Allow),
            1 => Ok(Vote::Veto),
            other => Err(AvpError::InvalidVote(other)),
        };
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Vote::Allow => write!(f, "allow (0)"),
            Vote::Veto => write!(f, "veto (1)"),
        };
    }
}

/// Build a ballot from the public element `a` and the participant's reconstructed secret
pub fn encode(
    ring: &Ring,
    public: &Polynomial,
    secret: &Polynomial,
    vote: Vote,
    participants: usize,
    sampler: &mut NoiseSampler,
) -> Result<Polynomial> {
    return match vote {
        Vote::Allow => {
            let error = sampler.error_poly(ring, participants)?;
            Ok(ring.add(&ring.mul(public, secret), &error))
        }
        Vote::Veto => Ok(sampler.high_noise_poly(ring)),
    };
}

/// Publish participant `id`'s ballot for the tally
pub fn publish_ballot<S: SharedStore + ?Sized>(
    store: &S,
    ring: &Ring,
    id: usize,
    ballot: &Polynomial,
) -> Result<()> {
    publish(store, Key::PartyVote(id), ring, ballot)?;
    info!(participant = id, "ballot written");
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MODULUS;

    #[test]
    fn test_vote_bits() {
        assert_eq!(Vote::try_from(0).unwrap(), Vote::Allow);
        assert_eq!(Vote::try_from(1).unwrap(), Vote::Veto);
        assert!(matches!(Vote::try_from(2), Err(AvpError::InvalidVote(2))));
    }

    /// With a zero secret an allow ballot is pure calibrated error
    #[test]
    fn test_allow_ballot_with_zero_secret() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([8u8; 32]);
        let public = sampler.small_poly(&ring);
        let ballot = encode(&ring, &public, &ring.zero(), Vote::Allow, 3, &mut sampler).unwrap();
        assert!(ring.inf_norm(&ballot) <= 66);
    }

    #[test]
    fn test_allow_ballot_is_structured() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([9u8; 32]);
        let public = sampler.small_poly(&ring);
        let secret = sampler.small_poly(&ring);
        let ballot = encode(&ring, &public, &secret, Vote::Allow, 3, &mut sampler).unwrap();
        let residue = ring.sub(&ballot, &ring.mul(&public, &secret));
        assert!(ring.inf_norm(&residue) <= 66);
    }

    #[test]
    fn test_veto_ballot_is_decoy() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([10u8; 32]);
        let public = sampler.small_poly(&ring);
        let ballot = encode(&ring, &public, &ring.zero(), Vote::Veto, 3, &mut sampler).unwrap();
        assert!(ring.inf_norm(&ballot) > MODULUS / 4);
    }

    #[test]
    fn test_allow_rejects_infeasible_parameters() {
        let ring = Ring::new(8, 97).unwrap();
        let mut sampler = NoiseSampler::from_seed([11u8; 32]);
        let public = sampler.small_poly(&ring);
        assert!(encode(&ring, &public, &ring.zero(), Vote::Allow, 4, &mut sampler).is_err());
    }
}
