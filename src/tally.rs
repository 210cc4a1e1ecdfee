//! Tally and decode
//!
//! Because the secrets sum to zero, an all-allow aggregate collapses to the sum of the honest
//! errors, whose norm is bounded well under q/4. A single veto contributes decoy coefficients of
//! magnitude at least q/3, which push the infinity norm past the threshold.
use crate::{
    arithmetics::{max_magnitude, Polynomial, Ring},
    store::{fetch, Key, SharedStore},
    AvpError, Result,
};
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Verdict {
    AllAllowed,
    SomeoneVetoed,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            Verdict::AllAllowed => write!(f, "ALL VOTED YES (0)"),
            Verdict::SomeoneVetoed => write!(f, "SOMEONE VETOED (1)"),
        };
    }
}

/// The decoded aggregate of every ballot
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct Tally {
    total: Polynomial,
    centered: Vec<i64>,
    inf_norm: i64,
    threshold: i64,
    verdict: Verdict,
}

impl Tally {
    pub fn get_total(&self) -> &Polynomial {
        return &self.total;
    }

    /// The aggregate with coefficients in (-q/2, q/2], for diagnostics
    pub fn get_centered(&self) -> &[i64] {
        return &self.centered;
    }

    pub fn get_inf_norm(&self) -> i64 {
        return self.inf_norm;
    }

    pub fn get_threshold(&self) -> i64 {
        return self.threshold;
    }

    pub fn get_verdict(&self) -> Verdict {
        return self.verdict;
    }
}

/// Center the aggregate and compare its infinity norm against q/4
pub fn decode(ring: &Ring, total: Polynomial) -> Tally {
    let centered = ring.center(&total);
    let inf_norm = max_magnitude(&centered);
    let threshold = ring.threshold();
    let verdict = if inf_norm <= threshold {
        Verdict::AllAllowed
    } else {
        Verdict::SomeoneVetoed
    };
    return Tally {
        total,
        centered,
        inf_norm,
        threshold,
        verdict,
    };
}

/// Read every ballot and decode their sum. Any missing or unreadable ballot aborts the tally;
/// no partial result is produced.
pub fn tally<S: SharedStore + ?Sized>(store: &S, ring: &Ring, participants: usize) -> Result<Tally> {
    if participants == 0 {
        return Err(AvpError::InvalidParticipant {
            id: 0,
            total: participants,
        });
    }
    let mut total = ring.zero();
    for party in 0..participants {
        let ballot = fetch(store, Key::PartyVote(party), ring).map_err(|e| match e {
            AvpError::Store(source) => AvpError::BallotMissing { party, source },
            other => other,
        })?;
        total = ring.add(&total, &ballot);
    }
    let tally = decode(ring, total);
    match tally.get_verdict() {
        Verdict::AllAllowed => info!(
            inf_norm = tally.get_inf_norm(),
            threshold = tally.get_threshold(),
            "no veto"
        ),
        Verdict::SomeoneVetoed => warn!(
            inf_norm = tally.get_inf_norm(),
            threshold = tally.get_threshold(),
            "veto detected"
        ),
    }
    return Ok(tally);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ballot::publish_ballot, error::StoreError, store::MemoryStore};

    #[test]
    fn test_verdict_strings() {
        assert_eq!(Verdict::AllAllowed.to_string(), "ALL VOTED YES (0)");
        assert_eq!(Verdict::SomeoneVetoed.to_string(), "SOMEONE VETOED (1)");
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let ring = Ring::new(2, 12289).unwrap();
        let at = decode(&ring, ring.from_signed(&[3072, -5]));
        assert_eq!(at.get_threshold(), 3072);
        assert_eq!(at.get_inf_norm(), 3072);
        assert_eq!(at.get_verdict(), Verdict::AllAllowed);
        let above = decode(&ring, ring.from_signed(&[0, -3073]));
        assert_eq!(above.get_centered(), &[0, -3073]);
        assert_eq!(above.get_verdict(), Verdict::SomeoneVetoed);
    }

    #[test]
    fn test_tally_sums_ballots() {
        let ring = Ring::new(3, 12289).unwrap();
        let store = MemoryStore::new();
        publish_ballot(&store, &ring, 0, &ring.from_signed(&[1, 2, 3])).unwrap();
        publish_ballot(&store, &ring, 1, &ring.from_signed(&[-1, -2, 10])).unwrap();
        let result = tally(&store, &ring, 2).unwrap();
        assert_eq!(result.get_centered(), &[0, 0, 13]);
        assert_eq!(result.get_inf_norm(), 13);
        assert_eq!(result.get_verdict(), Verdict::AllAllowed);
    }

    #[test]
    fn test_incomplete_ballot_set() {
        let ring = Ring::default();
        let store = MemoryStore::new();
        publish_ballot(&store, &ring, 0, &ring.zero()).unwrap();
        publish_ballot(&store, &ring, 1, &ring.zero()).unwrap();
        let err = tally(&store, &ring, 3).unwrap_err();
        assert!(matches!(
            err,
            AvpError::BallotMissing {
                party: 2,
                source: StoreError::NotFound { .. }
            }
        ));
        assert!(err.to_string().contains("participant 2"));
    }

    #[test]
    fn test_truncated_ballot_names_its_party() {
        let ring = Ring::default();
        let store = MemoryStore::new();
        publish_ballot(&store, &ring, 0, &ring.zero()).unwrap();
        // created but never written, as seen between create and write
        store.create("PartyVote_1", 3).unwrap();
        let err = tally(&store, &ring, 2).unwrap_err();
        assert!(matches!(
            err,
            AvpError::BallotMissing {
                party: 1,
                source: StoreError::Unreadable { .. }
            }
        ));
        assert!(err.to_string().contains("participant 1"));
    }

    #[test]
    fn test_empty_electorate() {
        let ring = Ring::default();
        let store = MemoryStore::new();
        assert!(matches!(
            tally(&store, &ring, 0),
            Err(AvpError::InvalidParticipant { total: 0, .. })
        ));
    }
}
