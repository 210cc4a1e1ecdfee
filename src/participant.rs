//! One protocol run, seen from each role: setup, participant, cleanup
use crate::{
    arithmetics::{Polynomial, Ring},
    ballot::{self, Vote},
    barrier::{self, Barrier},
    noise::{calibrate_bound, NoiseSampler},
    shares,
    store::{fetch, publish, Key, SharedStore},
    AvpError, Result,
};
use tracing::{debug, info};

/// Publish the public element `a` (small coefficients) and a fresh barrier state block
pub fn setup<S: SharedStore + ?Sized>(
    store: &S,
    ring: &Ring,
    sampler: &mut NoiseSampler,
) -> Result<Polynomial> {
    let public = sampler.small_poly(ring);
    publish(store, Key::PublicPoly, ring, &public)?;
    barrier::install_state(store)?;
    info!(
        degree = ring.get_degree(),
        modulus = ring.get_modulus(),
        "shared state initialized"
    );
    return Ok(public);
}

/// Remove every blob a run with up to `parties` participants can leave behind
pub fn cleanup<S: SharedStore + ?Sized>(store: &S, parties: usize) -> Result<()> {
    store.remove(&Key::PublicPoly.to_string())?;
    store.remove(&Key::SharedSync.to_string())?;
    store.remove(barrier::LOCK_NAME)?;
    for from in 0..parties {
        store.remove(&Key::PartyVote(from).to_string())?;
        for to in 0..parties {
            store.remove(&Key::Share { from, to }.to_string())?;
        }
    }
    debug!(parties, "shared state removed");
    return Ok(());
}

/// A single participant of one run
pub struct Participant<'a, S: ?Sized, B: ?Sized> {
    id: usize,
    total: usize,
    ring: Ring,
    store: &'a S,
    barrier: &'a B,
    sampler: NoiseSampler,
}

impl<'a, S, B> Participant<'a, S, B>
where
    S: SharedStore + ?Sized,
    B: Barrier + ?Sized,
{
    /// Validate the participant's position and the (q, n) pair. Infeasible parameters are
    /// rejected here, before any share is generated.
    pub fn new(
        id: usize,
        total: usize,
        ring: Ring,
        store: &'a S,
        barrier: &'a B,
        sampler: NoiseSampler,
    ) -> Result<Self> {
        if total == 0 || id >= total {
            return Err(AvpError::InvalidParticipant { id, total });
        }
        let bound = calibrate_bound(ring.get_modulus(), total)?;
        debug!(participant = id, total, bound, "noise bound calibrated");
        return Ok(Self {
            id,
            total,
            ring,
            store,
            barrier,
            sampler,
        });
    }

    pub fn get_id(&self) -> usize {
        return self.id;
    }

    pub fn get_total(&self) -> usize {
        return self.total;
    }

    /// Share zero with every peer and reconstruct this participant's secret `x_id`
    pub fn exchange_shares(&mut self) -> Result<Polynomial> {
        return shares::exchange(
            self.store,
            self.barrier,
            &self.ring,
            &mut self.sampler,
            self.id,
            self.total,
        );
    }

    /// Run the full participant sequence and return the published ballot
    pub fn cast(&mut self, vote: Vote) -> Result<Polynomial> {
        let secret = self.exchange_shares()?;
        let public = fetch(self.store, Key::PublicPoly, &self.ring)?;
        let ballot = ballot::encode(
            &self.ring,
            &public,
            &secret,
            vote,
            self.total,
            &mut self.sampler,
        )?;
        ballot::publish_ballot(self.store, &self.ring, self.id, &ballot)?;
        return Ok(ballot);
    }
}
