//! Additive sharing of zero and the exchange of shares through the shared store
//!
//! Participant `id` splits the zero polynomial into one share per recipient, `S[id][j]`, with
//! every off-diagonal share small and random and the diagonal share set to minus their sum. It
//! publishes its row, waits at the barrier, then sums its column to obtain `x_id`. Since every
//! row sums to zero, so do the `x_j` across all participants.
use crate::{
    arithmetics::{Polynomial, Ring},
    barrier::Barrier,
    noise::NoiseSampler,
    store::{fetch, publish, Key, SharedStore},
    AvpError, Result,
};
use tracing::info;

/// Produce row `id` of the share matrix: `total` ring elements that sum to zero
pub fn generate_row(
    ring: &Ring,
    sampler: &mut NoiseSampler,
    id: usize,
    total: usize,
) -> Vec<Polynomial> {
    let mut row = (0..total)
        .map(|to| {
            if to == id {
                ring.zero()
            } else {
                sampler.small_poly(ring)
            }
        })
        .collect::<Vec<Polynomial>>();
    if id < total {
        let others = ring.sum(row.iter());
        row[id] = ring.neg(&others);
    }
    return row;
}

/// Publish `S[id][to]` for every recipient
pub fn publish_row<S: SharedStore + ?Sized>(
    store: &S,
    ring: &Ring,
    id: usize,
    row: &[Polynomial],
) -> Result<()> {
    for (to, share) in row.iter().enumerate() {
        publish(store, Key::Share { from: id, to }, ring, share)?;
    }
    return Ok(());
}

/// Sum every share addressed to `id`. A missing or unreadable share is fatal.
pub fn collect<S: SharedStore + ?Sized>(
    store: &S,
    ring: &Ring,
    id: usize,
    total: usize,
) -> Result<Polynomial> {
    let mut secret = ring.zero();
    for from in 0..total {
        let share = fetch(store, Key::Share { from, to: id }, ring).map_err(|e| match e {
            AvpError::Store(source) => AvpError::ShareMissing {
                from,
                to: id,
                source,
            },
            other => other,
        })?;
        secret = ring.add(&secret, &share);
    }
    return Ok(secret);
}

/// The whole share-exchange phase for one participant: generate, publish, rendezvous, collect
pub fn exchange<S, B>(
    store: &S,
    barrier: &B,
    ring: &Ring,
    sampler: &mut NoiseSampler,
    id: usize,
    total: usize,
) -> Result<Polynomial>
where
    S: SharedStore + ?Sized,
    B: Barrier + ?Sized,
{
    let row = generate_row(ring, sampler, id, total);
    publish_row(store, ring, id, &row)?;
    info!(participant = id, total, "shares published, waiting for peers");
    barrier.arrive_and_wait(total)?;
    return collect(store, ring, id, total);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::StoreError, store::MemoryStore};

    #[test]
    fn test_rows_sum_to_zero() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([3u8; 32]);
        for total in 1..=8 {
            for id in 0..total {
                let row = generate_row(&ring, &mut sampler, id, total);
                assert_eq!(row.len(), total);
                assert_eq!(ring.sum(row.iter()), ring.zero());
            }
        }
    }

    #[test]
    fn test_single_party_row_is_zero() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([4u8; 32]);
        assert_eq!(generate_row(&ring, &mut sampler, 0, 1), vec![ring.zero()]);
    }

    #[test]
    fn test_secrets_sum_to_zero() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([5u8; 32]);
        for total in 2..=6 {
            let store = MemoryStore::new();
            for id in 0..total {
                let row = generate_row(&ring, &mut sampler, id, total);
                publish_row(&store, &ring, id, &row).unwrap();
            }
            let secrets = (0..total)
                .map(|id| collect(&store, &ring, id, total).unwrap())
                .collect::<Vec<Polynomial>>();
            assert_eq!(ring.sum(secrets.iter()), ring.zero());
            // individual secrets are not themselves zero
            assert!(secrets.iter().any(|secret| *secret != ring.zero()));
        }
    }

    #[test]
    fn test_missing_share() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([6u8; 32]);
        let store = MemoryStore::new();
        let row = generate_row(&ring, &mut sampler, 0, 3);
        publish_row(&store, &ring, 0, &row).unwrap();
        let err = collect(&store, &ring, 2, 3).unwrap_err();
        assert!(matches!(
            err,
            AvpError::ShareMissing {
                from: 1,
                to: 2,
                source: StoreError::NotFound { .. }
            }
        ));
    }

    #[test]
    fn test_unreadable_share() {
        let ring = Ring::default();
        let mut sampler = NoiseSampler::from_seed([8u8; 32]);
        let store = MemoryStore::new();
        let row = generate_row(&ring, &mut sampler, 0, 2);
        publish_row(&store, &ring, 0, &row).unwrap();
        store.create("Share_1_0", 0).unwrap();
        let err = collect(&store, &ring, 0, 2).unwrap_err();
        assert!(matches!(
            err,
            AvpError::ShareMissing {
                from: 1,
                to: 0,
                source: StoreError::Unreadable { .. }
            }
        ));
    }
}
