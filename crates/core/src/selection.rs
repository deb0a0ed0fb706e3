use crate::{Candidate, RngState};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("pool exhausted: requested {requested}, available {available}")]
    PoolExhausted { requested: usize, available: usize },
    #[error("no free slot among {total}")]
    NoFreeSlot { total: usize },
}

/// Draws `k` distinct candidates uniformly without replacement.
pub fn select_winners(
    pool: &[Candidate],
    k: usize,
    rng: &mut RngState,
) -> Result<Vec<Candidate>, SelectionError> {
    if pool.len() < k {
        return Err(SelectionError::PoolExhausted {
            requested: k,
            available: pool.len(),
        });
    }
    Ok(rng
        .sample_indices(pool.len(), k)
        .into_iter()
        .map(|idx| pool[idx].clone())
        .collect())
}

fn mix(seed_key: u64) -> u64 {
    let mut z = seed_key.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Picks a slot outside `used` for the winner keyed by `seed_key`.
///
/// Random probes are bounded by `total`; after that the lowest free slot wins.
pub fn assign_slot(
    used: &BTreeSet<usize>,
    total: usize,
    seed_key: u64,
    rng: &mut RngState,
) -> Result<usize, SelectionError> {
    probe_slot(used, total, total, seed_key, rng)
}

fn probe_slot(
    used: &BTreeSet<usize>,
    total: usize,
    tries: usize,
    seed_key: u64,
    rng: &mut RngState,
) -> Result<usize, SelectionError> {
    if used.range(..total).count() >= total {
        return Err(SelectionError::NoFreeSlot { total });
    }
    let key = mix(seed_key);
    for _ in 0..tries {
        let slot = ((rng.next_u64() ^ key) % total as u64) as usize;
        if !used.contains(&slot) {
            return Ok(slot);
        }
    }
    let fallback = (0..total).find(|slot| !used.contains(slot));
    log::debug!("slot probes exhausted for key {seed_key}, falling back to {fallback:?}");
    fallback.ok_or(SelectionError::NoFreeSlot { total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(size: u64) -> Vec<Candidate> {
        (1..=size).map(|id| Candidate::new(id, format!("P{id}"))).collect()
    }

    #[test]
    fn draws_exactly_k_distinct_members() {
        let mut rng = RngState::from_seed(11);
        for size in 0..12u64 {
            let pool = pool(size);
            for k in 0..=pool.len() {
                let winners = select_winners(&pool, k, &mut rng).expect("enough");
                assert_eq!(winners.len(), k);
                let ids: BTreeSet<u64> = winners.iter().map(|c| c.id).collect();
                assert_eq!(ids.len(), k);
                assert!(ids.iter().all(|id| pool.iter().any(|c| c.id == *id)));
            }
        }
    }

    #[test]
    fn oversized_request_is_rejected() {
        let mut rng = RngState::from_seed(1);
        let err = select_winners(&pool(2), 3, &mut rng).unwrap_err();
        assert_eq!(
            err,
            SelectionError::PoolExhausted {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn assigned_slot_is_never_used() {
        let mut rng = RngState::from_seed(5);
        for total in 1..20usize {
            let mut used = BTreeSet::new();
            for key in 0..total as u64 {
                let slot = assign_slot(&used, total, key, &mut rng).expect("free slot");
                assert!(slot < total);
                assert!(used.insert(slot));
            }
            assert_eq!(
                assign_slot(&used, total, 99, &mut rng),
                Err(SelectionError::NoFreeSlot { total })
            );
        }
    }

    #[test]
    fn exhausted_probes_fall_back_to_lowest_free_slot() {
        let total = 10_000;
        let used: BTreeSet<usize> = (0..total).filter(|slot| *slot != 4321 && *slot != 77).collect();
        for seed in 0..5 {
            let mut rng = RngState::from_seed(seed);
            assert_eq!(probe_slot(&used, total, 0, seed, &mut rng), Ok(77));
        }

        let used: BTreeSet<usize> = (0..total).filter(|slot| *slot != 4321).collect();
        let mut rng = RngState::from_seed(3);
        assert_eq!(assign_slot(&used, total, 1, &mut rng), Ok(4321));
    }

    #[test]
    fn zero_slots_is_full() {
        let mut rng = RngState::from_seed(5);
        assert!(assign_slot(&BTreeSet::new(), 0, 1, &mut rng).is_err());
    }
}
