use crate::models::DonorRecord;
use std::cmp::Reverse;
use std::collections::HashMap;

/// Deterministic ordering used whenever the ranking service can't be trusted
///
/// Donors in `city` (case-insensitive) come first; each partition is ordered
/// by total donations, highest first. The sort is stable, so ties keep
/// fetch order.
pub fn fallback_rank(mut donors: Vec<DonorRecord>, city: Option<&str>) -> Vec<DonorRecord> {
    let city = city.map(str::trim).filter(|c| !c.is_empty());

    donors.sort_by_cached_key(|donor| {
        let local = city.is_some_and(|c| donor.is_in_city(c));
        (Reverse(local), Reverse(donor.total_donations))
    });

    donors
}

/// Reorder `donors` by a list of ranked ids
///
/// Ranked ids come first in the given order; unknown and repeated ids are
/// skipped. Donors the ranking never mentioned follow in fetch order, so the
/// result is always a permutation of the input.
pub fn merge_rankings(donors: Vec<DonorRecord>, rankings: &[String]) -> Vec<DonorRecord> {
    let order = {
        let index: HashMap<&str, usize> = donors
            .iter()
            .enumerate()
            .map(|(i, donor)| (donor.id.as_str(), i))
            .collect();

        let mut taken = vec![false; donors.len()];
        let mut order = Vec::with_capacity(donors.len());

        for id in rankings {
            match index.get(id.as_str()) {
                Some(&i) if !taken[i] => {
                    taken[i] = true;
                    order.push(i);
                }
                Some(_) => {}
                None => tracing::debug!("Dropping unknown donor id from rankings: {}", id),
            }
        }

        order.extend((0..donors.len()).filter(|&i| !taken[i]));
        order
    };

    let mut slots: Vec<Option<DonorRecord>> = donors.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}
