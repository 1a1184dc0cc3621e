//! Class positions.

use rust_decimal::Decimal;

/// Competition ("1224") ranking of `totals`, highest first.
///
/// Returns one position per input, in input order. Tied totals share a
/// position and the next position skips accordingly.
#[must_use]
pub fn rank_positions(totals: &[Decimal]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..totals.len()).collect();
    order.sort_by(|&a, &b| totals[b].cmp(&totals[a]));

    let mut positions = vec![0u32; totals.len()];
    let mut current = 0u32;
    for (rank, &index) in order.iter().enumerate() {
        let place = u32::try_from(rank + 1).unwrap_or(u32::MAX);
        if rank == 0 || totals[index] != totals[order[rank - 1]] {
            current = place;
        }
        positions[index] = current;
    }
    positions
}
