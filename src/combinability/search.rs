//! Subset Search
//!
//! Candidate subsets of eligible promotions, in application order. Positions refer to the
//! priority-sorted candidate list.

use smallvec::SmallVec;

use crate::promotions::Promotion;

/// Positions of a subset's members in the sorted candidate list.
pub type Subset = SmallVec<[usize; 8]>;

/// Every maximal subset of mutually combinable promotions.
///
/// Backtracks over `promotions` in order, never extending a subset with a promotion that
/// conflicts with one of its members. Worst case is O(2^n) subsets.
pub fn maximal_subsets(promotions: &[&Promotion<'_>]) -> Vec<Subset> {
    let mut found = Vec::new();
    let mut members = Subset::new();

    extend(promotions, 0, &mut members, &mut found);

    found
}

fn extend(
    promotions: &[&Promotion<'_>],
    position: usize,
    members: &mut Subset,
    found: &mut Vec<Subset>,
) {
    let Some(candidate) = promotions.get(position) else {
        if is_maximal(promotions, members) {
            found.push(members.clone());
        }

        return;
    };

    if combines_with_all(promotions, members, candidate) {
        members.push(position);
        extend(promotions, position + 1, members, found);
        members.pop();
    }

    extend(promotions, position + 1, members, found);
}

/// Keep each promotion, in order, that combines with everything kept so far. O(n²).
pub fn greedy_subset(promotions: &[&Promotion<'_>]) -> Subset {
    let mut members = Subset::new();

    for (position, candidate) in promotions.iter().enumerate() {
        if combines_with_all(promotions, &members, candidate) {
            members.push(position);
        }
    }

    members
}

fn combines_with_all(
    promotions: &[&Promotion<'_>],
    members: &[usize],
    candidate: &Promotion<'_>,
) -> bool {
    members.iter().all(|&member| {
        promotions
            .get(member)
            .is_some_and(|promotion| promotion.can_combine_with(candidate))
    })
}

fn is_maximal(promotions: &[&Promotion<'_>], members: &[usize]) -> bool {
    promotions
        .iter()
        .enumerate()
        .filter(|(position, _)| !members.contains(position))
        .all(|(_, outsider)| !combines_with_all(promotions, members, outsider))
}
