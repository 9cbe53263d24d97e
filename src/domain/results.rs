//! Results aggregator: per-menu point sums for one day's votes.

use super::{InternalVote, MenuId};
use crate::store::{Store, StoreError};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::instrument;

/// Folds a day's ledger into a menu -> total map. Menus nobody voted for are
/// absent rather than present with zero; an empty ledger yields an empty map.
pub fn tally(votes: &[InternalVote]) -> HashMap<MenuId, i32> {
    let mut totals = HashMap::new();
    for vote in votes {
        *totals.entry(vote.menu_id).or_insert(0) += vote.points;
    }
    totals
}

/// Reads all votes whose menu is dated `date` in one consistent snapshot and
/// tallies them.
#[instrument(skip(store))]
pub async fn tally_for_date(
    store: &dyn Store,
    date: NaiveDate,
) -> Result<HashMap<MenuId, i32>, StoreError> {
    let votes = store.votes_for_date(date).await?;
    Ok(tally(&votes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmployeeId, VoteId};

    fn vote(menu_id: MenuId, points: i32) -> InternalVote {
        InternalVote {
            id: VoteId::new(),
            employee_id: EmployeeId::new(),
            menu_id,
            points,
        }
    }

    #[test]
    fn sums_points_per_menu() {
        let (m1, m2) = (MenuId::new(), MenuId::new());
        let votes = vec![vote(m1, 2), vote(m2, 1), vote(m1, 3), vote(m2, 2)];
        let totals = tally(&votes);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&m1], 5);
        assert_eq!(totals[&m2], 3);
    }

    #[test]
    fn empty_ledger_is_empty_map() {
        assert!(tally(&[]).is_empty());
    }

    #[test]
    fn unvoted_menus_are_absent() {
        let m1 = MenuId::new();
        let totals = tally(&[vote(m1, 1)]);
        assert_eq!(totals.len(), 1);
        assert!(!totals.contains_key(&MenuId::new()));
    }

    #[test]
    fn tally_is_idempotent() {
        let m1 = MenuId::new();
        let votes = vec![vote(m1, 2), vote(m1, 1)];
        assert_eq!(tally(&votes), tally(&votes));
    }
}
