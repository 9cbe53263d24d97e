//! Vote admission engine: decides whether a submission is admissible and
//! turns it into ledger entries.
//!
//! The list-shaped request fields stay untyped [`serde_json::Value`]s until
//! they get here, so shape problems ("not a list") surface as rejection
//! reasons with stable wording instead of opaque deserialization errors.

use super::protocol::Protocol;
use super::{EmployeeId, InternalVote, MenuId};
use crate::store::{Store, StoreError};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Why a submission was turned away. The display text is part of the API
/// contract and is surfaced verbatim to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("Menu IDs must be provided as a list.")]
    MenuIdsNotAList,
    #[error("Old version only allows voting for one menu.")]
    LegacySingleMenu,
    #[error("Points must be provided as a list.")]
    PointsNotAList,
    #[error("Number of menu IDs and points must match.")]
    LengthMismatch,
    #[error("You must vote for between one and three menus.")]
    MenuCountOutOfRange,
    #[error("Only {available} menus available for voting today.")]
    NotEnoughMenus { available: usize },
    #[error("Points must be unique for each menu.")]
    DuplicatePoints,
    #[error("Invalid points; must be 1, 2, or 3.")]
    PointOutOfRange,
    #[error("You have already voted today.")]
    AlreadyVoted,
    #[error("Menu ID {id} is not valid for today.")]
    UnknownMenu { id: String },
}

/// A submission as it arrives at the boundary, protocol already parsed.
#[derive(Clone, Debug)]
pub struct Submission {
    pub protocol: Protocol,
    pub menu_ids: Option<Value>,
    pub points: Option<Value>,
}

/// A fully validated submission: one (menu, points) line per chosen menu,
/// in submission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub lines: Vec<(MenuId, i32)>,
}

#[derive(Debug, Error)]
pub enum CastError {
    #[error(transparent)]
    Rejected(#[from] VoteRejection),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validates a submission against the protocol rules, today's catalog and
/// the employee's voting state. The checks run in a fixed order and the
/// first failure wins; callers rely on that for deterministic error
/// reporting.
pub fn validate(
    submission: &Submission,
    available: &[MenuId],
    already_voted: bool,
) -> Result<Ballot, VoteRejection> {
    // An empty list is treated the same as a missing one.
    let menu_ids = match &submission.menu_ids {
        Some(Value::Array(ids)) if !ids.is_empty() => ids,
        _ => return Err(VoteRejection::MenuIdsNotAList),
    };

    let points = match submission.protocol {
        Protocol::Legacy => {
            if menu_ids.len() != 1 {
                return Err(VoteRejection::LegacySingleMenu);
            }
            // Legacy callers cannot express preference; any supplied points
            // are overridden with a single implicit point.
            vec![1]
        }
        Protocol::Current => {
            let raw_points = match &submission.points {
                Some(Value::Array(points)) if !points.is_empty() => points,
                _ => return Err(VoteRejection::PointsNotAList),
            };
            if menu_ids.len() != raw_points.len() {
                return Err(VoteRejection::LengthMismatch);
            }
            if menu_ids.len() > 3 {
                return Err(VoteRejection::MenuCountOutOfRange);
            }
            if menu_ids.len() > available.len() {
                return Err(VoteRejection::NotEnoughMenus {
                    available: available.len(),
                });
            }
            // Uniqueness is judged on the raw values, before the range
            // check, so [4, 4] reports duplicates rather than range.
            for (idx, point) in raw_points.iter().enumerate() {
                if raw_points[..idx].contains(point) {
                    return Err(VoteRejection::DuplicatePoints);
                }
            }
            let mut points = Vec::with_capacity(raw_points.len());
            for point in raw_points {
                match point.as_i64() {
                    Some(value @ 1..=3) => points.push(value as i32),
                    _ => return Err(VoteRejection::PointOutOfRange),
                }
            }
            points
        }
    };

    if already_voted {
        return Err(VoteRejection::AlreadyVoted);
    }

    let catalog: HashSet<MenuId> = available.iter().copied().collect();
    let mut lines = Vec::with_capacity(menu_ids.len());
    for (raw_id, point) in menu_ids.iter().zip(points) {
        let menu_id = parse_menu_id(raw_id)
            .filter(|id| catalog.contains(id))
            .ok_or_else(|| VoteRejection::UnknownMenu {
                id: raw_id_text(raw_id),
            })?;
        lines.push((menu_id, point));
    }

    Ok(Ballot { lines })
}

/// Full admission pass: load the catalog and voting state, validate, and
/// persist the ballot. The store re-checks the already-voted condition
/// inside its own atomic unit, which closes the check-then-act race between
/// two concurrent submissions from the same employee.
#[instrument(skip(store, submission))]
pub async fn cast(
    store: &dyn Store,
    employee_id: EmployeeId,
    date: NaiveDate,
    submission: &Submission,
) -> Result<Vec<InternalVote>, CastError> {
    let available: Vec<MenuId> = store
        .menus_for_date(date)
        .await?
        .iter()
        .map(|menu| menu.id)
        .collect();
    let already_voted = store.has_voted(employee_id, date).await?;

    let ballot = validate(submission, &available, already_voted)?;
    debug!(lines = ballot.lines.len(), "ballot admitted, persisting");

    store
        .record_ballot(employee_id, date, &ballot)
        .await
        .map_err(|err| match err {
            StoreError::AlreadyVoted => CastError::Rejected(VoteRejection::AlreadyVoted),
            other => CastError::Store(other),
        })
}

fn parse_menu_id(raw: &Value) -> Option<MenuId> {
    raw.as_str()
        .and_then(|text| Uuid::parse_str(text).ok())
        .map(MenuId)
}

/// Text form of a raw menu id for the rejection message. A string element is
/// echoed as-is; anything else falls back to its JSON rendering.
fn raw_id_text(raw: &Value) -> String {
    match raw {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
