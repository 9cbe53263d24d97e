//! Data model shared by the stores, the admission engine and the HTTP layer.

pub mod admission;
pub mod protocol;
pub mod results;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct EmployeeId(pub Uuid);

impl EmployeeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EmployeeId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct RestaurantId(pub Uuid);

impl RestaurantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct MenuId(pub Uuid);

impl MenuId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct VoteId(pub Uuid);

impl VoteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Opaque bearer token handed out at login.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct SessionToken(pub Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalEmployee {
    pub id: EmployeeId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct NewEmployee {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Clone, Copy, Debug, sqlx::FromRow)]
pub struct InternalSession {
    pub token: SessionToken,
    pub employee_id: EmployeeId,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct InternalRestaurant {
    pub id: RestaurantId,
    pub name: String,
}

/// A restaurant's offering for one day. Immutable once uploaded; the catalog
/// holds at most one menu per (restaurant, date).
#[derive(Clone, Debug)]
pub struct InternalMenu {
    pub id: MenuId,
    pub restaurant_id: RestaurantId,
    pub date: NaiveDate,
    pub items: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct NewMenu {
    pub restaurant_id: RestaurantId,
    pub date: NaiveDate,
    pub items: Vec<String>,
}

/// One ledger entry: an employee's points for one menu. Written only by the
/// admission engine, never updated or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct InternalVote {
    pub id: VoteId,
    pub employee_id: EmployeeId,
    pub menu_id: MenuId,
    pub points: i32,
}
