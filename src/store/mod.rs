//! Persistence seam. The HTTP layer and the admission engine only ever see
//! the [`Store`] trait; `postgres` backs it with sqlx and `memory` keeps
//! everything in a mutex for development mode and tests.

pub mod memory;
pub mod postgres;

use crate::domain::admission::Ballot;
use crate::domain::{
    EmployeeId, InternalEmployee, InternalMenu, InternalRestaurant, InternalSession, InternalVote,
    NewEmployee, NewMenu, SessionToken,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (username taken, menu already uploaded
    /// for that restaurant and date).
    #[error("record already exists")]
    Duplicate,
    /// A referenced record does not exist.
    #[error("referenced record does not exist")]
    ForeignKey,
    /// The employee already has votes for the requested date. Also the
    /// outcome for the loser of two racing submissions.
    #[error("employee already has votes for this date")]
    AlreadyVoted,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_employee(&self, new: NewEmployee) -> Result<InternalEmployee, StoreError>;

    async fn employee_by_username(
        &self,
        username: &str,
    ) -> Result<Option<InternalEmployee>, StoreError>;

    async fn create_session(&self, employee_id: EmployeeId)
        -> Result<InternalSession, StoreError>;

    async fn session_by_token(
        &self,
        token: SessionToken,
    ) -> Result<Option<InternalSession>, StoreError>;

    async fn create_restaurant(&self, name: &str) -> Result<InternalRestaurant, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the restaurant already has a
    /// menu for that date, [`StoreError::ForeignKey`] for an unknown
    /// restaurant.
    async fn create_menu(&self, new: NewMenu) -> Result<InternalMenu, StoreError>;

    /// Menus dated `date`, in a stable order.
    async fn menus_for_date(&self, date: NaiveDate) -> Result<Vec<InternalMenu>, StoreError>;

    /// Whether the employee already has any vote whose menu is dated `date`.
    async fn has_voted(&self, employee_id: EmployeeId, date: NaiveDate)
        -> Result<bool, StoreError>;

    /// Writes all ballot lines atomically, re-checking the one-ballot-per-day
    /// rule inside the same atomic unit. Either every line is persisted or
    /// none is.
    async fn record_ballot(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        ballot: &Ballot,
    ) -> Result<Vec<InternalVote>, StoreError>;

    /// All votes whose menu is dated `date`, read from one consistent
    /// snapshot.
    async fn votes_for_date(&self, date: NaiveDate) -> Result<Vec<InternalVote>, StoreError>;
}
