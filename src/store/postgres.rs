//! Postgres-backed store.
//!
//! Vote persistence runs as a serializable transaction so the already-voted
//! check and the ballot inserts form one atomic unit; of two racing
//! submissions from the same employee exactly one commits.

use super::{Store, StoreError};
use crate::domain::admission::Ballot;
use crate::domain::{
    EmployeeId, InternalEmployee, InternalMenu, InternalRestaurant, InternalSession, InternalVote,
    MenuId, NewEmployee, NewMenu, RestaurantId, SessionToken, VoteId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};

pub async fn new_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    new_pool_with(database_url.parse()?).await
}

pub async fn new_pool_with(connect_options: PgConnectOptions) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MenuRow {
    id: MenuId,
    restaurant_id: RestaurantId,
    date: NaiveDate,
    items: Json<Vec<String>>,
}

impl From<MenuRow> for InternalMenu {
    fn from(row: MenuRow) -> Self {
        Self {
            id: row.id,
            restaurant_id: row.restaurant_id,
            date: row.date,
            items: row.items.0,
        }
    }
}

/// Postgres unique-violation and foreign-key error codes map onto the two
/// constraint variants; everything else is an infrastructure fault.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        match db.code().as_deref() {
            Some("23505") => return StoreError::Duplicate,
            Some("23503") => return StoreError::ForeignKey,
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// A serialization failure (40001) means another transaction for the same
/// employee won the race.
fn map_ballot_error(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("40001") {
            return StoreError::AlreadyVoted;
        }
    }
    map_db_error(err)
}

#[async_trait]
impl Store for PgStore {
    #[instrument(skip(self, new), fields(username = %new.username))]
    async fn create_employee(&self, new: NewEmployee) -> Result<InternalEmployee, StoreError> {
        let employee = sqlx::query_as::<_, InternalEmployee>(
            "INSERT INTO employees (id, username, email, password_hash) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, password_hash",
        )
        .bind(EmployeeId::new())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(employee)
    }

    async fn employee_by_username(
        &self,
        username: &str,
    ) -> Result<Option<InternalEmployee>, StoreError> {
        let employee = sqlx::query_as::<_, InternalEmployee>(
            "SELECT id, username, email, password_hash FROM employees WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(employee)
    }

    async fn create_session(
        &self,
        employee_id: EmployeeId,
    ) -> Result<InternalSession, StoreError> {
        let session = sqlx::query_as::<_, InternalSession>(
            "INSERT INTO sessions (token, employee_id) VALUES ($1, $2) \
             RETURNING token, employee_id",
        )
        .bind(SessionToken::new())
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(session)
    }

    async fn session_by_token(
        &self,
        token: SessionToken,
    ) -> Result<Option<InternalSession>, StoreError> {
        let session = sqlx::query_as::<_, InternalSession>(
            "SELECT token, employee_id FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(session)
    }

    #[instrument(skip(self))]
    async fn create_restaurant(&self, name: &str) -> Result<InternalRestaurant, StoreError> {
        let restaurant = sqlx::query_as::<_, InternalRestaurant>(
            "INSERT INTO restaurants (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(RestaurantId::new())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(restaurant)
    }

    #[instrument(skip(self, new), fields(restaurant_id = ?new.restaurant_id, date = %new.date))]
    async fn create_menu(&self, new: NewMenu) -> Result<InternalMenu, StoreError> {
        let row = sqlx::query_as::<_, MenuRow>(
            "INSERT INTO menus (id, restaurant_id, date, items) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, restaurant_id, date, items",
        )
        .bind(MenuId::new())
        .bind(new.restaurant_id)
        .bind(new.date)
        .bind(Json(&new.items))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(row.into())
    }

    async fn menus_for_date(&self, date: NaiveDate) -> Result<Vec<InternalMenu>, StoreError> {
        let rows = sqlx::query_as::<_, MenuRow>(
            "SELECT id, restaurant_id, date, items FROM menus WHERE date = $1 ORDER BY id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn has_voted(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let voted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
               SELECT 1 FROM votes v \
               JOIN menus m ON m.id = v.menu_id \
               WHERE v.employee_id = $1 AND m.date = $2 \
             )",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(voted)
    }

    #[instrument(skip(self, ballot), fields(lines = ballot.lines.len()))]
    async fn record_ballot(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        ballot: &Ballot,
    ) -> Result<Vec<InternalVote>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        let already_voted = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS ( \
               SELECT 1 FROM votes v \
               JOIN menus m ON m.id = v.menu_id \
               WHERE v.employee_id = $1 AND m.date = $2 \
             )",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_ballot_error)?;
        if already_voted {
            return Err(StoreError::AlreadyVoted);
        }

        let mut votes = Vec::with_capacity(ballot.lines.len());
        for (menu_id, points) in &ballot.lines {
            let vote = sqlx::query_as::<_, InternalVote>(
                "INSERT INTO votes (id, employee_id, menu_id, points) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING id, employee_id, menu_id, points",
            )
            .bind(VoteId::new())
            .bind(employee_id)
            .bind(menu_id)
            .bind(points)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_ballot_error)?;
            votes.push(vote);
        }

        tx.commit().await.map_err(map_ballot_error)?;
        debug!(votes = votes.len(), "ballot committed");
        Ok(votes)
    }

    async fn votes_for_date(&self, date: NaiveDate) -> Result<Vec<InternalVote>, StoreError> {
        let votes = sqlx::query_as::<_, InternalVote>(
            "SELECT v.id, v.employee_id, v.menu_id, v.points FROM votes v \
             JOIN menus m ON m.id = v.menu_id \
             WHERE m.date = $1 \
             ORDER BY v.id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(votes)
    }
}
