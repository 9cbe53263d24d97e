//! In-memory store: development mode without a database, and the backing
//! for the HTTP integration tests.
//!
//! A single mutex guards all state, and `record_ballot` performs its
//! already-voted check and the inserts under one lock acquisition. That is
//! the in-memory analogue of the serializable transaction in the Postgres
//! store.

use super::{Store, StoreError};
use crate::domain::admission::Ballot;
use crate::domain::{
    EmployeeId, InternalEmployee, InternalMenu, InternalRestaurant, InternalSession, InternalVote,
    MenuId, NewEmployee, NewMenu, RestaurantId, SessionToken, VoteId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct State {
    employees: Vec<InternalEmployee>,
    sessions: HashMap<SessionToken, InternalSession>,
    restaurants: Vec<InternalRestaurant>,
    menus: Vec<InternalMenu>,
    votes: Vec<InternalVote>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_employee(&self, new: NewEmployee) -> Result<InternalEmployee, StoreError> {
        let mut state = self.state.lock().await;
        if state.employees.iter().any(|e| e.username == new.username) {
            return Err(StoreError::Duplicate);
        }
        let employee = InternalEmployee {
            id: EmployeeId::new(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
        };
        state.employees.push(employee.clone());
        Ok(employee)
    }

    async fn employee_by_username(
        &self,
        username: &str,
    ) -> Result<Option<InternalEmployee>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .employees
            .iter()
            .find(|e| e.username == username)
            .cloned())
    }

    async fn create_session(
        &self,
        employee_id: EmployeeId,
    ) -> Result<InternalSession, StoreError> {
        let mut state = self.state.lock().await;
        let session = InternalSession {
            token: SessionToken::new(),
            employee_id,
        };
        state.sessions.insert(session.token, session);
        Ok(session)
    }

    async fn session_by_token(
        &self,
        token: SessionToken,
    ) -> Result<Option<InternalSession>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.sessions.get(&token).copied())
    }

    async fn create_restaurant(&self, name: &str) -> Result<InternalRestaurant, StoreError> {
        let mut state = self.state.lock().await;
        let restaurant = InternalRestaurant {
            id: RestaurantId::new(),
            name: name.to_owned(),
        };
        state.restaurants.push(restaurant.clone());
        Ok(restaurant)
    }

    async fn create_menu(&self, new: NewMenu) -> Result<InternalMenu, StoreError> {
        let mut state = self.state.lock().await;
        if !state.restaurants.iter().any(|r| r.id == new.restaurant_id) {
            return Err(StoreError::ForeignKey);
        }
        if state
            .menus
            .iter()
            .any(|m| m.restaurant_id == new.restaurant_id && m.date == new.date)
        {
            return Err(StoreError::Duplicate);
        }
        let menu = InternalMenu {
            id: MenuId::new(),
            restaurant_id: new.restaurant_id,
            date: new.date,
            items: new.items,
        };
        state.menus.push(menu.clone());
        Ok(menu)
    }

    async fn menus_for_date(&self, date: NaiveDate) -> Result<Vec<InternalMenu>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .menus
            .iter()
            .filter(|m| m.date == date)
            .cloned()
            .collect())
    }

    async fn has_voted(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let state = self.state.lock().await;
        Ok(state_has_voted(&state, employee_id, date))
    }

    async fn record_ballot(
        &self,
        employee_id: EmployeeId,
        date: NaiveDate,
        ballot: &Ballot,
    ) -> Result<Vec<InternalVote>, StoreError> {
        let mut state = self.state.lock().await;
        if state_has_voted(&state, employee_id, date) {
            return Err(StoreError::AlreadyVoted);
        }
        let votes: Vec<InternalVote> = ballot
            .lines
            .iter()
            .map(|&(menu_id, points)| InternalVote {
                id: VoteId::new(),
                employee_id,
                menu_id,
                points,
            })
            .collect();
        state.votes.extend(votes.iter().copied());
        Ok(votes)
    }

    async fn votes_for_date(&self, date: NaiveDate) -> Result<Vec<InternalVote>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .votes
            .iter()
            .filter(|v| menu_date(&state, v.menu_id) == Some(date))
            .copied()
            .collect())
    }
}

fn menu_date(state: &State, menu_id: MenuId) -> Option<NaiveDate> {
    state
        .menus
        .iter()
        .find(|m| m.id == menu_id)
        .map(|m| m.date)
}

fn state_has_voted(state: &State, employee_id: EmployeeId, date: NaiveDate) -> bool {
    state
        .votes
        .iter()
        .any(|v| v.employee_id == employee_id && menu_date(state, v.menu_id) == Some(date))
}
