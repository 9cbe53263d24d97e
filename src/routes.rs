//! HTTP handlers and their request/response shapes.
//!
//! The vote body keeps its list fields as raw JSON so the admission engine
//! can report shape violations with the exact contract wording; everything
//! else uses ordinary typed DTOs.

use crate::auth::{self, AuthenticatedEmployee};
use crate::domain::admission::{self, CastError, Submission};
use crate::domain::protocol::Protocol;
use crate::domain::{
    results, EmployeeId, InternalMenu, MenuId, NewEmployee, NewMenu, RestaurantId, SessionToken,
};
use crate::error::ApiError;
use crate::store::{Store, StoreError};
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{info, instrument};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn internal(err: StoreError) -> ApiError {
    ApiError::Internal(err.into())
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct EmployeeResponse {
    pub id: EmployeeId,
    pub username: String,
    pub email: String,
}

#[instrument(skip(store, body), fields(username = %body.username))]
pub async fn create_employee(
    store: web::Data<dyn Store>,
    body: web::Json<CreateEmployeeRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.username.trim().is_empty() {
        return Err(ApiError::BadRequest("Username must not be blank.".into()));
    }
    if body.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be blank.".into()));
    }
    let password_hash = auth::hash_password(&body.password)?;
    let employee = store
        .create_employee(NewEmployee {
            username: body.username,
            email: body.email,
            password_hash,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => {
                ApiError::Conflict("A user with that username already exists.".into())
            }
            other => internal(other),
        })?;
    info!("employee registered");
    Ok(HttpResponse::Created().json(EmployeeResponse {
        id: employee.id,
        username: employee.username,
        email: employee.email,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: SessionToken,
}

#[instrument(skip(store, body), fields(username = %body.username))]
pub async fn login(
    store: web::Data<dyn Store>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let employee = store
        .employee_by_username(&body.username)
        .await
        .map_err(internal)?;
    let employee = match employee {
        Some(employee) if auth::verify_password(&body.password, &employee.password_hash) => {
            employee
        }
        _ => return Err(ApiError::Unauthorized),
    };
    let session = store.create_session(employee.id).await.map_err(internal)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token: session.token,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RestaurantResponse {
    pub id: RestaurantId,
    pub name: String,
}

#[instrument(skip(store, body, _employee))]
pub async fn create_restaurant(
    store: web::Data<dyn Store>,
    _employee: AuthenticatedEmployee,
    body: web::Json<CreateRestaurantRequest>,
) -> Result<HttpResponse, ApiError> {
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name must not be blank.".into()));
    }
    let restaurant = store
        .create_restaurant(&body.name)
        .await
        .map_err(internal)?;
    Ok(HttpResponse::Created().json(RestaurantResponse {
        id: restaurant.id,
        name: restaurant.name,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    pub restaurant: RestaurantId,
    pub date: NaiveDate,
    pub items: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub id: MenuId,
    pub restaurant: RestaurantId,
    pub date: NaiveDate,
    pub items: Vec<String>,
}

impl From<InternalMenu> for MenuResponse {
    fn from(menu: InternalMenu) -> Self {
        Self {
            id: menu.id,
            restaurant: menu.restaurant_id,
            date: menu.date,
            items: menu.items,
        }
    }
}

#[instrument(skip(store, body, _employee), fields(restaurant = ?body.restaurant, date = %body.date))]
pub async fn create_menu(
    store: web::Data<dyn Store>,
    _employee: AuthenticatedEmployee,
    body: web::Json<CreateMenuRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let menu = store
        .create_menu(NewMenu {
            restaurant_id: body.restaurant,
            date: body.date,
            items: body.items,
        })
        .await
        .map_err(|err| match err {
            StoreError::Duplicate => ApiError::Conflict(
                "Menu for this restaurant already exists for the day.".into(),
            ),
            StoreError::ForeignKey => {
                ApiError::BadRequest("Restaurant does not exist.".into())
            }
            other => internal(other),
        })?;
    Ok(HttpResponse::Created().json(MenuResponse::from(menu)))
}

#[instrument(skip(store, _employee))]
pub async fn menus_today(
    store: web::Data<dyn Store>,
    _employee: AuthenticatedEmployee,
) -> Result<HttpResponse, ApiError> {
    let menus = store.menus_for_date(today()).await.map_err(internal)?;
    if menus.is_empty() {
        return Err(ApiError::NotFound("No menu found.".into()));
    }
    let menus: Vec<MenuResponse> = menus.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(menus))
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub menu_ids: Option<Value>,
    pub points: Option<Value>,
}

#[instrument(skip(store, req, body, employee), fields(employee_id = ?employee.id))]
pub async fn submit_vote(
    store: web::Data<dyn Store>,
    employee: AuthenticatedEmployee,
    req: HttpRequest,
    body: web::Json<VoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let version = req
        .headers()
        .get("Build-Version")
        .and_then(|value| value.to_str().ok());
    let body = body.into_inner();
    let submission = Submission {
        protocol: Protocol::from_header(version),
        menu_ids: body.menu_ids,
        points: body.points,
    };

    let votes = admission::cast(store.get_ref(), employee.id, today(), &submission)
        .await
        .map_err(|err| match err {
            CastError::Rejected(rejection) => ApiError::Rejected(rejection),
            CastError::Store(store_err) => internal(store_err),
        })?;
    info!(votes = votes.len(), "votes cast");
    Ok(HttpResponse::Created().json(json!({ "status": "Votes cast successfully" })))
}

#[instrument(skip(store, _employee))]
pub async fn results_today(
    store: web::Data<dyn Store>,
    _employee: AuthenticatedEmployee,
) -> Result<HttpResponse, ApiError> {
    let totals: HashMap<MenuId, i32> = results::tally_for_date(store.get_ref(), today())
        .await
        .map_err(internal)?;
    Ok(HttpResponse::Ok().json(totals))
}
