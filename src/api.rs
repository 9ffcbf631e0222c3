//! REST API over the income service (feature `server`)
//!
//! Every response uses the `ApiResponse` envelope. Service errors map to
//! 400 (validation), 404 (not found), 409 (ambiguous reference) and 500.

use crate::db::Event;
use crate::error::Error;
use crate::service::IncomeService;
use crate::views::{IncomeSourceView, IncomeView, PersonView};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<Mutex<IncomeService>>,
    pub default_page_size: u32,
}

impl AppState {
    pub fn new(service: IncomeService, default_page_size: u32) -> Self {
        AppState {
            service: Arc::new(Mutex::new(service)),
            default_page_size,
        }
    }

    fn service(&self) -> Result<MutexGuard<'_, IncomeService>, ApiError> {
        self.service
            .lock()
            .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "service lock poisoned"))
    }
}

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: &str) -> Self {
        ApiError {
            status,
            message: message.to_string(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AmbiguousReference { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", err);
        }
        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/incomes?page=&size= (paginated when either is given)
async fn list_incomes(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<IncomeView>> {
    let Query(query) =
        query.map_err(|rejection| ApiError::new(StatusCode::BAD_REQUEST, &rejection.body_text()))?;
    let service = state.service()?;

    let incomes = match (query.page, query.size) {
        (None, None) => service.list_all_incomes()?,
        (page, size) => service.list_incomes(
            page.unwrap_or(0),
            size.unwrap_or(state.default_page_size),
        )?,
    };

    Ok(Json(ApiResponse::ok(incomes)))
}

/// GET /api/incomes/:id
async fn get_income(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<IncomeView> {
    let service = state.service()?;

    match service.find_income(id)? {
        Some(income) => Ok(Json(ApiResponse::ok(income))),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            &format!("income {} not found", id),
        )),
    }
}

/// POST /api/incomes
async fn create_income(
    State(state): State<AppState>,
    Json(view): Json<IncomeView>,
) -> Result<(StatusCode, Json<ApiResponse<IncomeView>>), ApiError> {
    let mut service = state.service()?;
    let saved = service.add_income(view)?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(saved))))
}

/// PUT /api/incomes/:id
async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(view): Json<IncomeView>,
) -> ApiResult<IncomeView> {
    let mut service = state.service()?;
    let saved = service.update_income(id, view)?;

    Ok(Json(ApiResponse::ok(saved)))
}

/// DELETE /api/incomes/:id
async fn delete_income(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<bool> {
    let mut service = state.service()?;
    let deleted = service.delete_income(id)?;

    Ok(Json(ApiResponse::ok(deleted)))
}

/// GET /api/incomes/:id/history
async fn income_history(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Vec<Event>> {
    let service = state.service()?;
    Ok(Json(ApiResponse::ok(service.income_history(id)?)))
}

/// GET /api/persons
async fn list_persons(State(state): State<AppState>) -> ApiResult<Vec<PersonView>> {
    let service = state.service()?;
    Ok(Json(ApiResponse::ok(service.list_persons()?)))
}

/// GET /api/sources
async fn list_sources(State(state): State<AppState>) -> ApiResult<Vec<IncomeSourceView>> {
    let service = state.service()?;
    Ok(Json(ApiResponse::ok(service.list_income_sources()?)))
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/incomes", get(list_incomes).post(create_income))
        .route(
            "/incomes/:id",
            get(get_income).put(update_income).delete(delete_income),
        )
        .route("/incomes/:id/history", get(income_history))
        .route("/persons", get(list_persons))
        .route("/sources", get(list_sources))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
