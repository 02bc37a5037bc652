//! HTTP surface: axum router, request/response types, and the mapping
//! from [`SwapError`] kinds to status codes.

use crate::{
    auth::{self, Action, IdentityVerifier, Principal},
    database::Database,
    error::SwapError,
    ledger::SwapLedger,
    model::{Item, ItemPatch, NewItem, Swap, SwapStatus, User},
    registry::ItemRegistry,
    ItemId, SwapId,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub ledger: SwapLedger,
    pub registry: ItemRegistry,
    pub db: Database,
    pub verifier: IdentityVerifier,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/swaps", post(create_swap).get(list_swaps))
        .route("/api/swaps/history", get(swap_history))
        .route("/api/swaps/:swap_id", get(get_swap).put(transition_swap))
        .route("/api/items", post(create_item).get(list_items))
        .route(
            "/api/items/:item_id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/users/me", get(get_profile))
        .route("/api/users/me/dashboard", get(get_dashboard))
        .route("/api/admin/items/pending", get(pending_items))
        .route("/api/admin/items/:item_id/approve", put(approve_item))
        .route("/api/admin/items/:item_id/reject", put(reject_item))
        .route("/api/admin/users", get(list_users))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for SwapError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            SwapError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            SwapError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            SwapError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            SwapError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            SwapError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            _ => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Bearer-token extractor. Verification is the hand-off point to the
/// external identity provider; handlers only ever see a [`Principal`].
pub struct AuthPrincipal(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = SwapError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| SwapError::Auth("Missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| SwapError::Auth("Malformed authorization header".to_string()))?;

        let principal = state.verifier.verify(token)?;
        Ok(AuthPrincipal(principal))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSwapRequest {
    pub item_id: ItemId,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionSwapRequest {
    pub status: SwapStatus,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: User,
    pub items: Vec<Item>,
}

// swaps

async fn create_swap(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(request): Json<CreateSwapRequest>,
) -> Result<Json<Swap>, SwapError> {
    let swap = state
        .ledger
        .create_swap(&principal, request.item_id, request.message)
        .await?;
    Ok(Json(swap))
}

async fn list_swaps(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<Swap>>, SwapError> {
    Ok(Json(state.ledger.list_swaps(principal.id).await?))
}

async fn swap_history(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<Swap>>, SwapError> {
    Ok(Json(state.ledger.history(principal.id).await?))
}

async fn get_swap(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(swap_id): Path<SwapId>,
) -> Result<Json<Swap>, SwapError> {
    Ok(Json(state.ledger.get_swap(&principal, swap_id).await?))
}

async fn transition_swap(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(swap_id): Path<SwapId>,
    Json(request): Json<TransitionSwapRequest>,
) -> Result<Json<Swap>, SwapError> {
    let swap = state
        .ledger
        .transition(&principal, swap_id, request.status, request.message)
        .await?;
    Ok(Json(swap))
}

// items

async fn create_item(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Json(new_item): Json<NewItem>,
) -> Result<Json<Item>, SwapError> {
    Ok(Json(state.registry.create_item(&principal, new_item).await?))
}

async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<Vec<Item>>, SwapError> {
    Ok(Json(state.registry.list_items(query.offset, query.limit).await?))
}

async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> Result<Json<Item>, SwapError> {
    Ok(Json(state.registry.get_item(item_id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(item_id): Path<ItemId>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<Item>, SwapError> {
    Ok(Json(state.registry.update_item(&principal, item_id, patch).await?))
}

async fn delete_item(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(item_id): Path<ItemId>,
) -> Result<Json<serde_json::Value>, SwapError> {
    state.registry.delete_item(&principal, item_id).await?;
    Ok(Json(serde_json::json!({ "message": "Item deleted" })))
}

// users

async fn get_profile(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<User>, SwapError> {
    state.db.ensure_user(principal.id, principal.is_admin).await?;
    let user = state
        .db
        .get_user(principal.id)
        .await?
        .ok_or_else(|| SwapError::NotFound(format!("User {} not found", principal.id)))?;
    Ok(Json(user))
}

async fn get_dashboard(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<DashboardResponse>, SwapError> {
    state.db.ensure_user(principal.id, principal.is_admin).await?;
    let user = state
        .db
        .get_user(principal.id)
        .await?
        .ok_or_else(|| SwapError::NotFound(format!("User {} not found", principal.id)))?;
    let items = state.db.items_for_owner(principal.id).await?;
    Ok(Json(DashboardResponse { user, items }))
}

// admin

async fn pending_items(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<Item>>, SwapError> {
    Ok(Json(state.registry.pending_items(&principal).await?))
}

async fn approve_item(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(item_id): Path<ItemId>,
) -> Result<Json<Item>, SwapError> {
    Ok(Json(state.registry.approve_item(&principal, item_id).await?))
}

async fn reject_item(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
    Path(item_id): Path<ItemId>,
) -> Result<Json<Item>, SwapError> {
    Ok(Json(state.registry.reject_item(&principal, item_id).await?))
}

async fn list_users(
    State(state): State<AppState>,
    AuthPrincipal(principal): AuthPrincipal,
) -> Result<Json<Vec<User>>, SwapError> {
    auth::authorize(&principal, &Action::ListUsers)?;
    Ok(Json(state.db.list_users().await?))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
