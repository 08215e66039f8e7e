//! API Handlers
//!
//! HTTP request handlers for each document cache endpoint.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::collection::Payload;
use crate::error::{CacheError, Result};
use crate::models::{
    ArrayRequest, CollectionsResponse, CreateCollectionRequest, CreatedResponse, HealthResponse,
    MatchedResponse, QueryRequest, RemovedResponse, ReplaceRequest, StatsResponse, UpdateRequest,
};
use crate::registry::Registry;
use crate::store::{Query, UpdateOp};

/// Application state shared across all handlers.
///
/// The registry is internally shared, so cloning the state is cheap.
#[derive(Clone, Default)]
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    /// Creates a new AppState over the given registry.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

/// Handler for GET /collections
pub async fn list_collections_handler(State(state): State<AppState>) -> Json<CollectionsResponse> {
    Json(CollectionsResponse {
        collections: state.registry.names().await,
    })
}

/// Handler for POST /collections
///
/// Creates a collection with optional search indexes and TTL.
pub async fn create_collection_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateCollectionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.registry.create(&req.name, req.options).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse::new(req.name))))
}

/// Handler for GET /collections/:name/stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>> {
    let collection = state.registry.get(&name).await?;
    let stats = collection.stats().await;
    Ok(Json(StatsResponse::new(name, &stats)))
}

/// Handler for POST /collections/:name/documents
///
/// Accepts a document or an array of documents; echoes them with ids.
pub async fn add_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let payload = Payload::from_value(body)?;
    let collection = state.registry.get(&name).await?;
    let inserted = collection.add(payload).await?;
    Ok(Json(inserted.into_value()))
}

/// Handler for POST /collections/:name/find
///
/// Returns a document or `null` for equality, an array for membership.
pub async fn find_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<Value>> {
    let query = req.query()?;
    let collection = state.registry.get(&name).await?;
    let found = collection.get(&query).await?;
    Ok(Json(found.into_value()))
}

/// Handler for POST /collections/:name/update
pub async fn update_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<MatchedResponse>> {
    let query = Query::from_spec(&req.query)?;
    let collection = state.registry.get(&name).await?;
    let matched = collection.update(&query, req.set).await?;
    Ok(Json(MatchedResponse { matched }))
}

/// Handler for POST /collections/:name/replace
pub async fn replace_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ReplaceRequest>,
) -> Result<Json<MatchedResponse>> {
    let query = Query::from_spec(&req.query)?;
    let collection = state.registry.get(&name).await?;
    let matched = collection.replace(&query, req.document).await?;
    Ok(Json(MatchedResponse { matched }))
}

/// Handler for POST /collections/:name/push
pub async fn push_handler(
    state: State<AppState>,
    name: Path<String>,
    req: Json<ArrayRequest>,
) -> Result<Json<MatchedResponse>> {
    array_operation(state, name, req, |field, value| UpdateOp::push(field, value)).await
}

/// Handler for POST /collections/:name/add-to-set
pub async fn add_to_set_handler(
    state: State<AppState>,
    name: Path<String>,
    req: Json<ArrayRequest>,
) -> Result<Json<MatchedResponse>> {
    array_operation(state, name, req, |field, value| UpdateOp::add_to_set(field, value)).await
}

/// Handler for POST /collections/:name/pull
pub async fn pull_handler(
    state: State<AppState>,
    name: Path<String>,
    req: Json<ArrayRequest>,
) -> Result<Json<MatchedResponse>> {
    array_operation(state, name, req, |field, value| UpdateOp::pull(field, value)).await
}

async fn array_operation(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ArrayRequest>,
    build: fn(String, Value) -> UpdateOp,
) -> Result<Json<MatchedResponse>> {
    let query = Query::from_spec(&req.query)?;
    let (field, value) = req.target()?;
    let collection = state.registry.get(&name).await?;
    let matched = collection.apply(&query, build(field, value)).await?;
    Ok(Json(MatchedResponse { matched }))
}

/// Handler for POST /collections/:name/remove
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<RemovedResponse>> {
    let query = req.query()?;
    let collection = state.registry.get(&name).await?;
    let removed = collection.remove(&query).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionOptions;
    use serde_json::json;

    async fn state_with_users() -> AppState {
        let state = AppState::default();
        state
            .registry
            .create("Users", CollectionOptions::new().with_search_field("username"))
            .await
            .unwrap();
        state
    }

    fn query_request(query: Value) -> Json<QueryRequest> {
        Json(serde_json::from_value(json!({ "query": query })).unwrap())
    }

    #[tokio::test]
    async fn test_add_and_find_handler() {
        let state = state_with_users().await;

        let body = json!([{"id": 1, "username": "user1"}, {"id": 2, "username": "user2"}]);
        let result = add_handler(State(state.clone()), Path("Users".to_string()), Json(body)).await;
        let inserted = result.unwrap();
        assert_eq!(inserted.as_array().unwrap().len(), 2);
        assert!(inserted[0].get("_id").is_some());

        let found = find_handler(
            State(state.clone()),
            Path("Users".to_string()),
            query_request(json!({"username": "user2"})),
        )
        .await
        .unwrap();
        assert_eq!(found.0, json!({"id": 2, "username": "user2"}));
    }

    #[tokio::test]
    async fn test_find_unknown_collection() {
        let state = AppState::default();
        let result = find_handler(
            State(state),
            Path("Shares".to_string()),
            query_request(json!({"id": 1})),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_collection_handler() {
        let state = AppState::default();
        let req = CreateCollectionRequest {
            name: "Users".to_string(),
            options: CollectionOptions::default(),
        };
        let (status, _) = create_collection_handler(State(state.clone()), Json(req.clone()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let result = create_collection_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_invalid_request() {
        let state = AppState::default();
        let req = CreateCollectionRequest {
            name: "".to_string(),
            options: CollectionOptions::default(),
        };
        let result = create_collection_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_array_handlers() {
        let state = state_with_users().await;
        let users = || Path("Users".to_string());
        add_handler(State(state.clone()), users(), Json(json!({"id": 1, "tags": []})))
            .await
            .unwrap();

        let req = || -> Json<ArrayRequest> {
            let body = json!({"query": {"id": 1}, "values": {"tags": "a"}});
            Json(serde_json::from_value(body).unwrap())
        };
        push_handler(State(state.clone()), users(), req()).await.unwrap();
        push_handler(State(state.clone()), users(), req()).await.unwrap();
        add_to_set_handler(State(state.clone()), users(), req()).await.unwrap();

        let found = find_handler(State(state.clone()), users(), query_request(json!({"id": 1})))
            .await
            .unwrap();
        assert_eq!(found.0["tags"], json!(["a", "a"]));

        let matched = pull_handler(State(state.clone()), users(), req()).await.unwrap();
        assert_eq!(matched.matched, 1);
        let found = find_handler(State(state), users(), query_request(json!({"id": 1})))
            .await
            .unwrap();
        assert_eq!(found.0["tags"], json!([]));
    }

    #[tokio::test]
    async fn test_remove_handler() {
        let state = state_with_users().await;
        add_handler(State(state.clone()), Path("Users".to_string()), Json(json!({"id": 1})))
            .await
            .unwrap();

        let removed = remove_handler(
            State(state.clone()),
            Path("Users".to_string()),
            query_request(json!({"id": [1, 2]})),
        )
        .await
        .unwrap();
        assert_eq!(removed.removed, 1);

        let stats = stats_handler(State(state), Path("Users".to_string())).await.unwrap();
        assert_eq!(stats.documents, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
