use std::{future::Future, time::Instant};

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use tracing::error;

use crate::{
    error::{parse_member_id, ApiError},
    models::member::{ChildrenQuery, FamilyMember, FamilyQuery, FamilyView, SearchQuery},
    services::{family::SEARCH_LIMIT, metrics},
    AppState,
};

#[derive(Debug, Clone, Copy)]
enum Endpoint {
    Roots,
    Children,
    Family,
    Search,
}

impl Endpoint {
    fn label(self) -> &'static str {
        match self {
            Self::Roots => "roots",
            Self::Children => "children",
            Self::Family => "family",
            Self::Search => "search",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Roots => "Failed to load roots",
            Self::Children => "Failed to load children",
            Self::Family => "Failed to load family",
            Self::Search => "Failed to search family members",
        }
    }
}

/// Runs store work under the configured timeout. Failures are logged here and
/// replaced by the endpoint's fixed message.
async fn guarded<T, F>(state: &AppState, endpoint: Endpoint, query: F) -> Result<T, ApiError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let started = Instant::now();
    let result = tokio::time::timeout(state.config.query_timeout, query).await;
    metrics::observe_query(endpoint.label(), started.elapsed().as_secs_f64());

    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            error!(endpoint = endpoint.label(), "query failed: {:#}", e);
            Err(ApiError::Internal(endpoint.failure_message()))
        }
        Err(_) => {
            error!(
                endpoint = endpoint.label(),
                "query timed out after {:?}", state.config.query_timeout
            );
            Err(ApiError::Internal(endpoint.failure_message()))
        }
    }
}

fn finish<T>(endpoint: Endpoint, result: Result<T, ApiError>) -> Result<Json<T>, ApiError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(ApiError::Validation(_)) => "invalid",
        Err(ApiError::Internal(_)) => "error",
    };
    metrics::record_outcome(endpoint.label(), outcome);
    result.map(Json)
}

/// GET /api/family/roots
pub async fn roots(State(state): State<AppState>) -> Result<Json<Vec<FamilyMember>>, ApiError> {
    let result = guarded(&state, Endpoint::Roots, state.store.roots()).await;
    finish(Endpoint::Roots, result)
}

/// GET /api/family/children?parent_id=
pub async fn children(
    State(state): State<AppState>,
    params: Result<Query<ChildrenQuery>, QueryRejection>,
) -> Result<Json<Vec<FamilyMember>>, ApiError> {
    let result = load_children(&state, params).await;
    finish(Endpoint::Children, result)
}

async fn load_children(
    state: &AppState,
    params: Result<Query<ChildrenQuery>, QueryRejection>,
) -> Result<Vec<FamilyMember>, ApiError> {
    let Query(params) = params?;
    let parent_id = parse_member_id("parent_id", params.parent_id.as_deref())?;
    guarded(state, Endpoint::Children, state.store.children(parent_id)).await
}

/// GET /api/family/family?person_id=
pub async fn family(
    State(state): State<AppState>,
    params: Result<Query<FamilyQuery>, QueryRejection>,
) -> Result<Json<FamilyView>, ApiError> {
    let result = load_family(&state, params).await;
    finish(Endpoint::Family, result)
}

/// Both reads share one timeout budget.
async fn load_family(
    state: &AppState,
    params: Result<Query<FamilyQuery>, QueryRejection>,
) -> Result<FamilyView, ApiError> {
    let Query(params) = params?;
    let person_id = parse_member_id("person_id", params.person_id.as_deref())?;
    let store = &state.store;

    guarded(state, Endpoint::Family, async move {
        let person = store.person(person_id).await?;
        // An unknown person has no children to show.
        let children = match person {
            Some(_) => store.children(person_id).await?,
            None => Vec::new(),
        };
        Ok::<_, anyhow::Error>(FamilyView { person, children })
    })
    .await
}

/// GET /api/family/search?q=
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<FamilyMember>>, ApiError> {
    let result = load_search(&state, params).await;
    finish(Endpoint::Search, result)
}

async fn load_search(
    state: &AppState,
    params: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Vec<FamilyMember>, ApiError> {
    let Query(params) = params?;
    let needle = params.q.unwrap_or_default();
    if needle.is_empty() {
        return Ok(Vec::new());
    }

    guarded(state, Endpoint::Search, state.store.search(&needle, SEARCH_LIMIT)).await
}
