//! 查询 API 处理器

use std::sync::Arc;

use axum::{
    extract::{Json as ExtractJson, State},
    response::{IntoResponse, Json, Response},
};

use crate::dictionary::{DictError, DictType, LookupFailure};
use crate::web::types::{
    parse_dict_type, status_for, AppState, BatchSearchRequest, ErrorResponse, SearchWordRequest,
};

fn lookup_failure(word: &str, error: &DictError, dict_type: Option<DictType>) -> Response {
    let word = word.trim();
    let body = LookupFailure::from_error(word, word, error, false, dict_type);
    (status_for(error.kind()), Json(body)).into_response()
}

/// 查询单个词
pub async fn search_word(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<SearchWordRequest>,
) -> Response {
    let dict_type = match parse_dict_type(request.dict_type.as_deref()) {
        Ok(dict_type) => dict_type,
        Err(e) => return lookup_failure(&request.word, &e, None),
    };

    match state.service.lookup(&request.word, dict_type).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => lookup_failure(&request.word, &e, Some(dict_type)),
    }
}

/// 批量查询
pub async fn batch_search_words(
    State(state): State<Arc<AppState>>,
    ExtractJson(request): ExtractJson<BatchSearchRequest>,
) -> Response {
    let result = match parse_dict_type(request.dict_type.as_deref()) {
        Ok(dict_type) => {
            state
                .service
                .batch_lookup(&request.words, dict_type, request.return_cached_json)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => (status_for(e.kind()), Json(ErrorResponse::from_error(&e))).into_response(),
    }
}
