//! GET /search-students?q=
//!
//! Suggests student names for the makers field of the upload form.

use hyper::{Response, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::routes::{json_response, BoxBody};
use crate::server::AppState;
use crate::types::Result;

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub items: Vec<String>,
}

pub async fn handle_search_students(uri: &Uri, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let query: SearchQuery = uri
        .query()
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();

    let items = state.gallery.search_students(&query.q).await?;

    Ok(json_response(
        StatusCode::OK,
        &SearchResponse {
            success: true,
            items,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::routes::test_support::read_json;
    use crate::server::test_state;

    #[tokio::test]
    async fn test_search() {
        let state = test_state();
        state.identities.create("Ayşe Yılmaz", Role::Student, "1").await.unwrap();
        state.identities.create("Ayla Kaya", Role::Student, "1").await.unwrap();

        let uri: Uri = "/search-students?q=Ay%C5%9Fe".parse().unwrap();
        let (_, body) = read_json(handle_search_students(&uri, state.clone()).await.unwrap()).await;
        assert_eq!(body["items"], serde_json::json!(["Ayşe Yılmaz"]));

        let uri: Uri = "/search-students?q=a".parse().unwrap();
        let (_, body) = read_json(handle_search_students(&uri, state.clone()).await.unwrap()).await;
        assert_eq!(body["items"], serde_json::json!([]));

        let uri: Uri = "/search-students".parse().unwrap();
        let (status, body) = read_json(handle_search_students(&uri, state).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
