mod category;
mod index;
mod joke;
mod like;

use axum::{
    Router,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::AppState;

#[derive(Deserialize)]
pub(crate) struct OrderQuery {
    pub(crate) orderby: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index::index))
        .route("/index.html", get(home))
        .route("/joke/", get(home))
        .route("/joke/{id}", get(joke::joke))
        .route("/jokes/", get(home))
        .route("/jokes/{slug}", get(category::category))
        .route("/like", post(like::like))
}

async fn home() -> impl IntoResponse {
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, "/")])
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use crate::{
        AppState, Config, db,
        identity::Identity,
        store::{self, NewJoke},
    };

    async fn state() -> (AppState, i64) {
        let db_pool = db::open_in_memory().await.unwrap();
        let puns = store::create_category(&db_pool, "Puns", "puns").await.unwrap();
        let mut first = 0;
        for (i, text) in ["first pun", "second pun", "third pun"].into_iter().enumerate() {
            let joke = store::publish(
                &db_pool,
                NewJoke { text, reply: None, category_id: puns.id, created_at: i as i64 },
            )
            .await
            .unwrap();
            if i == 0 {
                first = joke.id;
            }
        }
        (AppState::new(db_pool, Config::default()), first)
    }

    async fn send(app_state: &AppState, request: Request<Body>) -> Response {
        crate::app(app_state.clone()).oneshot(request).await.unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn like(joke: &str, cookie: Option<&str>) -> Request<Body> {
        let mut request = Request::builder().method("POST").uri("/like");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        request.body(Body::from(joke.to_owned())).unwrap()
    }

    #[tokio::test]
    async fn front_page_lists_newest_first() {
        let (app_state, _) = state().await;
        let response = send(&app_state, get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        let third = body.find("third pun").unwrap();
        let first = body.find("first pun").unwrap();
        assert!(third < first);
        assert!(body.contains(r#"href="/jokes/puns""#));
    }

    #[tokio::test]
    async fn category_page_and_unknown_slug() {
        let (app_state, _) = state().await;
        let response = send(&app_state, get("/jokes/puns?orderby=older")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.find("first pun").unwrap() < body.find("third pun").unwrap());

        let response = send(&app_state, get("/jokes/nothing-here")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn joke_page_links_neighbors() {
        let (app_state, first) = state().await;
        let response = send(&app_state, get(&format!("/joke/{}", first + 1))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("second pun"));
        assert!(body.contains(&format!(r#"href="/joke/{first}""#)));
        assert!(body.contains(&format!(r#"href="/joke/{}""#, first + 2)));
    }

    #[tokio::test]
    async fn bad_joke_ids_are_not_found() {
        let (app_state, _) = state().await;
        for uri in ["/joke/999", "/joke/abc", "/joke/-1"] {
            assert_eq!(send(&app_state, get(uri)).await.status(), StatusCode::NOT_FOUND, "{uri}");
        }
        for uri in ["/joke/", "/jokes/", "/index.html"] {
            let response = send(&app_state, get(uri)).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{uri}");
            assert_eq!(response.headers()[header::LOCATION], "/");
        }
    }

    #[tokio::test]
    async fn like_issues_identity_once() {
        let (app_state, first) = state().await;

        let response = send(&app_state, like(&first.to_string(), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_owned();
        let token = cookie.split(';').next().unwrap().to_owned();
        assert!(token.starts_with("uuid="));
        assert_eq!(body_json(response).await, json!({ "outcome": "recorded", "likes": 1 }));

        let response = send(&app_state, like(&first.to_string(), Some(&token))).await;
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_json(response).await, json!({ "outcome": "already_liked", "likes": 1 }));

        let other = format!("uuid={}", Identity::issue());
        let response = send(&app_state, like(&first.to_string(), Some(&other))).await;
        assert_eq!(body_json(response).await, json!({ "outcome": "recorded", "likes": 2 }));

        let body = body_text(send(&app_state, {
            let mut request = get(&format!("/joke/{first}"));
            request.headers_mut().insert(header::COOKIE, token.parse().unwrap());
            request
        })
        .await)
        .await;
        assert!(body.contains(&format!(r#"data-joke="{first}" disabled"#)));
    }

    #[tokio::test]
    async fn like_unknown_or_malformed_is_not_found() {
        let (app_state, _) = state().await;
        for joke in ["999", "seven", ""] {
            let response = send(&app_state, like(joke, None)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{joke:?}");
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let (app_state, _) = state().await;
        assert_eq!(send(&app_state, get("/sitemap.txt")).await.status(), StatusCode::NOT_FOUND);
    }
}
