use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use movie_club::{
    app::build_app,
    config::AppConfig,
    db::StoreError,
    movies::{
        memory::MemoryMovieStore,
        repo::MovieStore,
        repo_types::{Director, Genre, Movie},
    },
    state::AppState,
    users::{
        repo::UserStore,
        repo_types::{NewUser, User, UserChanges},
    },
};
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    state: AppState,
    movie_id: Uuid,
}

fn test_app() -> TestApp {
    let movie_id = Uuid::new_v4();
    let movies = vec![Movie {
        id: movie_id,
        title: "Alien".into(),
        description: "In space no one can hear you scream.".into(),
        genre: Genre {
            name: "Horror".into(),
            description: "Scary".into(),
        },
        director: Director {
            name: "Ridley Scott".into(),
            bio: "English director".into(),
        },
        actors: vec!["Sigourney Weaver".into()],
        image_path: Some("alien.png".into()),
        featured: true,
    }];
    let state = AppState::in_memory(AppConfig::for_tests("integration-secret"), movies)
        .expect("state");
    TestApp {
        router: build_app(state.clone()),
        state,
        movie_id,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let auth = token.map(|t| format!("Bearer {t}"));
        let body = body.map(|b| b.to_string());
        let (status, _, value) = self
            .send(method, uri, auth.as_deref(), body.as_deref())
            .await;
        (status, value)
    }

    /// Sends `body` verbatim as JSON and returns the response content type too.
    async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, String, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(a) = authorization {
            req = req.header(header::AUTHORIZATION, a);
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_owned())),
            None => req.body(Body::empty()),
        }
        .expect("request");

        let res = self.router.clone().oneshot(req).await.expect("response");
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, content_type, value)
    }

    async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            "POST",
            "/users",
            None,
            Some(json!({
                "Username": username,
                "Password": password,
                "Email": format!("{username}@x.com"),
            })),
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token").to_string()
    }
}

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let app = test_app();

    let (status, body) = app.register("alice01", "p@ss1234").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "alice01");
    assert!(body.get("password_hash").is_none());

    let stored = app
        .state
        .users
        .find_by_username("alice01")
        .await
        .unwrap()
        .expect("stored user");
    assert_ne!(stored.password_hash, "p@ss1234");

    let token = app.login("alice01", "p@ss1234").await;
    let claims = app.state.jwt.verify(&token).expect("valid token");
    assert_eq!(claims.sub, "alice01");

    let (status, body) = app.call("GET", "/users/alice01", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice01@x.com");

    let (head, sig) = token.rsplit_once('.').unwrap();
    let mut sig: Vec<char> = sig.chars().collect();
    let i = sig.len() / 2;
    sig[i] = if sig[i] == 'A' { 'B' } else { 'A' };
    let forged = format!("{head}.{}", sig.into_iter().collect::<String>());
    let (status, _) = app.call("GET", "/users/alice01", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_are_generic_and_issue_no_token() {
    let app = test_app();
    app.register("alice01", "p@ss1234").await;

    let (s1, b1) = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "nobody1", "password": "p@ss1234" })),
        )
        .await;
    let (s2, b2) = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "alice01", "password": "wrong" })),
        )
        .await;

    assert_eq!(s1, StatusCode::BAD_REQUEST);
    assert_eq!(s2, StatusCode::BAD_REQUEST);
    assert_eq!(b1, b2);
    assert!(b1.get("token").is_none());
}

#[tokio::test]
async fn registration_validates_and_rejects_duplicates() {
    let app = test_app();

    let (status, body) = app
        .call(
            "POST",
            "/users",
            None,
            Some(json!({ "Username": "a_b", "Password": "", "Email": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"username"));
    assert!(fields.contains(&"password"));
    assert!(fields.contains(&"email"));

    let (status, _) = app.register("bobby01", "secret").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = app.register("bobby01", "other").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "bobby01 already exists");
}

#[tokio::test]
async fn guard_rejects_missing_and_expired_tokens() {
    let app = test_app();
    app.register("carol01", "secret").await;

    let (status, _) = app.call("GET", "/movies", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = app
        .state
        .users
        .find_by_username("carol01")
        .await
        .unwrap()
        .unwrap();
    let stale = app
        .state
        .jwt
        .sign_at(&user, OffsetDateTime::now_utc() - Duration::days(8))
        .unwrap();
    let (status, _) = app.call("GET", "/movies", Some(&stale), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn guard_resolves_live_record_by_id() {
    let app = test_app();
    app.register("dave001", "secret").await;
    let token = app.login("dave001", "secret").await;

    let (status, body) = app
        .call(
            "PUT",
            "/users/dave001",
            Some(&token),
            Some(json!({
                "Username": "dave002",
                "Password": "secret2",
                "Email": "dave@x.com",
                "Birthday": "1991-02-03",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["birthday"], "1991-02-03");

    // The token still names dave001 but resolves through the id.
    let (status, _) = app.call("GET", "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call("DELETE", "/users/dave002", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "dave002 was deleted");

    let (status, _) = app.call("GET", "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn favorites_have_set_semantics() {
    let app = test_app();
    app.register("erin001", "secret").await;
    let token = app.login("erin001", "secret").await;
    let uri = format!("/users/favorites/erin001/{}", app.movie_id);

    for _ in 0..2 {
        let (status, _) = app.call("POST", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, body) = app.call("GET", "/users/erin001", Some(&token), None).await;
    assert_eq!(body["favorite_movies"], json!([app.movie_id]));

    let unknown = format!("/users/favorites/erin001/{}", Uuid::new_v4());
    let (status, _) = app.call("POST", &unknown, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call("DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.call("GET", "/users/erin001", Some(&token), None).await;
    assert_eq!(body["favorite_movies"], json!([]));
}

#[tokio::test]
async fn movie_lookups() {
    let app = test_app();
    app.register("frank01", "secret").await;
    let token = app.login("frank01", "secret").await;

    let (status, body) = app.call("GET", "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = app.call("GET", "/movies/Alien", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["director"]["name"], "Ridley Scott");

    let (_, body) = app.call("GET", "/movies/genre/Horror", Some(&token), None).await;
    assert_eq!(body["name"], "Horror");

    let (_, body) = app
        .call("GET", "/movies/director/Ridley%20Scott", Some(&token), None)
        .await;
    assert_eq!(body["bio"], "English director");

    let (status, _) = app.call("GET", "/movies/Missing", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn welcome_banner_is_public() {
    let app = test_app();
    let (status, body) = app.call("GET", "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Welcome to my Movie Club!".into()));
}

#[tokio::test]
async fn malformed_login_body_is_invalid_credentials() {
    let app = test_app();
    app.register("alice01", "p@ss1234").await;

    let (_, _, wrong_password) = app
        .send(
            "POST",
            "/login",
            None,
            Some(r#"{"username":"alice01","password":"nope"}"#),
        )
        .await;

    for body in [r#"{"username":"alice01"}"#, "not json", "{}"] {
        let (status, content_type, value) = app.send("POST", "/login", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(content_type.starts_with("application/json"), "body {body}");
        assert_eq!(value, wrong_password, "body {body}");
        assert!(value.get("token").is_none());
    }
}

#[tokio::test]
async fn body_and_path_rejections_render_as_json() {
    let app = test_app();
    app.register("gina001", "secret").await;
    let token = app.login("gina001", "secret").await;
    let bearer = format!("Bearer {token}");

    let (status, content_type, value) = app
        .send("POST", "/users", None, Some("{\"Username\": "))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(value["message"].is_string());

    let (status, content_type, value) = app
        .send(
            "PUT",
            "/users/gina001",
            Some(&bearer),
            Some(r#"{"Username":"gina001","Password":"x","Email":"g@x.com","Birthday":12}"#),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(value["message"].is_string());

    let (status, content_type, value) = app
        .send("POST", "/users/favorites/gina001/not-a-uuid", Some(&bearer), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(value["message"].is_string());
}

#[tokio::test]
async fn guard_rejects_wrong_scheme_and_blank_bearer() {
    let app = test_app();
    app.register("hank001", "secret").await;
    let token = app.login("hank001", "secret").await;

    let basic = format!("Basic {token}");
    for header_value in [basic.as_str(), "Bearer ", "Bearer    ", token.as_str()] {
        let (status, content_type, value) = app
            .send("GET", "/movies", Some(header_value), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header_value:?}");
        assert!(content_type.starts_with("application/json"));
        assert!(value["message"].is_string());
    }

    let (status, _, _) = app
        .send("GET", "/movies", Some(&format!("bearer {token}")), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn profile_update_and_delete_edge_cases() {
    let app = test_app();
    app.register("ivan001", "secret").await;
    app.register("jane001", "secret").await;
    let token = app.login("ivan001", "secret").await;

    let (status, body) = app
        .call(
            "PUT",
            "/users/ivan001",
            Some(&token),
            Some(json!({ "Username": "iv", "Password": "", "Email": "bad" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"].as_array().map(Vec::len), Some(3));

    let valid = json!({
        "Username": "ghost01",
        "Password": "secret",
        "Email": "ghost@x.com",
    });
    let (status, body) = app
        .call("PUT", "/users/ghost00", Some(&token), Some(valid))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ghost00 was not found");

    let (status, body) = app
        .call(
            "PUT",
            "/users/ivan001",
            Some(&token),
            Some(json!({
                "Username": "jane001",
                "Password": "secret",
                "Email": "ivan@x.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "jane001 already exists");

    let (_, body) = app.call("GET", "/users/ivan001", Some(&token), None).await;
    assert_eq!(body["email"], "ivan001@x.com");

    let (status, body) = app.call("DELETE", "/users/nobody9", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "nobody9 was not found");
}

/// User store whose every call times out.
struct UnavailableUsers;

#[async_trait]
impl UserStore for UnavailableUsers {
    async fn find_by_username(&self, _: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn find_by_id(&self, _: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn create(&self, _: NewUser) -> Result<User, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn update(&self, _: &str, _: UserChanges) -> Result<Option<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn delete(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn add_favorite(&self, _: &str, _: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
    async fn remove_favorite(&self, _: &str, _: Uuid) -> Result<Option<User>, StoreError> {
        Err(StoreError::Timeout(StdDuration::from_secs(5)))
    }
}

#[tokio::test]
async fn store_failures_surface_as_generic_500() {
    let state = AppState::from_parts(
        Arc::new(UnavailableUsers) as Arc<dyn UserStore>,
        Arc::new(MemoryMovieStore::new(Vec::new())) as Arc<dyn MovieStore>,
        AppConfig::for_tests("integration-secret"),
    )
    .expect("state");
    let app = TestApp {
        router: build_app(state.clone()),
        state,
        movie_id: Uuid::new_v4(),
    };

    let (status, body) = app.register("kate001", "secret").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Internal server error" }));

    let (status, body) = app
        .call(
            "POST",
            "/login",
            None,
            Some(json!({ "username": "kate001", "password": "secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Internal server error" }));

    // The guard's lookup fails before any handler runs.
    let user = User {
        id: Uuid::new_v4(),
        username: "kate001".into(),
        password_hash: String::new(),
        email: "kate@x.com".into(),
        birthday: None,
        favorite_movies: Vec::new(),
        created_at: OffsetDateTime::now_utc(),
    };
    let token = app.state.jwt.sign(&user).expect("sign");
    let (status, body) = app.call("GET", "/movies", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Internal server error" }));
}
