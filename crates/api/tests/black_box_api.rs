use std::net::{IpAddr, Ipv4Addr};

use chrono::{Duration as ChronoDuration, Utc};
use quillpost_api::{app, AppConfig};
use quillpost_auth::{HashCost, TokenCodec};
use quillpost_core::UserId;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory storage, cheap hashing, ephemeral port.
        let config = AppConfig {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            jwt_secret: JWT_SECRET.to_string(),
            database_url: None,
            hash_cost: HashCost {
                memory_kib: 1024,
                iterations: 1,
                lanes: 1,
            },
        };
        let app = app::build_app(&config).await.expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn signup(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Sign up and log in; returns the `Cookie` header value for the session.
    async fn session(&self, username: &str) -> String {
        let res = self.signup(username, "123456a!").await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = self.login(username, "123456a!").await;
        assert_eq!(res.status(), StatusCode::OK);
        session_cookie(&res)
    }

    async fn create_post(&self, cookie: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/post"))
            .header(header::COOKIE, cookie)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn session_cookie(res: &reqwest::Response) -> String {
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("missing Set-Cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

async fn body(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}

#[tokio::test]
async fn ping_health_and_unknown_routes() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/api/ping")).send().await.unwrap();
    assert_eq!(body(res).await, json!({ "message": "pong" }));

    let res = srv.client.get(srv.url("/api/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "GET /api/nope not found");
}

#[tokio::test]
async fn wrong_method_on_known_path_is_not_found() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/auth/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body(res).await,
        json!({ "message": "GET /api/auth/login not found" })
    );

    let res = srv.client.post(srv.url("/api/ping")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "POST /api/ping not found");

    // Method check happens before the auth gate.
    let res = srv.client.patch(srv.url("/api/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "PATCH /api/profile not found");
}

#[tokio::test]
async fn signup_rejects_short_username_and_short_password() {
    let srv = TestServer::spawn().await;

    let res = srv.signup("ab", "123456a!").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let errors = body(res).await;
    assert_eq!(errors[0]["field"], "username");
    assert_eq!(
        errors[0]["message"],
        "Username should be at least 3 allowed characters"
    );

    let res = srv.signup("validuser", "short").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let error = body(res).await;
    assert_eq!(error["kind"], "ValidationError");
    assert_eq!(error["message"], "Password should only be 8-32 characters");
}

#[tokio::test]
async fn signup_requires_password_and_unique_username() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/api/auth/signup"))
        .json(&json!({ "username": "qwe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(res).await,
        json!({ "kind": "MissingParameter", "message": "password is missing or not supplied" })
    );

    let res = srv.signup("qwe", "123456a!").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body(res).await;
    assert_eq!(created["message"], "Sign up successful");
    assert_eq!(created["username"], "qwe");

    let res = srv.signup("qwe", "123456a!").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await[0]["message"], "Username is already taken");
}

#[tokio::test]
async fn login_logout_and_guest_only_routes() {
    let srv = TestServer::spawn().await;
    srv.signup("qwe", "123456a!").await;

    let res = srv.login("qwe", "wrong-pass1!").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "Incorrect username/password");

    let res = srv.login("nobody", "123456a!").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.login("qwe", "123456a!").await;
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Max-Age=86400"));

    // Any cookie, even a bogus one, blocks login.
    let res = srv
        .client
        .post(srv.url("/api/auth/login"))
        .header(header::COOKIE, "jwt=bogus")
        .json(&json!({ "username": "qwe", "password": "123456a!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "You are already logged in");

    let res = srv.client.delete(srv.url("/api/auth/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "You are not logged in");

    let res = srv
        .client
        .delete(srv.url("/api/auth/logout"))
        .header(header::COOKIE, "jwt=bogus")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn auth_gate_rejects_missing_and_bad_tokens() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/api/post")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "You are not logged in");

    let res = srv
        .client
        .get(srv.url("/api/post"))
        .header(header::COOKIE, "jwt=secretjwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(res).await,
        json!({ "kind": "SignatureOrExpiryError", "message": "jwt malformed" })
    );

    let forged = TokenCodec::new(b"another-secret")
        .issue(UserId::new(), "mallory")
        .unwrap();
    let res = srv
        .client
        .get(srv.url("/api/post"))
        .header(header::COOKIE, format!("jwt={forged}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "invalid signature");

    let stale = TokenCodec::new(JWT_SECRET.as_bytes())
        .issue_at(UserId::new(), "old", Utc::now() - ChronoDuration::hours(25))
        .unwrap();
    let res = srv
        .client
        .get(srv.url("/api/post"))
        .header(header::COOKIE, format!("jwt={stale}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["message"], "jwt expired");
}

#[tokio::test]
async fn post_lifecycle() {
    let srv = TestServer::spawn().await;
    let cookie = srv.session("author").await;

    let res = srv.create_post(&cookie, json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let errors = body(res).await;
    assert_eq!(errors[0]["message"], "Post should have a title");
    assert_eq!(errors[1]["message"], "Post should have a body");

    let res = srv
        .create_post(&cookie, json!({ "title": "Hello", "body": "World" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = body(res).await;
    assert_eq!(created["message"], "Post create successful");
    let id = created["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "subtitle": "x".repeat(81) }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(res).await[0]["message"],
        "Subtitle should be at most 80 characters"
    );

    let res = srv
        .client
        .put(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "title": "Hello again" }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await["message"], "Post update successful");

    let res = srv
        .client
        .get(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let post = body(res).await;
    assert_eq!(post["title"], "Hello again");
    assert_eq!(post["body"], "World");

    let owner = post["owner"].as_str().unwrap().to_string();
    let res = srv
        .client
        .get(srv.url(&format!("/api/post/owner/{owner}")))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await.as_array().unwrap().len(), 1);

    let res = srv
        .client
        .get(srv.url(&format!("/api/post/owner/{}", UserId::new())))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await, json!([]));

    let res = srv
        .client
        .delete(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await["message"], "Post delete successful");

    let res = srv
        .client
        .get(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "Post not found");
}

#[tokio::test]
async fn only_the_owner_can_change_a_post() {
    let srv = TestServer::spawn().await;
    let alice = srv.session("alice").await;
    let bob = srv.session("bob").await;

    let res = srv
        .create_post(&alice, json!({ "title": "Mine", "body": "Hands off" }))
        .await;
    let id = body(res).await["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &bob)
        .json(&json!({ "title": "Stolen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body(res).await,
        json!({ "kind": "AuthorizationError", "message": "User cannot edit other users' post" })
    );

    let res = srv
        .client
        .delete(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body(res).await["message"], "User cannot delete other users' post");

    let res = srv
        .client
        .get(srv.url(&format!("/api/post/{id}")))
        .header(header::COOKIE, &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(res).await["title"], "Mine");
}

#[tokio::test]
async fn malformed_identifiers_are_bad_requests() {
    let srv = TestServer::spawn().await;
    let cookie = srv.session("qwe").await;

    for path in ["/api/post/not-a-uuid", "/api/post/owner/not-a-uuid"] {
        let res = srv
            .client
            .get(srv.url(path))
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(res).await["kind"], "MalformedIdentifier");
    }
}

#[tokio::test]
async fn invalid_json_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    let cookie = srv.session("qwe").await;

    let res = srv
        .client
        .post(srv.url("/api/post"))
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body("{title:")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await["kind"], "ValidationError");
}

#[tokio::test]
async fn password_change_enforces_policy() {
    let srv = TestServer::spawn().await;
    let cookie = srv.session("qwe").await;

    let res = srv
        .client
        .put(srv.url("/api/profile/password"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "password": "1234abcd" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body(res).await["message"],
        "Password should have at least one character, number, and symbol"
    );

    // Unchanged: the old password still works.
    assert_eq!(srv.login("qwe", "123456a!").await.status(), StatusCode::OK);

    let res = srv
        .client
        .put(srv.url("/api/profile/password"))
        .header(header::COOKIE, &cookie)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await["kind"], "MissingParameter");

    let res = srv
        .client
        .put(srv.url("/api/profile/password"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "password": "n3w-secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await["message"], "Password change successful");

    assert_eq!(srv.login("qwe", "123456a!").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.login("qwe", "n3w-secret").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn profile_update_changes_display_name_only() {
    let srv = TestServer::spawn().await;
    let cookie = srv.session("qwe").await;

    let res = srv
        .client
        .get(srv.url("/api/profile"))
        .header(header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(body(res).await["display_name"], "qwe");

    let res = srv
        .client
        .put(srv.url("/api/profile"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "name": "qwertyuiopasdfghjklzxcvbnm" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(res).await[0]["message"], "Name should be at most 24 characters");

    // A password key in a profile payload is ignored.
    let res = srv
        .client
        .put(srv.url("/api/profile"))
        .header(header::COOKIE, &cookie)
        .json(&json!({ "name": "Q", "password": "zzzzzzz1!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(res).await["message"], "User update successful");

    assert_eq!(srv.login("qwe", "123456a!").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn mutations_check_existence_then_ownership_then_fields() {
    let srv = TestServer::spawn().await;
    let alice = srv.session("alice").await;
    let bob = srv.session("bob").await;

    let missing = format!("/api/post/{}", UserId::new());
    let res = srv
        .client
        .put(srv.url(&missing))
        .header(header::COOKIE, &alice)
        .json(&json!({ "title": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body(res).await,
        json!({ "kind": "NotFoundError", "message": "Post not found" })
    );

    let res = srv
        .client
        .delete(srv.url(&missing))
        .header(header::COOKIE, &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body(res).await["message"], "Post not found");

    let res = srv
        .create_post(&alice, json!({ "title": "Mine", "body": "Hands off" }))
        .await;
    let id = body(res).await["id"].as_str().unwrap().to_string();

    for invalid in [json!({ "title": "" }), json!({ "subtitle": "x".repeat(81) })] {
        let res = srv
            .client
            .put(srv.url(&format!("/api/post/{id}")))
            .header(header::COOKIE, &bob)
            .json(&invalid)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body(res).await,
            json!({ "kind": "AuthorizationError", "message": "User cannot edit other users' post" })
        );
    }

    for res in [
        srv.client
            .put(srv.url("/api/post/not-a-uuid"))
            .header(header::COOKIE, &alice)
            .json(&json!({ "title": "x" }))
            .send()
            .await
            .unwrap(),
        srv.client
            .delete(srv.url("/api/post/not-a-uuid"))
            .header(header::COOKIE, &alice)
            .send()
            .await
            .unwrap(),
    ] {
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body(res).await["kind"], "MalformedIdentifier");
    }
}
