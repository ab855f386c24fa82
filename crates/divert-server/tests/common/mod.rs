//! Shared harness for the HTTP integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use divert_core::config::SiteConfig;
use divert_server::accounts::{self, NewAccount};
use divert_server::server::{AppState, build_router};
use divert_server::storage::{Account, Database};

pub const PASSWORD: &str = "correct-horse-7";

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl TestResponse {
    /// Assert a 303 to `to` and hand back the response for further checks.
    pub fn assert_redirect(&self, to: &str) -> &Self {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location.as_deref(), Some(to));
        self
    }

    pub fn items(&self) -> &Vec<Value> {
        self.body["page"]["items"].as_array().unwrap()
    }

    pub fn messages(&self) -> Vec<String> {
        self.body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["message"].as_str().unwrap().to_string())
            .collect()
    }

    pub fn field_value(&self, field: &str) -> Option<String> {
        self.body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == field)
            .and_then(|f| f["value"].as_str().map(String::from))
    }

    pub fn field_errors(&self, field: &str) -> Vec<String> {
        self.body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == field)
            .map(|f| {
                f["errors"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|e| e.as_str().unwrap().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::open_in_memory().await.unwrap();
        let state = AppState::new(db, b"test-secret", 3600, SiteConfig::default());
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub async fn account(&self, name: &str, link_quota: i64) -> Account {
        let new = NewAccount {
            link_quota: Some(link_quota),
            ..NewAccount::new(name, Some(PASSWORD))
        };
        accounts::create_account(self.db(), new).await.unwrap()
    }

    pub async fn staff(&self, name: &str) -> Account {
        let new = NewAccount {
            is_staff: Some(true),
            ..NewAccount::new(name, Some(PASSWORD))
        };
        accounts::create_account(self.db(), new).await.unwrap()
    }

    pub async fn superuser(&self, name: &str) -> Account {
        accounts::create_superuser(self.db(), NewAccount::new(name, Some(PASSWORD)))
            .await
            .unwrap()
    }

    /// Log in through the form and return the `Cookie` header value.
    pub async fn login(&self, name: &str) -> String {
        let resp = self
            .post("/login/", None, &[("username", name), ("password", PASSWORD)])
            .await;
        resp.assert_redirect("/");
        let set_cookie = resp.set_cookie.expect("login sets a cookie");
        set_cookie.split(';').next().unwrap().to_string()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, form: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let header = |name| {
            resp.headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let location = header(LOCATION);
        let set_cookie = header(SET_COOKIE);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            location,
            set_cookie,
            body,
        }
    }
}

pub fn link_form<'a>(identifier: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![("identifier", identifier), ("country", "CN")]
}

pub fn work_order_form(name: &str) -> Vec<(&str, &str)> {
    vec![
        ("name", name),
        ("order_url", "https://orders.example.com/1"),
        ("start_time", "2025-01-01T00:00"),
        ("end_time", "2025-02-01T00:00"),
        ("order_acct", "acct"),
        ("order_psw", "secret"),
    ]
}
