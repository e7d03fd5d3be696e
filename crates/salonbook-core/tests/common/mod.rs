//! Local mock backend for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{any, MethodRouter};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::Value;

use salonbook_core::{AuthStore, CredentialStore, InitParams, SessionClient, SessionConfig};

#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: String,
}

/// Every request the mock backend received, in arrival order
#[derive(Clone, Default)]
pub struct Seen(Arc<Mutex<Vec<SeenRequest>>>);

impl Seen {
    fn record(&self, uri: &Uri, headers: &HeaderMap, body: String) {
        let authorization = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.0.lock().unwrap().push(SeenRequest {
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            authorization,
            body,
        });
    }

    pub fn all(&self) -> Vec<SeenRequest> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> SeenRequest {
        self.0.lock().unwrap().last().cloned().expect("no requests recorded")
    }
}

/// Route that records the request and answers with a fixed status and JSON body
pub fn reply(seen: &Seen, status: StatusCode, body: Value) -> MethodRouter {
    let seen = seen.clone();
    any(move |uri: Uri, headers: HeaderMap, request_body: String| {
        let seen = seen.clone();
        let body = body.clone();
        async move {
            seen.record(&uri, &headers, request_body);
            (status, Json(body))
        }
    })
}

/// Serve the router on an ephemeral local port and return its base URL
pub async fn spawn(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{}", addr)).unwrap()
}

pub fn client_for(
    base_url: &Url,
    store: &CredentialStore,
    auth: &AuthStore,
    params: InitParams,
) -> SessionClient {
    let config = SessionConfig::new(base_url.clone());
    SessionClient::initialize(&config, store.clone(), auth.clone(), params).unwrap()
}
