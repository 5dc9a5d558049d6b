//! HTTP server for the relay.
//!
//! # Endpoints
//!
//! - `POST /webhook` - accepts GitHub webhook deliveries and answers with
//!   `did-process` / `did-match-rule` headers
//! - `GET /` - build banner
//! - `GET /health` - returns 200 if the server is running

pub mod health;
pub mod webhook;

pub use health::{health_handler, index_handler};
pub use webhook::webhook_handler;

use std::sync::Arc;

use crate::dispatch::{HttpServiceCaller, Processor};
use crate::github::GithubClient;

/// The concrete processor the server runs.
pub type AppProcessor = Processor<GithubClient, HttpServiceCaller>;

/// Shared application state, passed to handlers via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    processor: AppProcessor,

    /// Contents of `git-info.txt` when the deployment ships one;
    /// surfaced on the index page so a running instance identifies its
    /// build.
    commit_info: Option<String>,
}

impl AppState {
    pub fn new(processor: AppProcessor, commit_info: Option<String>) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                processor,
                commit_info,
            }),
        }
    }

    pub fn processor(&self) -> &AppProcessor {
        &self.inner.processor
    }

    pub fn commit_info(&self) -> Option<&str> {
        self.inner.commit_info.as_deref()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}
