use std::net::SocketAddr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use change_relay::config;
use change_relay::dispatch::{HttpServiceCaller, Processor};
use change_relay::github::{Credentials, GithubClient};
use change_relay::server::{build_router, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "change_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let credentials = Credentials::from_env();
    let rules = config::load_rules(&config::rules_path()).expect("rules file must be well-formed");

    let processor = Processor::new(
        rules,
        GithubClient::new(credentials.clone()),
        HttpServiceCaller::new(),
        credentials,
    );

    // Deployments bake the built commit into git-info.txt.
    let commit_info = std::fs::read_to_string("git-info.txt").ok();
    let app = build_router(AppState::new(processor, commit_info));

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
