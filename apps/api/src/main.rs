mod chat;
mod config;
mod db;
mod errors;
mod evaluation;
mod extract;
mod interviewer;
mod interviews;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::interviewer::{Evaluator, LlmInterviewer, ResponseGenerator, ScriptedInterviewer};
use crate::llm_client::LlmClient;
use crate::routes::{build_router, cors_layer};
use crate::state::AppState;
use crate::store::{ConversationStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("interview_api={},tower_http=debug", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Interview API v{}", env!("CARGO_PKG_VERSION"));

    // Storage: Postgres when configured, otherwise in-process
    let store: Arc<dyn ConversationStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(create_pool(url).await?)),
        None => {
            warn!("DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };
    info!("Conversation store: {}", store.backend());

    // Interviewer: Claude when a key is configured, otherwise the scripted fallback
    let (generator, evaluator): (Arc<dyn ResponseGenerator>, Arc<dyn Evaluator>) =
        match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), config.ai_request_timeout)?;
                info!("LLM client initialized (model: {})", llm_client::MODEL);
                let interviewer = Arc::new(LlmInterviewer::new(llm));
                (interviewer.clone(), interviewer)
            }
            None => {
                warn!("ANTHROPIC_API_KEY not set, using scripted interviewer");
                let interviewer = Arc::new(ScriptedInterviewer::default());
                (interviewer.clone(), interviewer)
            }
        };

    let state = AppState::new(config.clone(), store, generator, evaluator);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let stop = Arc::new(Notify::new());
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown({
                let stop = stop.clone();
                async move { stop.notified().await }
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        signal = shutdown_signal() => signal?,
    }

    stop.notify_one();
    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!(
                "In-flight requests still running after {:?}, exiting",
                config.shutdown_timeout
            );
            server.abort();
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Received SIGINT - shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM - shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl-C - shutting down");
    }

    Ok(())
}
