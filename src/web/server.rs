//! Web server for ReadRoom.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::auth::TokenKeys;
use crate::chat::ChatGateway;
use crate::config::Config;
use crate::Database;

use super::handlers::AppState;
use super::router::{create_health_router, create_router};
use super::ws::ChatWsState;

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// WebSocket chat state.
    ws_state: Arc<ChatWsState>,
    /// Token keys.
    token_keys: Arc<TokenKeys>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database) -> Self {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .expect("Invalid web server address");

        let gateway = Arc::new(ChatGateway::new(
            db.pool().clone(),
            config.chat.history_limit,
        ));
        let token_keys = Arc::new(TokenKeys::new(
            &config.auth.jwt_secret,
            config.auth.token_expiry_secs,
        ));

        let app_state = Arc::new(AppState::new(gateway.clone()));
        let ws_state = Arc::new(ChatWsState::new(
            gateway,
            token_keys.clone(),
            Duration::from_secs(config.chat.idle_timeout_secs),
        ));

        Self {
            addr,
            app_state,
            ws_state,
            token_keys,
            cors_origins: config.server.cors_origins.clone(),
        }
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn build_router(self) -> axum::Router {
        create_router(
            self.app_state,
            self.ws_state,
            self.token_keys,
            &self.cors_origins,
        )
        .merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> Result<(), std::io::Error> {
        let addr = self.addr;
        let router = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr, std::io::Error> {
        let addr = self.addr;
        let router = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
