//! One-shot loopback listener for the OAuth redirect.

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::errors::CliError;

use super::oauth::code_from_params;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Bound loopback socket waiting for the provider redirect.
pub struct CallbackListener {
    listener: TcpListener,
    host: String,
    port: u16,
}

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    results: mpsc::Sender<anyhow::Result<String>>,
}

impl CallbackListener {
    /// Bind `host:port`; port 0 picks a free port.
    pub fn bind(host: &str, port: u16) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((host, port)).map_err(|e| {
            CliError::invalid_input(format!("Cannot listen on {}:{}: {}", host, port, e))
        })?;
        let port = listener.local_addr()?.port();
        listener.set_nonblocking(true)?;
        Ok(Self {
            listener,
            host: host.to_string(),
            port,
        })
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Serve requests until one carries `code`/`error`, then return the code.
    pub fn wait_for_code(self, expected_state: &str) -> anyhow::Result<String> {
        self.wait_for_code_within(expected_state, CALLBACK_TIMEOUT)
    }

    fn wait_for_code_within(self, expected_state: &str, timeout: Duration) -> anyhow::Result<String> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.serve_until_code(expected_state, timeout))
    }

    async fn serve_until_code(self, expected_state: &str, timeout: Duration) -> anyhow::Result<String> {
        let listener = tokio::net::TcpListener::from_std(self.listener)?;
        let (results, mut received) = mpsc::channel(1);
        let (shutdown, shutdown_signal) = oneshot::channel::<()>();

        let app = Router::new()
            .route("/", get(receive))
            .with_state(CallbackState {
                expected_state: Arc::from(expected_state),
                results,
            });
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_signal.await;
                })
                .await
        });

        let outcome = tokio::time::timeout(timeout, received.recv()).await;
        let _ = shutdown.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
            Ok(Ok(Ok(()))) => debug!("callback listener stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "callback listener failed"),
            Ok(Err(e)) => warn!(error = %e, "callback listener task panicked"),
            Err(_) => debug!("callback listener left open connections behind"),
        }

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) => Err(anyhow::anyhow!("Callback listener stopped before a redirect arrived")),
            Err(_) => Err(CliError::remote(format!(
                "OAuth callback timed out after {} seconds",
                timeout.as_secs()
            ))
            .into()),
        }
    }
}

async fn receive(
    State(state): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<String>) {
    // Browsers also ask for /favicon.ico and friends.
    if !(params.contains_key("code") || params.contains_key("error")) {
        return (StatusCode::NOT_FOUND, Html("Not found".to_string()));
    }

    let result = code_from_params(&params, &state.expected_state);
    let response = match &result {
        Ok(_) => (
            StatusCode::OK,
            Html("<h1>Authentication successful!</h1><p>You can close this window.</p>".to_string()),
        ),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Html(format!(
                "<h1>Authentication failed</h1><p>{}</p>",
                html_escape::encode_text(&e.to_string())
            )),
        ),
    };
    if state.results.try_send(result).is_err() {
        debug!("ignoring redirect after the first one");
    }
    response
}
