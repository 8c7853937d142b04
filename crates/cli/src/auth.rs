//! # OAuth Callback Server
//!
//! Handles browser sign-in with a third-party provider. The identity provider
//! redirects the browser to `http://127.0.0.1:{port}/auth/callback?code=...`; the
//! local server exchanges the code for a session, then redirects the browser to
//! the application root, which confirms the sign-in.

use anyhow::{anyhow, Result};
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use lumascan::providers::auth::IdentityProvider;
use lumascan::types::Session;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info, warn};

pub const CALLBACK_PATH: &str = "/auth/callback";
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);
/// How long the server stays up after a sign-in so the browser can load `/`.
const REDIRECT_GRACE: Duration = Duration::from_millis(500);

const SIGNED_IN_PAGE: &str =
    "<html><body><h1>Signed in to Lumascan</h1><p>You can close this tab and return to the terminal.</p></body></html>";
const WAITING_PAGE: &str = "<html><body><p>Waiting for sign-in to complete...</p></body></html>";
const FAILED_PAGE: &str =
    "<html><body><h1>Sign-in failed</h1><p>Please return to the terminal and try again.</p></body></html>";

/// The query parameters the identity provider appends to the redirect.
#[derive(Deserialize, Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

struct CallbackState {
    identity: Box<dyn IdentityProvider>,
    code_verifier: String,
    result_tx: Mutex<Option<oneshot::Sender<Result<Session>>>>,
    signed_in: AtomicBool,
}

fn page(status: StatusCode, body: &str) -> Response<String> {
    let mut response = Response::new(body.to_string());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn redirect_to_root() -> Response<String> {
    let mut response = Response::new(String::new());
    *response.status_mut() = StatusCode::SEE_OTHER;
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static("/"));
    response
}

async fn callback_service(
    req: Request<Incoming>,
    state: Arc<CallbackState>,
) -> Result<Response<String>, hyper::Error> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, CALLBACK_PATH) => {
            let query = req.uri().query().unwrap_or("");
            let params = serde_urlencoded::from_str::<CallbackParams>(query).unwrap_or_else(|e| {
                error!("Failed to parse callback query parameters: {}", e);
                CallbackParams::default()
            });

            let tx = state.result_tx.lock().await.take();
            let Some(tx) = tx else {
                // The callback URL was hit more than once.
                return Ok(page(
                    StatusCode::GONE,
                    "This sign-in link has already been used.",
                ));
            };

            if let Some(err) = params.error {
                let reason = params.error_description.unwrap_or(err);
                let _ = tx.send(Err(anyhow!("Sign-in was not completed: {reason}")));
                return Ok(page(StatusCode::UNAUTHORIZED, FAILED_PAGE));
            }
            let Some(code) = params.code else {
                let _ = tx.send(Err(anyhow!("The sign-in callback carried no code.")));
                return Ok(page(StatusCode::BAD_REQUEST, FAILED_PAGE));
            };

            match state.identity.exchange_code(&code, &state.code_verifier).await {
                Ok(session) => {
                    state.signed_in.store(true, Ordering::SeqCst);
                    let _ = tx.send(Ok(session));
                    Ok(redirect_to_root())
                }
                Err(e) => {
                    error!("Code exchange failed: {}", e);
                    let _ = tx.send(Err(e.into()));
                    Ok(page(StatusCode::UNAUTHORIZED, FAILED_PAGE))
                }
            }
        }
        (&Method::GET, "/") => {
            if state.signed_in.load(Ordering::SeqCst) {
                Ok(page(StatusCode::OK, SIGNED_IN_PAGE))
            } else {
                Ok(page(StatusCode::OK, WAITING_PAGE))
            }
        }
        _ => Ok(page(StatusCode::NOT_FOUND, "Not Found")),
    }
}

/// Serves the callback on `listener` until a sign-in completes, fails, or `timeout`
/// elapses.
pub async fn serve_callback(
    listener: TcpListener,
    identity: Box<dyn IdentityProvider>,
    code_verifier: String,
    timeout: Duration,
) -> Result<Session> {
    let (result_tx, result_rx) = oneshot::channel();
    let state = Arc::new(CallbackState {
        identity,
        code_verifier,
        result_tx: Mutex::new(Some(result_tx)),
        signed_in: AtomicBool::new(false),
    });

    let server_handle = tokio::spawn(async move {
        loop {
            let (stream, _) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept callback connection: {:?}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let state = Arc::clone(&state);
            tokio::task::spawn(async move {
                if let Err(err) = http1::Builder::new()
                    .serve_connection(
                        io,
                        service_fn(move |req| callback_service(req, Arc::clone(&state))),
                    )
                    .await
                {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    });

    let outcome = tokio::select! {
        res = result_rx => res.map_err(|e| anyhow!("Callback channel closed unexpectedly: {e}")),
        _ = tokio::time::sleep(timeout) => {
            Err(anyhow!("Sign-in timed out after {} seconds.", timeout.as_secs()))
        }
    };

    if matches!(outcome, Ok(Ok(_))) {
        tokio::time::sleep(REDIRECT_GRACE).await;
    }
    server_handle.abort();

    outcome?
}

/// Runs the whole browser sign-in: starts the callback server on `port`, opens the
/// provider's authorization page, and waits for the session delivered to `redirect_to`.
pub async fn login_with_provider(
    identity: Box<dyn IdentityProvider>,
    provider: &str,
    port: u16,
    redirect_to: &str,
) -> Result<Session> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    info!("Callback server listening on {}", redirect_to);

    let request = identity.sign_in_with_provider(provider, redirect_to)?;
    match open::that(&request.url) {
        Ok(()) => println!("Opened your browser to sign in with {provider}..."),
        Err(e) => {
            warn!("Failed to open browser: {}", e);
            println!("Open this URL in your browser to sign in:\n{}", request.url);
        }
    }

    serve_callback(listener, identity, request.code_verifier, CALLBACK_TIMEOUT).await
}
