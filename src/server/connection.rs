// Connection handling module
// Accepts a single TCP connection and serves it through the CORS-decorated handler

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Body, Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::{service_fn, Service};
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};

use crate::config::AppState;
use crate::cors::Cors;
use crate::handler;
use crate::logger::{self, AccessLogEntry};

/// Accept and process a connection, checking limits.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_connection_rejected(&peer_addr, prev_count, max_conn);
            drop(stream);
            return;
        }
    }

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
    );
}

/// Serve one connection in its own task.
///
/// The request pipeline is `access log -> Cors -> handle_request`, so the
/// access log sees the final, decorated response, preflights included.
/// Once the larger of the read and write timeouts has passed, the connection
/// is shut down gracefully: a response in progress completes, an idle
/// keep-alive connection closes. A connection still busy after a second such
/// period is dropped. Client disconnects only end this task.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let deadline = std::time::Duration::from_secs(std::cmp::max(
            performance.read_timeout,
            performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(std::time::Duration::from_secs(performance.read_timeout))
            .keep_alive(performance.keep_alive);

        let handler_state = Arc::clone(&state);
        let files = service_fn(move |req: Request<Incoming>| {
            handler::handle_request(req, Arc::clone(&handler_state))
        });
        let cors = Cors::new(files, Arc::clone(&state.cors));

        let access_log = state.access_log();
        let log_format = state.config.logging.access_log_format.clone();
        let service = service_fn(move |req: Request<Incoming>| {
            let entry = access_log.then(|| AccessLogEntry::from_request(&peer_addr, &req));
            let started = std::time::Instant::now();
            let response = cors.call(req);
            let log_format = log_format.clone();
            async move {
                let response = response.await?;
                if let Some(entry) = entry {
                    log_response(entry, &response, started, &log_format);
                }
                Ok::<_, std::convert::Infallible>(response)
            }
        });

        let conn = builder.serve_connection(io, service);
        tokio::pin!(conn);

        let result = match tokio::time::timeout(deadline, conn.as_mut()).await {
            Ok(result) => Some(result),
            Err(_) => {
                // Finish the in-flight response, then close instead of idling
                conn.as_mut().graceful_shutdown();
                tokio::time::timeout(deadline, conn.as_mut()).await.ok()
            }
        };

        match result {
            Some(Ok(())) => {}
            Some(Err(err)) => logger::log_connection_error(&err),
            None => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} still busy {} seconds after its deadline, dropped",
                    deadline.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

fn log_response(
    mut entry: AccessLogEntry,
    response: &Response<Full<Bytes>>,
    started: std::time::Instant,
    format: &str,
) {
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    logger::log_access(&entry, format);
}
