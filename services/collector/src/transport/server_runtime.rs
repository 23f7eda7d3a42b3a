use std::{
    net::{TcpListener, TcpStream},
    sync::{Arc, Mutex, mpsc},
};

use super::{
    SOCKET_TIMEOUT_SECS, SharedRuntime, handle_connection, http::write_backpressure_response,
};

pub(super) fn serve_http_with_workers(
    runtime: SharedRuntime,
    bind_addr: &str,
    worker_count: usize,
    queue_capacity: usize,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr)?;
    let worker_count = worker_count.max(1);
    let queue_capacity = queue_capacity.max(1);
    let (tx, rx) = mpsc::sync_channel::<TcpStream>(queue_capacity);
    let rx = Arc::new(Mutex::new(rx));
    tracing::info!(
        bind_addr,
        worker_count,
        queue_capacity,
        "std transport accepting connections"
    );

    std::thread::scope(|scope| {
        for worker_id in 0..worker_count {
            let runtime = Arc::clone(&runtime);
            let rx = Arc::clone(&rx);
            scope.spawn(move || {
                loop {
                    let stream = {
                        let guard = match rx.lock() {
                            Ok(guard) => guard,
                            Err(_) => break,
                        };
                        match guard.recv() {
                            Ok(stream) => stream,
                            Err(_) => break,
                        }
                    };
                    if let Err(err) = handle_connection(&runtime, stream) {
                        tracing::warn!(worker_id, error = %err, "connection handling failed");
                    }
                }
            });
        }

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if !enqueue_connection(&tx, stream) {
                        break;
                    }
                }
                Err(err) => tracing::warn!(error = %err, "accept failed"),
            }
        }
        drop(tx);
    });

    Ok(())
}

/// Hands an accepted connection to the worker pool. A full queue answers the
/// client with 503 instead of holding the socket. Returns `false` once every
/// worker has gone away.
pub(super) fn enqueue_connection(tx: &mpsc::SyncSender<TcpStream>, stream: TcpStream) -> bool {
    match tx.try_send(stream) {
        Ok(()) => true,
        Err(mpsc::TrySendError::Full(stream)) => {
            tracing::warn!("worker queue full; rejecting connection");
            if let Err(err) = write_backpressure_response(stream, SOCKET_TIMEOUT_SECS) {
                tracing::debug!(error = %err, "backpressure response failed");
            }
            true
        }
        Err(mpsc::TrySendError::Disconnected(_)) => {
            tracing::error!("worker queue closed; stopping accept loop");
            false
        }
    }
}
