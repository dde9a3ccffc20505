pub mod http;
pub mod routes;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    time::{timeout, Duration},
};
use tokio_util::sync::CancellationToken;

use crate::query::QueryService;

use self::http::{read_request, write_response, Response};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const REQUEST_READ_TIMEOUT_SECS: u64 = 10;

pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))
}

/// Accepts connections until cancelled. Each connection gets its own task, so
/// a slow live sensor read never holds up history queries.
pub async fn serve(
    listener: TcpListener,
    service: QueryService,
    cancel_token: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .context("failed to read listener address")?;
    log_info!("Server running at http://{local}");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let service = service.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, peer, service).await {
                                log_warn!("connection from {peer} failed: {err:#}");
                            }
                        });
                    }
                    Err(err) => log_error!("failed to accept connection: {err}"),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("server shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, service: QueryService) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let request = match timeout(
        Duration::from_secs(REQUEST_READ_TIMEOUT_SECS),
        read_request(&mut reader),
    )
    .await
    {
        Ok(Ok(request)) => request,
        Ok(Err(err)) => {
            write_response(&mut write_half, &Response::text(400, "Error 400 - bad request")).await?;
            return Err(err);
        }
        Err(_) => anyhow::bail!("timed out waiting for request head"),
    };

    let response = routes::route(&request, &service, &peer.to_string()).await;
    write_response(&mut write_half, &response).await
}
