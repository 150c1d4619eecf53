//! TCP command transport.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;
use tracing::debug;

use crate::error::TransportError;

/// Resolve `host` and connect to the first address that accepts on `port`.
pub async fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<TcpStream, TransportError> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port))
        .await
        .map_err(|source| TransportError::Resolve {
            host: host.to_string(),
            source,
        })?
        .collect();

    let mut last_error = None;

    for addr in addrs {
        match timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                // Commands are tiny and latency-sensitive.
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(%addr, error = %e, "could not set TCP_NODELAY");
                }
                debug!(%addr, "command connection established");
                return Ok(stream);
            }
            Ok(Err(source)) => {
                last_error = Some(TransportError::Connect {
                    target: addr.to_string(),
                    source,
                });
            }
            Err(_) => {
                last_error = Some(TransportError::Timeout(addr.to_string()));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| TransportError::NoAddress(host.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let (stream, accepted) = tokio::join!(
            connect("127.0.0.1", port, Duration::from_secs(5)),
            listener.accept()
        );

        let stream = stream.unwrap();
        assert!(stream.nodelay().unwrap());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_reports_connect_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let result = connect("127.0.0.1", port, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }
}
