use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::protocol;
use crate::service::Handle;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP front end: length-prefixed JSON requests, one reply per request.
pub struct Listener {
    listener: TcpListener,
    max_frame_len: usize,
}

impl Listener {
    pub async fn new(address: &str, max_frame_len: usize) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(address).await?;
        info!(address = %listener.local_addr()?, "database server listening");
        Ok(Self { listener, max_frame_len })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn accept(&self, handle: Handle) {
        loop {
            let (socket, addr) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };
            info!(%addr, "client connected");
            let handle = handle.clone();
            let max_frame_len = self.max_frame_len;
            tokio::spawn(async move {
                serve_client(socket, addr, handle, max_frame_len).await;
                info!(%addr, "client disconnected");
            });
        }
    }
}

async fn serve_client(mut socket: TcpStream, addr: SocketAddr, handle: Handle, max_frame_len: usize) {
    loop {
        let frame = match protocol::read_frame(&mut socket, max_frame_len).await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => {
                warn!(%addr, error = %e, "client read error");
                break;
            }
        };
        debug!(%addr, bytes = frame.len(), "request");

        let response = handle.request(&frame).await;
        if let Err(e) = protocol::write_frame(&mut socket, &protocol::encode_response(&response)).await {
            warn!(%addr, error = %e, "client write error");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::service;

    #[test]
    fn accept_errors_back_off() {
        assert!(ACCEPT_BACKOFF > Duration::ZERO);
        assert!(ACCEPT_BACKOFF <= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn accept_loop_outlives_a_dropped_client() {
        let (handle, _task) = service::spawn(Registry::new(), 4);
        let listener = Listener::new("127.0.0.1:0", 4096).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { listener.accept(handle).await });

        drop(TcpStream::connect(addr).await.unwrap());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        protocol::write_frame(&mut stream, br#"{"type":"listDatabases"}"#).await.unwrap();
        let reply = protocol::read_frame(&mut stream, 4096).await.unwrap().unwrap();
        let reply: serde_json::Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(reply["ok"], true);
    }
}
