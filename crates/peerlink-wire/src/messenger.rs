//! Direct messenger: one TCP connection per message.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, info};

/// Why a direct send did not complete. Every variant is a fallback trigger.
#[derive(Debug, Error)]
pub enum SendError {
    /// Refused, unreachable, or the name did not resolve.
    #[error("connect to {addr} failed: {reason}")]
    ConnectFailed { addr: String, reason: String },
    /// Connecting or writing exceeded the time budget.
    #[error("{phase} to {addr} timed out after {elapsed_ms}ms")]
    Timeout {
        addr: String,
        phase: &'static str,
        elapsed_ms: u64,
    },
    /// The connection opened but the payload could not be written.
    #[error("write to {addr} failed: {reason}")]
    Io { addr: String, reason: String },
}

/// Anything that can push a text payload to `host:port`.
///
/// Implemented by [`DirectMessenger`]; the registry relay and the dispatcher
/// depend on this trait so tests can substitute in-process fakes.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(&self, host: &str, port: u16, text: &str) -> Result<(), SendError>;
}

/// Sends a message by connecting straight to the receiver's listener.
///
/// Makes exactly one attempt per call; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct DirectMessenger {
    timeout: Duration,
}

impl DirectMessenger {
    /// `timeout` bounds the connect and the write separately.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn write_payload(
        &self,
        stream: &mut TcpStream,
        addr: &str,
        text: &str,
    ) -> Result<(), SendError> {
        let write = async {
            stream.write_all(text.as_bytes()).await?;
            stream.flush().await?;
            // Closing the write side marks the end of the message.
            stream.shutdown().await?;
            Ok::<(), io::Error>(())
        };
        match tokio::time::timeout(self.timeout, write).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SendError::Io {
                addr: addr.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(SendError::Timeout {
                addr: addr.to_string(),
                phase: "write",
                elapsed_ms: self.timeout.as_millis() as u64,
            }),
        }
    }
}

impl Default for DirectMessenger {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl Transport for DirectMessenger {
    async fn send(&self, host: &str, port: u16, text: &str) -> Result<(), SendError> {
        let addr = format!("{host}:{port}");
        let connect = TcpStream::connect((host, port));
        let mut stream = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                debug!(addr = %addr, kind = ?e.kind(), "direct connect failed");
                return Err(classify_connect_error(&addr, e));
            }
            Err(_) => {
                return Err(SendError::Timeout {
                    addr,
                    phase: "connect",
                    elapsed_ms: self.timeout.as_millis() as u64,
                });
            }
        };
        debug!(addr = %addr, "connection opened");

        self.write_payload(&mut stream, &addr, text).await?;
        info!(addr = %addr, bytes = text.len(), "message sent directly");
        Ok(())
    }
}

fn classify_connect_error(addr: &str, e: io::Error) -> SendError {
    if e.kind() == io::ErrorKind::TimedOut {
        return SendError::Timeout {
            addr: addr.to_string(),
            phase: "connect",
            elapsed_ms: 0,
        };
    }
    SendError::ConnectFailed {
        addr: addr.to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_send_writes_full_payload_then_closes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let reader = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).await.unwrap();
            String::from_utf8(buf).unwrap()
        });

        let messenger = DirectMessenger::new(Duration::from_secs(2));
        messenger
            .send("127.0.0.1", port, "hello over tcp")
            .await
            .unwrap();

        assert_eq!(reader.await.unwrap(), "hello over tcp");
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let messenger = DirectMessenger::new(Duration::from_secs(2));
        let err = messenger.send("127.0.0.1", port, "hi").await.unwrap_err();
        assert!(
            matches!(err, SendError::ConnectFailed { .. }),
            "expected ConnectFailed, got {err:?}"
        );
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_a_send_error() {
        let messenger = DirectMessenger::new(Duration::from_secs(2));
        let err = messenger
            .send("no-such-peer.invalid", 9001, "hi")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SendError::ConnectFailed { .. } | SendError::Timeout { .. }
        ));
    }

    #[test]
    fn test_error_messages_name_the_address() {
        let err = SendError::Timeout {
            addr: "10.0.0.9:9002".into(),
            phase: "connect",
            elapsed_ms: 3000,
        };
        assert_eq!(err.to_string(), "connect to 10.0.0.9:9002 timed out after 3000ms");
    }
}
