//! One connection to a Network Information Server.
//!
//! A session moves through `Unopened -> Open -> Closed` and carries exactly
//! one request/response exchange. The protocol is half duplex with no
//! pipelining, so sessions are never reused.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::SessionState;
use crate::{frame, SessionError};

#[derive(Debug)]
enum Connection {
    Unopened,
    Open(BufReader<TcpStream>),
    Closed,
}

/// A transport session to one NIS endpoint.
///
/// Dropping a session releases the socket, so the connection is freed on
/// every exit path even when [`Session::close`] is never awaited.
#[derive(Debug)]
pub struct Session {
    addr: String,
    io_timeout: Option<Duration>,
    connection: Connection,
}

impl Session {
    /// Create an unopened session for `host:port`.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{}:{}", host, port),
            io_timeout: None,
            connection: Connection::Unopened,
        }
    }

    /// Bound each `send` and `receive` call by `timeout`.
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Create a session and connect it in one step.
    pub async fn connect(host: &str, port: u16, connect_timeout: Duration) -> Result<Self, SessionError> {
        let mut session = Self::new(host, port);
        session.open(connect_timeout).await?;
        Ok(session)
    }

    /// The `host:port` this session talks to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        match self.connection {
            Connection::Unopened => SessionState::Unopened,
            Connection::Open(_) => SessionState::Open,
            Connection::Closed => SessionState::Closed,
        }
    }

    /// Connect, waiting at most `connect_timeout`.
    ///
    /// Only valid on an unopened session.
    pub async fn open(&mut self, connect_timeout: Duration) -> Result<(), SessionError> {
        if !matches!(self.connection, Connection::Unopened) {
            return Err(SessionError::NotOpen(self.state()));
        }

        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| SessionError::Timeout {
                operation: "connect",
                timeout: connect_timeout,
            })?
            .map_err(|source| SessionError::Connect {
                addr: self.addr.clone(),
                source,
            })?;

        // Requests are tiny; do not hold them back waiting for more data.
        let _ = stream.set_nodelay(true);

        tracing::debug!(addr = %self.addr, "connected to NIS");
        self.connection = Connection::Open(BufReader::new(stream));
        Ok(())
    }

    /// Send one command frame. Returns the number of bytes written.
    pub async fn send(&mut self, command: &str) -> Result<usize, SessionError> {
        let io_timeout = self.io_timeout;
        let stream = self.stream()?;
        let sent = deadline(io_timeout, "send", frame::write_frame(stream.get_mut(), command)).await??;
        tracing::trace!(command, sent, "sent command frame");
        Ok(sent)
    }

    /// Read one complete response, up to the zero-length terminator.
    pub async fn receive(&mut self) -> Result<String, SessionError> {
        let io_timeout = self.io_timeout;
        let stream = self.stream()?;
        let body = deadline(io_timeout, "receive", frame::read_response(stream)).await??;
        tracing::trace!(bytes = body.len(), "received response");
        Ok(body)
    }

    /// Release the connection.
    ///
    /// A no-op on an unopened session and idempotent once closed. Shutdown
    /// errors are logged, not returned: the socket is gone either way.
    pub async fn close(&mut self) {
        match std::mem::replace(&mut self.connection, Connection::Closed) {
            Connection::Unopened => self.connection = Connection::Unopened,
            Connection::Open(mut stream) => {
                if let Err(e) = stream.get_mut().shutdown().await {
                    tracing::debug!(addr = %self.addr, error = %e, "error shutting down NIS connection");
                }
                tracing::debug!(addr = %self.addr, "disconnected from NIS");
            }
            Connection::Closed => {}
        }
    }

    fn stream(&mut self) -> Result<&mut BufReader<TcpStream>, SessionError> {
        match &mut self.connection {
            Connection::Open(stream) => Ok(stream),
            Connection::Unopened => Err(SessionError::NotOpen(SessionState::Unopened)),
            Connection::Closed => Err(SessionError::NotOpen(SessionState::Closed)),
        }
    }
}

async fn deadline<F, T>(
    timeout: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> Result<T, SessionError>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| SessionError::Timeout { operation, timeout }),
        None => Ok(fut.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_new_session_is_unopened() {
        let session = Session::new("127.0.0.1", 3551);
        assert_eq!(session.state(), SessionState::Unopened);
        assert_eq!(session.addr(), "127.0.0.1:3551");
    }

    #[tokio::test]
    async fn test_send_before_open_fails() {
        let mut session = Session::new("127.0.0.1", 3551);
        let err = session.send("status").await.unwrap_err();
        assert!(matches!(err, SessionError::NotOpen(SessionState::Unopened)));

        let err = session.receive().await.unwrap_err();
        assert!(matches!(err, SessionError::NotOpen(SessionState::Unopened)));
    }

    #[tokio::test]
    async fn test_close_unopened_is_noop() {
        let mut session = Session::new("127.0.0.1", 3551);
        session.close().await;
        assert_eq!(session.state(), SessionState::Unopened);
    }

    #[tokio::test]
    async fn test_open_close_lifecycle() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            // Returns once the client shuts down its side
            socket.read_to_end(&mut buf).await.unwrap();
            buf
        });

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::Open);

        let sent = session.send("status").await.unwrap();
        assert_eq!(sent, 8);

        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);

        // Closing twice is fine
        session.close().await;
        assert_eq!(session.state(), SessionState::Closed);

        let err = session.send("status").await.unwrap_err();
        assert!(matches!(err, SessionError::NotOpen(SessionState::Closed)));

        assert_eq!(server.await.unwrap(), b"\x00\x06status");
    }

    #[tokio::test]
    async fn test_open_twice_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        let err = session.open(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, SessionError::NotOpen(SessionState::Open)));
    }

    #[tokio::test]
    async fn test_receive_deadline() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Accept and then say nothing
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let mut session = Session::connect("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap()
            .with_io_timeout(Some(Duration::from_millis(50)));

        let err = session.receive().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Timeout {
                operation: "receive",
                ..
            }
        ));

        server.abort();
    }
}
