//! TCP server module.
//!
//! Accepts raw TCP connections for one emulated node. Each connection runs in
//! its own task with its own session: bytes read from the socket are decoded
//! into keys and fed to the session's shell, and the terminal operations the
//! shell queues are replayed on the socket before the next read.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fakeswitch_engine::{KeyDecoder, Shell, ShellVariant, SwitchCore, TerminalOp};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};

// ============================================================================
// Types
// ============================================================================

/// Errors raised by the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Local address lookup failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Wait after an accept failure that is not specific to one client, such as
/// running out of file descriptors.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Listening endpoint of an emulated node.
pub struct SwitchServer {
    core: Arc<dyn SwitchCore>,
    variant: ShellVariant,
    listener: TcpListener,
}

impl std::fmt::Debug for SwitchServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchServer")
            .field("node", &self.core.node_name())
            .field("variant", &self.variant)
            .field("listener", &self.listener.local_addr().ok())
            .finish()
    }
}

impl SwitchServer {
    /// Bind `host:port`. Port 0 picks a free port, see
    /// [`SwitchServer::local_addr`].
    pub async fn bind(
        host: &str,
        port: u16,
        core: Arc<dyn SwitchCore>,
        variant: ShellVariant,
    ) -> ServerResult<Self> {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(SwitchServer {
            core,
            variant,
            listener,
        })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever, one task per connection. Accept failures
    /// are logged and never stop the listener.
    pub async fn run(self) -> ServerResult<()> {
        info!(
            "Listening for {} sessions of {} on {}",
            self.variant,
            self.core.node_name(),
            self.local_addr()?
        );

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("failed to accept connection: {}", e);
                    if !is_transient(&e) {
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                    continue;
                }
            };
            let core = Arc::clone(&self.core);
            let variant = self.variant;

            let span = info_span!(
                "session",
                node = %core.node_name(),
                peer = %peer_addr,
                protocol = %variant,
                connection = tracing::field::Empty,
            );
            tokio::spawn(
                async move {
                    info!("connection opened");
                    match handle_connection(stream, core.as_ref(), variant).await {
                        Ok(()) => info!("connection closed"),
                        Err(e) => warn!("connection error: {}", e),
                    }
                }
                .instrument(span),
            );
        }
    }

    /// Run the accept loop in the background.
    pub fn spawn(self) -> JoinHandle<ServerResult<()>> {
        tokio::spawn(async move {
            let result = self.run().await;
            if let Err(e) = &result {
                error!("server stopped: {}", e);
            }
            result
        })
    }
}

// ============================================================================
// Connection handling
// ============================================================================

/// What the connection should do after replaying the queued operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    Continue,
    Close,
}

/// Serve one session until the client disconnects or the session closes.
async fn handle_connection(
    mut stream: TcpStream,
    core: &dyn SwitchCore,
    variant: ShellVariant,
) -> io::Result<()> {
    let mut shell = match core.launch(variant) {
        Ok(shell) => shell,
        Err(e) => {
            error!("failed to start session: {}", e);
            return Ok(());
        }
    };

    let (mut reader, mut writer) = stream.split();
    let mut decoder = KeyDecoder::new();
    let mut read_buf = [0u8; 1024];

    if replay(shell.as_mut(), &mut writer).await? == Replay::Close {
        return Ok(());
    }

    loop {
        let n = reader.read(&mut read_buf).await?;
        if n == 0 {
            debug!("client disconnected");
            return Ok(());
        }

        decoder.push(&read_buf[..n]);
        shell.keys_received(decoder.decode_all());

        if replay(shell.as_mut(), &mut writer).await? == Replay::Close {
            writer.shutdown().await?;
            return Ok(());
        }
    }
}

/// Play the shell's queued terminal operations on the socket, in order.
async fn replay<W>(shell: &mut dyn Shell, writer: &mut W) -> io::Result<Replay>
where
    W: AsyncWrite + Unpin,
{
    for op in shell.terminal().take_ops() {
        match op {
            TerminalOp::Write(text) => {
                writer.write_all(text.as_bytes()).await?;
                // Flush to ensure data is sent immediately
                writer.flush().await?;
            }
            TerminalOp::Pause(duration) => pause(duration).await,
            TerminalOp::Close => return Ok(Replay::Close),
        }
    }
    Ok(Replay::Continue)
}

/// Accept failures caused by a single client going away.
fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
    )
}

async fn pause(duration: Duration) {
    debug!("pausing for {:?}", duration);
    tokio::time::sleep(duration).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_side_accept_errors_are_transient() {
        for kind in [
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::Interrupted,
        ] {
            assert!(is_transient(&io::Error::from(kind)));
        }
        assert!(!is_transient(&io::Error::new(
            io::ErrorKind::Other,
            "Too many open files"
        )));
    }
}
