//! Connection to the game-side sidecar.
//!
//! The sidecar owns the actual game client. We talk to it over one TCP
//! connection carrying newline-delimited JSON in both directions: game
//! events come in (see [`GameEvent`]), actions go out as tagged
//! [`Action`] objects such as `{"op":"dig","target":"stone"}`.

use std::io;

use mimir_core::script::Action;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::control::{AgentControl, ControlError, ControlResult};
use crate::events::GameEvent;

/// Buffered inbound events before the reader waits on the loop.
const EVENT_BUFFER: usize = 64;

/// [`AgentControl`] that forwards every action to the sidecar.
pub struct RemoteAgent<W = OwnedWriteHalf> {
    writer: Mutex<W>,
}

impl RemoteAgent {
    /// Connect to the sidecar and start reading events.
    ///
    /// The returned receiver closes when the connection does.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the connection cannot be opened.
    pub async fn connect(addr: &str) -> io::Result<(Self, mpsc::Receiver<GameEvent>)> {
        let stream = TcpStream::connect(addr).await?;
        let (read, write) = stream.into_split();
        info!(addr, "Connected to game sidecar");

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(forward_events(BufReader::new(read), tx));
        Ok((Self::new(write), rx))
    }
}

impl<W: AsyncWrite + Unpin + Send> RemoteAgent<W> {
    /// Wrap an already open writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Give back the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    async fn send(&self, action: Action) -> ControlResult {
        let mut line = serde_json::to_string(&action)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await.map_err(lift_io)?;
        writer.flush().await.map_err(lift_io)?;
        debug!(action = %action, "Action sent");
        Ok(())
    }
}

fn lift_io(err: io::Error) -> ControlError {
    match err.kind() {
        io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => ControlError::Disconnected,
        _ => ControlError::Io(err),
    }
}

impl<W: AsyncWrite + Unpin + Send> AgentControl for RemoteAgent<W> {
    async fn chat(&self, message: &str) -> ControlResult {
        self.send(Action::Chat { message: message.to_string() }).await
    }

    async fn dig(&self, target: &str) -> ControlResult {
        self.send(Action::Dig { target: target.to_string() }).await
    }

    async fn place(&self, block: &str) -> ControlResult {
        self.send(Action::Place { block: block.to_string() }).await
    }

    async fn goto(&self, x: f64, y: f64, z: f64) -> ControlResult {
        self.send(Action::Goto { x, y, z }).await
    }

    async fn follow(&self, player: &str) -> ControlResult {
        self.send(Action::Follow { player: player.to_string() }).await
    }

    async fn attack(&self, target: &str) -> ControlResult {
        self.send(Action::Attack { target: target.to_string() }).await
    }

    async fn equip(&self, item: &str) -> ControlResult {
        self.send(Action::Equip { item: item.to_string() }).await
    }

    async fn jump(&self) -> ControlResult {
        self.send(Action::Jump).await
    }

    async fn stop(&self) -> ControlResult {
        self.send(Action::Stop).await
    }
}

/// Read event lines until EOF and push them into `tx`.
///
/// Unknown or malformed lines are logged and skipped. Returns when the
/// reader hits EOF or an error, or when the receiving side is gone.
pub async fn forward_events<R: AsyncBufRead + Unpin>(reader: R, tx: mpsc::Sender<GameEvent>) {
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                let Some(event) = GameEvent::from_line(&line) else {
                    warn!(line = %line, "Ignoring unrecognised game event");
                    continue;
                };
                if tx.send(event).await.is_err() {
                    debug!("Event loop gone, stop reading");
                    return;
                }
            }
            Ok(None) => {
                info!("Game sidecar closed the connection");
                return;
            }
            Err(err) => {
                warn!(error = %err, "Reading game events failed");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn actions_go_out_as_json_lines() {
        let agent = RemoteAgent::new(Vec::new());
        agent.chat("hi").await.unwrap();
        agent.goto(1.0, 64.0, -2.5).await.unwrap();
        agent.jump().await.unwrap();

        let out = String::from_utf8(agent.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                r#"{"op":"chat","message":"hi"}"#,
                r#"{"op":"goto","x":1.0,"y":64.0,"z":-2.5}"#,
                r#"{"op":"jump"}"#,
            ]
        );
    }

    #[tokio::test]
    async fn events_are_forwarded_until_eof() {
        let wire = concat!(
            "{\"event\":\"spawn\"}\n",
            "\n",
            "{\"event\":\"weather\"}\n",
            "{\"event\":\"chat\",\"username\":\"Steve\",\"message\":\"jump\"}\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        forward_events(wire.as_bytes(), tx).await;

        assert_eq!(rx.recv().await, Some(GameEvent::Spawn { username: None }));
        assert_eq!(
            rx.recv().await,
            Some(GameEvent::Chat {
                username: "Steve".into(),
                message: "jump".into(),
            })
        );
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn dropped_connections_become_disconnected() {
        for kind in [
            io::ErrorKind::BrokenPipe,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
        ] {
            assert!(matches!(lift_io(io::Error::from(kind)), ControlError::Disconnected));
        }
        assert!(matches!(
            lift_io(io::Error::from(io::ErrorKind::PermissionDenied)),
            ControlError::Io(_)
        ));
    }
}
