//! Push-channel transport.
//!
//! The driver only sees the [`Connector`] and [`Connection`] traits; the
//! production implementation speaks WebSocket through `tokio-tungstenite`.

use crate::error::Result;
use crate::protocol::{CLOSE_ABNORMAL, CloseInfo};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};

/// Close code reported for a close frame without a status.
pub const CLOSE_NO_STATUS: u16 = 1005;

/// Something read from an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame.
    Text(String),
    /// The connection ended. Terminal.
    Closed(CloseInfo),
}

/// Opens connections to a push endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>>;
}

/// An open push-channel connection.
#[async_trait]
pub trait Connection: Send {
    /// Send a text frame.
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Wait for the next text frame or the closure. Must be cancel-safe.
    async fn recv(&mut self) -> Inbound;

    /// Close with the given code and reason.
    async fn close(&mut self, close: CloseInfo) -> Result<()>;
}

/// WebSocket connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Connection>> {
        let (stream, response) = connect_async(url).await?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WsConnection { stream }))
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A WebSocket connection.
pub struct WsConnection {
    stream: WsStream,
}

#[async_trait]
impl Connection for WsConnection {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Inbound {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Inbound::Text(text),
                Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                    Ok(text) => return Inbound::Text(text),
                    Err(_) => debug!("Dropping non UTF-8 binary frame"),
                },
                // tungstenite answers pings itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    trace!("Control frame");
                }
                Some(Ok(Message::Close(frame))) => {
                    return Inbound::Closed(match frame {
                        Some(frame) => CloseInfo::new(frame.code.into(), frame.reason.into_owned()),
                        None => CloseInfo::new(CLOSE_NO_STATUS, ""),
                    });
                }
                Some(Err(e)) => return Inbound::Closed(CloseInfo::abnormal(e.to_string())),
                None => return Inbound::Closed(CloseInfo::new(CLOSE_ABNORMAL, "stream ended")),
            }
        }
    }

    async fn close(&mut self, close: CloseInfo) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(close.code),
            reason: close.reason.into(),
        };
        self.stream.close(Some(frame)).await?;
        Ok(())
    }
}
