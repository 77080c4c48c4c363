//! Development push server speaking the monitor protocol.

use super::generator::TweetGenerator;
use crate::config::SimulatorConfig;
use crate::error::Result;
use crate::protocol::{ClientMessage, ServerMessage};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{Instant, sleep_until};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tracing::{debug, info, warn};

const SOURCE: &str = "simulator";

type Sink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Serves generated tweets to every subscribed client.
pub struct SimulatorServer {
    config: SimulatorConfig,
    listener: TcpListener,
}

impl SimulatorServer {
    /// Bind to `config.bind`.
    pub async fn bind(config: SimulatorConfig) -> Result<Self> {
        let listener = TcpListener::bind(&config.bind).await?;
        Ok(Self { config, listener })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept clients forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Accept clients until `shutdown` resolves.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(addr = %self.local_addr()?, "Simulator listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Simulator shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_client(stream, peer, config).await {
                            debug!(%peer, error = %e, "Simulator client ended with error");
                        }
                    });
                }
            }
        }
    }
}

async fn serve_client(stream: TcpStream, peer: SocketAddr, config: SimulatorConfig) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (mut sink, mut source) = ws.split();
    debug!(%peer, "Simulator client connected");

    // Nothing is pushed until the client subscribes.
    loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::SubscribeTweets) => break,
                Err(e) => debug!(%peer, error = %e, "Ignoring unexpected client frame"),
            },
            Some(Ok(Message::Close(_))) | None => return Ok(()),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(e.into()),
        }
    }
    info!(%peer, "Simulator client subscribed");

    let mut generator = TweetGenerator::new(config.recent_window);
    let started = Instant::now();
    let mut status_at = Some(started + Duration::from_millis(config.status_delay_ms));
    let mut batch_at = Some(started + Duration::from_millis(config.initial_delay_ms));
    let mut tweet_at = started
        + Duration::from_millis(config.initial_delay_ms)
        + generator.live_interval(config.min_interval_ms, config.max_interval_ms);

    loop {
        let deadline = [status_at, batch_at, Some(tweet_at)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(tweet_at);

        tokio::select! {
            () = sleep_until(deadline) => {
                let now = Instant::now();
                if status_at.is_some_and(|at| at <= now) {
                    status_at = None;
                    let notice = ServerMessage::status("Connection established to tweet stream", SOURCE);
                    send(&mut sink, &notice).await?;
                }
                if batch_at.is_some_and(|at| at <= now) {
                    batch_at = None;
                    for tweet in generator.initial_batch(config.initial_batch) {
                        send(&mut sink, &ServerMessage::new_tweet(tweet, SOURCE)).await?;
                    }
                }
                if tweet_at <= now {
                    send(&mut sink, &ServerMessage::new_tweet(generator.next_live(), SOURCE)).await?;
                    tweet_at = now + generator.live_interval(config.min_interval_ms, config.max_interval_ms);
                }
            }
            inbound = source.next() => match inbound {
                Some(Ok(Message::Close(frame))) => {
                    debug!(%peer, ?frame, "Simulator client closed");
                    return Ok(());
                }
                None => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn send(sink: &mut Sink, message: &ServerMessage) -> Result<()> {
    sink.send(Message::Text(message.to_frame()?)).await?;
    Ok(())
}
