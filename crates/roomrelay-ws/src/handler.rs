use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures::stream::{select_all, BoxStream, SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use roomrelay_cache::pubsub::{self, Topic};
use roomrelay_core::AppState;
use roomrelay_models::live_push::{ClientFrame, LiveStats, ServerFrame};
use tokio::time::{Duration, Instant};

use crate::session::{connected_dashboards, DashboardGuard};

const AUTH_TIMEOUT: Duration = Duration::from_secs(10);
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(30);
const LIVE_STATS_INTERVAL: Duration = Duration::from_secs(5);

const PUSHED_TOPICS: [Topic; 4] = [
    Topic::NewMessage,
    Topic::SystemNotification,
    Topic::RoomUpdate,
    Topic::ChannelUpdate,
];

pub async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let username = match authenticate(&mut sender, &mut receiver, &state).await {
        Some(username) => username,
        None => return,
    };
    let _guard = DashboardGuard::acquire();
    tracing::info!(%username, "dashboard connected");

    let mut events = subscribe_pushed_topics(&state).await;

    let mut live_stats_interval = tokio::time::interval(LIVE_STATS_INTERVAL);
    live_stats_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let liveness_sleep = tokio::time::sleep(LIVENESS_TIMEOUT);
    tokio::pin!(liveness_sleep);

    let disconnect_reason = loop {
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let Ok(frame) = serde_json::from_str::<ClientFrame>(&text) else {
                            continue;
                        };
                        match frame {
                            ClientFrame::Ping { ts } => {
                                liveness_sleep.as_mut().reset(Instant::now() + LIVENESS_TIMEOUT);
                                if send_frame(&mut sender, &ServerFrame::Pong { ts }).await.is_err() {
                                    break "send error".to_string();
                                }
                            }
                            // Re-authenticating mid-session and any frame type
                            // this version doesn't recognize are both ignored
                            // rather than rejected, per the forward-compatibility
                            // rule client frames are decoded under.
                            ClientFrame::Authenticate { .. } | ClientFrame::Unknown => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) => break "client closed".to_string(),
                    Some(Err(e)) => break format!("receive error: {e}"),
                    None => break "stream ended".to_string(),
                    _ => {}
                }
            }
            frame = events.next() => {
                let Some(frame) = frame else { continue };
                if send_frame(&mut sender, &frame).await.is_err() {
                    break "send error".to_string();
                }
            }
            _ = live_stats_interval.tick() => {
                let stats = current_live_stats(&state).await;
                let _ = roomrelay_cache::snapshot::put_live_stats(&state.cache, &stats).await;
                if send_frame(&mut sender, &ServerFrame::LiveStats { stats }).await.is_err() {
                    break "send error".to_string();
                }
            }
            () = &mut liveness_sleep => {
                break "no ping within liveness window".to_string();
            }
        }
    };

    let _ = send_close(&mut sender, 1000, &disconnect_reason).await;
    tracing::info!(%username, reason = %disconnect_reason, "dashboard disconnected");
}

/// Waits for the post-connect `authenticate` frame and replies with success
/// or a closing error, per the Live Push Hub's handshake.
async fn authenticate(
    sender: &mut SplitSink<WebSocket, Message>,
    receiver: &mut SplitStream<WebSocket>,
    state: &AppState,
) -> Option<String> {
    let first = match tokio::time::timeout(AUTH_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(msg))) => msg,
        _ => {
            let _ = send_close(sender, 1008, "authentication timed out").await;
            return None;
        }
    };
    let Message::Text(text) = first else {
        let _ = send_close(sender, 1008, "expected an authenticate frame").await;
        return None;
    };
    let Ok(ClientFrame::Authenticate { token }) = serde_json::from_str::<ClientFrame>(&text) else {
        let _ = send_frame(
            sender,
            &ServerFrame::AuthenticationError {
                reason: "expected an authenticate frame".into(),
            },
        )
        .await;
        return None;
    };

    match roomrelay_core::auth::validate_token(&token, &state.config.jwt_secret) {
        Ok(claims) => {
            if send_frame(sender, &ServerFrame::AuthenticationSuccess)
                .await
                .is_err()
            {
                return None;
            }
            Some(claims.sub)
        }
        Err(e) => {
            let _ = send_frame(
                sender,
                &ServerFrame::AuthenticationError {
                    reason: e.to_string(),
                },
            )
            .await;
            None
        }
    }
}

async fn subscribe_pushed_topics(state: &AppState) -> impl futures::Stream<Item = ServerFrame> {
    let mut streams: Vec<BoxStream<'static, ServerFrame>> = Vec::with_capacity(PUSHED_TOPICS.len());
    for topic in PUSHED_TOPICS {
        match pubsub::subscribe::<ServerFrame>(&state.cache, topic).await {
            Ok(stream) => streams.push(stream.boxed()),
            Err(e) => tracing::warn!(topic = topic.as_str(), "subscribe failed: {e:#}"),
        }
    }
    select_all(streams)
}

async fn current_live_stats(state: &AppState) -> LiveStats {
    let rooms = roomrelay_store::rooms::list_rooms(&state.store, false)
        .await
        .unwrap_or_default();
    let active_subscriptions: i64 = rooms.iter().map(|r| r.channel_count).sum();
    LiveStats {
        connected_dashboards: connected_dashboards(),
        active_rooms: rooms.len() as i64,
        active_subscriptions,
        messages_relayed_last_minute: state
            .metrics
            .messages_relayed
            .load(std::sync::atomic::Ordering::Relaxed) as i64,
        messages_rejected_last_minute: state
            .metrics
            .messages_rejected
            .load(std::sync::atomic::Ordering::Relaxed) as i64,
    }
}

async fn send_frame(
    sender: &mut SplitSink<WebSocket, Message>,
    frame: &ServerFrame,
) -> Result<(), ()> {
    let text = serde_json::to_string(frame).map_err(|_| ())?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

async fn send_close(
    sender: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), ()> {
    sender
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
        .await
        .map_err(|_| ())
}
