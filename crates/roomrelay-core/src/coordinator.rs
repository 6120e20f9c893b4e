use roomrelay_cache::pubsub::{self, Topic};
use roomrelay_models::inbound_event::InboundChatEvent;
use roomrelay_models::live_push::ServerFrame;
use roomrelay_models::message_log::NewMessageLogEntry;
use serde_json::json;

use crate::content_filter::{self, FilterInput};
use crate::error::{CoreError, PolicyRejection};
use crate::fanout::{self, TargetLocks};
use crate::formatter::{format_envelope, FormatInput};
use crate::platform::PlatformClient;
use crate::rate_limiter;
use crate::reply_resolver;
use crate::resolver;
use crate::AppState;

/// Generator worker id for this process's snowflake IDs. A single-process
/// deployment never needs more than one; a clustered one would thread this
/// through `AppConfig` instead.
const LOG_ENTRY_WORKER_ID: u16 = 1;

/// Window for suppressing repeat rejection notices to the same author for
/// the same failure kind, per the external interface contract.
const NOTICE_SUPPRESSION_WINDOW_SECS: i64 = 60;

#[derive(Debug, Clone)]
pub enum CoordinatorOutcome {
    Delivered { delivered_count: i64, failed_count: i64 },
    Rejected(PolicyRejection),
}

fn rejection_notice_kind(rejection: PolicyRejection) -> &'static str {
    match rejection {
        PolicyRejection::NotSubscribed => "not_subscribed",
        PolicyRejection::GuildBanned => "guild_banned",
        PolicyRejection::RoomInactive => "room_inactive",
        PolicyRejection::RateLimited { .. } => "rate_limited",
        PolicyRejection::TooLong => "too_long",
        PolicyRejection::UrlsDisallowed => "urls_disallowed",
        PolicyRejection::AttachmentsDisallowed => "attachments_disallowed",
        PolicyRejection::BannedWord => "banned_word",
    }
}

fn rejection_message(rejection: PolicyRejection) -> String {
    match rejection {
        PolicyRejection::RateLimited { retry_after_secs } => {
            format!("You're sending messages too fast. Try again in {retry_after_secs}s.")
        }
        other => format!("Your message wasn't relayed: {other}"),
    }
}

/// Drives one inbound event through the full pipeline: Resolver, Rate
/// Limiter, Content Filter, Reply Resolver, Formatter, Fan-Out Engine, then
/// the Store log write and the Cache publish that feeds the Live Push Hub.
/// A `PolicyRejection` anywhere up through the Content Filter ends the
/// pipeline early and is reported back as `CoordinatorOutcome::Rejected`,
/// never as an `Err` — only infrastructure failures are `Err`.
pub async fn handle_inbound_event<P: PlatformClient>(
    state: &AppState,
    platform: &P,
    locks: &TargetLocks,
    event: InboundChatEvent,
) -> Result<CoordinatorOutcome, CoreError> {
    let (room, permissions) = match resolver::resolve(
        &state.store,
        &state.cache,
        event.guild_id,
        event.channel_id,
    )
    .await
    {
        Ok(resolved) => resolved,
        Err(rejection) => return reject(state, platform, event.author_id, None, rejection).await,
    };

    let source = roomrelay_store::subscriptions::find_by_channel(
        &state.store,
        event.guild_id,
        event.channel_id,
    )
    .await?
    .ok_or(PolicyRejection::NotSubscribed)?;

    if let Err(err) = rate_limiter::check(
        &state.cache,
        room.id,
        event.author_id,
        permissions.rate_limit_seconds,
    )
    .await
    {
        if let CoreError::Policy(rejection) = err {
            return reject(state, platform, event.author_id, Some(room.id), rejection).await;
        }
        return Err(err);
    }

    let accepted = match content_filter::apply(
        FilterInput {
            text: event.content.clone(),
            attachment_urls: event.attachments.iter().map(|a| a.url.clone()).collect(),
        },
        &permissions,
    ) {
        Ok(accepted) => accepted,
        Err(rejection) => {
            return reject(state, platform, event.author_id, Some(room.id), rejection).await
        }
    };

    let reply_context = reply_resolver::resolve(platform, event.reference.as_ref()).await?;

    let envelope_text = format_envelope(FormatInput {
        author_display: &event.author_display,
        body: &accepted.normalized_text,
        reply_context: reply_context.as_ref(),
        attachment_urls: &accepted.attachment_urls,
        source_guild_name: &source.guild_name,
    });

    let targets: Vec<_> = roomrelay_store::subscriptions::list_active_by_room(&state.store, room.id)
        .await?
        .into_iter()
        .filter(|sub| !(sub.guild_id == event.guild_id && sub.channel_id == event.channel_id))
        .collect();

    let report = fanout::fan_out(
        platform,
        locks,
        &targets,
        state.config.fanout_per_room_concurrency,
        state.config.fanout_retry_max,
        |_| envelope_text.clone(),
    )
    .await;

    for dead in &report.permanently_failed {
        roomrelay_store::subscriptions::deactivate(&state.store, dead.id).await?;
        let _ = pubsub::publish(
            &state.cache,
            Topic::ChannelUpdate,
            &ServerFrame::ChannelUpdate {
                room_id: room.id,
                payload: json!({ "subscription_id": dead.id, "is_active": false }),
            },
        )
        .await;
    }

    let _ = roomrelay_store::subscriptions::touch_last_message(&state.store, source.id).await;

    let entry = NewMessageLogEntry {
        id: roomrelay_util::snowflake::generate(LOG_ENTRY_WORKER_ID),
        room_id: room.id,
        source_guild_id: event.guild_id,
        source_channel_id: event.channel_id,
        source_message_id: event.message_id,
        author_id: event.author_id,
        author_display: event.author_display.clone(),
        content: accepted.normalized_text,
        attachments: event.attachments,
        reply_to: reply_context,
        delivered_count: report.outcome.delivered_count,
        failed_count: report.outcome.failed_count,
    };
    let logged = roomrelay_store::messages::append_message_log(&state.store, &entry).await?;

    let _ = pubsub::publish(
        &state.cache,
        Topic::NewMessage,
        &ServerFrame::NewMessage {
            room_id: room.id,
            payload: serde_json::to_value(&logged).unwrap_or(serde_json::Value::Null),
        },
    )
    .await;

    state.metrics.record_relayed();

    Ok(CoordinatorOutcome::Delivered {
        delivered_count: report.outcome.delivered_count,
        failed_count: report.outcome.failed_count,
    })
}

async fn reject<P: PlatformClient>(
    state: &AppState,
    platform: &P,
    author_id: i64,
    room_id: Option<i64>,
    rejection: PolicyRejection,
) -> Result<CoordinatorOutcome, CoreError> {
    state.metrics.record_rejected();

    let kind = rejection_notice_kind(rejection);
    let should_notify = match room_id {
        Some(room_id) => roomrelay_cache::notice::claim_notice(
            &state.cache,
            room_id,
            author_id,
            kind,
            NOTICE_SUPPRESSION_WINDOW_SECS,
        )
        .await
        .unwrap_or(true),
        // No resolved room (e.g. NotSubscribed) — nothing to scope the
        // suppression key to, so always notify.
        None => true,
    };
    if should_notify {
        let _ = platform.notify_author(author_id, &rejection_message(rejection)).await;
    }

    Ok(CoordinatorOutcome::Rejected(rejection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatformClient;
    use roomrelay_cache::create_pool as create_cache_pool;
    use roomrelay_store::create_pool as create_store_pool;
    use std::sync::Arc;
    use tokio::sync::Notify;

    async fn test_state() -> AppState {
        let store = create_store_pool("sqlite::memory:", 1).await.unwrap();
        roomrelay_store::run_migrations(&store).await.unwrap();
        // A local, ephemeral Redis is assumed reachable in the test
        // environment the same way the Store's in-memory SQLite is; if that
        // assumption ever stops holding these tests need a fake Cache.
        let cache = create_cache_pool("redis://127.0.0.1/").await.unwrap();
        AppState {
            store,
            cache,
            config: crate::AppConfig {
                jwt_secret: "test-secret".into(),
                jwt_expiry_minutes: 60,
                admin_username: "admin".into(),
                admin_password_hash: String::new(),
                allowed_origins: vec![],
                rate_limit_requests: 100,
                rate_limit_window_secs: 60,
                fanout_per_room_concurrency: 8,
                fanout_retry_max: 3,
            },
            metrics: Arc::new(crate::RelayMetrics::default()),
            shutdown: Arc::new(Notify::new()),
        }
    }

    #[tokio::test]
    #[ignore = "requires a reachable Redis instance"]
    async fn unsubscribed_channel_is_rejected_without_touching_the_platform() {
        let state = test_state().await;
        let platform = MockPlatformClient::new();
        let locks = TargetLocks::new();
        let event = InboundChatEvent {
            guild_id: 1,
            channel_id: 2,
            message_id: 3,
            author_id: 4,
            author_display: "Alice".into(),
            content: "hello".into(),
            attachments: vec![],
            reference: None,
        };
        let outcome = handle_inbound_event(&state, &platform, &locks, event).await.unwrap();
        assert!(matches!(
            outcome,
            CoordinatorOutcome::Rejected(PolicyRejection::NotSubscribed)
        ));
    }

    #[tokio::test]
    #[ignore = "requires a reachable Redis instance"]
    async fn subscribed_message_relays_to_other_channels_in_the_room() {
        let state = test_state().await;
        roomrelay_store::rooms::create_room(&state.store, 1, "general", 1, 10)
            .await
            .unwrap();
        roomrelay_store::subscriptions::register_channel(&state.store, 1, 1, 100, 200, "G1", "c1", 1)
            .await
            .unwrap();
        roomrelay_store::subscriptions::register_channel(&state.store, 2, 1, 101, 201, "G2", "c2", 1)
            .await
            .unwrap();

        let platform = MockPlatformClient::new();
        let locks = TargetLocks::new();
        let event = InboundChatEvent {
            guild_id: 100,
            channel_id: 200,
            message_id: 9,
            author_id: 4,
            author_display: "Alice".into(),
            content: "hello room".into(),
            attachments: vec![],
            reference: None,
        };
        let outcome = handle_inbound_event(&state, &platform, &locks, event).await.unwrap();
        match outcome {
            CoordinatorOutcome::Delivered { delivered_count, failed_count } => {
                assert_eq!(delivered_count, 1);
                assert_eq!(failed_count, 0);
            }
            other => panic!("expected delivery, got {other:?}"),
        }
        assert_eq!(platform.sent.lock().unwrap().len(), 1);
    }
}
