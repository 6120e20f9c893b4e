use roomrelay_models::inbound_event::MessageReference;
use roomrelay_models::message_log::{ReplyContext, ReplyOriginKind};

use crate::envelope;
use crate::platform::{PlatformClient, PlatformError};

/// Pure with respect to Store: the only reads are through `PlatformClient`.
/// Resolves the original author/text for a native reply, collapsing a
/// relayed-reply-to-a-relayed-reply down to one level of nesting per the
/// design's depth cap.
pub async fn resolve<P: PlatformClient>(
    platform: &P,
    reference: Option<&MessageReference>,
) -> Result<Option<ReplyContext>, PlatformError> {
    let Some(reference) = reference else {
        return Ok(None);
    };

    let referenced = platform
        .fetch_message(reference.guild_id, reference.channel_id, reference.message_id)
        .await?;

    let Some(referenced) = referenced else {
        return Ok(None);
    };

    if !referenced.is_bot_author {
        return Ok(Some(ReplyContext {
            author_display: referenced.author_display,
            quoted_text: envelope::cap_quote(&referenced.content),
            origin_kind: ReplyOriginKind::Native,
        }));
    }

    match envelope::parse(&referenced.content) {
        Some(parsed) => match parsed.reply_headline {
            Some(nested) => Ok(Some(ReplyContext {
                author_display: nested.author_display,
                quoted_text: envelope::cap_quote(&nested.quoted_text),
                origin_kind: ReplyOriginKind::RelayedNested,
            })),
            None => Ok(Some(ReplyContext {
                author_display: parsed.author_display,
                quoted_text: envelope::cap_quote(&parsed.body),
                origin_kind: ReplyOriginKind::Relayed,
            })),
        },
        // Not one of our envelopes despite being bot-authored (e.g. a
        // system message) — fall back to treating it as a native reply.
        None => Ok(Some(ReplyContext {
            author_display: referenced.author_display,
            quoted_text: envelope::cap_quote(&referenced.content),
            origin_kind: ReplyOriginKind::Native,
        })),
    }
}
