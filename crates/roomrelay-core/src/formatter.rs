use roomrelay_models::message_log::ReplyContext;
use roomrelay_util::validation::truncate_with_ellipsis;

use crate::envelope::{self, Envelope, ReplyHeadline};

/// Matches the platform's practical message-length ceiling. Overflow is
/// resolved by truncating the body, never by dropping the author/reply
/// headers the Reply Resolver depends on.
const MAX_ENVELOPE_BODY_CHARS: usize = 2000;

pub struct FormatInput<'a> {
    pub author_display: &'a str,
    pub body: &'a str,
    pub reply_context: Option<&'a ReplyContext>,
    pub attachment_urls: &'a [String],
    pub source_guild_name: &'a str,
}

/// Renders the stable envelope for a relayed message, specialized per
/// target by the caller supplying that target's `source_guild_name`.
pub fn format_envelope(input: FormatInput) -> String {
    let body = truncate_with_ellipsis(input.body, MAX_ENVELOPE_BODY_CHARS);
    let reply_headline = input.reply_context.map(|ctx| ReplyHeadline {
        author_display: ctx.author_display.clone(),
        quoted_text: ctx.quoted_text.clone(),
    });
    envelope::format(&Envelope {
        author_display: input.author_display.to_string(),
        body,
        reply_headline,
        attachment_urls: input.attachment_urls.to_vec(),
        source_guild_name: input.source_guild_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_a_plain_message() {
        let out = format_envelope(FormatInput {
            author_display: "Alice",
            body: "hello there",
            reply_context: None,
            attachment_urls: &[],
            source_guild_name: "Guild A",
        });
        let parsed = envelope::parse(&out).expect("parses");
        assert_eq!(parsed.author_display, "Alice");
        assert_eq!(parsed.body, "hello there");
    }

    #[test]
    fn truncates_overlong_body_but_keeps_headers() {
        let long_body = "x".repeat(3000);
        let out = format_envelope(FormatInput {
            author_display: "Alice",
            body: &long_body,
            reply_context: None,
            attachment_urls: &[],
            source_guild_name: "Guild A",
        });
        let parsed = envelope::parse(&out).expect("parses");
        assert_eq!(parsed.author_display, "Alice");
        assert!(parsed.body.chars().count() <= MAX_ENVELOPE_BODY_CHARS);
        assert!(parsed.body.ends_with('…'));
    }

    #[test]
    fn includes_reply_headline_when_present() {
        use roomrelay_models::message_log::ReplyOriginKind;
        let reply = ReplyContext {
            author_display: "Bob".into(),
            quoted_text: "earlier text".into(),
            origin_kind: ReplyOriginKind::Native,
        };
        let out = format_envelope(FormatInput {
            author_display: "Carol",
            body: "replying now",
            reply_context: Some(&reply),
            attachment_urls: &[],
            source_guild_name: "Guild C",
        });
        let parsed = envelope::parse(&out).expect("parses");
        assert_eq!(parsed.reply_headline.unwrap().author_display, "Bob");
    }
}
