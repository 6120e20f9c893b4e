//! The wire grammar shared by the Formatter and the Reply Resolver.
//!
//! A relayed message's body is never just the author's text: it carries an
//! author header, an optional reply headline, an attachment block, and a
//! source badge. Both producer (`format`) and consumer (`parse`) live here
//! so the round-trip invariant `parse(format(x)) == x` (for the author and
//! reply-headline fields) holds by construction rather than by convention
//! between two independently maintained modules.

const REPLY_MARKER: &str = " \u{21aa} replying to ";
const ATTACHMENT_PREFIX: &str = "\u{1f4ce} ";
const SOURCE_BADGE_PREFIX: &str = "\u{2014} via ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyHeadline {
    pub author_display: String,
    pub quoted_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub author_display: String,
    pub body: String,
    pub reply_headline: Option<ReplyHeadline>,
    pub attachment_urls: Vec<String>,
    pub source_guild_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEnvelope {
    pub author_display: String,
    pub body: String,
    pub reply_headline: Option<ReplyHeadline>,
    pub attachment_urls: Vec<String>,
    pub source_guild_name: String,
}

pub fn format(envelope: &Envelope) -> String {
    let mut out = format!("**{}**", envelope.author_display);
    if let Some(reply) = &envelope.reply_headline {
        out.push_str(REPLY_MARKER);
        out.push_str(&format!("**{}**: \"{}\"", reply.author_display, reply.quoted_text));
    }
    out.push('\n');
    out.push_str(&envelope.body);
    if !envelope.attachment_urls.is_empty() {
        out.push_str("\n\n");
        for url in &envelope.attachment_urls {
            out.push_str(ATTACHMENT_PREFIX);
            out.push_str(url);
            out.push('\n');
        }
        out.pop();
    }
    out.push('\n');
    out.push_str(SOURCE_BADGE_PREFIX);
    out.push_str(&envelope.source_guild_name);
    out
}

pub fn parse(text: &str) -> Option<ParsedEnvelope> {
    let mut lines = text.lines();
    let header = lines.next()?;
    let rest = header.strip_prefix("**")?;
    let close = rest.find("**")?;
    let author_display = rest[..close].to_string();
    let after_author = &rest[close + 2..];

    let reply_headline = match after_author.strip_prefix(REPLY_MARKER) {
        Some(tail) => {
            let tail = tail.strip_prefix("**")?;
            let close2 = tail.find("**")?;
            let reply_author = tail[..close2].to_string();
            let after = tail[close2 + 2..].strip_prefix(": \"")?;
            let end = after.rfind('"')?;
            Some(ReplyHeadline {
                author_display: reply_author,
                quoted_text: after[..end].to_string(),
            })
        }
        None => None,
    };

    let mut body_lines: Vec<&str> = Vec::new();
    let mut attachment_urls = Vec::new();
    let mut source_guild_name = String::new();
    for line in lines {
        if let Some(url) = line.strip_prefix(ATTACHMENT_PREFIX) {
            attachment_urls.push(url.to_string());
        } else if let Some(guild) = line.strip_prefix(SOURCE_BADGE_PREFIX) {
            source_guild_name = guild.to_string();
        } else {
            body_lines.push(line);
        }
    }
    while matches!(body_lines.last(), Some(&"")) {
        body_lines.pop();
    }

    Some(ParsedEnvelope {
        author_display,
        body: body_lines.join("\n"),
        reply_headline,
        attachment_urls,
        source_guild_name,
    })
}

/// Caps a quoted reply excerpt at 80 visible characters per the Reply
/// Resolver's nesting rule.
pub fn cap_quote(text: &str) -> String {
    roomrelay_util::validation::truncate_with_ellipsis(text, 80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_author_and_body_without_reply() {
        let env = Envelope {
            author_display: "Alice".into(),
            body: "hello there".into(),
            reply_headline: None,
            attachment_urls: vec![],
            source_guild_name: "Guild A".into(),
        };
        let rendered = format(&env);
        let parsed = parse(&rendered).expect("parses");
        assert_eq!(parsed.author_display, env.author_display);
        assert_eq!(parsed.body, env.body);
        assert_eq!(parsed.reply_headline, None);
        assert_eq!(parsed.source_guild_name, env.source_guild_name);
    }

    #[test]
    fn round_trips_reply_headline() {
        let env = Envelope {
            author_display: "Bob".into(),
            body: "sounds good".into(),
            reply_headline: Some(ReplyHeadline {
                author_display: "Alice".into(),
                quoted_text: "hello there".into(),
            }),
            attachment_urls: vec![],
            source_guild_name: "Guild B".into(),
        };
        let rendered = format(&env);
        let parsed = parse(&rendered).expect("parses");
        assert_eq!(parsed.author_display, "Bob");
        assert_eq!(
            parsed.reply_headline,
            Some(ReplyHeadline {
                author_display: "Alice".into(),
                quoted_text: "hello there".into(),
            })
        );
    }

    #[test]
    fn round_trips_with_attachments() {
        let env = Envelope {
            author_display: "Carol".into(),
            body: "check this out".into(),
            reply_headline: None,
            attachment_urls: vec!["https://example.com/a.png".into(), "https://example.com/b.png".into()],
            source_guild_name: "Guild C".into(),
        };
        let rendered = format(&env);
        let parsed = parse(&rendered).expect("parses");
        assert_eq!(parsed.attachment_urls, env.attachment_urls);
        assert_eq!(parsed.body, "check this out");
    }

    #[test]
    fn parse_rejects_text_with_no_header() {
        assert!(parse("just some plain text").is_none());
    }

    #[test]
    fn cap_quote_truncates_past_eighty_chars() {
        let long = "x".repeat(200);
        let capped = cap_quote(&long);
        assert!(capped.chars().count() <= 80);
    }
}
