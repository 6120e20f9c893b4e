use roomrelay_models::permissions::RoomPermissions;
use roomrelay_util::validation;

use crate::error::PolicyRejection;

/// A conservative, built-in word list. The data model has no per-room word
/// list field (`RoomPermissions` only carries the `enable_bad_word_filter`
/// toggle), so this is the single list every room with the filter enabled
/// shares; see DESIGN.md for the recorded decision.
const BUILT_IN_BANNED_WORDS: &[&str] = &["fuck", "shit", "bitch", "cunt", "nigger", "faggot"];

#[derive(Debug, Clone)]
pub struct FilterInput {
    pub text: String,
    pub attachment_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Accepted {
    pub normalized_text: String,
    pub attachment_urls: Vec<String>,
}

/// Runs the ordered rule pipeline from the content filter's design: length,
/// then urls, then attachments, then mentions, then emojis, then the
/// banned-word list. First failure wins.
pub fn apply(input: FilterInput, perms: &RoomPermissions) -> Result<Accepted, PolicyRejection> {
    let normalized = validation::normalize_message_text(&input.text);

    if normalized.chars().count() as i64 > perms.max_message_length {
        return Err(PolicyRejection::TooLong);
    }
    if !perms.allow_urls && validation::contains_url(&normalized) {
        return Err(PolicyRejection::UrlsDisallowed);
    }
    if !perms.allow_files && !input.attachment_urls.is_empty() {
        return Err(PolicyRejection::AttachmentsDisallowed);
    }

    let mut text = normalized;
    if !perms.allow_mentions && validation::has_mention_token(&text) {
        text = validation::strip_mention_tokens(&text);
    }
    if !perms.allow_emojis {
        text = validation::strip_emoji_tokens(&text);
    }

    if perms.enable_bad_word_filter && contains_banned_word(&text) {
        return Err(PolicyRejection::BannedWord);
    }

    Ok(Accepted {
        normalized_text: text,
        attachment_urls: input.attachment_urls,
    })
}

fn contains_banned_word(text: &str) -> bool {
    let lower = text.to_lowercase();
    BUILT_IN_BANNED_WORDS.iter().any(|word| lower.contains(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(text: &str) -> FilterInput {
        FilterInput {
            text: text.to_string(),
            attachment_urls: vec![],
        }
    }

    #[test]
    fn accepts_plain_text_under_permissive_defaults() {
        let perms = RoomPermissions::defaults(1);
        let accepted = apply(input("hello there"), &perms).expect("accepted");
        assert_eq!(accepted.normalized_text, "hello there");
    }

    #[test]
    fn rejects_text_over_max_length() {
        let mut perms = RoomPermissions::defaults(1);
        perms.max_message_length = 5;
        let err = apply(input("way too long"), &perms).unwrap_err();
        assert_eq!(err, PolicyRejection::TooLong);
    }

    #[test]
    fn rejects_urls_when_disallowed() {
        let mut perms = RoomPermissions::defaults(1);
        perms.allow_urls = false;
        let err = apply(input("check https://example.com"), &perms).unwrap_err();
        assert_eq!(err, PolicyRejection::UrlsDisallowed);
    }

    #[test]
    fn rejects_attachments_when_disallowed() {
        let mut perms = RoomPermissions::defaults(1);
        perms.allow_files = false;
        let mut msg = input("look at this");
        msg.attachment_urls.push("https://example.com/a.png".into());
        let err = apply(msg, &perms).unwrap_err();
        assert_eq!(err, PolicyRejection::AttachmentsDisallowed);
    }

    #[test]
    fn strips_mentions_instead_of_rejecting() {
        let mut perms = RoomPermissions::defaults(1);
        perms.allow_mentions = false;
        let accepted = apply(input("hey <@123> check this"), &perms).expect("accepted");
        assert!(!accepted.normalized_text.contains("<@123>"));
    }

    #[test]
    fn rejects_banned_word_when_filter_enabled() {
        let mut perms = RoomPermissions::defaults(1);
        perms.enable_bad_word_filter = true;
        let err = apply(input("that is such bullshit"), &perms).unwrap_err();
        assert_eq!(err, PolicyRejection::BannedWord);
    }

    #[test]
    fn length_check_runs_before_url_check() {
        let mut perms = RoomPermissions::defaults(1);
        perms.allow_urls = false;
        perms.max_message_length = 3;
        let err = apply(input("https://example.com"), &perms).unwrap_err();
        assert_eq!(err, PolicyRejection::TooLong);
    }
}
