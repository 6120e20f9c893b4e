use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("value is too short (min {min}, got {got})")]
    TooShort { min: usize, got: usize },
    #[error("value is too long (max {max}, got {got})")]
    TooLong { max: usize, got: usize },
    #[error("invalid characters")]
    InvalidCharacters,
    #[error("invalid format")]
    InvalidFormat,
}

/// Room names are 1-50 visible characters, compared case-insensitively for
/// uniqueness by the caller.
pub fn validate_room_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < 1 {
        return Err(ValidationError::TooShort { min: 1, got: len });
    }
    if len > 50 {
        return Err(ValidationError::TooLong { max: 50, got: len });
    }
    if name.trim().is_empty() {
        return Err(ValidationError::InvalidCharacters);
    }
    Ok(())
}

pub fn normalize_room_name_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

pub fn validate_max_servers(max_servers: i64) -> Result<(), ValidationError> {
    if max_servers < 1 {
        return Err(ValidationError::TooShort {
            min: 1,
            got: max_servers.max(0) as usize,
        });
    }
    Ok(())
}

pub fn validate_max_message_length(len: i64) -> Result<(), ValidationError> {
    if !(1..=4000).contains(&len) {
        return Err(ValidationError::InvalidFormat);
    }
    Ok(())
}

pub fn validate_rate_limit_seconds(secs: i64) -> Result<(), ValidationError> {
    if !(0..=60).contains(&secs) {
        return Err(ValidationError::InvalidFormat);
    }
    Ok(())
}

/// Strips leading/trailing control characters and collapses internal
/// whitespace runs, preserving user-visible markup otherwise.
pub fn normalize_message_text(text: &str) -> String {
    let trimmed = text
        .trim_matches(|c: char| c.is_control() && c != '\n' && c != '\t');
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_space = false;
    for c in trimmed.chars() {
        if c == ' ' || c == '\t' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Scheme + host URL matcher, deliberately permissive: the filter only needs
/// to know whether a link is present, not validate it as well-formed.
pub fn contains_url(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    for scheme in ["http://", "https://"] {
        if let Some(pos) = lower.find(scheme) {
            let rest = &lower[pos + scheme.len()..];
            if rest.chars().next().is_some_and(|c| c.is_alphanumeric()) {
                return true;
            }
        }
    }
    false
}

/// Platform-native mention tokens look like `<@id>` or `<@!id>`.
pub fn strip_mention_tokens(text: &str) -> String {
    strip_angle_tokens(text, '@')
}

/// Platform-native custom emoji tokens look like `<:name:id>`.
pub fn strip_emoji_tokens(text: &str) -> String {
    strip_angle_tokens(text, ':')
}

fn strip_angle_tokens(text: &str, marker: char) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(end) = text[i..].find('>') {
                let token = &text[i + 1..i + end];
                let body = token.strip_prefix('!').unwrap_or(token);
                if body.starts_with(marker) {
                    i += end + 1;
                    continue;
                }
            }
        }
        let ch = text[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

pub fn has_mention_token(text: &str) -> bool {
    strip_mention_tokens(text) != text
}

/// Truncates to at most `max_chars` visible characters, appending an
/// ellipsis marker when truncation occurred.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut out: String = text.chars().take(keep).collect();
    out.push('…');
    out
}
