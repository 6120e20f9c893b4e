use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoomPermissions {
    pub room_id: i64,
    pub allow_urls: bool,
    pub allow_files: bool,
    pub allow_mentions: bool,
    pub allow_emojis: bool,
    pub enable_bad_word_filter: bool,
    pub max_message_length: i64,
    pub rate_limit_seconds: i64,
}

impl RoomPermissions {
    pub fn defaults(room_id: i64) -> Self {
        Self {
            room_id,
            allow_urls: true,
            allow_files: true,
            allow_mentions: true,
            allow_emojis: true,
            enable_bad_word_filter: false,
            max_message_length: 2000,
            rate_limit_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionsPatch {
    pub allow_urls: Option<bool>,
    pub allow_files: Option<bool>,
    pub allow_mentions: Option<bool>,
    pub allow_emojis: Option<bool>,
    pub enable_bad_word_filter: Option<bool>,
    pub max_message_length: Option<i64>,
    pub rate_limit_seconds: Option<i64>,
}

impl RoomPermissions {
    pub fn apply_patch(&mut self, patch: &PermissionsPatch) {
        if let Some(v) = patch.allow_urls {
            self.allow_urls = v;
        }
        if let Some(v) = patch.allow_files {
            self.allow_files = v;
        }
        if let Some(v) = patch.allow_mentions {
            self.allow_mentions = v;
        }
        if let Some(v) = patch.allow_emojis {
            self.allow_emojis = v;
        }
        if let Some(v) = patch.enable_bad_word_filter {
            self.enable_bad_word_filter = v;
        }
        if let Some(v) = patch.max_message_length {
            self.max_message_length = v;
        }
        if let Some(v) = patch.rate_limit_seconds {
            self.rate_limit_seconds = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive() {
        let perms = RoomPermissions::defaults(1);
        assert!(perms.allow_urls);
        assert!(perms.allow_files);
        assert_eq!(perms.rate_limit_seconds, 0);
    }

    #[test]
    fn patch_only_overwrites_present_fields() {
        let mut perms = RoomPermissions::defaults(1);
        perms.apply_patch(&PermissionsPatch {
            allow_urls: Some(false),
            ..Default::default()
        });
        assert!(!perms.allow_urls);
        assert!(perms.allow_files);
    }
}
