use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Guild (Server) specific verification settings
///
/// Every field is optional: a missing value means "use the process-wide
/// default" (or, for the role, "look it up by name").
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GuildConfig {
    /// Role granted by the verify button
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_role_id: Option<u64>,
    /// Role name used when the id is unset or the role was deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_role_name: Option<String>,
    /// Channel the welcome message is posted to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_channel_id: Option<u64>,
    /// Minimum account age in days, overrides the bot default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_account_age_days: Option<i64>,
    /// Keys this bot does not know about, kept so saving never drops them
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GuildConfig {
    /// Stored role id, treating `0` as unset
    pub fn role_id(&self) -> Option<u64> {
        self.verified_role_id.filter(|id| *id != 0)
    }

    /// Stored role name, treating an empty string as unset
    pub fn role_name(&self) -> Option<&str> {
        self.verified_role_name.as_deref().filter(|name| !name.is_empty())
    }

    /// Stored channel id, treating `0` as unset
    pub fn channel_id(&self) -> Option<u64> {
        self.verify_channel_id.filter(|id| *id != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let cfg: GuildConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, GuildConfig::default());
        assert_eq!(serde_json::to_string(&cfg).unwrap(), "{}");
    }

    #[test]
    fn test_unknown_keys_survive() {
        let raw = r#"{"min_account_age_days":7,"note":"관리자 메모"}"#;
        let cfg: GuildConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.min_account_age_days, Some(7));
        assert_eq!(cfg.extra.get("note").and_then(|v| v.as_str()), Some("관리자 메모"));

        let back: serde_json::Value = serde_json::to_value(&cfg).unwrap();
        assert_eq!(back["note"], "관리자 메모");
    }

    #[test]
    fn test_zero_and_empty_are_unset() {
        let cfg = GuildConfig {
            verified_role_id: Some(0),
            verified_role_name: Some(String::new()),
            verify_channel_id: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.role_id(), None);
        assert_eq!(cfg.role_name(), None);
        assert_eq!(cfg.channel_id(), None);
    }
}
