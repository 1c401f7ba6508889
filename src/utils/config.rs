// Centralized configuration for the verification bot

use anyhow::{Context as _, Result};

pub const DEFAULT_VERIFIED_ROLE_NAME: &str = "Verified";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Process-wide settings read from the environment at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotSettings {
    pub token: String,
    /// Role name used when a guild has neither a role id nor a role name stored
    pub default_role_name: String,
    pub config_path: String,
    /// Minimum account age the verify button falls back to
    pub default_min_age_days: i64,
}

impl BotSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_min_age_days = match lookup("MIN_ACCOUNT_AGE_DAYS") {
            Some(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("MIN_ACCOUNT_AGE_DAYS must be an integer, got {:?}", raw))?,
            _ => 0,
        };

        Ok(Self {
            token: lookup("DISCORD_TOKEN").unwrap_or_default(),
            default_role_name: lookup("VERIFIED_ROLE_NAME")
                .unwrap_or_else(|| DEFAULT_VERIFIED_ROLE_NAME.to_string()),
            config_path: lookup("CONFIG_PATH").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
            default_min_age_days,
        })
    }
}

/// Discord embed colors
pub mod colors {
    pub const PRIMARY: u32 = 0x00bfff;
    pub const SUCCESS: u32 = 0x2ecc71;
    pub const INFO: u32 = 0x3498db;
}

/// User-facing texts
pub mod messages {
    pub const WELCOME_TEXT: &str = "🐉 **Dragon’s Den**에 오신 걸 환영합니다!\n\
        아래 버튼을 눌러 **인증**을 완료하면 모든 채널을 이용할 수 있어요. ✅";
    pub const VERIFY_BUTTON_LABEL: &str = "✅ 인증하기";

    pub const GUILD_ONLY: &str = "서버에서만 사용할 수 있어요.";
    pub const SUCCESS: &str = "인증 완료! 이제 자유롭게 이용하세요 🎉";
    pub const ALREADY_VERIFIED: &str = "이미 인증되어 있어요!";
    pub const ROLE_NOT_FOUND: &str = "인증 역할을 찾지 못했어요. 운영진에게 문의해주세요.";
    pub const MISSING_PERMISSION: &str = "권한이 부족해 역할을 부여할 수 없어요. (봇 역할 순서/권한 확인)";
    pub const GENERIC_ERROR: &str = "인증 중 오류가 발생했어요. 잠시 후 다시 시도해주세요.";

    pub fn account_too_young(days: i64) -> String {
        format!("죄송해요. 계정 생성 후 **{}일**이 지나야 인증할 수 있어요.", days)
    }
}
