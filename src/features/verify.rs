// Verify button: age gate -> role lookup -> grant -> one ephemeral reply

use std::future::Future;

use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tracing::{debug, error};

use crate::features::guild_settings::{self, RoleRef};
use crate::models::guild::GuildConfig;
use crate::utils::age_gate;
use crate::utils::config::messages;
use crate::{Data, Error};

/// Custom id of the verify button. Must never change, or buttons posted
/// before a restart stop working.
pub const VERIFY_BUTTON_ID: &str = "dragonsden_verify";

/// Audit log reason attached to role grants
pub const GRANT_REASON: &str = "Button verify";

/// The persistent verify button and the default it was built with
#[derive(Debug, Clone, Copy)]
pub struct VerifyView {
    pub default_min_age_days: i64,
}

impl VerifyView {
    pub fn new(default_min_age_days: i64) -> Self {
        Self {
            default_min_age_days,
        }
    }

    pub fn button(&self) -> serenity::CreateButton {
        serenity::CreateButton::new(VERIFY_BUTTON_ID)
            .label(messages::VERIFY_BUTTON_LABEL)
            .style(serenity::ButtonStyle::Success)
    }

    /// Welcome message carrying the verify button
    pub fn welcome_message(&self) -> serenity::CreateMessage {
        serenity::CreateMessage::new()
            .content(messages::WELCOME_TEXT)
            .components(vec![serenity::CreateActionRow::Buttons(vec![self.button()])])
    }

    /// Minimum age for a guild: its own override, else this view's default
    pub fn effective_min_age(&self, config: Option<&GuildConfig>) -> i64 {
        config
            .and_then(|c| c.min_account_age_days)
            .unwrap_or(self.default_min_age_days)
    }
}

#[derive(Debug, Error)]
pub enum GrantError {
    #[error("missing permissions to manage this role")]
    PermissionDenied,
    #[error("role grant failed: {0}")]
    Failed(#[source] Error),
}

impl GrantError {
    /// Classify a Discord error; HTTP 403 means the bot may not touch the role
    pub fn from_discord(err: serenity::Error) -> Self {
        if let serenity::Error::Http(http_err) = &err {
            if http_err.status_code().map(|s| s.as_u16()) == Some(403) {
                return Self::PermissionDenied;
            }
        }
        Self::Failed(Box::new(err))
    }
}

/// Something a role can be granted on (a guild member)
pub trait RoleGrantTarget {
    fn add_role(
        &self,
        role_id: serenity::RoleId,
        reason: &str,
    ) -> impl Future<Output = Result<(), GrantError>> + Send;
}

/// Grants roles to one member through the Discord HTTP API
pub struct MemberTarget<'a> {
    pub http: &'a serenity::Http,
    pub guild_id: serenity::GuildId,
    pub user_id: serenity::UserId,
}

impl RoleGrantTarget for MemberTarget<'_> {
    async fn add_role(&self, role_id: serenity::RoleId, reason: &str) -> Result<(), GrantError> {
        self.http
            .add_member_role(self.guild_id, self.user_id, role_id, Some(reason))
            .await
            .map_err(GrantError::from_discord)
    }
}

#[derive(Debug)]
pub enum GrantOutcome {
    Granted,
    AlreadyHad,
    PermissionDenied,
    OtherFailure(GrantError),
}

/// Grant `role_id` unless the member already holds it
pub async fn grant_role<T: RoleGrantTarget + Sync>(
    target: &T,
    member_roles: &[serenity::RoleId],
    role_id: serenity::RoleId,
) -> GrantOutcome {
    if member_roles.contains(&role_id) {
        return GrantOutcome::AlreadyHad;
    }
    match target.add_role(role_id, GRANT_REASON).await {
        Ok(()) => GrantOutcome::Granted,
        Err(GrantError::PermissionDenied) => GrantOutcome::PermissionDenied,
        Err(e) => GrantOutcome::OtherFailure(e),
    }
}

/// Everything a verification decision depends on, apart from the guild's roles
#[derive(Debug)]
pub struct VerifyRequest<'a> {
    pub view: VerifyView,
    pub config: Option<&'a GuildConfig>,
    pub default_role_name: &'a str,
    pub member_roles: &'a [serenity::RoleId],
    pub account_created: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    TooYoung { min_days: i64 },
    RoleNotFound,
    AlreadyVerified,
    Verified,
    MissingPermission,
    Failed,
}

impl VerifyOutcome {
    /// The single ephemeral reply for this outcome
    pub fn reply(&self) -> String {
        match self {
            Self::TooYoung { min_days } => messages::account_too_young(*min_days),
            Self::RoleNotFound => messages::ROLE_NOT_FOUND.to_string(),
            Self::AlreadyVerified => messages::ALREADY_VERIFIED.to_string(),
            Self::Verified => messages::SUCCESS.to_string(),
            Self::MissingPermission => messages::MISSING_PERMISSION.to_string(),
            Self::Failed => messages::GENERIC_ERROR.to_string(),
        }
    }
}

/// Run the verification steps in order, stopping at the first terminal one.
///
/// `load_roles` is only awaited once the age check has passed.
pub async fn run_verification<T, R>(
    request: &VerifyRequest<'_>,
    load_roles: R,
    target: &T,
) -> VerifyOutcome
where
    T: RoleGrantTarget + Sync,
    R: Future<Output = Result<Vec<RoleRef>, serenity::Error>> + Send,
{
    let min_days = request.view.effective_min_age(request.config);
    if !age_gate::is_old_enough(request.account_created, min_days, request.now) {
        return VerifyOutcome::TooYoung { min_days };
    }

    let roles = match load_roles.await {
        Ok(roles) => roles,
        Err(e) => {
            error!("verify error: could not fetch guild roles: {:?}", e);
            return VerifyOutcome::Failed;
        }
    };

    let role = match guild_settings::resolve_verified_role(
        request.config,
        &roles,
        None,
        request.default_role_name,
    ) {
        Some(role) => role,
        None => return VerifyOutcome::RoleNotFound,
    };

    match grant_role(target, request.member_roles, role.id).await {
        GrantOutcome::Granted => VerifyOutcome::Verified,
        GrantOutcome::AlreadyHad => VerifyOutcome::AlreadyVerified,
        GrantOutcome::PermissionDenied => VerifyOutcome::MissingPermission,
        GrantOutcome::OtherFailure(e) => {
            error!("verify error for role {} ({}): {:?}", role.name, role.id, e);
            VerifyOutcome::Failed
        }
    }
}

/// Reply text for a click. `verify` only runs when the click came from a
/// guild member; anything else gets the guild-only reply.
pub async fn click_reply<M, F, Fut>(
    guild_id: Option<serenity::GuildId>,
    member: Option<M>,
    verify: F,
) -> String
where
    F: FnOnce(serenity::GuildId, M) -> Fut,
    Fut: Future<Output = VerifyOutcome>,
{
    match guild_id.zip(member) {
        Some((guild_id, member)) => verify(guild_id, member).await.reply(),
        None => messages::GUILD_ONLY.to_string(),
    }
}

/// Handle a click on the verify button
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    if interaction.data.custom_id != VERIFY_BUTTON_ID {
        return Ok(());
    }

    let content = click_reply(
        interaction.guild_id,
        interaction.member.as_ref(),
        |guild_id, member| verify_member(ctx, guild_id, member, data),
    )
    .await;

    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

async fn verify_member(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    member: &serenity::Member,
    data: &Data,
) -> VerifyOutcome {
    // Copy the guild's settings out so the lock is not held across the grant call
    let config = data.config.read().await.get(guild_id).cloned();

    let request = VerifyRequest {
        view: data.verify_view,
        config: config.as_ref(),
        default_role_name: &data.settings.default_role_name,
        member_roles: &member.roles,
        account_created: age_gate::snowflake_created_at(member.user.id.get()),
        now: Utc::now(),
    };
    let target = MemberTarget {
        http: &ctx.http,
        guild_id,
        user_id: member.user.id,
    };

    let outcome = run_verification(
        &request,
        guild_settings::guild_roles(ctx, guild_id),
        &target,
    )
    .await;
    debug!("Verify click by {} in {}: {:?}", member.user.id, guild_id, outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records grant calls and answers with a canned result
    struct FakeMember {
        calls: Mutex<Vec<(serenity::RoleId, String)>>,
        result: fn() -> Result<(), GrantError>,
    }

    impl FakeMember {
        fn answering(result: fn() -> Result<(), GrantError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                result,
            }
        }

        fn calls(&self) -> Vec<(serenity::RoleId, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RoleGrantTarget for FakeMember {
        async fn add_role(&self, role_id: serenity::RoleId, reason: &str) -> Result<(), GrantError> {
            self.calls.lock().unwrap().push((role_id, reason.to_string()));
            (self.result)()
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn guild_roles() -> Vec<RoleRef> {
        vec![
            RoleRef {
                id: serenity::RoleId::new(1),
                name: "@everyone".to_string(),
                position: 0,
            },
            RoleRef {
                id: serenity::RoleId::new(500),
                name: "Verified".to_string(),
                position: 1,
            },
        ]
    }

    async fn roles_of(roles: Vec<RoleRef>) -> Result<Vec<RoleRef>, serenity::Error> {
        Ok(roles)
    }

    async fn roles_unavailable() -> Result<Vec<RoleRef>, serenity::Error> {
        Err(serenity::Error::Other("guild not cached"))
    }

    fn seven_day_guild() -> GuildConfig {
        GuildConfig {
            min_account_age_days: Some(7),
            ..Default::default()
        }
    }

    fn request<'a>(
        config: Option<&'a GuildConfig>,
        member_roles: &'a [serenity::RoleId],
        age_days: i64,
    ) -> VerifyRequest<'a> {
        VerifyRequest {
            view: VerifyView::new(0),
            config,
            default_role_name: "Verified",
            member_roles,
            account_created: now() - Duration::days(age_days),
            now: now(),
        }
    }

    #[tokio::test]
    async fn test_old_enough_member_gets_role() {
        let cfg = seven_day_guild();
        let member = FakeMember::answering(|| Ok(()));

        let outcome =
            run_verification(&request(Some(&cfg), &[], 10), roles_of(guild_roles()), &member)
                .await;

        assert_eq!(outcome, VerifyOutcome::Verified);
        assert_eq!(
            member.calls(),
            vec![(serenity::RoleId::new(500), "Button verify".to_string())]
        );
        assert_eq!(outcome.reply(), messages::SUCCESS);
    }

    #[tokio::test]
    async fn test_young_account_is_rejected_with_threshold() {
        let cfg = seven_day_guild();
        let member = FakeMember::answering(|| Ok(()));

        let outcome =
            run_verification(&request(Some(&cfg), &[], 3), roles_of(guild_roles()), &member)
                .await;

        assert_eq!(outcome, VerifyOutcome::TooYoung { min_days: 7 });
        assert!(outcome.reply().contains('7'));
        assert!(member.calls().is_empty());
    }

    #[tokio::test]
    async fn test_age_checked_before_roles_are_loaded() {
        let cfg = seven_day_guild();
        let member = FakeMember::answering(|| Ok(()));

        let young =
            run_verification(&request(Some(&cfg), &[], 3), roles_unavailable(), &member).await;
        assert_eq!(young, VerifyOutcome::TooYoung { min_days: 7 });

        let old =
            run_verification(&request(Some(&cfg), &[], 30), roles_unavailable(), &member).await;
        assert_eq!(old, VerifyOutcome::Failed);
        assert_eq!(old.reply(), messages::GENERIC_ERROR);
        assert!(member.calls().is_empty());
    }

    #[tokio::test]
    async fn test_view_default_applies_without_override() {
        let member = FakeMember::answering(|| Ok(()));
        let mut req = request(None, &[], 3);
        req.view = VerifyView::new(5);

        let outcome = run_verification(&req, roles_of(guild_roles()), &member).await;
        assert_eq!(outcome, VerifyOutcome::TooYoung { min_days: 5 });
    }

    #[tokio::test]
    async fn test_missing_role() {
        let cfg = seven_day_guild();
        let roles = vec![guild_roles().remove(0)];
        let member = FakeMember::answering(|| Ok(()));

        let outcome =
            run_verification(&request(Some(&cfg), &[], 30), roles_of(roles), &member).await;

        assert_eq!(outcome, VerifyOutcome::RoleNotFound);
        assert!(member.calls().is_empty());
    }

    #[tokio::test]
    async fn test_already_verified_makes_no_call() {
        let cfg = seven_day_guild();
        let held = [serenity::RoleId::new(500)];
        let member = FakeMember::answering(|| Ok(()));

        let outcome =
            run_verification(&request(Some(&cfg), &held, 30), roles_of(guild_roles()), &member)
                .await;

        assert_eq!(outcome, VerifyOutcome::AlreadyVerified);
        assert_eq!(outcome.reply(), messages::ALREADY_VERIFIED);
        assert!(member.calls().is_empty());
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let cfg = seven_day_guild();
        let member = FakeMember::answering(|| Err(GrantError::PermissionDenied));

        let outcome =
            run_verification(&request(Some(&cfg), &[], 30), roles_of(guild_roles()), &member)
                .await;

        assert_eq!(outcome, VerifyOutcome::MissingPermission);
        assert_eq!(outcome.reply(), messages::MISSING_PERMISSION);
        assert_eq!(member.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_other_failure_gives_generic_reply() {
        let member = FakeMember::answering(|| Err(GrantError::Failed("gateway hiccup".into())));

        let outcome =
            run_verification(&request(None, &[], 30), roles_of(guild_roles()), &member).await;

        assert_eq!(outcome, VerifyOutcome::Failed);
        assert_eq!(outcome.reply(), messages::GENERIC_ERROR);
        assert_eq!(member.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_grant_role_outcomes() {
        let role = serenity::RoleId::new(9);

        let ok = FakeMember::answering(|| Ok(()));
        assert!(matches!(grant_role(&ok, &[], role).await, GrantOutcome::Granted));
        assert!(matches!(grant_role(&ok, &[role], role).await, GrantOutcome::AlreadyHad));
        assert_eq!(ok.calls().len(), 1);

        let denied = FakeMember::answering(|| Err(GrantError::PermissionDenied));
        assert!(matches!(
            grant_role(&denied, &[], role).await,
            GrantOutcome::PermissionDenied
        ));

        let broken = FakeMember::answering(|| Err(GrantError::Failed("boom".into())));
        assert!(matches!(
            grant_role(&broken, &[], role).await,
            GrantOutcome::OtherFailure(GrantError::Failed(_))
        ));
    }

    #[tokio::test]
    async fn test_click_outside_guild_gets_guild_only_reply() {
        let counter = AtomicUsize::new(0);
        let runs = &counter;
        let verify = move |_: serenity::GuildId, _: ()| async move {
            runs.fetch_add(1, Ordering::SeqCst);
            VerifyOutcome::Verified
        };

        // Direct message: neither guild nor member
        let reply = click_reply(None, None::<()>, verify).await;
        assert_eq!(reply, messages::GUILD_ONLY);

        // Guild present but no member payload
        let reply = click_reply(Some(serenity::GuildId::new(1)), None::<()>, verify).await;
        assert_eq!(reply, messages::GUILD_ONLY);

        // Member without a guild
        let reply = click_reply(None, Some(()), verify).await;
        assert_eq!(reply, messages::GUILD_ONLY);

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_click_from_member_runs_verification_once() {
        let counter = AtomicUsize::new(0);
        let runs = &counter;
        let guild = serenity::GuildId::new(7);

        let reply = click_reply(Some(guild), Some("member"), move |guild_id, member| {
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                assert_eq!(guild_id, guild);
                assert_eq!(member, "member");
                VerifyOutcome::TooYoung { min_days: 7 }
            }
        })
        .await;

        assert_eq!(reply, messages::account_too_young(7));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_effective_min_age() {
        let view = VerifyView::new(2);
        assert_eq!(view.effective_min_age(None), 2);
        assert_eq!(view.effective_min_age(Some(&GuildConfig::default())), 2);
        assert_eq!(view.effective_min_age(Some(&seven_day_guild())), 7);
    }

    #[test]
    fn test_other_discord_errors_are_not_permission_errors() {
        let err = GrantError::from_discord(serenity::Error::Other("socket closed"));
        assert!(matches!(err, GrantError::Failed(_)));
    }
}
