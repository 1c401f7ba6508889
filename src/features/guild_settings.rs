// Resolves a guild's effective verified role and verify channel

use poise::serenity_prelude as serenity;

use crate::models::guild::GuildConfig;

/// Snapshot of the role fields the resolver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRef {
    pub id: serenity::RoleId,
    pub name: String,
    pub position: u16,
}

impl From<&serenity::Role> for RoleRef {
    fn from(role: &serenity::Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            position: role.position,
        }
    }
}

/// Effective verified role.
///
/// A stored role id wins while that role still exists. Otherwise the first role
/// (in `roles` order) named `name_hint`, the stored role name, or `default_name`.
pub fn resolve_verified_role<'a>(
    config: Option<&GuildConfig>,
    roles: &'a [RoleRef],
    name_hint: Option<&str>,
    default_name: &str,
) -> Option<&'a RoleRef> {
    if let Some(id) = config.and_then(GuildConfig::role_id) {
        if let Some(role) = roles.iter().find(|r| r.id.get() == id) {
            return Some(role);
        }
    }

    let target = name_hint
        .filter(|name| !name.is_empty())
        .or_else(|| config.and_then(GuildConfig::role_name))
        .unwrap_or(default_name);

    roles.iter().find(|r| r.name == target)
}

/// Effective verify channel, by id only
pub fn resolve_verify_channel(
    config: Option<&GuildConfig>,
    channels: &[serenity::ChannelId],
) -> Option<serenity::ChannelId> {
    let id = config.and_then(GuildConfig::channel_id)?;
    channels.iter().copied().find(|c| c.get() == id)
}

/// Roles of a guild ordered by position, from cache when possible
pub async fn guild_roles(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
) -> Result<Vec<RoleRef>, serenity::Error> {
    let cached: Option<Vec<RoleRef>> = ctx
        .cache
        .guild(guild_id)
        .map(|guild| guild.roles.values().map(RoleRef::from).collect());

    let mut roles = match cached {
        Some(roles) => roles,
        None => guild_id
            .roles(&ctx.http)
            .await?
            .values()
            .map(RoleRef::from)
            .collect(),
    };

    sort_roles(&mut roles);
    Ok(roles)
}

/// Channel ids of a guild, from cache when possible
pub async fn guild_channels(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
) -> Result<Vec<serenity::ChannelId>, serenity::Error> {
    let cached: Option<Vec<serenity::ChannelId>> = ctx
        .cache
        .guild(guild_id)
        .map(|guild| guild.channels.keys().copied().collect());

    match cached {
        Some(channels) => Ok(channels),
        None => Ok(guild_id.channels(&ctx.http).await?.into_keys().collect()),
    }
}

fn sort_roles(roles: &mut [RoleRef]) {
    roles.sort_by_key(|r| (r.position, r.id));
}
