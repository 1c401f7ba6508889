use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::features::guild_settings;
use crate::models::guild::GuildConfig;
use crate::utils::config::colors;
use crate::{Context, Data, Error};

/// Manage verification settings
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("get", "role", "channel", "min_age", "reset")
)]
pub async fn config(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the current verification settings
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn get(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    ctx.defer_ephemeral().await?;
    let data = ctx.data();

    // Read-only: looking at the settings must not create a record
    let config = data.config.read().await.get(guild_id).cloned();

    let roles = guild_settings::guild_roles(ctx.serenity_context(), guild_id).await?;
    let channels = guild_settings::guild_channels(ctx.serenity_context(), guild_id).await?;

    let role = guild_settings::resolve_verified_role(
        config.as_ref(),
        &roles,
        None,
        &data.settings.default_role_name,
    )
    .map(|r| format!("<@&{}>", r.id))
    .unwrap_or_else(|| "Not found".to_string());

    let channel = guild_settings::resolve_verify_channel(config.as_ref(), &channels)
        .map(|id| format!("<#{}>", id))
        .unwrap_or_else(|| "Not set".to_string());

    let min_age = data.verify_view.effective_min_age(config.as_ref());
    let min_age_source = if config.as_ref().and_then(|c| c.min_account_age_days).is_some() {
        "server"
    } else {
        "default"
    };

    let embed = serenity::CreateEmbed::new()
        .title("Verification Settings")
        .field("Verified Role", role, true)
        .field("Verify Channel", channel, true)
        .field(
            "Minimum Account Age",
            format!("{} day(s) ({})", min_age, min_age_source),
            true,
        )
        .color(colors::INFO);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

/// Set the role granted by the verify button
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn role(
    ctx: Context<'_>,
    #[description = "Role to grant"] role: serenity::Role,
) -> Result<(), Error> {
    let description = format!("**Verified Role** set to <@&{}>", role.id);
    update(ctx, description, move |cfg| {
        cfg.verified_role_id = Some(role.id.get());
        cfg.verified_role_name = Some(role.name);
    })
    .await
}

/// Set the channel the welcome message goes to
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn channel(
    ctx: Context<'_>,
    #[description = "Channel to use"] channel: serenity::Channel,
) -> Result<(), Error> {
    let channel_id = channel.id();
    update(ctx, format!("**Verify Channel** set to <#{}>", channel_id), move |cfg| {
        cfg.verify_channel_id = Some(channel_id.get());
    })
    .await
}

/// Set the minimum account age in days (0 disables the check)
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn min_age(
    ctx: Context<'_>,
    #[description = "Days since account creation"]
    #[min = 0]
    days: i64,
) -> Result<(), Error> {
    if days < 0 {
        ctx.say("Minimum account age cannot be negative.").await?;
        return Ok(());
    }
    update(ctx, format!("**Minimum Account Age** set to {} day(s)", days), move |cfg| {
        cfg.min_account_age_days = Some(days);
    })
    .await
}

/// Forget all verification settings for this server
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn reset(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    let result = ctx.data().config.write().await.reset(guild_id).await;
    let removed = match result {
        Ok(removed) => removed,
        Err(e) => {
            error!("Failed to save guild config: {:?}", e);
            ctx.say("Failed to save configuration.").await?;
            return Ok(());
        }
    };

    let text = if removed {
        info!("Reset config for guild {}", guild_id);
        "Verification settings reset to defaults."
    } else {
        "Nothing to reset, this server uses the defaults."
    };
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;

    Ok(())
}

/// Apply `edit` to this guild's settings, save, and confirm
async fn update(
    ctx: Context<'_>,
    description: String,
    edit: impl FnOnce(&mut GuildConfig),
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    match apply(ctx.data(), guild_id, edit).await {
        Ok(()) => {
            info!("Updated config for guild {}: {}", guild_id, description);
            let embed = serenity::CreateEmbed::new()
                .title("Configuration Updated")
                .description(description)
                .color(colors::SUCCESS);
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
        Err(e) => {
            error!("Failed to save guild config: {:?}", e);
            ctx.say("Failed to save configuration.").await?;
        }
    }

    Ok(())
}

/// Edit one guild's record (creating it if needed) and persist the store.
/// Nothing changes in memory when the save fails.
pub async fn apply(
    data: &Data,
    guild_id: serenity::GuildId,
    edit: impl FnOnce(&mut GuildConfig),
) -> Result<(), Error> {
    data.config.write().await.update(guild_id, edit).await?;
    Ok(())
}
