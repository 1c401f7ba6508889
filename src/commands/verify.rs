use poise::serenity_prelude as serenity;
use tracing::{error, info};

use crate::commands::config::apply;
use crate::features::guild_settings;
use crate::features::verify::VerifyView;
use crate::utils::config::colors;
use crate::{Context, Error};

/// Manage the verify button
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_GUILD",
    subcommands("panel", "setup")
)]
pub async fn verify(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Post the welcome message with the verify button
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn panel(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    ctx.defer_ephemeral().await?;

    let target = panel_channel(ctx, guild_id).await?;
    match send_welcome(ctx.http(), target, &ctx.data().verify_view).await {
        Ok(()) => {
            ctx.say(format!("Verify button posted in <#{}>.", target)).await?;
        }
        Err(e) => {
            error!("Failed to post verify panel in {}: {:?}", target, e);
            ctx.say("Failed to post the verify button. Check my permissions in that channel.")
                .await?;
        }
    }

    Ok(())
}

/// Configure verification for this server in one go
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Role granted on verification"] role: Option<serenity::Role>,
    #[description = "Channel for the welcome message"] channel: Option<serenity::Channel>,
    #[description = "Minimum account age in days"]
    #[min = 0]
    min_age_days: Option<i64>,
) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("This command can only be used in a server.").await?;
        return Ok(());
    };

    if min_age_days.is_some_and(|d| d < 0) {
        ctx.say("Minimum account age cannot be negative.").await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    let channel_id = channel.map(|c| c.id());
    let saved = apply(ctx.data(), guild_id, |cfg| {
        if let Some(role) = &role {
            cfg.verified_role_id = Some(role.id.get());
            cfg.verified_role_name = Some(role.name.clone());
        }
        if let Some(channel_id) = channel_id {
            cfg.verify_channel_id = Some(channel_id.get());
        }
        if let Some(days) = min_age_days {
            cfg.min_account_age_days = Some(days);
        }
    })
    .await;

    if let Err(e) = saved {
        error!("Failed to save guild config: {:?}", e);
        ctx.say("Failed to save configuration.").await?;
        return Ok(());
    }
    info!("Verification set up for guild {}", guild_id);

    let config = ctx.data().config.read().await.get(guild_id).cloned();
    let fmt_opt = |v: Option<String>| v.unwrap_or_else(|| "Unchanged".to_string());

    let embed = serenity::CreateEmbed::new()
        .title("Verification Configured")
        .field("Verified Role", fmt_opt(role.map(|r| format!("<@&{}>", r.id))), true)
        .field("Verify Channel", fmt_opt(channel_id.map(|c| format!("<#{}>", c))), true)
        .field(
            "Minimum Account Age",
            format!(
                "{} day(s)",
                ctx.data().verify_view.effective_min_age(config.as_ref())
            ),
            true,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Use /verify panel to post the button",
        ))
        .color(colors::SUCCESS);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}

/// Configured verify channel if it still exists, else the channel the command ran in
async fn panel_channel(
    ctx: Context<'_>,
    guild_id: serenity::GuildId,
) -> Result<serenity::ChannelId, Error> {
    let config = ctx.data().config.read().await.get(guild_id).cloned();
    let channels = guild_settings::guild_channels(ctx.serenity_context(), guild_id).await?;

    Ok(guild_settings::resolve_verify_channel(config.as_ref(), &channels)
        .unwrap_or_else(|| ctx.channel_id()))
}

/// Send the welcome message with the verify button
pub async fn send_welcome(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    view: &VerifyView,
) -> Result<(), Error> {
    channel_id.send_message(http, view.welcome_message()).await?;
    Ok(())
}
