// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show help and usage guide
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let default_age = ctx.data().verify_view.default_min_age_days;

    let embed = serenity::CreateEmbed::new()
        .title("🐉 Dragon's Den Verify - Help")
        .description("Members press the ✅ button to receive the verified role")
        .color(colors::PRIMARY)
        .field(
            "🚀 Getting Started",
            "`/verify setup` - Pick the role, channel and minimum account age\n\
            `/verify panel` - Post the welcome message with the button",
            false,
        )
        .field(
            "⚙️ Configuration",
            "`/config get` - View current settings\n\
            `/config role` - Role to grant\n\
            `/config channel` - Channel for the welcome message\n\
            `/config min_age` - Minimum account age in days\n\
            `/config reset` - Back to defaults",
            false,
        )
        .field(
            "🛡️ Requirements",
            format!(
                "The bot's role must sit above the verified role and have **Manage Roles**.\n\
                Default minimum account age: {} day(s)",
                default_age
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(
            "Rust Edition • Built with Serenity & Poise",
        ));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;

    Ok(())
}
