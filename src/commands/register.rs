use tracing::info;

use crate::{Context, Error};

/// Re-register the bot's slash commands (owner only)
///
/// Commands are registered globally on startup; use this to push them to a
/// single server right away while testing.
#[poise::command(prefix_command, hide_in_help, owners_only = true)]
pub async fn register(ctx: Context<'_>) -> Result<(), Error> {
    info!("Command registration requested by {}", ctx.author().id);
    poise::builtins::register_application_commands_buttons(ctx).await?;
    Ok(())
}
