// Dragon's Den Verify
// Posts a welcome message with a button and grants the verified role on click

mod commands;
mod features;
mod models;
mod utils;

use poise::serenity_prelude as serenity;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::verify::VerifyView;
use crate::utils::config::BotSettings;
use crate::utils::config_store::ConfigStore;

/// User data shared across all commands and event handlers
#[derive(Debug)]
pub struct Data {
    pub settings: BotSettings,
    /// Per-guild settings; written only by configuration commands
    pub config: RwLock<ConfigStore>,
    pub verify_view: VerifyView,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all slash commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::verify::verify(),
        commands::config::config(),
        commands::help::help(),
        commands::register::register(),
    ]
}

/// GUILD_MEMBERS is privileged, enable "Server Members Intent" in the Developer Portal.
/// DIRECT_MESSAGES lets prefix commands (`v!register`, `v!help`) run from a DM,
/// where message content arrives without the MESSAGE_CONTENT intent.
fn gateway_intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::DIRECT_MESSAGES
}

/// Dispatch gateway events that are not commands
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Logged in as {} ({})",
                data_about_bot.user.name, data_about_bot.user.id
            );
        }
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => {
            features::verify::handle_interaction(ctx, component, data).await?;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "dragonsden_verify=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let settings = BotSettings::from_env().expect("Invalid bot settings");
    if settings.token.is_empty() {
        warn!("DISCORD_TOKEN is empty; login will fail");
    }

    info!("Starting Dragon's Den Verify...");

    let config = ConfigStore::load(&settings.config_path);
    if config.is_empty() {
        info!("No guild settings stored yet, defaults apply everywhere");
    }
    let verify_view = VerifyView::new(settings.default_min_age_days);
    let token = settings.token.clone();

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("v!".into()),
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Command error: {:?}", error);
                            let _ = ctx.say("❌ Something went wrong, please try again later.").await;
                        }
                        poise::FrameworkError::EventHandler { error, .. } => {
                            error!("Event handler error: {:?}", error);
                        }
                        err => {
                            if let Err(e) = poise::builtins::on_error(err).await {
                                error!("Error while handling error: {:?}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                info!("Bot is ready! Registering commands...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully!");

                Ok(Data {
                    settings,
                    config: RwLock::new(config),
                    verify_view,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, gateway_intents())
        .framework(framework)
        .await
        .expect("Failed to create client");

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {:?}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }

    info!("Goodbye!");
}
