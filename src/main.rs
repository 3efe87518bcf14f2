use anyhow::anyhow;
use clap::{Arg, ArgMatches, Command, crate_authors, crate_description, crate_version, value_parser};
use remindhook::{
    Api, Config, Database, Dispatcher, RawConfig, SystemClock, WebhookClient,
    reminders::{ReminderCreateParams, ReminderListParams, ReminderStatus},
};
use serde::Serialize;
use std::{env, io, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so that command output can be piped.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr);
    if env::var("RUST_LOG_FORMAT").is_ok_and(|format| format == "json") {
        subscriber.json().flatten_event(true).init();
    } else {
        subscriber.init();
    }

    let matches = Command::new("Remindhook")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("CONFIG")
                .env("REMINDHOOK_CONFIG")
                .short('c')
                .long("config")
                .global(true)
                .default_value("remindhook.toml")
                .help("Path to the application configuration file."),
        )
        .subcommand_required(true)
        .subcommand(Command::new("run").about("Runs the dispatcher until interrupted."))
        .subcommand(
            Command::new("schedule")
                .about("Schedules a new reminder.")
                .arg(
                    Arg::new("TITLE")
                        .long("title")
                        .required(true)
                        .help("Human readable title of the reminder."),
                )
                .arg(
                    Arg::new("MESSAGE")
                        .long("message")
                        .required(true)
                        .help("Context message of the reminder."),
                )
                .arg(
                    Arg::new("AT")
                        .long("at")
                        .required(true)
                        .help("Target time with an explicit UTC offset, e.g. 2025-10-17T11:25:00+07:00."),
                )
                .arg(
                    Arg::new("PAYLOAD")
                        .long("payload")
                        .help("JSON document to send to the webhook instead of the default envelope."),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("Lists reminders.")
                .arg(
                    Arg::new("STATUS")
                        .long("status")
                        .value_parser(["pending", "dispatched", "failed", "cancelled"])
                        .help("Only list reminders in this status."),
                )
                .arg(
                    Arg::new("LIMIT")
                        .long("limit")
                        .value_parser(value_parser!(u32))
                        .help("Maximum number of reminders to list (1-1000, 20 by default)."),
                ),
        )
        .subcommand(
            Command::new("cancel").about("Cancels a pending reminder.").arg(
                Arg::new("ID")
                    .required(true)
                    .help("ID of the reminder to cancel."),
            ),
        )
        .get_matches();

    let raw_config = RawConfig::read_from_file(
        matches
            .get_one::<String>("CONFIG")
            .ok_or_else(|| anyhow!("<CONFIG> argument is not provided."))?,
    )?;

    info!("Remindhook raw configuration: {raw_config:?}.");

    let config = Config::try_from(raw_config)?;
    let store = Database::open(&config.db).await?;
    match matches.subcommand() {
        Some(("run", _)) => run(config, store).await,
        Some((command, command_matches)) => {
            let api = Api::new(config, store, Arc::new(SystemClock));
            execute(&api, command, command_matches).await
        }
        None => Err(anyhow!("Command is not provided.")),
    }
}

async fn run(config: Config, store: Arc<dyn remindhook::ReminderStore>) -> anyhow::Result<()> {
    let webhook_client = WebhookClient::new(config.webhook_url.clone(), &config.http.client)?;
    let handle = Dispatcher::new(
        store,
        webhook_client,
        Arc::new(SystemClock),
        config.dispatcher.clone(),
    )
    .start();

    tokio::signal::ctrl_c().await?;
    info!("Received interrupt signal, shutting down.");

    handle.shutdown().await
}

async fn execute(api: &Api, command: &str, matches: &ArgMatches) -> anyhow::Result<()> {
    match command {
        "schedule" => {
            let payload = matches
                .get_one::<String>("PAYLOAD")
                .map(|payload| serde_json::from_str(payload))
                .transpose()
                .map_err(|err| anyhow!("<PAYLOAD> argument is not a valid JSON: {err}"))?;
            let summary = api
                .reminders()
                .schedule(ReminderCreateParams {
                    title: required_arg(matches, "TITLE")?,
                    message: required_arg(matches, "MESSAGE")?,
                    target_time_iso: required_arg(matches, "AT")?,
                    payload,
                })
                .await?;
            print_json(&summary)
        }
        "list" => {
            let status = matches
                .get_one::<String>("STATUS")
                .map(|status| status.parse::<ReminderStatus>())
                .transpose()?;
            let summaries = api
                .reminders()
                .list(ReminderListParams {
                    status,
                    limit: matches.get_one::<u32>("LIMIT").copied(),
                })
                .await?;
            print_json(&summaries)
        }
        "cancel" => {
            let summary = api
                .reminders()
                .cancel(&required_arg(matches, "ID")?)
                .await?;
            print_json(&summary)
        }
        command => Err(anyhow!("Unknown command `{command}`.")),
    }
}

fn required_arg(matches: &ArgMatches, name: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow!("<{name}> argument is not provided."))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
