use std::{sync::Arc, time::Duration};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lockhist_frontend::settings::{GlyphSet, Settings};
use lockhist_host::{ws::WsHost, Host, HostError};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod demo;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Card configuration is no valid json: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Host connection failed: {0}")]
    Host(#[from] HostError),
    #[error("Initialization error")]
    Initialization,
    #[error("No access token given, use --token or LOCKHIST_TOKEN")]
    MissingToken,
    #[error("Tracing error")]
    Tracing(#[from] tracing::subscriber::SetGlobalDefaultError),
}

struct Connection {
    demo: bool,
    request_timeout: Option<Duration>,
    token: Option<String>,
    url: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = cli().get_matches();

    let level = args
        .get_one::<String>("log-level")
        .map_or("info", |level| level.as_str());

    if let Err(err) = init_logging(level) {
        eprintln!("lockhist: {}", err);
        return;
    }

    debug!("starting application");

    let mut settings = Settings::default();
    if let Err(err) = map_args_to_settings(&args, &mut settings) {
        error!("reading arguments failed: {:?}", err);
        eprintln!("lockhist: {}", err);
        return;
    }

    let host = match connect(map_args_to_connection(&args)).await {
        Ok(host) => host,
        Err(err) => {
            error!("connecting to host failed: {:?}", err);
            eprintln!("lockhist: {}", err);
            return;
        }
    };

    match lockhist_frontend::run(settings, host).await {
        Ok(()) => {
            debug!("closing application");
        }
        Err(err) => {
            error!("closing application with error: {:?}", err);
        }
    }
}

fn cli() -> Command {
    Command::new("lockhist")
        .about("lockhist - lock history card for the terminal")
        .args([
            Arg::new("url")
                .long("url")
                .action(ArgAction::Set)
                .default_value("ws://localhost:8123/api/websocket")
                .help("websocket api of the home assistant instance"),
            Arg::new("token")
                .long("token")
                .env("LOCKHIST_TOKEN")
                .hide_env_values(true)
                .action(ArgAction::Set)
                .help("long lived access token used to authenticate"),
            Arg::new("config")
                .long("config")
                .action(ArgAction::Set)
                .help("card configuration as json, e.g. '{\"name\": \"Front Door\"}'"),
            Arg::new("name")
                .long("name")
                .action(ArgAction::Set)
                .help("name shown on the card, overrides the name in --config"),
            Arg::new("demo")
                .long("demo")
                .action(ArgAction::SetTrue)
                .help("run against an in memory host recording fake lock changes"),
            Arg::new("request-timeout")
                .long("request-timeout")
                .action(ArgAction::Set)
                .value_parser(value_parser!(u64))
                .help("seconds until a request to the host is given up"),
            Arg::new("glyphs")
                .long("glyphs")
                .action(ArgAction::Set)
                .value_parser(["unicode", "ascii"])
                .default_value("unicode")
                .help("glyphs used for the home and lock icons"),
            Arg::new("log-level")
                .long("log-level")
                .action(ArgAction::Set)
                .default_value("info")
                .help("tracing filter written to the log file"),
        ])
}

fn map_args_to_settings(args: &ArgMatches, settings: &mut Settings) -> Result<(), Error> {
    if let Some(config) = args.get_one::<String>("config") {
        settings.card = serde_json::from_str::<Value>(config)?;
    }

    if let Some(name) = args.get_one::<String>("name") {
        match settings.card.as_object_mut() {
            Some(card) => {
                card.insert("name".to_owned(), json!(name));
            }
            None => settings.card = json!({ "name": name }),
        }
    }

    settings.glyphs = match args.get_one::<String>("glyphs").map(String::as_str) {
        Some("ascii") => GlyphSet::Ascii,
        _ => GlyphSet::Unicode,
    };

    Ok(())
}

fn map_args_to_connection(args: &ArgMatches) -> Connection {
    Connection {
        demo: args.get_flag("demo"),
        request_timeout: args
            .get_one::<u64>("request-timeout")
            .map(|seconds| Duration::from_secs(*seconds)),
        token: args.get_one::<String>("token").cloned(),
        url: args
            .get_one::<String>("url")
            .cloned()
            .unwrap_or_default(),
    }
}

async fn connect(connection: Connection) -> Result<Arc<dyn Host>, Error> {
    if connection.demo {
        debug!("starting demo host");
        let host: Arc<dyn Host> = Arc::new(demo::start(Duration::from_secs(5)));
        return Ok(host);
    }

    let token = match connection.token {
        Some(token) => token,
        None => return Err(Error::MissingToken),
    };

    let host: Arc<dyn Host> =
        Arc::new(WsHost::connect(&connection.url, &token, connection.request_timeout).await?);

    Ok(host)
}

fn init_logging(level: &str) -> Result<(), Error> {
    let logpath = get_logging_path()?;
    let logfile = tracing_appender::rolling::daily(logpath, "log");

    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(logfile)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn get_logging_path() -> Result<String, Error> {
    let cache_dir = match dirs::cache_dir() {
        Some(cache_dir) => match cache_dir.to_str() {
            Some(cache_dir_string) => cache_dir_string.to_string(),
            None => return Err(Error::Initialization),
        },
        None => return Err(Error::Initialization),
    };

    Ok(format!("{}{}", cache_dir, "/lockhist/logs"))
}
