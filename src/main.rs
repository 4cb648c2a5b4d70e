use cet_translate::client::{MockMode, MockTransport, TranslationClient};
use cet_translate::command::Dispatcher;
use cet_translate::config::{API_KEY_ENV, ClientConfig, parse_number};
use clap::{Arg, ArgAction, Command};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("cet-translate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Chat Event Trigger translation bridge")
        .arg(
            Arg::new("command")
                .help("Command to run once (e.g. ping, translate \"hello\" en fr); reads stdin when omitted")
                .num_args(0..)
                .trailing_var_arg(true)
                .index(1),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("JSON file with client settings"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .help("Translation API host"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("cache-ttl")
                .long("cache-ttl")
                .help("Seconds a cached translation stays valid"),
        )
        .arg(
            Arg::new("max-entries")
                .long("max-entries")
                .help("Maximum number of cached translations"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the echo mock transport instead of Google Translate")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("auto-init")
                .long("auto-init")
                .help(format!("Initialize the translator from {}", API_KEY_ENV))
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log request details")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    // File settings first, then environment, then flags
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => ClientConfig::from_json_file(Path::new(path))?,
        None => ClientConfig::from_env()?,
    };
    if let Some(host) = matches.get_one::<String>("host") {
        config.host = host.clone();
    }
    if let Some(value) = matches.get_one::<String>("timeout") {
        config.timeout_secs = parse_number("--timeout", value)?;
    }
    if let Some(value) = matches.get_one::<String>("cache-ttl") {
        config.cache_ttl_secs = parse_number("--cache-ttl", value)?;
    }
    if let Some(value) = matches.get_one::<String>("max-entries") {
        config.max_cache_entries = parse_number("--max-entries", value)?;
    }
    config.validate()?;

    let client = if matches.get_flag("mock") {
        TranslationClient::new(config, Arc::new(MockTransport::new(MockMode::Echo)))
    } else {
        TranslationClient::with_https(config)?
    };
    let mut dispatcher = Dispatcher::new(client);

    if matches.get_flag("auto-init") {
        match std::env::var(API_KEY_ENV) {
            Ok(key) => {
                let words = ["init_translator", key.as_str()];
                info!("{}", dispatcher.dispatch(&words).await);
            }
            Err(_) => warn!("{} is not set; translator stays uninitialized", API_KEY_ENV),
        }
    }

    let words: Vec<String> = matches
        .get_many::<String>("command")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if words.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            println!("{}", dispatcher.dispatch_line(&line).await);
        }
    } else {
        println!("{}", dispatcher.dispatch(words.as_slice()).await);
    }

    dispatcher.client_mut().shutdown();
    Ok(())
}
