//! chatdock CLI: Command-line interface for the embeddable chat widget

use chatdock_engine::{
    host_channel, BridgeOutcome, ControllerOptions, ConversationController, HostBridge,
    HostEnvelope, HttpTransport, Rejection, Sender, Settlement, WidgetConfig,
};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Embeddable chat widget with a terminal host
#[derive(Parser)]
#[command(name = "chatdock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the widget config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the chat endpoint URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the widget in the terminal (default when no command specified)
    Tui {
        /// API key handed to the widget by the host
        #[arg(long)]
        token: Option<String>,

        /// Origin the host posts the key from
        #[arg(long, default_value = "local")]
        origin: String,
    },

    /// Send one message and print the transcript
    Send {
        /// Message to send
        message: String,

        /// API key handed to the widget by the host
        #[arg(long)]
        token: String,

        /// Origin the host posts the key from
        #[arg(long, default_value = "local")]
        origin: String,
    },

    /// Write a default config file
    Init,

    /// Print the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

const DEFAULT_CONFIG_PATH: &str = ".chatdock/config.json";

fn main() {
    let cli = Cli::parse();

    let interactive = matches!(cli.command, None | Some(Commands::Tui { .. }));
    if let Err(e) = init_logging(cli.verbose, cli.log_file.as_deref(), interactive) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match cli.command {
        None => {
            // Default: open TUI without a credential
            cmd_tui(&cli.config, cli.endpoint, None, "local".into());
        }
        Some(Commands::Tui { token, origin }) => {
            cmd_tui(&cli.config, cli.endpoint, token, origin);
        }
        Some(Commands::Send {
            message,
            token,
            origin,
        }) => {
            cmd_send(&cli.config, cli.endpoint, &message, token, origin);
        }
        Some(Commands::Init) => {
            cmd_init(&cli.config);
        }
        Some(Commands::Config { json }) => {
            cmd_config(&cli.config, cli.endpoint, json);
        }
    }
}

/// Install the tracing subscriber.
///
/// The TUI owns the terminal, so interactive runs only log when a file is
/// given. Other commands log to stderr.
fn init_logging(
    verbose: bool,
    log_file: Option<&Path>,
    interactive: bool,
) -> std::io::Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::new(format!("chatdock={level}"));

    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None if interactive => {}
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

/// Load the config and apply command-line overrides, exiting on error.
fn load_config(path: &Path, endpoint: Option<String>) -> WidgetConfig {
    let mut config = match WidgetConfig::load_or_default(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", path.display());
            std::process::exit(1);
        }
    };

    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
        if let Err(e) = config.validate() {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    config
}

fn runtime() -> tokio::runtime::Runtime {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_tui(config_path: &Path, endpoint: Option<String>, token: Option<String>, origin: String) {
    let config = load_config(config_path, endpoint);

    // The CLI plays the host page: it posts the key once the widget mounts
    let (port, inbox) = host_channel();
    if let Some(token) = token {
        port.post(HostEnvelope::token(origin, token));
    }

    let rt = runtime();
    if let Err(e) = rt.block_on(chatdock_tui::run_tui(&config, inbox)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_send(
    config_path: &Path,
    endpoint: Option<String>,
    message: &str,
    token: String,
    origin: String,
) {
    let config = load_config(config_path, endpoint);

    let bridge = HostBridge::new(config.origin_policy());
    match bridge.accept(&HostEnvelope::token(origin.clone(), token)) {
        BridgeOutcome::Accepted => {}
        BridgeOutcome::DisallowedOrigin => {
            eprintln!("Origin '{origin}' is not in allowed_origins; the key was ignored");
        }
        BridgeOutcome::Malformed => {
            eprintln!("The key was empty and was ignored");
        }
    }

    let rt = runtime();
    let exit_code = rt.block_on(async {
        let transport = Arc::new(HttpTransport::from_config(&config));
        let mut controller = ConversationController::new(
            transport,
            bridge.subscribe(),
            ControllerOptions::from(&config),
        );
        controller.open();
        controller.set_input(message);

        let code = match controller.submit().await {
            Ok(Settlement::Replied(_)) => 0,
            Ok(Settlement::Failed(_) | Settlement::Stale) => 1,
            Err(Rejection::EmptyInput) => {
                eprintln!("Error: message is empty");
                2
            }
            Err(e) => {
                if let Some(banner) = controller.error() {
                    eprintln!("Error: {banner}");
                } else {
                    eprintln!("Error: {e}");
                }
                2
            }
        };

        for message in controller.messages() {
            let label = match message.sender {
                Sender::User => "You",
                Sender::Assistant => "Assistant",
            };
            println!("{label}: {}", message.text);
        }

        code
    });

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn cmd_init(config_path: &Path) {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return;
    }

    match WidgetConfig::default().save(config_path) {
        Ok(()) => println!("Created {}", config_path.display()),
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_config(config_path: &Path, endpoint: Option<String>, json: bool) {
    let config = load_config(config_path, endpoint);

    if json {
        match serde_json::to_string_pretty(&config) {
            Ok(output) => println!("{output}"),
            Err(e) => {
                eprintln!("Failed to serialize config: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    let source = if config_path.exists() {
        config_path.display().to_string()
    } else {
        "defaults".to_string()
    };

    println!("chatdock config ({source})\n");
    println!("Endpoint:        {}", config.endpoint);
    println!("Allowed origins: {}", config.allowed_origins.join(", "));
    println!("Title:           {}", config.title);
    println!("Open on mount:   {}", config.open_on_mount);
    match config.request_timeout() {
        Some(timeout) => println!("Request timeout: {}s", timeout.as_secs()),
        None => println!("Request timeout: none"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_tui() {
        let cli = Cli::try_parse_from(["chatdock"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_send_parses_message_and_token() {
        let cli = Cli::try_parse_from(["chatdock", "send", "hello", "--token", "k1", "-v"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Send {
                message,
                token,
                origin,
            }) => {
                assert_eq!(message, "hello");
                assert_eq!(token, "k1");
                assert_eq!(origin, "local");
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_send_requires_token() {
        assert!(Cli::try_parse_from(["chatdock", "send", "hello"]).is_err());
    }

    #[test]
    fn test_global_endpoint_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chatdock",
            "tui",
            "--endpoint",
            "https://chat.example.com/widget/chat",
        ])
        .unwrap();
        assert_eq!(
            cli.endpoint.as_deref(),
            Some("https://chat.example.com/widget/chat")
        );
    }

    #[test]
    fn test_init_then_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".chatdock").join("config.json");

        cmd_init(&path);
        assert!(path.exists());

        let config = load_config(&path, None);
        assert_eq!(config.allowed_origins, vec!["local".to_string()]);
        assert_eq!(config.request_timeout_secs, 60);
    }
}
