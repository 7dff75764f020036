// # cpanelctl - cPanel resource lifecycle host
//
// This binary is a THIN integration layer: it reads configuration from the
// environment, connects to cPanel, and maps one command onto one
// `LifecycleDriver` operation. All resource logic lives in cpanel-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Connection
// - `CPANEL_URL`: cPanel host (a leading `https://` is accepted)
// - `CPANEL_USER`: cPanel account name
// - `CPANEL_TOKEN`: API token
// - `CPANEL_PORT`: HTTPS port (default 2083)
// - `CPANEL_INSECURE`: Skip TLS verification (true/1/yes)
//
// ### Host
// - `CPANEL_STATE_PATH`: Path to the state file (default `cpanel-state.json`)
// - `CPANEL_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Output
//
// Results are printed to stdout as JSON; logs go to stderr.
//
// ## Example
//
// ```bash
// export CPANEL_URL=cpanel.example.com
// export CPANEL_USER=alice
// export CPANEL_TOKEN=your_token
//
// cpanelctl apply cpanel_zone_record.www \
//     '{"zone": "example.com", "name": "www", "address": "192.0.2.10"}'
// ```

use anyhow::{Context, Result, anyhow, bail};
use cpanel_client::CpanelClient;
use cpanel_core::config::ConnectionConfig;
use cpanel_core::lifecycle::{LifecycleDriver, ResourceAddress};
use cpanel_core::registry::ResourceRegistry;
use cpanel_core::state::StateStoreConfig;
use cpanel_core::traits::{Attributes, CpanelApi};
use serde_json::{Value, json};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

const USAGE: &str = "\
Usage: cpanelctl <command>

Commands:
  verify                      Check credentials against the cPanel host
  schema [type]               Print resource schemas
  plan <address> <json>       Show what apply would do
  apply <address> <json>      Create, update or replace a resource
  refresh <address>           Re-read a tracked resource
  destroy <address>           Delete a tracked resource
  import <address> <id>       Start tracking an existing entity
  list                        List tracked resources

Addresses have the form <type>.<name>, e.g. cpanel_zone_record.www";

/// Default path of the state file
const DEFAULT_STATE_PATH: &str = "cpanel-state.json";

/// Exit codes for different termination scenarios
///
/// - 0: Success
/// - 1: Configuration or usage error
/// - 2: Runtime error (backend or state failure)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtlExitCode {
    /// Command completed
    Success = 0,
    /// Bad arguments, bad declaration, or incomplete configuration
    ConfigError = 1,
    /// The command failed while running
    RuntimeError = 2,
}

impl From<CtlExitCode> for ExitCode {
    fn from(code: CtlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl CtlExitCode {
    /// Classify a failure by its root cause
    fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<cpanel_core::Error>() {
            Some(cpanel_core::Error::Config(_) | cpanel_core::Error::InvalidInput(_)) => {
                CtlExitCode::ConfigError
            }
            _ => CtlExitCode::RuntimeError,
        }
    }
}

/// One invocation
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Verify,
    Schema(Option<String>),
    Plan {
        address: ResourceAddress,
        desired: Attributes,
    },
    Apply {
        address: ResourceAddress,
        desired: Attributes,
    },
    Refresh(ResourceAddress),
    Destroy(ResourceAddress),
    Import {
        address: ResourceAddress,
        id: String,
    },
    List,
}

impl Command {
    /// Parse command-line arguments (without the program name)
    fn parse(args: &[String]) -> Result<Self> {
        let arg = |index: usize, what: &str| {
            args.get(index)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("missing {what}"))
        };

        let (command, expected) = match args.first().map(String::as_str) {
            Some("verify") => (Command::Verify, 1),
            Some("schema") => (Command::Schema(args.get(1).cloned()), args.len().min(2)),
            Some("plan") => (
                Command::Plan {
                    address: arg(1, "<address>")?.parse()?,
                    desired: parse_desired(arg(2, "<json>")?)?,
                },
                3,
            ),
            Some("apply") => (
                Command::Apply {
                    address: arg(1, "<address>")?.parse()?,
                    desired: parse_desired(arg(2, "<json>")?)?,
                },
                3,
            ),
            Some("refresh") => (Command::Refresh(arg(1, "<address>")?.parse()?), 2),
            Some("destroy") => (Command::Destroy(arg(1, "<address>")?.parse()?), 2),
            Some("import") => (
                Command::Import {
                    address: arg(1, "<address>")?.parse()?,
                    id: arg(2, "<id>")?.to_string(),
                },
                3,
            ),
            Some("list") => (Command::List, 1),
            Some(other) => bail!("unknown command '{other}'"),
            None => bail!("missing command"),
        };

        if args.len() > expected {
            bail!("unexpected argument '{}'", args[expected]);
        }
        Ok(command)
    }
}

fn parse_desired(raw: &str) -> Result<Attributes> {
    match serde_json::from_str::<Value>(raw).context("declared attributes are not valid JSON")? {
        Value::Object(attributes) => Ok(attributes),
        other => bail!("declared attributes must be a JSON object, got {other}"),
    }
}

/// Host settings that are not part of the connection
struct Settings {
    state_path: String,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Self {
        Self {
            state_path: env::var("CPANEL_STATE_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATE_PATH.to_string()),
            log_level: env::var("CPANEL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}\n\n{USAGE}");
            return CtlExitCode::ConfigError.into();
        }
    };

    let settings = Settings::from_env();

    // Logs go to stderr so stdout carries only the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CtlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CtlExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(command, settings));

    match result.and_then(|output| Ok(serde_json::to_string_pretty(&output)?)) {
        Ok(rendered) => {
            println!("{rendered}");
            CtlExitCode::Success.into()
        }
        Err(e) => {
            error!("{:#}", e);
            CtlExitCode::for_error(&e).into()
        }
    }
}

/// Execute one command and return its JSON result
async fn run(command: Command, settings: Settings) -> Result<Value> {
    let registry = Arc::new(ResourceRegistry::with_builtin());

    if let Command::Schema(type_name) = &command {
        return Ok(match type_name {
            Some(type_name) => serde_json::to_value(registry.get(type_name)?.schema())?,
            None => serde_json::to_value(registry.schemas())?,
        });
    }

    let connection = ConnectionConfig::from_env()?;
    let (host, username) = (connection.host.clone(), connection.username.clone());
    let client = CpanelClient::connect(connection).await?;

    if command == Command::Verify {
        return Ok(json!({"status": "ok", "host": host, "username": username}));
    }

    let api: Arc<dyn CpanelApi> = Arc::new(client);
    let state = StateStoreConfig::File {
        path: settings.state_path,
    }
    .open()
    .await?;
    let driver = LifecycleDriver::new(api, registry, state);

    let output = match command {
        Command::Plan { address, desired } => {
            let plan = driver.plan(&address, &desired).await?;
            json!({"address": address.to_string(), "plan": plan})
        }
        Command::Apply { address, desired } => {
            let outcome = driver.apply(&address, &desired).await?;
            info!("Applied {}", address);
            json!({"address": address.to_string(), "result": outcome})
        }
        Command::Refresh(address) => match driver.refresh(&address).await? {
            Some(tracked) => json!({"address": address.to_string(), "resource": tracked}),
            None => json!({"address": address.to_string(), "status": "gone"}),
        },
        Command::Destroy(address) => {
            driver.destroy(&address).await?;
            json!({"address": address.to_string(), "status": "destroyed"})
        }
        Command::Import { address, id } => {
            let tracked = driver.import(&address, &id).await?;
            json!({"address": address.to_string(), "resource": tracked})
        }
        Command::List => serde_json::to_value(driver.list().await?)?,
        Command::Verify | Command::Schema(_) => unreachable!("handled above"),
    };

    Ok(output)
}
