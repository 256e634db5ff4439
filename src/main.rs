pub mod models {
    pub mod domain;
    pub mod tiko;
}

pub mod client;
pub mod config;
pub mod cookies;
pub mod dispatch;
pub mod handlers;
pub mod mapper;
pub mod queries;
pub mod retry;
pub mod session;
pub mod transport;

use crate::client::TikoClient;
use crate::config::Config;
use crate::handlers::ApiResponse;
use http::Method;
use log::{error, info, warn};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

const USAGE: &str = "usage: tiko-panel [--env-file PATH] <command>

commands:
  rooms                                          print property mode and rooms
  mode <MODE|none> [--room ID] [--until RFC3339] activate a property or room mode
  temperature <ROOM_ID> <DEGREES>                set a room's target temperature

modes: comfort, boost, sleep, absence, frost, disableHeating, passive, summer, bypass";

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Rooms,
    Mode {
        mode: Option<String>,
        room_id: Option<i64>,
        until: Option<String>,
    },
    Temperature {
        room_id: i64,
        degrees: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Cli {
    env_file: Option<PathBuf>,
    command: Command,
}

fn parse_cli<I>(args: I) -> Result<Cli, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut env_file: Option<PathBuf> = None;
    let mut positional = Vec::new();
    let mut room_id: Option<i64> = None;
    let mut until: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--env-file" => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            "--room" => {
                let value = args.next().ok_or_else(|| "`--room` requires a room id".to_string())?;
                room_id = Some(parse_room_id(&value)?);
            }
            "--until" => {
                until = Some(
                    args.next()
                        .ok_or_else(|| "`--until` requires a timestamp".to_string())?,
                );
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            s if s.starts_with("--") => return Err(format!("unrecognised argument: {}\n\n{}", s, USAGE)),
            _ => positional.push(arg),
        }
    }

    let mode_flags_given = room_id.is_some() || until.is_some();
    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        Some("rooms") => Command::Rooms,
        Some("mode") => {
            let mode = positional
                .next()
                .ok_or_else(|| format!("`mode` requires a mode name or `none`\n\n{}", USAGE))?;
            Command::Mode {
                mode: if mode == "none" { None } else { Some(mode) },
                room_id,
                until,
            }
        }
        Some("temperature") => {
            let (Some(room), Some(degrees)) = (positional.next(), positional.next()) else {
                return Err(format!("`temperature` requires a room id and degrees\n\n{}", USAGE));
            };
            Command::Temperature {
                room_id: parse_room_id(&room)?,
                degrees: degrees
                    .parse::<f64>()
                    .map_err(|_| format!("invalid temperature: {}", degrees))?,
            }
        }
        Some(other) => return Err(format!("unknown command: {}\n\n{}", other, USAGE)),
        None => return Err(USAGE.to_string()),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument: {}", extra));
    }
    if mode_flags_given && !matches!(command, Command::Mode { .. }) {
        return Err("`--room` and `--until` only apply to `mode`".to_string());
    }

    Ok(Cli { env_file, command })
}

fn parse_room_id(value: &str) -> Result<i64, String> {
    value.parse::<i64>().map_err(|_| format!("invalid room id: {}", value))
}

/// Request body the matching endpoint expects for `command`.
fn request_body(command: &Command) -> Value {
    match command {
        Command::Rooms => Value::Null,
        Command::Mode { mode, room_id, until } => {
            let mut body = Map::new();
            body.insert("mode".into(), json!(mode));
            if let Some(room_id) = room_id {
                body.insert("room_id".into(), json!(room_id));
            }
            if let Some(until) = until {
                body.insert("end_datetime".into(), json!(until));
            }
            Value::Object(body)
        }
        Command::Temperature { room_id, degrees } => json!({ "room_id": room_id, "temperature": degrees }),
    }
}

fn dispatch_command(client: &TikoClient, command: &Command) -> ApiResponse {
    let body = request_body(command);
    match command {
        Command::Rooms => handlers::mode_and_rooms(client, &Method::GET),
        Command::Mode { .. } => handlers::mode(client, &Method::PUT, &body),
        Command::Temperature { .. } => handlers::temperature(client, &Method::PUT, &body),
    }
}

fn load_env(env_file: Option<&PathBuf>) -> Result<Option<(PathBuf, bool)>, String> {
    // dotenvy never overrides variables already present in the process environment.
    if let Some(path) = env_file {
        if !path.is_file() {
            return Err(format!("env file not found: {}", path.display()));
        }
        dotenvy::from_path(path).map_err(|e| format!("failed to load {}: {}", path.display(), e))?;
        return Ok(Some((path.clone(), true)));
    }
    let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
    let default_path = cwd.join(".env");
    if default_path.is_file() {
        dotenvy::from_path(&default_path).map_err(|e| format!("failed to load {}: {}", default_path.display(), e))?;
        Ok(Some((default_path, false)))
    } else {
        Ok(None)
    }
}

fn run(command: &Command) -> Result<(), String> {
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (endpoint={}, lang={}, timeout={}s, credentials={})",
        cfg.graphql_url(),
        cfg.lang_code,
        cfg.request_timeout.as_secs(),
        if cfg.credentials.is_some() { "set" } else { "missing" }
    );
    if cfg.credentials.is_none() {
        warn!("TIKO_USERNAME/TIKO_PASSWORD not set; every request will fail");
    }

    let client = TikoClient::new(&cfg);
    let response = dispatch_command(&client, command);
    let rendered = serde_json::to_string_pretty(&response.body).map_err(|e| format!("encode response: {}", e))?;
    println!("{}", rendered);

    if response.status.is_success() {
        Ok(())
    } else {
        Err(format!("request failed with status {}", response.status))
    }
}

fn main() {
    let cli = match parse_cli(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    let loaded_env = match load_env(cli.env_file.as_ref()) {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some((path, explicit)) = loaded_env.as_ref() {
        let origin = if *explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, path.display());
    }

    info!(
        "tiko-panel {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run(&cli.command) {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}
