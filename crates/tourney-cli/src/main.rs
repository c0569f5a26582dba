//! tourney - command-line client for the tournament server.
//!
//! Keeps one authenticated session across invocations. Credentials live in
//! the configured store; an expired access token is renewed transparently.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tourney_core::{ApiClient, ApiError, ApiRequest, Config, SessionState};

const USAGE: &str = "\
Usage: tourney <command> [args]

Commands:
  login [email]       Log in and store the session
  logout              Forget the stored session
  whoami              Show the logged-in user
  tournaments         List visible tournaments
  join <id> [code]    Join a tournament
  matches <id>        List matches of a tournament
  standings <id>      Show the league table of a tournament
  friends             List friendships
  notifications       List notifications
  get <path>          GET any API path and print the JSON";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // RUST_LOG controls the level (e.g., RUST_LOG=tourney_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        println!("{}", USAGE);
        return Ok(());
    };
    if matches!(command, "-h" | "--help" | "help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    config.apply_env()?;
    debug!(api = %config.api_base_url, store = ?config.store, "Configuration loaded");

    let client = ApiClient::from_config(&config)?;

    match command {
        "login" => login(&client, &mut config, args.get(1).cloned()).await,
        "logout" => {
            client.logout();
            println!("Logged out.");
            Ok(())
        }
        other => {
            require_session(&client).await?;
            run(&client, other, &args[1..]).await.map_err(explain)
        }
    }
}

async fn run(client: &ApiClient, command: &str, rest: &[String]) -> Result<()> {
    match command {
        "whoami" => {
            let profile = client.fetch_profile().await?;
            println!("{}", profile.display_name());
        }
        "tournaments" => {
            for t in client.fetch_tournaments().await? {
                println!(
                    "{:>5}  {:<30} {:<9} {}/{}",
                    t.id, t.name, t.status, t.participants_count, t.max_players
                );
            }
        }
        "join" => {
            let id = parse_id(rest.first())?;
            let result = client.join_tournament(id, rest.get(1).map(String::as_str)).await?;
            println!("{}", result.message);
        }
        "matches" => {
            let id = parse_id(rest.first())?;
            for m in client.fetch_matches(id).await? {
                println!("{:>5}  {:<14} {}", m.id, m.round.display_name(), m.scoreline());
            }
        }
        "standings" => {
            let id = parse_id(rest.first())?;
            for (pos, row) in client.fetch_standings(id).await?.iter().enumerate() {
                println!(
                    "{:>2}. {:<20} {:>3} pts  {:>+4} GD",
                    pos + 1,
                    row.player.username,
                    row.points,
                    row.goal_difference
                );
            }
        }
        "friends" => {
            let me = client.fetch_profile().await?;
            for f in client.fetch_friendships().await? {
                println!("{:<20} {:?}", f.counterpart(me.id).username, f.status);
            }
        }
        "notifications" => {
            for n in client.fetch_notifications().await? {
                let marker = if n.is_read { ' ' } else { '*' };
                println!("{} {}  {}", marker, n.created_at.format("%Y-%m-%d %H:%M"), n.content);
            }
        }
        "get" => {
            let Some(path) = rest.first() else {
                bail!("get needs a path, e.g. /tournaments/");
            };
            let value: serde_json::Value = client.get_json(ApiRequest::get(path.as_str())).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }
    Ok(())
}

async fn login(client: &ApiClient, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email.or_else(|| config.last_email.clone()) {
        Some(email) => email,
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let profile = client.login(&email, &password).await.map_err(explain)?;
    info!(user = %profile.username, "Logged in");
    println!("Logged in as {}", profile.display_name());

    config.last_email = Some(email);
    config.save()?;
    Ok(())
}

async fn require_session(client: &ApiClient) -> Result<()> {
    match client.bootstrap().await {
        SessionState::Authenticated(_) => Ok(()),
        _ => bail!("Not logged in. Run `tourney login` first."),
    }
}

fn explain(err: impl Into<anyhow::Error>) -> anyhow::Error {
    let err = err.into();
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::InvalidCredentials) => anyhow::anyhow!("Email or password is incorrect"),
        Some(ApiError::SessionExpired) => {
            anyhow::anyhow!("Your session has expired. Run `tourney login` to sign in again.")
        }
        _ => err,
    }
}

fn parse_id(arg: Option<&String>) -> Result<i64> {
    let arg = arg.context("Missing id")?;
    arg.parse().with_context(|| format!("Invalid id: {}", arg))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim().to_string();
    if line.is_empty() {
        bail!("No input given");
    }
    Ok(line)
}
