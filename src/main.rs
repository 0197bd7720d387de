mod cache;
mod config;
mod ice;
mod logging;
mod network;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use cache::{format_age, EmergencyCache};
use ice::{CachedIceClient, CardView, IceClient};
use network::NetworkStatus;

#[derive(Parser, Debug)]
#[command(name = "policyvault")]
#[command(about = "PolicyVault emergency card viewer with offline cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/policyvault/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL (overrides config)
  #[arg(long)]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Store a JSON payload in the offline cache
  Put {
    key: String,
    /// Read the payload from this file instead of stdin
    #[arg(short, long)]
    file: Option<PathBuf>,
  },
  /// Print a cached payload and its age
  Get { key: String },
  /// Remove a cached payload
  Delete { key: String },
  /// Describe how old a capture timestamp (epoch milliseconds) is
  Age { captured_at: i64 },
  /// Report network reachability of the API
  Status,
  /// View an emergency card, falling back to the offline copy
  Card {
    access_code: String,
    /// PIN for protected cards
    #[arg(long)]
    pin: Option<String>,
    /// Print the card as JSON
    #[arg(long)]
    json: bool,
  },
  /// Save an emergency card for offline use
  Prefetch { access_code: String },
  /// Remove the offline copy of an emergency card
  Forget { access_code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }

  let _log_guard = logging::init(&config.log);
  info!(api = %config.api.url, "PolicyVault starting");

  let cache = Arc::new(EmergencyCache::from_config(&config.cache));

  match args.command {
    Cmd::Put { key, file } => {
      let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
          .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?,
        None => {
          let mut buf = String::new();
          std::io::stdin().read_to_string(&mut buf)?;
          buf
        }
      };
      let payload: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| eyre!("Payload is not valid JSON: {}", e))?;
      cache.put(&key, &payload).await;
    }
    Cmd::Get { key } => match cache.get::<serde_json::Value>(&key).await {
      Some(entry) => {
        println!("{}", serde_json::to_string_pretty(&entry.payload)?);
        println!("Captured: {}", format_age(entry.captured_at));
      }
      None => println!("No cached entry for {}", key),
    },
    Cmd::Delete { key } => cache.delete(&key).await,
    Cmd::Age { captured_at } => println!("{}", format_age(captured_at)),
    Cmd::Status => {
      let client = cached_client(&config, cache)?;
      client.refresh_network().await;
      println!("{}", if client.is_online() { "online" } else { "offline" });
    }
    Cmd::Card {
      access_code,
      pin,
      json,
    } => {
      let client = cached_client(&config, cache)?;
      let view = client.view_card(&access_code, pin.as_deref()).await?;
      if json {
        println!("{}", serde_json::to_string_pretty(&view.card)?);
      } else {
        print_card(&view);
      }
    }
    Cmd::Prefetch { access_code } => {
      let client = cached_client(&config, cache)?;
      if client.prefetch(&access_code).await? {
        println!("Saved {} for offline use", access_code);
      } else {
        println!("{} is PIN-protected and cannot be saved offline", access_code);
      }
    }
    Cmd::Forget { access_code } => {
      let client = cached_client(&config, cache)?;
      client.forget_card(&access_code).await;
    }
  }

  Ok(())
}

fn cached_client(config: &config::Config, cache: Arc<EmergencyCache>) -> Result<CachedIceClient> {
  let inner = IceClient::new(&config.api)?;

  // Without probing there is no reachability signal, so assume online
  Ok(if config.network.probe {
    CachedIceClient::new(inner, cache, NetworkStatus::with_indicator(true))
      .with_probe(Duration::from_millis(config.network.probe_timeout_ms))
  } else {
    CachedIceClient::new(inner, cache, NetworkStatus::detached())
  })
}

fn print_card(view: &CardView) {
  if let Some(banner) = view.banner() {
    println!("[{}]", banner);
  }
  if view.offline {
    println!("[offline]");
  }

  let card = &view.card;
  println!("Emergency card: {}", card.holder_name);

  if card.requires_pin {
    println!("This card is PIN-protected. Re-run with --pin.");
    return;
  }

  if let Some(name) = &card.emergency_contact_name {
    let phone = card.emergency_contact_phone.as_deref().unwrap_or("-");
    println!("Emergency contact: {} ({})", name, phone);
  }

  for policy in &card.policies {
    println!();
    println!(
      "{} - {}",
      policy.policy_type.as_deref().unwrap_or("Policy"),
      policy.carrier.as_deref().unwrap_or("Unknown carrier")
    );
    if let Some(number) = &policy.policy_number {
      println!("  Policy #: {}", number);
    }
    if let Some(phone) = &policy.claims_phone {
      println!("  Claims: {}", phone);
    }
    if let Some(agent) = &policy.agent_name {
      println!("  Agent: {} {}", agent, policy.agent_phone.as_deref().unwrap_or(""));
    }
    if let Some(amount) = policy.coverage_amount {
      println!("  Coverage: ${:.0}", amount);
    }
    if let Some(deductible) = policy.deductible {
      println!("  Deductible: ${:.0}", deductible);
    }
  }
}
