use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{info, warn};

use kalshi_bot::{
    config::{ApiKey, AppConfig, DEFAULT_CONFIG_PATH},
    kalshi::KalshiClient,
    logging::BotLogger,
    ApiCredentials,
};

#[derive(Parser, Debug)]
#[command(name = "kalshi-bot")]
#[command(about = "Minimal Kalshi prediction-market client")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Bearer token to use instead of KALSHI_API_KEY
    #[arg(long)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the account balance
    Balance,
    /// List all markets
    Markets,
    /// Show a single market
    Market { market_id: String },
    /// Place a trade with a raw JSON payload
    Trade {
        market_id: String,
        /// Trade payload, forwarded to the API unchanged
        #[arg(long)]
        data: String,
    },
    /// Print the loaded configuration
    #[command(alias = "settings")]
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, source) = AppConfig::load_with_source(&args.config)?;
    let logger = BotLogger::init(&config.logging)?;
    source.log();

    if let Command::Config = args.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let override_key = args.api_key.map(ApiKey::new);
    let credentials = match (ApiCredentials::from_env(), &override_key) {
        (Ok(credentials), _) => credentials,
        (Err(_), Some(key)) => ApiCredentials {
            api_key: key.clone(),
        },
        (Err(e), None) => {
            logger.log_error(format_args!("{:#}", e));
            return Err(e);
        }
    };

    if override_key.is_some() {
        warn!("Using API key from the command line");
    }

    let client = KalshiClient::new(&config.api, &credentials, override_key)?;
    info!("Using Kalshi API at {}", client.base_url());

    let result = match args.command {
        Command::Balance => client.get_account_balance().await,
        Command::Markets => client.fetch_market_data().await,
        Command::Market { market_id } => client.get_market_data(&market_id).await,
        Command::Trade { market_id, data } => {
            let payload: Value =
                serde_json::from_str(&data).context("--data must be a valid JSON document")?;
            let result = client.place_trade(&market_id, &payload).await;
            if result.is_ok() {
                logger.log_trade(format_args!("{} {}", market_id, payload));
            }
            result
        }
        Command::Config => return Ok(()),
    };

    match result {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Err(e) => {
            logger.log_error(&e);
            Err(e.into())
        }
    }
}
