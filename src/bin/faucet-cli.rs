use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "faucet-cli")]
#[command(about = "Command line client for the faucet HTTP API", long_about = None)]
struct Cli {
    #[arg(short, long, env = "FAUCET_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the funding account, network and payout
    Info,
    /// Request funds for an address
    Claim {
        /// Recipient address (0x-prefixed hex)
        address: String,
    },
    /// Check server liveness and queue depth
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Info => client.get(format!("{}/api/info", base)).send().await?,
        Commands::Claim { address } => {
            client
                .post(format!("{}/api/claim", base))
                .json(&json!({ "address": address }))
                .send()
                .await?
        }
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(body)) if body.len() == 1 && body.contains_key("msg") => {
            body["msg"].as_str().unwrap_or_default().to_string()
        }
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
        Ok(())
    } else {
        eprintln!("Error ({}): {}", status, rendered);
        std::process::exit(1);
    }
}
