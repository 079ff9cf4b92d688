use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use company_service::company::Company;
use company_service::rpc::RpcClient;

#[derive(Parser)]
#[command(name = "company-cli")]
#[command(about = "Command line client for the company service", long_about = None)]
struct Cli {
    /// RPC address of the service
    #[arg(short, long, default_value = "127.0.0.1:8082", env = "EM_RPC_ADDR")]
    rpc: String,

    /// Talk to the HTTP binding at this base URL instead of RPC
    #[arg(long)]
    http: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a company, or rename one when --id is given
    Save {
        name: String,
        #[arg(long, default_value_t = 0)]
        id: i64,
    },
    /// Show one company
    Find { id: i64 },
    /// Delete one company
    Delete { id: i64 },
    /// List every company
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.http {
        Some(base) => run_http(&base, cli.command).await,
        None => run_rpc(&cli.rpc, cli.command).await,
    }
}

async fn run_rpc(addr: &str, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = RpcClient::connect(addr).await?;

    match command {
        Commands::Save { name, id } => {
            let saved = client.save(Company { id, ..Company::named(name) }).await?;
            print_json(&saved)?;
        }
        Commands::Find { id } => print_json(&client.find(id).await?)?,
        Commands::Delete { id } => {
            client.delete(id).await?;
            print_json(&json!({}))?;
        }
        Commands::List => print_json(&json!({ "companies": client.find_all().await? }))?,
    }

    Ok(())
}

async fn run_http(base: &str, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let (path, body) = match command {
        Commands::Save { name, id } => ("save", json!({ "company": { "id": id, "name": name } })),
        Commands::Find { id } => ("find", json!({ "id": id })),
        Commands::Delete { id } => ("delete", json!({ "id": id })),
        Commands::List => ("findall", json!({})),
    };

    let res = reqwest::Client::new()
        .post(format!("{}/company/{}", base.trim_end_matches('/'), path))
        .json(&body)
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: company service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    print_json(&json)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
