//! Operator command line for the heritage registry API.
//!
//! - `heritage-console get <path> --param page=0` reads through a query controller
//! - `heritage-console download <path> <filename>` saves a file to the download directory
//! - `heritage-console policy <path>` shows how the client treats an endpoint

#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use heritage::{
    ApiError, Method, QueryController, QueryOptions, RequestClient, RequestConfig, RequestStatus,
};
use serde_json::Value;
use shared::config::ClientConfig;
use shared_http::QueryParams;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "heritage-console")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override HERITAGE_API_BASE_URL.
    #[arg(long, env = "HERITAGE_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a path and print the normalized JSON.
    Get {
        path: String,
        /// Query parameter as name=value; repeatable.
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
        /// Go to the network even if a fresh cached copy exists.
        #[arg(long)]
        skip_cache: bool,
    },
    /// Save the body of a path to the download directory.
    Download { path: String, filename: String },
    /// Show whether a path gets the credential and whether reads are cached.
    Policy {
        path: String,
        #[arg(long, default_value = "GET", value_parser = parse_method)]
        method: Method,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{}'", raw)),
    }
}

fn parse_method(raw: &str) -> Result<Method, String> {
    match raw.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::Get),
        "POST" => Ok(Method::Post),
        "PUT" => Ok(Method::Put),
        "PATCH" => Ok(Method::Patch),
        "DELETE" => Ok(Method::Delete),
        other => Err(format!("unsupported method '{}'", other)),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays clean JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_string();
    }

    let client = match RequestClient::builder(config).build() {
        Ok(client) => client,
        Err(err) => {
            error!("Cannot start: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Get {
            path,
            params,
            skip_cache,
        } => get(client, path, params, skip_cache).await,
        Commands::Download { path, filename } => {
            match client.download(&path, &filename, RequestConfig::new()).await {
                Ok(saved) => {
                    println!("{}", saved.display());
                    ExitCode::SUCCESS
                }
                Err(err) => report(&err),
            }
        }
        Commands::Policy { path, method } => {
            let policy = client.policy().resolve(method, &path);
            println!(
                "{} {}: credential {}, cache {}",
                method,
                path,
                if policy.attach_credentials { "attached" } else { "omitted" },
                if policy.cacheable { "enabled" } else { "disabled" }
            );
            ExitCode::SUCCESS
        }
    }
}

async fn get(
    client: RequestClient,
    path: String,
    params: Vec<(String, String)>,
    skip_cache: bool,
) -> ExitCode {
    let params: QueryParams = params.into_iter().collect();
    let mut request = RequestConfig::new();
    if skip_cache {
        request = request.skip_cache();
    }

    let controller: QueryController<Value> =
        QueryController::new(client, path, params, QueryOptions::new().config(request));
    controller.activate().await;

    let state = controller.state();
    match (state.status(), state.data, state.error) {
        (RequestStatus::Success, Some(data), _) => {
            match serde_json::to_string_pretty(&data) {
                Ok(text) => println!("{}", text),
                Err(err) => {
                    error!("Cannot print response: {}", err);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        (_, _, Some(err)) => report(&err),
        _ => ExitCode::FAILURE,
    }
}

fn report(err: &ApiError) -> ExitCode {
    match serde_json::to_string_pretty(&err.normalized) {
        Ok(text) => eprintln!("{}", text),
        Err(_) => eprintln!("{}", err),
    }
    ExitCode::FAILURE
}
