//! Request command implementation.

use anyhow::{Context, Result, anyhow};
use clap::Args;
use serde_json::Value;

use passgate_core::Loader;
use passgate_http::Method;

use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, DELETE, ...)
    pub method: String,

    /// Path below the API base URL (e.g. /api/passes/)
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", short = 'q', value_parser = parse_query_pair)]
    pub query: Vec<(String, String)>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,
}

pub async fn run(args: RequestArgs, config: &Config) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .context("Invalid HTTP method")?;
    let body = args
        .body
        .as_deref()
        .map(|raw| serde_json::from_str::<Value>(raw))
        .transpose()
        .context("Request body is not valid JSON")?;

    let session = config.session()?;
    let client = session.client();

    let mut request = client.request(method, &args.path);
    if !args.query.is_empty() {
        request = request.query(&args.query);
    }
    if let Some(body) = &body {
        request = request.json(body);
    }

    let loader = Loader::new();
    let response = match loader.execute(|| client.send(request)).await {
        Ok(response) => response,
        Err(err) => {
            output::error(loader.error().unwrap_or_else(|| err.to_string()));
            if err.is_unauthorized() {
                tracing::warn!(path = %args.path, "Backend rejected the stored session");
                eprintln!("Session is no longer valid. Run 'passgate login' again.");
            }
            return Err(anyhow!(err).context(format!("{} {} failed", args.method, args.path)));
        }
    };

    if response.bytes().is_empty() {
        output::success(response.status());
        return Ok(());
    }

    match response.json::<Value>() {
        Ok(value) => output::json_pretty(&value),
        Err(_) => {
            println!("{}", response.text());
            Ok(())
        }
    }
}

fn parse_query_pair(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
