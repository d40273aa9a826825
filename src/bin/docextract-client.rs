//! Companion client: upload one PDF to a running docextract service and
//! print what comes back.

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;
use std::time::Duration;

/// Upload a PDF to the extraction service and print the response.
#[derive(Parser, Debug)]
#[command(name = "docextract-client", version)]
struct Cli {
    /// PDF file to upload.
    file: PathBuf,

    /// Upload endpoint.
    #[arg(long, env = "DOCEXTRACT_URL", default_value = "http://localhost:8998/upload-pdf/")]
    url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 600)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let data = tokio::fs::read(&cli.file)
        .await
        .with_context(|| format!("Failed to read {:?}", cli.file))?;
    let file_name = cli
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    let part = Part::bytes(data)
        .file_name(file_name)
        .mime_str("application/pdf")
        .context("Invalid MIME type")?;
    let form = Form::new().part("file", part);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .build()
        .context("Failed to build HTTP client")?;
    let response = client
        .post(&cli.url)
        .multipart(form)
        .send()
        .await
        .with_context(|| format!("Request to {} failed", cli.url))?;

    let status = response.status();
    println!("{}", status.as_u16());

    let body = response.text().await.context("Failed to read response body")?;
    let json = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(value) => value,
        Err(_) => serde_json::json!({ "error": body }),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&json).context("Failed to serialise response")?
    );
    Ok(())
}
