use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "jarvisctl", about = "JARVIS CLI — check a running assistant backend")]
struct Cli {
    /// Print the raw JSON response
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show service name, version and status
    Status {
        /// JARVIS address
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        addr: String,
    },

    /// Show health and the configured memory service
    Health {
        /// JARVIS address
        #[arg(long, default_value = "http://127.0.0.1:8000")]
        addr: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let (url, render): (String, fn(&Value) -> String) = match cli.command {
        Commands::Status { addr } => (format!("{}/", addr.trim_end_matches('/')), render_status),
        Commands::Health { addr } => (
            format!("{}/health", addr.trim_end_matches('/')),
            render_health,
        ),
    };

    let resp: Value = client
        .get(&url)
        .send()
        .await
        .context("Failed to connect")?
        .error_for_status()
        .with_context(|| format!("{url} returned an error"))?
        .json()
        .await
        .context("Response was not JSON")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
    } else {
        print!("{}", render(&resp));
    }

    Ok(())
}

fn field(resp: &Value, key: &str) -> String {
    resp[key].as_str().unwrap_or("unknown").to_string()
}

fn render_status(resp: &Value) -> String {
    format!(
        "{} v{}\n  Status: {}\n",
        field(resp, "service"),
        field(resp, "version"),
        field(resp, "status"),
    )
}

fn render_health(resp: &Value) -> String {
    format!(
        "JARVIS Health:\n  Status:     {}\n  Memory API: {}\n  User ID:    {}\n",
        field(resp, "status"),
        field(resp, "memory_api"),
        field(resp, "user_id"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_status() {
        let resp = json!({"status": "online", "service": "JARVIS", "version": "0.1.0"});
        assert_eq!(render_status(&resp), "JARVIS v0.1.0\n  Status: online\n");
    }

    #[test]
    fn test_render_health() {
        let resp = json!({
            "status": "healthy",
            "memory_api": "http://mem:9999",
            "user_id": "alice",
        });
        let out = render_health(&resp);
        assert!(out.contains("Status:     healthy"));
        assert!(out.contains("Memory API: http://mem:9999"));
        assert!(out.contains("User ID:    alice"));
    }

    #[test]
    fn test_render_missing_fields() {
        assert!(render_health(&json!({})).contains("Memory API: unknown"));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["jarvisctl", "health", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Health { ref addr } if addr == "http://127.0.0.1:8000"));

        let cli = Cli::try_parse_from(["jarvisctl", "status", "--addr", "http://jarvis:8000"]).unwrap();
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::Status { ref addr } if addr == "http://jarvis:8000"));
    }
}
