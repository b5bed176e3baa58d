use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
mod auth;
mod config;
mod render;
use config::ScryptArgs;
use qrseal::{CURRENT_VERSION, Payload, TokenError, url};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "qrseal")]
#[command(
    version,
    about = "Seal small payloads into passphrase-protected, URL-safe tokens for QR links."
)]
struct Cli {
    #[command(flatten)]
    scrypt: ScryptArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seals a payload into a token, or into a page URL carrying it and its QR image
    Encode {
        /// HTTPS page that receives the token as its `t` parameter
        #[arg(long, value_name = "URL")]
        page_url: Option<String>,

        /// What this token is for
        #[arg(long, default_value = "demo")]
        subject: String,

        /// Extra payload field; values that parse as JSON keep their type
        #[arg(long = "claim", value_name = "KEY=VALUE", value_parser = parse_claim)]
        claims: Vec<(String, Value)>,

        /// Domains the page URL may point at (comma-separated)
        #[arg(
            long = "allow-domain",
            value_name = "DOMAIN",
            env = "QR_ALLOWED_DOMAINS",
            value_delimiter = ','
        )]
        allowed_domains: Vec<String>,

        /// QR image file name, without extension
        #[arg(long, default_value = "secure_qr")]
        name: String,

        /// Directory the QR image is written to
        #[arg(long, value_name = "DIR", env = "QR_OUTPUT_DIR", default_value = "qr_codes")]
        out_dir: PathBuf,
    },

    /// Opens a token, or a URL carrying one, and prints its payload
    #[command(arg_required_else_help = true)]
    Decode {
        /// Token text or carrier URL
        input: String,
    },
}

fn parse_claim(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty claim name in '{raw}'"));
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(v) if !v.is_object() && !v.is_array() => v,
        _ => Value::String(value.to_string()),
    };
    Ok((key.to_string(), value))
}

fn build_payload(subject: String, claims: Vec<(String, Value)>) -> Payload {
    let mut payload = Payload::new();
    payload.insert("sub".into(), Value::String(subject));
    payload.insert("iat".into(), Value::String(Utc::now().to_rfc3339()));
    for (key, value) in claims {
        payload.insert(key, value);
    }
    payload
}

/// Maps core failures to the messages users act on.
fn explain(err: TokenError) -> anyhow::Error {
    let msg = match &err {
        TokenError::MissingSecret => Some(format!(
            "missing passphrase: set {}",
            auth::PASSPHRASE_ENV
        )),
        TokenError::UnsupportedVersion(v) => Some(format!(
            "token version '{v}' is not supported (this build reads '{CURRENT_VERSION}'); upgrade required"
        )),
        TokenError::AuthenticationFailed => {
            Some("could not open token: wrong passphrase or corrupted token".to_string())
        }
        e if e.is_format_error() => Some("input is not a valid token".to_string()),
        _ => None,
    };

    match msg {
        Some(msg) => anyhow::Error::new(err).context(msg),
        None => anyhow::Error::new(err),
    }
}

fn main() -> Result<()> {
    let env_file = config::load_env_file();
    config::init_logging();
    config::report_env_file(env_file);

    let args = Cli::parse();
    let kdf = args.scrypt.to_kdf_params()?;

    match args.command {
        Commands::Encode {
            page_url,
            subject,
            claims,
            allowed_domains,
            name,
            out_dir,
        } => {
            if let Some(page_url) = &page_url {
                if allowed_domains.is_empty() {
                    bail!(
                        "no allowed domains configured: pass --allow-domain or set QR_ALLOWED_DOMAINS"
                    );
                }
                url::validate_page_url(page_url, &allowed_domains)?;
                debug!(page_url = %page_url, "page url accepted");
            }

            let passphrase = auth::read_passphrase(true)?;
            let payload = build_payload(subject, claims);

            let token = qrseal::encode_with_kdf(&payload, &passphrase, kdf).map_err(explain)?;
            info!(len = token.len(), "token sealed");

            match page_url {
                Some(page_url) => {
                    let qr_url = url::build_url(&page_url, &token)?;
                    let saved = render::save_qr_png(&qr_url, &out_dir, &name)?;
                    info!(path = %saved.display(), "qr image written");

                    println!("QR URL: {qr_url}");
                    println!("Saved: {}", saved.display());
                }
                None => println!("{token}"),
            }
        }
        Commands::Decode { input } => {
            let token = if input.contains("://") {
                url::token_from_url(&input).context("URL has no 't' token parameter")?
            } else {
                input.trim()
            };
            debug!(version = ?qrseal::version_of(token), "opening token");

            let passphrase = auth::read_passphrase(false)?;
            let payload = qrseal::decode_with_kdf(token, &passphrase, kdf).map_err(explain)?;

            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}
