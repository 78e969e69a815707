//! Demo CLI
//!
//! Exercises the vault client against a live realm fleet. Uses `anyhow`
//! for startup errors; operation errors surface as the vault's own types.
//!
//! Environment:
//! - `VAULT_CONFIG`: path to a JSON realm configuration
//! - `TENANT_SIGNING_KEY`: hex tenant key for local token minting
//! - `TENANT_NAME`, `TENANT_KEY_VERSION`: key id parts
//! - `VAULT_SECRET_ID`: hex secret id (generated and printed when unset)

use std::env;
use std::fs;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vault::{
    create_authentication, random_secret_id, Client, CodecError, Configuration, Pin, SecretCodec,
    SecretId, SecretShare, SigningParameters, UserSecret,
};

/// Every share mirrors the whole secret. No threshold security at all;
/// this exists so the demo runs without a production sharing scheme.
struct MirrorCodec;

impl SecretCodec for MirrorCodec {
    fn split(
        &self,
        secret: &UserSecret,
        share_count: u8,
        _recover_threshold: u8,
    ) -> Result<Vec<SecretShare>, CodecError> {
        Ok((0..share_count)
            .map(|index| SecretShare {
                index,
                data: secret.as_bytes().to_vec(),
            })
            .collect())
    }

    fn reconstruct(
        &self,
        shares: &[SecretShare],
        recover_threshold: u8,
    ) -> Result<UserSecret, CodecError> {
        if shares.len() < usize::from(recover_threshold) {
            return Err(CodecError::TooFewShares {
                needed: recover_threshold,
                got: shares.len(),
            });
        }
        UserSecret::new(shares[0].data.clone())
            .map_err(|e| CodecError::MalformedShares(e.to_string()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "demo=info,vault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        env::var("VAULT_CONFIG").context("VAULT_CONFIG must point to a configuration file")?;
    let configuration: Configuration = serde_json::from_str(
        &fs::read_to_string(&config_path)
            .with_context(|| format!("reading {config_path}"))?,
    )
    .context("parsing realm configuration")?;

    let key_hex =
        env::var("TENANT_SIGNING_KEY").context("TENANT_SIGNING_KEY must be set (hex)")?;
    let tenant = env::var("TENANT_NAME").unwrap_or_else(|_| "demo".to_string());
    let version: u32 = env::var("TENANT_KEY_VERSION")
        .unwrap_or_else(|_| "1".to_string())
        .parse()
        .context("TENANT_KEY_VERSION must be an integer")?;
    let parameters = SigningParameters::new(&key_hex, tenant, version)?;

    let secret_id = match env::var("VAULT_SECRET_ID") {
        Ok(hex) => SecretId::parse_hex(&hex).context("VAULT_SECRET_ID must be 32 hex chars")?,
        Err(_) => {
            let id = random_secret_id();
            tracing::info!(secret_id = %id, "Generated a fresh secret id");
            id
        }
    };

    let authentication = create_authentication(&configuration, parameters, &secret_id)?;

    tracing::warn!("Demo codec mirrors the secret to every realm; do not use in production");
    let client = Client::over_http(Arc::new(MirrorCodec));

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, pin, secret] if cmd == "register" => {
            let pin = Pin::new(pin.clone().into_bytes())?;
            let secret = UserSecret::new(secret.clone().into_bytes())?;
            client
                .register(
                    &configuration,
                    &authentication,
                    &secret_id,
                    &pin,
                    &secret,
                    secret_id.to_hex().as_bytes(),
                    5,
                )
                .await?;
            println!("registered under {secret_id}");
        }
        [cmd, pin] if cmd == "recover" => {
            let pin = Pin::new(pin.clone().into_bytes())?;
            let secret = client
                .recover(
                    &configuration,
                    &authentication,
                    &secret_id,
                    &pin,
                    secret_id.to_hex().as_bytes(),
                )
                .await?;
            println!("{}", String::from_utf8_lossy(secret.as_bytes()));
        }
        [cmd] if cmd == "delete" => {
            client
                .delete(&configuration, &authentication, &secret_id)
                .await?;
            println!("deleted {secret_id}");
        }
        _ => bail!("usage: demo register <pin> <secret> | demo recover <pin> | demo delete"),
    }

    Ok(())
}
