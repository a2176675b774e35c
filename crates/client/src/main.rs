//! `quire` command-line entry point.
//!
//! Usage: `quire <login USER PASS | logout | whoami | articles [TAG] | latest>`

use std::sync::Arc;

use anyhow::{Context, bail};
use serde::Serialize;

use quire_client::resources::{ArticleQuery, articles};
use quire_client::{ClientConfig, FileTokenStore, SessionManager, TokenStore};
use quire_core::Credentials;

const USAGE: &str = "usage: quire <login USER PASS | logout | whoami | articles [TAG] | latest>";

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quire_observability::init_from_env();

    let config = ClientConfig::from_env().context("failed to read configuration")?;
    let store = match &config.token_path {
        Some(path) => FileTokenStore::new(path),
        None => FileTokenStore::in_data_dir()?,
    };
    tracing::debug!("using token file {:?}", store.path());

    let tokens: Arc<dyn TokenStore> = Arc::new(store);
    let manager = SessionManager::from_config(&config, tokens)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["login", username, password] => {
            let session = manager
                .login(&Credentials::new(*username, *password))
                .await
                .context("login failed")?;
            print_json(&session)?;
        }
        ["logout"] => {
            manager.logout().await;
            print_json(&manager.session().await)?;
        }
        ["whoami"] => {
            let session = manager.bootstrap().await;
            print_json(&session)?;
        }
        ["articles", rest @ ..] if rest.len() <= 1 => {
            manager.bootstrap().await;
            let query = rest
                .first()
                .map(|tag| ArticleQuery::tagged(*tag))
                .unwrap_or_default();
            let listing = articles::list(manager.client(), &query).await?;
            print_json(&listing.into_items())?;
        }
        ["latest"] => {
            manager.bootstrap().await;
            print_json(&articles::latest(manager.client()).await?)?;
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
