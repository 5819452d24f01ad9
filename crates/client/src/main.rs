//! `quizhub-whoami`: sign in (or resume a stored session) and print who the
//! API thinks you are.
//!
//! Environment:
//! - `QUIZHUB_API_URL`, `QUIZHUB_API_TIMEOUT_MS`, `QUIZHUB_STORE_PATH`
//! - `QUIZHUB_EMAIL` + `QUIZHUB_PASSWORD` to sign in; without them the stored
//!   credential is used
//! - `QUIZHUB_LOGOUT=1` to sign out afterwards

use anyhow::{Context, bail};

use quizhub_client::{AuthState, ClientConfig, QuizHubClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    quizhub_observability::init();

    let config = ClientConfig::from_env().context("invalid client configuration")?;
    let client = QuizHubClient::new(config).context("failed to build client")?;

    match (std::env::var("QUIZHUB_EMAIL"), std::env::var("QUIZHUB_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            client
                .session()
                .login(&email, &password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("sign-in failed")?;
        }
        _ => client.start().await,
    }

    let state = client.state();
    let Some(identity) = state.identity() else {
        match state {
            AuthState::Loading => bail!("identity is still loading"),
            _ => bail!("not signed in; set QUIZHUB_EMAIL and QUIZHUB_PASSWORD"),
        }
    };

    let authz = client.authorizer();
    println!("{} <{}>", identity.display_name(), identity.email);
    println!("id:          {}", identity.id);
    println!(
        "roles:       {}",
        authz
            .roles()
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("permissions: {}", authz.permissions().to_strings().join(", "));

    if std::env::var("QUIZHUB_LOGOUT").is_ok_and(|v| v == "1") {
        client.session().logout().await;
    }

    Ok(())
}
