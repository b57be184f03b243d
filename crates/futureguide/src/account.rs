// SPDX-FileCopyrightText: 2026 FutureGuide Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `futureguide login`, `logout`, and `balance`.

use std::io::{self, IsTerminal};

use futureguide_client::{ApiClient, LoginRequest, RegisterRequest, TokenStore};
use futureguide_config::FutureGuideConfig;
use futureguide_core::FutureGuideError;
use secrecy::SecretString;
use tracing::info;

pub async fn run_login(
    config: &FutureGuideConfig,
    email: String,
    password: Option<String>,
    register: bool,
    username: Option<String>,
) -> Result<(), FutureGuideError> {
    let password = match password {
        Some(password) => SecretString::from(password),
        None => prompt_password()?,
    };

    let api = ApiClient::from_config(&config.client)?;
    let session = if register {
        api.register(&RegisterRequest {
            email,
            password,
            username,
        })
        .await?
    } else {
        api.login(&LoginRequest { email, password }).await?
    };

    let mut store = TokenStore::new(&config.session.token_path);
    store.save(SecretString::from(session.token))?;
    info!(user_id = %session.user.id, path = %store.path().display(), "session saved");

    let name = session.user.username.as_deref().unwrap_or(&session.user.email);
    println!("logged in as {name}");
    if let Some(balance) = session.user.token_balance {
        println!("token balance: {balance}");
    }
    Ok(())
}

pub fn run_logout(config: &FutureGuideConfig) -> Result<(), FutureGuideError> {
    let mut store = TokenStore::new(&config.session.token_path);
    store.clear()?;
    println!("logged out");
    Ok(())
}

pub async fn run_balance(config: &FutureGuideConfig) -> Result<(), FutureGuideError> {
    let store = TokenStore::from_config(&config.session)?;
    let token = require_session(&store)?;
    let api = ApiClient::from_config(&config.client)?;
    let balance = api.token_balance(token).await?;
    println!("token balance: {}", balance.token_balance);
    Ok(())
}

/// The stored token, or an error telling the user to log in.
pub fn require_session(store: &TokenStore) -> Result<&SecretString, FutureGuideError> {
    store
        .token()
        .ok_or_else(|| FutureGuideError::unauthorized("not logged in; run `futureguide login` first"))
}

/// Prompt on the terminal without echo.
fn prompt_password() -> Result<SecretString, FutureGuideError> {
    read_password_with(io::stdin().is_terminal(), || {
        eprint!("Password: ");
        rpassword::read_password()
    })
}

fn read_password_with(
    is_terminal: bool,
    read: impl FnOnce() -> io::Result<String>,
) -> Result<SecretString, FutureGuideError> {
    if !is_terminal {
        return Err(FutureGuideError::validation(
            "no password given and stdin is not a terminal; pass --password",
        ));
    }
    let password = read().map_err(|e| FutureGuideError::Unknown {
        message: format!("failed to read password: {e}"),
        source: Some(Box::new(e)),
    })?;
    if password.is_empty() {
        return Err(FutureGuideError::validation("Password is required"));
    }
    Ok(SecretString::from(password))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_session_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::open(dir.path().join("session.json")).unwrap();
        let err = require_session(&store).unwrap_err();
        assert!(matches!(err, FutureGuideError::Unauthorized { .. }));
    }

    #[test]
    fn password_prompt_needs_a_terminal() {
        let err = read_password_with(false, || panic!("must not read without a terminal"))
            .unwrap_err();
        assert!(matches!(err, FutureGuideError::Validation { .. }));
        assert!(err.to_string().contains("--password"));
    }

    #[test]
    fn empty_password_is_rejected() {
        let err = read_password_with(true, || Ok(String::new())).unwrap_err();
        assert_eq!(err.to_string(), "Password is required");
    }

    #[test]
    fn read_failure_is_reported() {
        let err = read_password_with(true, || {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"))
        })
        .unwrap_err();
        assert!(err.to_string().contains("failed to read password"));
    }

    #[test]
    fn typed_password_is_wrapped() {
        use secrecy::ExposeSecret;

        let password = read_password_with(true, || Ok("hunter2".to_string())).unwrap();
        assert_eq!(password.expose_secret(), "hunter2");
    }
}
