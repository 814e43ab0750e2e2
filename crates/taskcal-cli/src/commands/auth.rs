use clap::Subcommand;
use taskcal_core::credentials;

use crate::context::CliResult;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a Google Calendar access token in the OS keyring
    SetToken {
        /// OAuth access token with calendar scope
        token: String,
    },
    /// Remove the stored token
    Clear,
    /// Report where the token would be taken from
    Status,
}

pub fn run(action: AuthAction) -> CliResult {
    match action {
        AuthAction::SetToken { token } => {
            credentials::store_access_token(&token)?;
            println!("token stored");
        }
        AuthAction::Clear => {
            credentials::clear_access_token()?;
            println!("token cleared");
        }
        AuthAction::Status => {
            if std::env::var(credentials::TOKEN_ENV).is_ok_and(|t| !t.trim().is_empty()) {
                println!("using {}", credentials::TOKEN_ENV);
            } else if credentials::access_token()?.is_some() {
                println!("using keyring");
            } else {
                println!("no token configured");
            }
        }
    }
    Ok(())
}
