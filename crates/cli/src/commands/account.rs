//! Sign-in and session commands.

use eathub_client::EatHub;
use eathub_core::{Email, SignupRequest};

use super::CliError;

/// `eathub login`
#[allow(clippy::print_stdout)]
pub async fn login(hub: &EatHub, email: &str, password: &str, admin: bool) -> Result<(), CliError> {
    let principal = if admin {
        hub.admin().login(email, password).await?
    } else {
        hub.auth().login(email, password).await?
    };
    println!("Signed in as {} ({})", principal.display_name(), principal.role);
    Ok(())
}

/// `eathub signup`
#[allow(clippy::print_stdout)]
pub async fn signup(
    hub: &EatHub,
    name: String,
    email: &str,
    password: String,
    phone: Option<String>,
) -> Result<(), CliError> {
    let request = SignupRequest {
        name,
        email: Email::parse(email).map_err(eathub_client::Error::from)?,
        password,
        phone,
    };
    let principal = hub.auth().signup(&request).await?;
    println!("Welcome, {}!", principal.display_name());
    Ok(())
}

/// `eathub logout`
#[allow(clippy::print_stdout)]
pub fn logout(hub: &EatHub) {
    hub.logout();
    println!("Signed out.");
}

/// `eathub whoami`
#[allow(clippy::print_stdout)]
pub async fn whoami(hub: &EatHub) -> Result<(), CliError> {
    let valid = if hub.session().is_admin() {
        hub.session().verify_token(|_| hub.admin().verify()).await
    } else {
        hub.auth().restore_session().await
    };
    if !valid {
        println!("Not signed in.");
        return Ok(());
    }
    if let Some(principal) = hub.session().principal() {
        println!("{} ({})", principal.display_name(), principal.role);
        if let Some(email) = &principal.email {
            println!("  {email}");
        }
    }
    Ok(())
}
