//! Feedback command.

use eathub_client::EatHub;
use eathub_core::{Email, NewFeedback};

use super::CliError;

/// `eathub feedback`
#[allow(clippy::print_stdout)]
pub async fn submit(
    hub: &EatHub,
    rating: u8,
    message: String,
    name: Option<String>,
    email: Option<&str>,
) -> Result<(), CliError> {
    let email = email
        .map(Email::parse)
        .transpose()
        .map_err(eathub_client::Error::from)?;
    let feedback = NewFeedback {
        name,
        email,
        rating,
        message,
    };
    hub.feedback().submit_feedback(&feedback).await?;
    println!("Thanks for your feedback!");
    Ok(())
}
