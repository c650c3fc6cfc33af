//! Subcommand implementations.

pub mod account;
pub mod cart;
pub mod feedback;
pub mod menu;
pub mod rewards;

use eathub_client::storage::StorageError;
use eathub_core::Price;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Client(#[from] eathub_client::Error),

    #[error("Cannot open local storage: {0}")]
    Storage(#[from] StorageError),

    /// The command line itself was wrong.
    #[error("{0}")]
    Usage(String),
}

/// Tell the user what went wrong and whether trying again could help.
#[allow(clippy::print_stderr)]
pub fn report(error: &CliError) {
    match error {
        CliError::Client(e) if e.is_retryable() => {
            eprintln!("error: {e}. EatHub is unreachable right now, try again later.");
        }
        CliError::Client(eathub_client::Error::Api(api)) if api.is_auth_error() => {
            eprintln!("error: {api}. Sign in with `eathub login` and try again.");
        }
        other => eprintln!("error: {other}"),
    }
}

/// Parse a decimal amount such as `12.50`.
pub fn parse_price(raw: &str) -> Result<Price, CliError> {
    let amount: Decimal = raw
        .trim()
        .parse()
        .map_err(|e| CliError::Usage(format!("Invalid amount '{raw}': {e}")))?;
    Price::new(amount).map_err(|e| CliError::Usage(format!("Invalid amount '{raw}': {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(" 34.48 ").unwrap(), Price::from_cents(3448));
        assert!(matches!(parse_price("-1"), Err(CliError::Usage(_))));
        assert!(matches!(parse_price("abc"), Err(CliError::Usage(_))));
    }
}
