//! Shared helpers for command handlers.

use std::io::{self, BufRead, IsTerminal};

use secrecy::SecretString;

use gatehouse_core::{EntityId, Gatehouse};

use crate::error::CliError;

/// Resolve a username or id to the account's id.
pub fn resolve_user_id(gate: &Gatehouse, identifier: &str) -> Result<EntityId, CliError> {
    if let Ok(id) = identifier.parse::<EntityId>() {
        return Ok(id);
    }
    Ok(gate.users().find(identifier)?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool, action: &str) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(io::Error::other(e)))
}

/// Read a new password, either the first line of stdin or twice from the
/// terminal. Returns `(password, confirmation)`.
pub fn read_password(from_stdin: bool) -> Result<(SecretString, SecretString), CliError> {
    if from_stdin {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let password = line.trim_end_matches(['\r', '\n']).to_owned();
        return Ok((
            SecretString::from(password.clone()),
            SecretString::from(password),
        ));
    }
    let first = rpassword::prompt_password("Password: ")?;
    let second = rpassword::prompt_password("Confirm password: ")?;
    Ok((SecretString::from(first), SecretString::from(second)))
}

/// Empty strings clear optional fields.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_dropped() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some("x".into())).as_deref(), Some("x"));
        assert_eq!(non_empty(None), None);
    }
}
