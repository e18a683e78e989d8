// ── Password policy and hashing ──

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Rules applied to newly submitted passwords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicy {
    pub enabled: bool,
    pub min_length: usize,
    /// Reject a password equal to the username.
    pub forbid_username: bool,
    /// Require upper case, lower case, a digit and a symbol.
    pub require_complexity: bool,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_length: 8,
            forbid_username: true,
            require_complexity: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl PasswordPolicy {
    /// Policy violations for `password`, in a stable order.
    pub fn check(&self, username: &str, password: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.enabled {
            return errors;
        }

        if password.chars().count() < self.min_length {
            errors.push(format!(
                "The password must be at least {} characters long.",
                self.min_length
            ));
        }
        if self.forbid_username && !username.is_empty() && password == username {
            errors.push("The password cannot be identical to the username.".to_owned());
        }
        if self.require_complexity && !is_complex(password) {
            errors.push(
                "The password must contain upper and lower case letters, a digit and a symbol."
                    .to_owned(),
            );
        }
        errors
    }

    /// Hints shown next to the password field.
    pub fn hints(&self) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        let mut hints = vec![format!("At least {} characters.", self.min_length)];
        if self.forbid_username {
            hints.push("Must differ from the username.".to_owned());
        }
        if self.require_complexity {
            hints.push("Mix upper and lower case letters, digits and symbols.".to_owned());
        }
        hints
    }

    pub fn hash(&self, password: &str) -> Result<String, CoreError> {
        Ok(bcrypt::hash(password, self.bcrypt_cost)?)
    }
}

fn is_complex(password: &str) -> bool {
    let upper = password.chars().any(char::is_uppercase);
    let lower = password.chars().any(char::is_lowercase);
    let digit = password.chars().any(|c| c.is_ascii_digit());
    let symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    upper && lower && digit && symbol
}

/// Compare a candidate password against a stored bcrypt hash.
pub fn verify(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn fast() -> PasswordPolicy {
        PasswordPolicy {
            bcrypt_cost: 4,
            ..PasswordPolicy::default()
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let errors = fast().check("alice", "short");
        assert_eq!(errors, vec!["The password must be at least 8 characters long."]);
    }

    #[test]
    fn username_as_password_is_rejected() {
        let errors = fast().check("alice-long", "alice-long");
        assert_eq!(errors, vec!["The password cannot be identical to the username."]);
    }

    #[test]
    fn complexity_when_required() {
        let policy = PasswordPolicy {
            require_complexity: true,
            ..fast()
        };
        assert_eq!(policy.check("bob", "alllowercase").len(), 1);
        assert!(policy.check("bob", "Passw0rd!").is_empty());
    }

    #[test]
    fn disabled_policy_accepts_anything() {
        let policy = PasswordPolicy {
            enabled: false,
            ..fast()
        };
        assert!(policy.check("x", "x").is_empty());
        assert!(policy.hints().is_empty());
    }

    #[test]
    fn hash_verifies() {
        let hash = fast().hash("correct horse").unwrap();
        assert!(verify("correct horse", &hash));
        assert!(!verify("wrong", &hash));
        assert!(!verify("anything", "not-a-hash"));
    }
}
