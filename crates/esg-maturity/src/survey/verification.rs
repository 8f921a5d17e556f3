use async_trait::async_trait;
use serde::Serialize;

/// Outcome of an external deliverability check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum EmailVerdict {
    Deliverable,
    Rejected { reason: String },
}

impl EmailVerdict {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Deliverable)
    }
}

/// Boundary to the email reputation service.
///
/// Implementations must fail closed: transport errors, timeouts, and malformed replies
/// are reported as [`EmailVerdict::Rejected`] rather than surfaced as errors.
#[async_trait]
pub trait EmailVerifier: Send + Sync {
    async fn verify(&self, email: &str) -> EmailVerdict;
}

/// Offline verifier that only checks the address shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxEmailVerifier;

impl SyntaxEmailVerifier {
    pub fn check(email: &str) -> EmailVerdict {
        let email = email.trim();
        if email.is_empty() {
            return EmailVerdict::rejected("email is empty");
        }
        if email.chars().any(char::is_whitespace) {
            return EmailVerdict::rejected("email contains whitespace");
        }

        let Some((local, domain)) = email.split_once('@') else {
            return EmailVerdict::rejected("email is missing '@'");
        };
        if local.is_empty() || domain.contains('@') {
            return EmailVerdict::rejected("email local part is malformed");
        }

        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
            return EmailVerdict::rejected("email domain is malformed");
        }

        EmailVerdict::Deliverable
    }
}

#[async_trait]
impl EmailVerifier for SyntaxEmailVerifier {
    async fn verify(&self, email: &str) -> EmailVerdict {
        Self::check(email)
    }
}
