use std::time::Duration;

use async_trait::async_trait;
use esg_maturity::survey::{EmailVerdict, EmailVerifier};
use serde::Deserialize;
use tracing::warn;

/// Deliverability statuses the reputation service reports for mailboxes we accept.
const ACCEPTED_STATUSES: [&str; 2] = ["deliverable", "risky"];

/// Email reputation lookup against an AbstractAPI-compatible endpoint.
///
/// Transport failures, non-success responses, and unparseable bodies all reject the
/// address; the survey never proceeds on an unverified email.
pub(crate) struct AbstractApiEmailVerifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AbstractApiEmailVerifier {
    pub(crate) fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    async fn lookup(&self, email: &str) -> Result<ReputationResponse, reqwest::Error> {
        self.client
            .get(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str()), ("email", email)])
            .send()
            .await?
            .error_for_status()?
            .json::<ReputationResponse>()
            .await
    }
}

#[async_trait]
impl EmailVerifier for AbstractApiEmailVerifier {
    async fn verify(&self, email: &str) -> EmailVerdict {
        match self.lookup(email).await {
            Ok(response) => response.verdict(),
            Err(err) => {
                warn!(error = %err, "email reputation lookup failed");
                EmailVerdict::rejected(format!("email verification unavailable: {err}"))
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReputationResponse {
    #[serde(default)]
    email_deliverability: Deliverability,
}

#[derive(Debug, Default, Deserialize)]
struct Deliverability {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_format_valid: bool,
}

impl ReputationResponse {
    fn verdict(&self) -> EmailVerdict {
        let deliverability = &self.email_deliverability;
        if !deliverability.is_format_valid {
            return EmailVerdict::rejected("address format is invalid");
        }

        match deliverability.status.as_deref() {
            Some(status) if ACCEPTED_STATUSES.contains(&status) => EmailVerdict::Deliverable,
            Some(status) => EmailVerdict::rejected(format!("mailbox reported as {status}")),
            None => EmailVerdict::rejected("deliverability status missing"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ReputationResponse {
        serde_json::from_str(body).expect("response parses")
    }

    #[test]
    fn deliverable_and_risky_mailboxes_pass() {
        for status in ["deliverable", "risky"] {
            let body = format!(
                r#"{{"email_address":"ops@example.com","email_deliverability":{{"status":"{status}","is_format_valid":true,"is_smtp_valid":true}}}}"#
            );
            assert_eq!(parse(&body).verdict(), EmailVerdict::Deliverable);
        }
    }

    #[test]
    fn undeliverable_mailbox_is_rejected() {
        let response = parse(
            r#"{"email_deliverability":{"status":"undeliverable","is_format_valid":true}}"#,
        );
        let verdict = response.verdict();
        assert!(!verdict.is_valid());
        assert_eq!(
            verdict,
            EmailVerdict::rejected("mailbox reported as undeliverable")
        );
    }

    #[test]
    fn invalid_format_wins_over_status() {
        let response = parse(
            r#"{"email_deliverability":{"status":"deliverable","is_format_valid":false}}"#,
        );
        assert!(!response.verdict().is_valid());
    }

    #[test]
    fn missing_deliverability_block_fails_closed() {
        let response = parse(r#"{"error":{"message":"quota exceeded"}}"#);
        assert!(!response.verdict().is_valid());
    }

    #[tokio::test]
    async fn unreachable_endpoint_rejects_address() {
        let verifier = AbstractApiEmailVerifier::new(
            "test-key",
            "http://127.0.0.1:9/v1/",
            Duration::from_millis(200),
        )
        .expect("client builds");

        let verdict = verifier.verify("ops@example.com").await;
        assert!(!verdict.is_valid());
    }
}
