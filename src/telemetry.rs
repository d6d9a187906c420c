//! Telemetry logic.
//! Support logging and metrics.
use metrics::{Unit, counter};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::prelude::*;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (defaults to
/// `default_level`).
pub fn setup_logging(default_level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
}

/// Describe account metrics to whatever recorder is installed.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "accounts_created_total",
        Unit::Count,
        "Accounts created, labelled by role."
    );
    metrics::describe_counter!(
        "authentications_total",
        Unit::Count,
        "Authentication attempts, labelled by outcome."
    );
}

/// Role of a freshly created account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Superuser,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Superuser => "superuser",
        }
    }
}

/// Record an account creation.
pub fn record_account_created(account_id: i64, role: Role) {
    tracing::info!(account_id, role = role.as_str(), "account created");
    counter!("accounts_created_total", "role" => role.as_str()).increment(1);
}

/// Record the outcome of an authentication attempt.
pub fn record_authentication(outcome: &'static str) {
    tracing::debug!(outcome, "authentication attempt");
    counter!("authentications_total", "outcome" => outcome).increment(1);
}
