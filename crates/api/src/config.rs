use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;

use cellcentre_auth::{PasswordPolicy, RoleName};

/// `eventstore` process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_address: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,

    /// Postgres employee/role storage when set, in-memory stores otherwise.
    pub database_url: Option<String>,

    pub nats_cluster_id: String,
    pub nats_url: String,
    pub publish_timeout: Duration,

    /// Roles allowed to mutate employees.
    pub mutation_roles: Vec<RoleName>,

    pub password_policy: PasswordPolicy,

    /// Optional first administrator, created at startup when both are set.
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .parse()
        .with_context(|| format!("{key} is not valid"))
}

/// Token lifetime from a minute count; zero, negative and overflowing
/// values are rejected.
pub fn token_ttl(minutes: i64) -> anyhow::Result<chrono::Duration> {
    if minutes <= 0 {
        anyhow::bail!("TOKEN_TTL_MINUTES must be positive, got {minutes}");
    }
    chrono::Duration::try_minutes(minutes)
        .with_context(|| format!("TOKEN_TTL_MINUTES {minutes} is out of range"))
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let low = PasswordPolicy::low_cost();

        Ok(Self {
            listen_address: parsed("LISTEN_ADDRESS", "0.0.0.0:8080")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            token_ttl: token_ttl(parsed("TOKEN_TTL_MINUTES", "60")?)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),

            nats_cluster_id: var_or("NATS_CLUSTER_ID", "cell-centre"),
            nats_url: var_or("NATS_URL", "nats://localhost:4222"),
            publish_timeout: Duration::from_millis(parsed("PUBLISH_TIMEOUT_MS", "5000")?),

            mutation_roles: split_list(&var_or("MUTATION_ROLES", "admin,serviceman"))
                .into_iter()
                .map(RoleName::from)
                .collect(),

            password_policy: PasswordPolicy {
                memory_kb: parsed("ARGON_MEMORY_KB", &low.memory_kb.to_string())?,
                iterations: parsed("ARGON_ITERATIONS", &low.iterations.to_string())?,
                parallelism: parsed("ARGON_PARALLELISM", &low.parallelism.to_string())?,
            },

            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        })
    }

    /// Defaults suitable for tests: in-process everything, given secret.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            listen_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            jwt_secret: jwt_secret.into(),
            token_ttl: chrono::Duration::hours(1),
            database_url: None,
            nats_cluster_id: "cell-centre".to_string(),
            nats_url: "mem://".to_string(),
            publish_timeout: Duration::from_secs(5),
            mutation_roles: vec![RoleName::from("admin"), RoleName::from("serviceman")],
            password_policy: PasswordPolicy::low_cost(),
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_splitting_trims_and_drops_blanks() {
        assert_eq!(split_list(" admin, serviceman ,,"), vec!["admin", "serviceman"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn token_ttl_must_be_positive_and_in_range() {
        assert_eq!(token_ttl(60).unwrap(), chrono::Duration::hours(1));
        assert!(token_ttl(0).is_err());
        assert!(token_ttl(-5).is_err());
        assert!(token_ttl(i64::MAX).is_err());
    }
}
