use std::env;

use anyhow::Context;

/// `eventlogger` process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub nats_cluster_id: String,
    pub nats_url: String,
    /// Stable consumer id; part of the durable name.
    pub nats_client_id: String,
    /// Channels to log.
    pub subscribes: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let subscribes = parse_channels(
            &env::var("SUBSCRIBES").unwrap_or_else(|_| "employees".to_string()),
        );
        anyhow::ensure!(!subscribes.is_empty(), "SUBSCRIBES names no channel");

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            nats_cluster_id: env::var("NATS_CLUSTER_ID").unwrap_or_else(|_| "cell-centre".to_string()),
            nats_url: env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            nats_client_id: env::var("NATS_CLIENT_ID").unwrap_or_else(|_| "eventlogger".to_string()),
            subscribes,
        })
    }
}

/// Comma-separated channel list; blanks and duplicates dropped, order kept.
pub fn parse_channels(raw: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for channel in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !channels.iter().any(|c| c == channel) {
            channels.push(channel.to_string());
        }
    }
    channels
}
