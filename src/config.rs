use crate::db::postgres::ConnectionSettings;
use crate::db::probe::RetryPolicy;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variables recognised by [`Config::load`], lowercased.
const ENV_KEYS: &[&str] = &[
    "db_host",
    "db_port",
    "db_name",
    "db_user",
    "db_password",
    "db_maintenance_name",
    "listen_addr",
    "loglevel",
    "probe_max_attempts",
    "probe_delay_ms",
    "probe_max_delay_ms",
    "connect_timeout_ms",
    "seed_text",
];

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_user: String,
    pub db_password: String,
    /// Database used for availability probes and `CREATE DATABASE`.
    pub db_maintenance_name: String,
    pub listen_addr: String,
    pub loglevel: String,
    pub probe_max_attempts: usize,
    pub probe_delay_ms: u64,
    pub probe_max_delay_ms: u64,
    pub connect_timeout_ms: u64,
    pub seed_text: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "db".to_string(),
            db_port: 5432,
            db_name: "notesdb".to_string(),
            db_user: "postgres".to_string(),
            db_password: "password".to_string(),
            db_maintenance_name: "postgres".to_string(),
            listen_addr: "0.0.0.0:5000".to_string(),
            loglevel: "info".to_string(),
            probe_max_attempts: 30,
            probe_delay_ms: 2_000,
            probe_max_delay_ms: 2_000,
            connect_timeout_ms: 2_000,
            seed_text: "Première note de test!".to_string(),
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(ENV_KEYS))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            maintenance_database: self.db_maintenance_name.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.probe_max_attempts,
            Duration::from_millis(self.probe_delay_ms),
            Duration::from_millis(self.probe_max_delay_ms),
            Duration::from_millis(self.connect_timeout_ms),
        )
    }
}
