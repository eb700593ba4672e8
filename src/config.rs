use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "mail_responder.toml";

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub account: Account,
    pub imap: Imap,
    pub smtp: Smtp,
    #[serde(default)]
    pub inference: Inference,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// How many replied-to Message-IDs to remember. Zero turns it off.
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Account {
    pub address: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Imap {
    pub host: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Smtp {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Inference {
    #[serde(default = "default_inference_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    // Accepted so existing config files keep loading; the generate call
    // doesn't send it.
    pub api_key: Option<String>,
    #[serde(default = "default_inference_timeout")]
    pub timeout_secs: u64,
}

impl Default for Inference {
    fn default() -> Self {
        Inference {
            url: default_inference_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_inference_timeout(),
        }
    }
}

impl Inference {
    /// The generate endpoint under the configured base url.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.url.trim_end_matches('/'))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn from_toml(s: &str) -> Result<Config> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }
}

fn default_poll_interval() -> u64 {
    7
}

fn default_dedup_capacity() -> usize {
    1024
}

fn default_imap_port() -> u16 {
    993
}

fn default_smtp_port() -> u16 {
    465
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn default_inference_url() -> String {
    "http://localhost:11434/".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_inference_timeout() -> u64 {
    300
}

pub fn get_config(file: &Option<String>) -> Result<Config> {
    let path = file
        .as_deref()
        .unwrap_or(DEFAULT_CONFIG_FILE);
    let s = fs::read_to_string(path).map_err(|e| Error::Config(format!("{}: {}", path, e)))?;
    Config::from_toml(&s)
}
