use std::path::Path;
use std::time::Duration;

use anyhow::{Context as _, ensure};
use serde_derive::Deserialize;

pub const DEFAULT_MQTT_PORT: u16 = 1883;
pub const DEFAULT_PUBLISHER_ID: &str = "device_publisher";
pub const DEFAULT_TOPIC_PATH: &str = "NETWORK";
pub const DEFAULT_KEEP_ALIVE_SECONDS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;

pub const DEFAULT_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_COMMAND_TIMEOUT_SECONDS: u64 = 5;

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    pub scan: Option<ScanConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub publisher_id: Option<String>,
    pub topic_path: Option<String>,
    pub keep_alive_seconds: Option<u64>,
    pub connect_timeout_seconds: Option<u64>,
}

impl MqttConfig {
    pub fn topic_path(&self) -> &str {
        self.topic_path.as_deref().unwrap_or(DEFAULT_TOPIC_PATH)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_seconds
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        )
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ScanConfig {
    pub interval_seconds: Option<u64>,
    pub command_timeout_seconds: Option<u64>,
    /// Neighbor table listing, e.g. `["arp", "-an"]`.
    pub table_command: Option<Vec<String>>,
    /// Prints the local address as its first whitespace-separated token.
    pub ip_command: Option<Vec<String>>,
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.unwrap_or(DEFAULT_INTERVAL_SECONDS))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(
            self.command_timeout_seconds
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT_SECONDS),
        )
    }

    pub fn table_command(&self) -> Vec<String> {
        self.table_command
            .clone()
            .unwrap_or_else(|| argv(&["arp", "-an"]))
    }

    pub fn ip_command(&self) -> Vec<String> {
        self.ip_command.clone().unwrap_or_else(default_ip_command)
    }
}

#[cfg(target_os = "macos")]
fn default_ip_command() -> Vec<String> {
    argv(&["ipconfig", "getifaddr", "en0"])
}

#[cfg(not(target_os = "macos"))]
fn default_ip_command() -> Vec<String> {
    argv(&["hostname", "-I"])
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("loading config file {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::de::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn scan(&self) -> ScanConfig {
        self.scan.clone().unwrap_or_default()
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.mqtt.host.is_empty(), "mqtt.host must not be empty");
        ensure!(
            !self.mqtt.connect_timeout().is_zero(),
            "mqtt.connect_timeout_seconds must be positive"
        );

        let scan = self.scan();
        ensure!(
            !scan.interval().is_zero(),
            "scan.interval_seconds must be positive"
        );
        ensure!(
            !scan.command_timeout().is_zero(),
            "scan.command_timeout_seconds must be positive"
        );
        ensure!(
            !scan.table_command().is_empty(),
            "scan.table_command must name a program"
        );
        ensure!(
            !scan.ip_command().is_empty(),
            "scan.ip_command must name a program"
        );
        Ok(())
    }
}
