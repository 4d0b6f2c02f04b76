use std::future::Future;
use std::process::Stdio;
use std::time::Duration;

use log::debug;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ScanConfig;
use crate::devices::DeviceSet;
use crate::error::SourceError;

/// Where snapshots of the network come from.
pub trait SnapshotSource {
    fn capture(&self) -> impl Future<Output = Result<DeviceSet, SourceError>> + Send;

    fn local_ip(&self) -> impl Future<Output = Result<String, SourceError>> + Send;

    fn local_mac(&self) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Reads the neighbor table by running the platform's listing command.
#[derive(Debug, Clone)]
pub struct CommandSource {
    table_command: Vec<String>,
    ip_command: Vec<String>,
    command_timeout: Duration,
}

impl CommandSource {
    pub fn new(config: &ScanConfig) -> Self {
        CommandSource {
            table_command: config.table_command(),
            ip_command: config.ip_command(),
            command_timeout: config.command_timeout(),
        }
    }
}

impl SnapshotSource for CommandSource {
    async fn capture(&self) -> Result<DeviceSet, SourceError> {
        let output = run_command(&self.table_command, self.command_timeout).await?;
        let devices = parse_table(&output);
        if devices.is_empty() {
            debug!("Neighbor table lists no devices");
        } else {
            debug!("Neighbor table lists {} devices", devices.len());
        }
        Ok(devices)
    }

    async fn local_ip(&self) -> Result<String, SourceError> {
        let output = run_command(&self.ip_command, self.command_timeout).await?;
        output
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| SourceError::Unavailable("local address lookup printed nothing".into()))
    }

    async fn local_mac(&self) -> Result<String, SourceError> {
        match mac_address::get_mac_address() {
            Ok(Some(mac)) => Ok(mac.to_string().to_lowercase()),
            Ok(None) => Err(SourceError::Unavailable(
                "no interface with a hardware address".into(),
            )),
            Err(err) => Err(SourceError::Unavailable(format!(
                "hardware address lookup failed: {err}"
            ))),
        }
    }
}

async fn run_command(argv: &[String], limit: Duration) -> Result<String, SourceError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| SourceError::Unavailable("empty command".into()))?;
    let display = argv.join(" ");

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output();

    let output = match timeout(limit, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return Err(SourceError::Unavailable(format!(
                "unable to run `{display}`: {err}"
            )));
        }
        Err(_) => {
            return Err(SourceError::TimedOut {
                command: display,
                timeout: limit,
            });
        }
    };

    if !output.status.success() {
        return Err(SourceError::Unavailable(format!(
            "`{display}` exited with {}",
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Takes the first hardware address on each line; lines without one are ignored.
fn parse_table(output: &str) -> DeviceSet {
    output
        .lines()
        .filter_map(|line| {
            line.split_whitespace()
                .map(|token| token.trim_matches(|c| matches!(c, '(' | ')' | '[' | ']')))
                .find(|token| is_hardware_address(token))
        })
        .collect()
}

fn is_hardware_address(token: &str) -> bool {
    let separator = if token.contains(':') { ':' } else { '-' };
    let groups: Vec<&str> = token.split(separator).collect();
    groups.len() == 6
        && groups.iter().all(|group| {
            (1..=2).contains(&group.len()) && group.chars().all(|c| c.is_ascii_hexdigit())
        })
}
