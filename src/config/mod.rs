use serde::Deserialize;

use std::path::Path;
use std::time::Duration;

mod export;
mod general;
mod log;
mod sysfs;

pub use export::SinkKind;

use export::Export;
use general::General;
use log::Log;
use sysfs::Sysfs;

fn interval() -> String {
    "60s".into()
}

fn timeout() -> String {
    "5s".into()
}

fn namespace() -> String {
    "ParallelCluster/Network".into()
}

fn batch_cycles() -> usize {
    5
}

fn chunk_size() -> usize {
    20
}

fn root() -> String {
    "/sys/class/infiniband".into()
}

fn port() -> u32 {
    1
}

/// Parses a humantime duration and rejects zero.
fn parse_duration(name: &str, value: &str) -> Result<Duration, String> {
    let duration: Duration = value
        .parse::<humantime::Duration>()
        .map_err(|e| format!("{name} couldn't be parsed: {e}"))?
        .into();

    if duration.is_zero() {
        return Err(format!("{name} must be greater than zero"));
    }

    Ok(duration)
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    general: General,
    #[serde(default)]
    sysfs: Sysfs,
    #[serde(default)]
    export: Export,
    #[serde(default)]
    log: Log,
}

impl Config {
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("unable to open config file: {e}"))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Config =
            toml::from_str(content).map_err(|e| format!("failed to parse config file: {e}"))?;

        config.check()?;

        Ok(config)
    }

    pub fn check(&self) -> Result<(), String> {
        self.general.check()?;
        self.sysfs.check()?;
        self.export.check()
    }

    pub fn general(&self) -> &General {
        &self.general
    }

    pub fn sysfs(&self) -> &Sysfs {
        &self.sysfs
    }

    pub fn export(&self) -> &Export {
        &self.export
    }

    pub fn log(&self) -> &Log {
        &self.log
    }
}
