use super::*;

use std::path::PathBuf;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sysfs {
    #[serde(default = "root")]
    root: String,

    #[serde(default = "port")]
    port: u32,
}

impl Default for Sysfs {
    fn default() -> Self {
        Self {
            root: root(),
            port: port(),
        }
    }
}

impl Sysfs {
    pub fn check(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("sysfs port numbers start at 1".into());
        }

        Ok(())
    }

    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.root)
    }

    pub fn port(&self) -> u32 {
        self.port
    }
}
