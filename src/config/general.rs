use super::*;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct General {
    // sampling period between ticks
    #[serde(default = "interval")]
    interval: String,

    // skips instance metadata lookup when set
    #[serde(default)]
    host_id: Option<String>,

    // replaces interface discovery when set
    #[serde(default)]
    interfaces: Option<Vec<String>>,
}

impl Default for General {
    fn default() -> Self {
        Self {
            interval: interval(),
            host_id: None,
            interfaces: None,
        }
    }
}

impl General {
    pub fn check(&self) -> Result<(), String> {
        parse_duration("interval", &self.interval)?;

        if let Some(ref interfaces) = self.interfaces {
            if interfaces.iter().any(|i| i.is_empty()) {
                return Err("interface names must not be empty".into());
            }
        }

        Ok(())
    }

    pub fn interval(&self) -> Duration {
        // validated by check()
        parse_duration("interval", &self.interval).unwrap_or(Duration::from_secs(60))
    }

    pub fn host_id(&self) -> Option<&str> {
        self.host_id.as_deref()
    }

    pub fn interfaces(&self) -> Option<&[String]> {
        self.interfaces.as_deref()
    }
}
