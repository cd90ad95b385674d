use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Write chunks to the log instead of a remote endpoint.
    #[default]
    Log,
    /// POST chunks as JSON to `endpoint`.
    Http,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Export {
    #[serde(default)]
    sink: SinkKind,

    #[serde(default)]
    endpoint: Option<String>,

    #[serde(default = "namespace")]
    namespace: String,

    // the flush threshold is this many sampling cycles worth of records
    #[serde(default = "batch_cycles")]
    batch_cycles: usize,

    // the remote API accepts at most this many entries per call
    #[serde(default = "chunk_size")]
    chunk_size: usize,

    #[serde(default = "timeout")]
    timeout: String,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            endpoint: None,
            namespace: namespace(),
            batch_cycles: batch_cycles(),
            chunk_size: chunk_size(),
            timeout: timeout(),
        }
    }
}

impl Export {
    pub fn check(&self) -> Result<(), String> {
        parse_duration("export timeout", &self.timeout)?;

        if self.batch_cycles == 0 {
            return Err("export batch_cycles must be at least 1".into());
        }

        if !(1..=1000).contains(&self.chunk_size) {
            return Err("export chunk_size must be in the range 1..=1000".into());
        }

        if self.namespace.is_empty() {
            return Err("export namespace must not be empty".into());
        }

        if self.sink == SinkKind::Http && self.endpoint.is_none() {
            return Err("the http sink requires an export endpoint".into());
        }

        Ok(())
    }

    pub fn sink(&self) -> SinkKind {
        self.sink
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn batch_cycles(&self) -> usize {
        self.batch_cycles
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn timeout(&self) -> Duration {
        parse_duration("export timeout", &self.timeout).unwrap_or(Duration::from_secs(5))
    }
}
