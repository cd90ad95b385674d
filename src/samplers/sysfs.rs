use super::*;

use std::path::Path;

use walkdir::{DirEntry, WalkDir};

/// Reads counters from `<root>/<interface>/ports/<port>/counters/<file>`.
pub struct Sysfs {
    root: PathBuf,
    port: u32,
}

impl Sysfs {
    pub fn new(root: impl Into<PathBuf>, port: u32) -> Self {
        Self {
            root: root.into(),
            port,
        }
    }

    fn path(&self, interface: &str, counter: Counter) -> PathBuf {
        self.root
            .join(interface)
            .join("ports")
            .join(self.port.to_string())
            .join("counters")
            .join(counter.file())
    }
}

impl CounterSource for Sysfs {
    fn read_counter(&self, interface: &str, counter: Counter) -> Result<u64, Error> {
        let path = self.path(interface, counter);

        let raw = std::fs::read_to_string(&path).map_err(|source| Error::Unreadable {
            counter,
            path: path.clone(),
            source,
        })?;

        let raw = raw.trim();

        raw.parse().map_err(|_| Error::Unparseable {
            counter,
            path,
            value: raw.to_string(),
        })
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Returns the names of the devices found under `root`, sorted. A missing
/// root yields an empty list.
pub fn network_interfaces(root: &Path) -> Vec<String> {
    let mut interfaces = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
        .into_iter();

    for entry in walker.filter_entry(|e| !is_hidden(e)) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_) => continue,
        };

        if entry.file_type().is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                interfaces.push(name.to_string());
            }
        }
    }

    interfaces.sort();
    interfaces
}

/// The configured interface list when present, otherwise whatever is
/// discovered under `root`.
pub fn monitored_interfaces(configured: Option<&[String]>, root: &Path) -> Vec<String> {
    match configured {
        Some(interfaces) => interfaces.to_vec(),
        None => network_interfaces(root),
    }
}
