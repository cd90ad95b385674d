//! Resolves the identity attached to every exported entry.

use reqwest::blocking::Client;
use tracing::{debug, warn};

use std::time::Duration;

/// Used when no identity can be resolved.
pub const UNKNOWN_HOST: &str = "unknown";

const IMDS: &str = "http://169.254.169.254/latest";

const IMDS_TIMEOUT: Duration = Duration::from_secs(5);

/// Returns the configured identity, otherwise the EC2 instance id, otherwise
/// [`UNKNOWN_HOST`]. Never fails.
pub fn host_id(configured: Option<&str>) -> String {
    host_id_from(configured, IMDS)
}

/// As [`host_id`], asking the metadata service rooted at `base`.
pub fn host_id_from(configured: Option<&str>, base: &str) -> String {
    if let Some(id) = configured {
        return id.to_string();
    }

    match instance_id(base) {
        Ok(id) if !id.is_empty() => id,
        Ok(_) => {
            warn!("metadata service returned an empty instance id");
            UNKNOWN_HOST.to_string()
        }
        Err(e) => {
            warn!("unable to resolve instance id: {e}");
            UNKNOWN_HOST.to_string()
        }
    }
}

fn instance_id(base: &str) -> Result<String, reqwest::Error> {
    let client = Client::builder().timeout(IMDS_TIMEOUT).build()?;

    // IMDSv2 session token
    let token = client
        .put(format!("{base}/api/token"))
        .header("X-aws-ec2-metadata-token-ttl-seconds", "21600")
        .send()?
        .error_for_status()?
        .text()?;

    let id = client
        .get(format!("{base}/meta-data/instance-id"))
        .header("X-aws-ec2-metadata-token", token.trim())
        .send()?
        .error_for_status()?
        .text()?;

    debug!("resolved instance id from metadata service");

    Ok(id.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_identity_wins() {
        assert_eq!(host_id(Some("i-0123456789abcdef0")), "i-0123456789abcdef0");
    }

    #[test]
    fn unreachable_metadata_service_falls_back() {
        assert_eq!(host_id_from(None, "http://127.0.0.1:1/latest"), UNKNOWN_HOST);
    }

    #[test]
    fn configured_identity_skips_metadata_service() {
        assert_eq!(
            host_id_from(Some("node-7"), "http://127.0.0.1:1/latest"),
            "node-7"
        );
    }
}
