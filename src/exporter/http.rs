use super::*;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;

use std::time::Duration;

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutMetricData<'a> {
    namespace: &'a str,
    metric_data: &'a [MetricDatum],
}

/// Posts each chunk as a JSON document to a metrics endpoint.
pub struct HttpSink {
    client: Client,
    endpoint: Url,
}

impl HttpSink {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint).map_err(|e| Error::Endpoint(e.to_string()))?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, endpoint })
    }
}

fn encode(namespace: &str, entries: &[MetricDatum]) -> Result<Vec<u8>, Error> {
    Ok(serde_json::to_vec(&PutMetricData {
        namespace,
        metric_data: entries,
    })?)
}

impl MetricsSink for HttpSink {
    fn submit(&mut self, namespace: &str, entries: &[MetricDatum]) -> Result<(), Error> {
        let body = encode(namespace, entries)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_endpoint() {
        assert!(matches!(
            HttpSink::new("not a url", Duration::from_secs(1)),
            Err(Error::Endpoint(_))
        ));
    }

    #[test]
    fn https_endpoints_are_supported() {
        // nothing listens on port 1, so the request fails while connecting
        let mut sink = HttpSink::new("https://127.0.0.1:1/", Duration::from_secs(1)).unwrap();

        match sink.submit("ns", &[]) {
            Err(Error::Http(e)) => {
                assert!(e.is_connect(), "expected a connect error, got {e:?}");

                let mut source: Option<&dyn std::error::Error> = Some(&e);
                while let Some(err) = source {
                    assert!(!err.to_string().contains("scheme is not http"));
                    source = err.source();
                }
            }
            other => panic!("expected a connect error, got {other:?}"),
        }
    }

    #[test]
    fn request_body() {
        let entries = vec![MetricDatum {
            metric_name: "tx_bytes_rate".into(),
            value: 10.0,
            unit: Unit::BytesPerSecond,
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            dimensions: vec![],
        }];

        let body: serde_json::Value =
            serde_json::from_slice(&encode("ParallelCluster/Network", &entries).unwrap()).unwrap();

        assert_eq!(body["Namespace"], "ParallelCluster/Network");
        assert_eq!(body["MetricData"][0]["MetricName"], "tx_bytes_rate");
        assert_eq!(body["MetricData"][0]["Unit"], "Bytes/Second");
        assert_eq!(body["MetricData"].as_array().unwrap().len(), 1);
    }
}
