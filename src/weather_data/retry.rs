use crate::weather_data::error::WeatherDataError;
use log::warn;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::{
    default_on_request_failure, default_on_request_success, Retryable, RetryTransientMiddleware,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Upper bound of the backoff, as a multiple of the initial delay.
const MAX_BACKOFF_FACTOR: u32 = 10;

/// How often and how patiently transient upstream failures are retried.
///
/// Only transient failures are retried: connection errors, timeouts, `408`, `429` and `5xx`.
/// Client errors and undecodable bodies fail on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total requests per call, the first one included.
    pub max_attempts: u32,
    /// Initial backoff. Later retries back off exponentially from it.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_attempts.saturating_sub(1)
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::builder()
            .retry_bounds(self.delay, self.delay * MAX_BACKOFF_FACTOR)
            .build_with_max_retries(self.max_retries())
    }
}

/// Wraps a reqwest client in the transient-retry middleware.
pub(crate) fn build_client(
    builder: reqwest::ClientBuilder,
    policy: &RetryPolicy,
) -> Result<ClientWithMiddleware, WeatherDataError> {
    let client = builder.build().map_err(WeatherDataError::ClientBuild)?;
    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(policy.backoff()))
        .build())
}

/// GETs `url` and decodes the JSON body. Any failure is wrapped in
/// [`WeatherDataError::UpstreamFetch`] naming `endpoint` and the number of requests made.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &ClientWithMiddleware,
    policy: &RetryPolicy,
    endpoint: &str,
    url: &str,
    query: &[(&str, &str)],
    bearer: Option<&str>,
) -> Result<T, WeatherDataError> {
    let give_up = |retried: bool, err: WeatherDataError| {
        let attempts = if retried { policy.max_attempts } else { 1 };
        warn!(
            "Giving up on {} after {} attempt(s): {}",
            endpoint, attempts, err
        );
        WeatherDataError::UpstreamFetch {
            endpoint: endpoint.to_string(),
            attempts,
            source: Box::new(err),
        }
    };

    let mut request = client.get(url).query(query);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            let transient = match &e {
                reqwest_middleware::Error::Reqwest(_) => is_transient(default_on_request_failure(&e)),
                reqwest_middleware::Error::Middleware(_) => false,
            };
            return Err(give_up(transient, WeatherDataError::NetworkRequest(url.to_string(), e)));
        }
    };

    let transient_status = is_transient(default_on_request_success(&response));
    let response = match response.error_for_status() {
        Ok(resp) => resp,
        Err(e) => {
            let err = match e.status() {
                Some(status) => WeatherDataError::HttpStatus {
                    url: url.to_string(),
                    status,
                    source: e,
                },
                None => WeatherDataError::NetworkRequest(url.to_string(), e.into()),
            };
            return Err(give_up(transient_status, err));
        }
    };

    let body = response
        .text()
        .await
        .map_err(|e| give_up(false, WeatherDataError::NetworkRequest(url.to_string(), e.into())))?;
    serde_json::from_str(&body).map_err(|e| {
        give_up(
            false,
            WeatherDataError::ResponseParse {
                url: url.to_string(),
                source: e,
            },
        )
    })
}

fn is_transient(retryable: Option<Retryable>) -> bool {
    matches!(retryable, Some(Retryable::Transient))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[derive(Debug, Deserialize)]
    struct Payload {
        value: f64,
    }

    /// Serves `responses` in order (repeating the last one) and counts the requests.
    async fn serve(responses: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicU32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/reading", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicU32::new(0));
        let counter = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
                let (status, body) = responses[n.min(responses.len() - 1)];
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        (url, requests)
    }

    fn upstream_status(err: &WeatherDataError) -> Option<StatusCode> {
        match err {
            WeatherDataError::HttpStatus { status, .. } => Some(*status),
            WeatherDataError::UpstreamFetch { source, .. } => upstream_status(source),
            _ => None,
        }
    }

    fn client(policy: &RetryPolicy) -> ClientWithMiddleware {
        build_client(reqwest::Client::builder().no_proxy(), policy).unwrap()
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let (url, requests) = serve(vec![
            ("503 Service Unavailable", "{}"),
            ("502 Bad Gateway", "{}"),
            ("200 OK", r#"{"value": 31.2}"#),
        ])
        .await;
        let policy = policy(3);
        let payload: Payload = get_json(&client(&policy), &policy, "air-temperature", &url, &[], None)
            .await
            .unwrap();
        assert_eq!(payload.value, 31.2);
        assert_eq!(requests.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (url, requests) = serve(vec![("503 Service Unavailable", "{}")]).await;
        let policy = policy(2);
        let err = get_json::<Payload>(&client(&policy), &policy, "wind-speed", &url, &[], None)
            .await
            .unwrap_err();
        assert_eq!(requests.load(Ordering::SeqCst), 2);
        assert!(matches!(
            err,
            WeatherDataError::UpstreamFetch { ref endpoint, attempts: 2, .. } if endpoint == "wind-speed"
        ));
        assert_eq!(upstream_status(&err), Some(StatusCode::SERVICE_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, requests) = serve(vec![("404 Not Found", "{}")]).await;
        let policy = policy(3);
        let err = get_json::<Payload>(&client(&policy), &policy, "onemap-search", &url, &[], None)
            .await
            .unwrap_err();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert!(matches!(err, WeatherDataError::UpstreamFetch { attempts: 1, .. }));
        assert_eq!(upstream_status(&err), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_malformed_body_is_not_retried() {
        let (url, requests) = serve(vec![("200 OK", "not json")]).await;
        let policy = policy(3);
        let err = get_json::<Payload>(&client(&policy), &policy, "relative-humidity", &url, &[], None)
            .await
            .unwrap_err();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        match err {
            WeatherDataError::UpstreamFetch { attempts, source, .. } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*source, WeatherDataError::ResponseParse { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.max_retries(), 0);
    }
}
