use std::time::Duration;

use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::ServiceError;

const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";
const AMZ_TARGET_HEADER: &str = "X-Amz-Target";

pub fn http_client(timeout_secs: u64) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
        .map_err(ServiceError::from)
}

/// Appends percent-encoded path segments to a base endpoint.
pub(crate) fn endpoint_url(endpoint: &str, segments: &[&str]) -> Result<Url, ServiceError> {
    let mut url = Url::parse(endpoint)
        .map_err(|error| ServiceError::Transport(format!("invalid endpoint `{endpoint}`: {error}")))?;
    url.path_segments_mut()
        .map_err(|_| ServiceError::Transport(format!("endpoint `{endpoint}` cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) async fn post_json<B, R>(client: &Client, url: Url, body: &B) -> Result<R, ServiceError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client.post(url).json(body).send().await?;
    decode(response).await
}

/// Calls an operation exposed through the `X-Amz-Target` JSON protocol.
pub(crate) async fn post_target<B, R>(
    client: &Client,
    endpoint: &str,
    target: &str,
    body: &B,
) -> Result<R, ServiceError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let payload = serde_json::to_vec(body)?;
    let response = client
        .post(endpoint)
        .header(CONTENT_TYPE, AMZ_JSON_CONTENT_TYPE)
        .header(AMZ_TARGET_HEADER, target)
        .body(payload)
        .send()
        .await?;
    decode(response).await
}

async fn decode<R>(response: reqwest::Response) -> Result<R, ServiceError>
where
    R: DeserializeOwned,
{
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        debug!(
            event_name = "cloud.request.rejected",
            correlation_id = "cloud",
            status = status.as_u16(),
            "service answered with an error status"
        );
        return Err(ServiceError::Status { status: status.as_u16(), body: text });
    }

    let raw = if text.trim().is_empty() { "{}" } else { text.as_str() };
    serde_json::from_str(raw).map_err(ServiceError::from)
}

#[cfg(test)]
mod tests {
    use super::endpoint_url;

    #[test]
    fn endpoint_url_encodes_segments() {
        let url = endpoint_url("https://runtime.example.com/", &["sessions", "a b/c"])
            .expect("url builds");

        assert_eq!(url.as_str(), "https://runtime.example.com/sessions/a%20b%2Fc");
    }

    #[test]
    fn endpoint_url_rejects_garbage() {
        assert!(endpoint_url("not a url", &["x"]).is_err());
    }
}
