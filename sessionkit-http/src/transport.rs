//! Shared JSON POST helper.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sessionkit::error::TransportError;
use url::Url;

/// Builds a client with `timeout`, unless one is supplied.
pub(crate) fn client_or_default(
    client: Option<Client>,
    timeout: Duration,
) -> Result<Client, TransportError> {
    match client {
        Some(client) => Ok(client),
        None => Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportError::Network(format!("Cannot build HTTP client: {e}"))),
    }
}

/// POSTs `payload` as JSON and decodes a `200 OK` body as `R`.
///
/// Any other status yields [`TransportError::Http`] carrying the body.
pub(crate) async fn post_json<T, R>(
    client: &Client,
    url: Url,
    headers: HeaderMap,
    payload: &T,
) -> Result<R, TransportError>
where
    T: Serialize + Sync + ?Sized,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .headers(headers)
        .json(payload)
        .send()
        .await
        .map_err(|e| TransportError::Network(e.to_string()))?;

    let status = response.status();
    let result = if status == StatusCode::OK {
        response
            .json::<R>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Http {
            status: status.as_u16(),
            body,
        })
    };

    #[cfg(feature = "telemetry")]
    if let Err(err) = &result {
        tracing::warn!(error = %err, "HTTP request failed");
    }

    result
}
