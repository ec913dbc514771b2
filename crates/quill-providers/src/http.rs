use quill_models::truncate_for_detail;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

use crate::error::{ProviderError, ProviderResult};

/// Longest provider body kept in an error message.
const MAX_ERROR_BODY_BYTES: usize = 2048;

pub(crate) fn build_client(timeout: Duration) -> ProviderResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ProviderError::Network)
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

pub(crate) fn authorize(request: RequestBuilder, api_key: Option<&str>) -> RequestBuilder {
    match api_key {
        Some(key) => request.bearer_auth(key),
        None => request,
    }
}

/// Read a successful response body as text, or turn a non-2xx answer into
/// `RequestFailed` with a bounded copy of the body.
pub(crate) async fn read_body(response: Response) -> ProviderResult<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ProviderError::RequestFailed {
            status: status.as_u16(),
            body: truncate_for_detail(&body, MAX_ERROR_BODY_BYTES),
        });
    }
    Ok(body)
}
