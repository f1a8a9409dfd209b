//! [`ResourceManager`] implementation talking to Azure Resource Manager over HTTPS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode, header::HeaderMap};
use serde_json::Value;
use snafu::ResultExt;
use url::Url;

use crate::{
    client::{
        DecodeSnafu, Error, InvalidUrlSnafu, NotFoundSnafu, Operation, OperationStatus, Poll,
        PollResult, RequestSnafu, ResourceManager, TransportSnafu,
    },
    config::ProviderOptions,
    sensitive::Sensitive,
};

/// The API version of `Microsoft.AppPlatform` all requests are sent with.
pub const API_VERSION: &str = "2023-05-01-preview";

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const LOCATION: &str = "location";
const RETRY_AFTER: &str = "retry-after";

#[derive(Clone, Debug)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    token: Sensitive,
    poll_interval: Duration,
}

impl ArmClient {
    pub fn new(options: &ProviderOptions) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: options.endpoint.clone(),
            token: options.access_token.clone(),
            poll_interval: options.poll_interval,
        }
    }

    fn url(&self, id: &str) -> Result<Url, Error> {
        let mut url = self
            .endpoint
            .join(id.trim_start_matches('/'))
            .context(InvalidUrlSnafu { id })?;
        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        id: &str,
        body: Option<Value>,
    ) -> Result<Response, Error> {
        tracing::debug!(%method, id, "sending request");
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(self.token.expose());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.context(TransportSnafu { id })?;
        check_status(response, id).await
    }

    fn operation(&self, id: &str, response: &Response) -> Operation {
        let headers = response.headers();
        let monitor = header_url(headers, AZURE_ASYNC_OPERATION)
            .map(|url| (url, MonitorKind::AsyncOperation))
            .or_else(|| header_url(headers, LOCATION).map(|url| (url, MonitorKind::Location)));

        // A `Location` header on `200 OK` only points to the resource itself
        let pending = monitor.filter(|(_, kind)| {
            *kind == MonitorKind::AsyncOperation || response.status() != StatusCode::OK
        });

        match pending {
            Some((url, kind)) => {
                let poller = ArmPoller {
                    http: self.http.clone(),
                    token: self.token.clone(),
                    id: id.to_owned(),
                    url,
                    kind,
                };
                Operation::pending(id, Box::new(poller), self.poll_interval)
            }
            None => Operation::completed(id),
        }
    }

    async fn mutate(
        &self,
        method: Method,
        id: &str,
        body: Option<Value>,
    ) -> Result<Operation, Error> {
        let url = self.url(id)?;
        let response = self.send(method, url, id, body).await?;
        Ok(self.operation(id, &response))
    }
}

#[async_trait]
impl ResourceManager for ArmClient {
    async fn get(&self, id: &str) -> Result<Value, Error> {
        let url = self.url(id)?;
        let response = self.send(Method::GET, url, id, None).await?;
        decode(response, id).await
    }

    async fn list(&self, collection: &str) -> Result<Vec<Value>, Error> {
        let mut items = Vec::new();
        let mut next = Some(self.url(collection)?);

        while let Some(url) = next.take() {
            let response = self.send(Method::GET, url, collection, None).await?;
            let mut page = decode(response, collection).await?;

            if let Some(Value::Array(values)) = page.get_mut("value").map(Value::take) {
                items.extend(values);
            }
            next = page
                .get("nextLink")
                .and_then(Value::as_str)
                .map(Url::parse)
                .transpose()
                .context(InvalidUrlSnafu { id: collection })?;
        }

        Ok(items)
    }

    async fn put(&self, id: &str, body: Value) -> Result<Operation, Error> {
        self.mutate(Method::PUT, id, Some(body)).await
    }

    async fn patch(&self, id: &str, body: Value) -> Result<Operation, Error> {
        self.mutate(Method::PATCH, id, Some(body)).await
    }

    async fn delete(&self, id: &str) -> Result<Operation, Error> {
        self.mutate(Method::DELETE, id, None).await
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MonitorKind {
    /// The `Azure-AsyncOperation` header points to a status document.
    AsyncOperation,

    /// The `Location` header is polled until it stops answering with `202 Accepted`.
    Location,
}

struct ArmPoller {
    http: reqwest::Client,
    token: Sensitive,
    id: String,
    url: Url,
    kind: MonitorKind,
}

#[async_trait]
impl Poll for ArmPoller {
    async fn poll(&mut self) -> Result<PollResult, Error> {
        let id = self.id.as_str();
        let response = self
            .http
            .get(self.url.clone())
            .bearer_auth(self.token.expose())
            .send()
            .await
            .context(TransportSnafu { id })?;
        let retry_after = retry_after(response.headers());
        let response = check_status(response, id).await?;

        let mut result = match self.kind {
            MonitorKind::Location if response.status() == StatusCode::ACCEPTED => {
                PollResult::with_status(OperationStatus::InProgress)
            }
            MonitorKind::Location => PollResult::with_status(OperationStatus::Succeeded),
            MonitorKind::AsyncOperation => {
                let document = decode(response, id).await?;
                async_operation_result(&document)
            }
        };
        result.retry_after = retry_after;
        Ok(result)
    }
}

/// Interprets an `Azure-AsyncOperation` status document.
fn async_operation_result(document: &Value) -> PollResult {
    let status = document
        .get("status")
        .and_then(Value::as_str)
        .and_then(|status| status.parse().ok())
        // Unknown states like "Accepted" or "Deleting" are still running
        .unwrap_or(OperationStatus::InProgress);

    PollResult {
        status,
        retry_after: None,
        message: error_message(document),
    }
}

fn error_message(document: &Value) -> Option<String> {
    let error = document.get("error")?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(format!("{code}: {message}"))
}

fn header_url(headers: &HeaderMap, name: &str) -> Option<Url> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Url::parse(value).ok())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn check_status(response: Response, id: &str) -> Result<Response, Error> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return NotFoundSnafu { id }.fail();
    }
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.context(TransportSnafu { id })?;
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|document| error_message(&document))
        .unwrap_or(body);
    RequestSnafu {
        id,
        status: status.as_u16(),
        message,
    }
    .fail()
}

async fn decode(response: Response, id: &str) -> Result<Value, Error> {
    let bytes = response.bytes().await.context(TransportSnafu { id })?;
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).context(DecodeSnafu { id })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!({"status": "Succeeded"}), OperationStatus::Succeeded)]
    #[case(json!({"status": "InProgress"}), OperationStatus::InProgress)]
    #[case(json!({"status": "Deleting"}), OperationStatus::InProgress)]
    #[case(json!({"status": "Canceled"}), OperationStatus::Canceled)]
    #[case(json!({}), OperationStatus::InProgress)]
    fn async_operation_status(#[case] document: Value, #[case] expected: OperationStatus) {
        assert_eq!(async_operation_result(&document).status, expected);
    }

    #[test]
    fn async_operation_error_message() {
        let document = json!({
            "status": "Failed",
            "error": {"code": "InvalidConfigServer", "message": "repository not reachable"}
        });
        let result = async_operation_result(&document);

        assert_eq!(result.status, OperationStatus::Failed);
        assert_eq!(
            result.message.as_deref(),
            Some("InvalidConfigServer: repository not reachable")
        );
    }

    #[test]
    fn url_carries_api_version() {
        let client = ArmClient {
            http: reqwest::Client::new(),
            endpoint: Url::parse("https://management.azure.com").expect("valid url"),
            token: Sensitive::new("token"),
            poll_interval: Duration::from_secs(10),
        };

        let url = client
            .url("/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc")
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "https://management.azure.com/subscriptions/sub/resourceGroups/rg/providers/Microsoft.AppPlatform/spring/svc?api-version=2023-05-01-preview"
        );
    }

    #[test]
    fn retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, "15".parse().expect("valid header"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(15)));
    }
}
