//! Authorized HTTP transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use passgate_core::error::{Error, ProtocolError, TransportError};
use passgate_core::{ApiUrl, Result};

use crate::endpoints::ErrorBody;
use crate::hooks::{RequestHook, ResponseHook, ResponseInfo};

/// A response that passed through the transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    /// HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    /// Body as (lossy) UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<R: DeserializeOwned>(&self) -> Result<R> {
        let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        };

        serde_json::from_slice(body).map_err(|e| {
            Error::Transport(TransportError::Decode {
                message: e.to_string(),
            })
        })
    }
}

/// HTTP client that runs an ordered hook chain around every exchange.
///
/// Request hooks run in order on the fully built request just before it is
/// sent; response hooks run in order on every response before status
/// handling. Non-success responses are returned as
/// [`Error::Protocol`] with the backend's detail message; transport failures
/// as [`Error::Transport`]. Hooks never alter what the caller receives.
#[derive(Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    api: ApiUrl,
    request_hooks: Arc<[Arc<dyn RequestHook>]>,
    response_hooks: Arc<[Arc<dyn ResponseHook>]>,
}

impl AuthorizedClient {
    /// Start building a client for `api`.
    pub fn builder(api: ApiUrl) -> ClientBuilder {
        ClientBuilder::new(api)
    }

    /// The backend base URL.
    pub fn api(&self) -> &ApiUrl {
        &self.api
    }

    /// A request builder for `path`, to be sent with [`send`](Self::send).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, self.api.endpoint(path))
    }

    /// Send a request through the hook chain.
    #[instrument(skip(self, request), fields(api = %self.api))]
    pub async fn send(&self, request: RequestBuilder) -> Result<ApiResponse> {
        let mut request = request.build()?;

        for hook in self.request_hooks.iter() {
            hook.on_request(&mut request);
        }

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Sending request");

        let response = self.http.execute(request).await?;
        let status = response.status();

        let info = ResponseInfo {
            method: &method,
            url: &url,
            status,
        };
        for hook in self.response_hooks.iter() {
            hook.on_response(&info);
        }

        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        trace!(%status, len = body.len(), "Response received");

        if status.is_success() {
            Ok(ApiResponse {
                status,
                headers,
                body,
            })
        } else {
            let detail = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::message);
            Err(Error::Protocol(ProtocolError::new(status.as_u16(), detail)))
        }
    }

    /// Send a request and decode the JSON response.
    pub async fn send_json<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R> {
        self.send(request).await?.json()
    }

    /// `GET` a JSON resource.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send_json(self.request(Method::GET, path)).await
    }

    /// `GET` a JSON resource with query parameters.
    pub async fn get_with_query<Q, R>(&self, path: &str, query: &Q) -> Result<R>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(self.request(Method::GET, path).query(query))
            .await
    }

    /// `POST` a JSON body.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(self.request(Method::POST, path).json(body))
            .await
    }

    /// `PUT` a JSON body.
    pub async fn put<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.send_json(self.request(Method::PUT, path).json(body))
            .await
    }

    /// `DELETE` a resource.
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.send_json(self.request(Method::DELETE, path)).await
    }
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("api", &self.api)
            .field("request_hooks", &self.request_hooks.len())
            .field("response_hooks", &self.response_hooks.len())
            .finish()
    }
}

/// Builder for [`AuthorizedClient`].
pub struct ClientBuilder {
    api: ApiUrl,
    timeout: Option<Duration>,
    request_hooks: Vec<Arc<dyn RequestHook>>,
    response_hooks: Vec<Arc<dyn ResponseHook>>,
}

impl ClientBuilder {
    fn new(api: ApiUrl) -> Self {
        Self {
            api,
            timeout: None,
            request_hooks: Vec::new(),
            response_hooks: Vec::new(),
        }
    }

    /// Bound every request by `timeout`. Off by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Append a request hook.
    pub fn request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    /// Append a response hook.
    pub fn response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hooks.push(Arc::new(hook));
        self
    }

    /// Insert a request hook ahead of the ones already added.
    pub(crate) fn prepend_request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.request_hooks.insert(0, Arc::new(hook));
        self
    }

    /// Insert a response hook ahead of the ones already added.
    pub(crate) fn prepend_response_hook(mut self, hook: impl ResponseHook + 'static) -> Self {
        self.response_hooks.insert(0, Arc::new(hook));
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<AuthorizedClient> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut http = reqwest::Client::builder()
            .user_agent(concat!("passgate/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        Ok(AuthorizedClient {
            http: http.build()?,
            api: self.api,
            request_hooks: self.request_hooks.into(),
            response_hooks: self.response_hooks.into(),
        })
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("api", &self.api)
            .field("timeout", &self.timeout)
            .field("request_hooks", &self.request_hooks.len())
            .field("response_hooks", &self.response_hooks.len())
            .finish()
    }
}
