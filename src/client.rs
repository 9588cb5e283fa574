//! HTTP client that answers NTLM `401` challenges transparently.
//!
//! A request goes out unmodified. If the server answers `401` with an NTLM prompt, the request
//! is replayed once with a Type 1 token, and once more with the Type 3 token answering the
//! server's Type 2 challenge. A `401` after the Type 3 token is final, as is any `401` without
//! an NTLM prompt once a token has been sent.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{IntoUrl, Method, Request, RequestBuilder, Response, StatusCode};

use crate::credentials::{ClientConfig, Credentials};
use crate::crypto::nonce::NonceSource;
use crate::error::{Error, Result};
use crate::messages::{Challenge, SCHEME};

/// NTLM segments shorter than this are taken as a bare prompt rather than a Type 2 token.
///
/// Heuristic: some servers list `Negotiate` next to a Type 2 token, so the header alone does
/// not say which message it carries.
pub const NEGOTIATE_PROMPT_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum HandshakeState {
    #[default]
    New,
    NegotiateSent,
    AuthenticateSent,
}

/// What the server asked for in a `401` response.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    /// `NTLM` with no token: start the handshake.
    Negotiate,
    /// `NTLM <type 2>`.
    Challenge(String),
}

/// The first `WWW-Authenticate` segment that starts with `NTLM`, trimmed.
fn ntlm_segment(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(WWW_AUTHENTICATE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .find(|segment| segment.starts_with(SCHEME))
        .map(str::to_owned)
}

fn prompt(status: StatusCode, headers: &HeaderMap) -> Option<Prompt> {
    if status != StatusCode::UNAUTHORIZED {
        return None;
    }
    let segment = ntlm_segment(headers)?;
    if segment.len() < NEGOTIATE_PROMPT_MAX_LEN {
        Some(Prompt::Negotiate)
    } else {
        Some(Prompt::Challenge(segment))
    }
}

/// Builder for [`NegotiationClient`].
pub struct ClientBuilder {
    credentials: Credentials,
    http: Option<reqwest::Client>,
    config: ClientConfig,
}

impl ClientBuilder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            http: None,
            config: ClientConfig::default(),
        }
    }

    /// Transport to send requests with. Defaults to a keep-alive `reqwest::Client`; NTLM
    /// authenticates the connection, so the transport must reuse it across the handshake.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// How long to spend reading a `401` body before replaying the request.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.config.drain_timeout = timeout;
        self
    }

    pub fn nonce_source(mut self, nonces: impl NonceSource + 'static) -> Self {
        self.config.nonce_source = Arc::new(nonces);
        self
    }

    pub fn build(self) -> Result<NegotiationClient> {
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder().build()?,
        };
        Ok(NegotiationClient {
            http,
            credentials: Arc::new(self.credentials),
            config: Arc::new(self.config),
        })
    }
}

/// `reqwest` client wrapper that performs the NTLM handshake on `401` responses.
///
/// Cheap to clone; clones share the transport and credentials.
#[derive(Debug, Clone)]
pub struct NegotiationClient {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    config: Arc<ClientConfig>,
}

impl NegotiationClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.http.request(method, url)
    }

    pub async fn get<U: IntoUrl>(&self, url: U) -> Result<Response> {
        self.send(self.http.get(url)).await
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        self.execute(request.build()?).await
    }

    /// Sends `request`, answering NTLM prompts.
    ///
    /// Responses other than an NTLM `401` are returned as they are, including `401`s for other
    /// schemes to the untouched request. Once a token has been sent, any `401` that does not
    /// carry the next handshake step fails with [`Error::Rejected`] carrying that response.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut state = HandshakeState::default();
        let mut request = request;

        loop {
            let replay = request.try_clone();
            let url = request.url().clone();
            let response = self.http.execute(request).await?;

            let prompt = match prompt(response.status(), response.headers()) {
                Some(prompt) => prompt,
                None if response.status() == StatusCode::UNAUTHORIZED
                    && state != HandshakeState::New =>
                {
                    log::debug!("{}: 401 without an NTLM prompt after {:?}", url, state);
                    return Err(Error::Rejected {
                        response: Box::new(response),
                    });
                }
                None => {
                    log::trace!("{} {} ({:?})", response.status(), url, state);
                    return Ok(response);
                }
            };

            let authorization = match (state, prompt) {
                (HandshakeState::New, Prompt::Negotiate) => {
                    log::debug!("{}: NTLM prompt, sending negotiate message", url);
                    state = HandshakeState::NegotiateSent;
                    self.credentials.negotiate_header()?
                }
                (HandshakeState::NegotiateSent, Prompt::Negotiate) => {
                    log::debug!("{}: negotiate message was not answered with a challenge", url);
                    return Err(Error::Rejected {
                        response: Box::new(response),
                    });
                }
                (HandshakeState::AuthenticateSent, _) => {
                    log::debug!("{}: authentication rejected", url);
                    return Err(Error::Rejected {
                        response: Box::new(response),
                    });
                }
                (_, Prompt::Challenge(segment)) => {
                    let challenge = Challenge::from_header(&segment)?;
                    log::debug!(
                        "{}: {:?} challenge for {:?}, sending authenticate message",
                        url,
                        challenge.version,
                        challenge.target_name
                    );
                    state = HandshakeState::AuthenticateSent;
                    self.credentials
                        .authenticate_header(&challenge, self.config.nonce_source.as_ref())?
                }
            };

            let mut replay = replay.ok_or(Error::RequestNotReplayable)?;
            self.drain(response).await;

            let mut value = HeaderValue::from_str(&authorization)?;
            value.set_sensitive(true);
            replay.headers_mut().insert(AUTHORIZATION, value);
            request = replay;
        }
    }

    /// Reads the rest of `response` so its connection can carry the retry.
    async fn drain(&self, mut response: Response) {
        let timeout = self.config.drain_timeout;
        let drain = async move {
            let mut drained = 0usize;
            while let Some(chunk) = response.chunk().await? {
                drained += chunk.len();
            }
            Ok::<_, reqwest::Error>(drained)
        };

        match tokio::time::timeout(timeout, drain).await {
            Ok(Ok(drained)) => log::trace!("drained {} byte 401 body", drained),
            Ok(Err(e)) => log::debug!("could not drain 401 body: {}", e),
            Err(_) => log::warn!("gave up draining 401 body after {:?}", timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(values: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(WWW_AUTHENTICATE, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    const TYPE2: &str = "NTLM TlRMTVNTUAACAAAAEAAQADAAAAAFgominWXBG0VA2i4AAAAAAAAAAHYAdgBAAAAA";

    #[test]
    fn segment_isolation() {
        assert_eq!(ntlm_segment(&headers(&["NTLM"])).as_deref(), Some("NTLM"));
        assert_eq!(
            ntlm_segment(&headers(&["Negotiate, NTLM, Basic realm=\"x\""])).as_deref(),
            Some("NTLM")
        );
        assert_eq!(
            ntlm_segment(&headers(&["Basic realm=\"x\"", "NTLM"])).as_deref(),
            Some("NTLM")
        );
        assert_eq!(
            ntlm_segment(&headers(&[&format!("Negotiate, {}", TYPE2)])).as_deref(),
            Some(TYPE2)
        );
        assert_eq!(ntlm_segment(&headers(&["Basic realm=\"x\""])), None);
        assert_eq!(ntlm_segment(&HeaderMap::new()), None);
    }

    #[test]
    fn prompt_classification() {
        assert_eq!(
            prompt(StatusCode::UNAUTHORIZED, &headers(&["Negotiate, NTLM"])),
            Some(Prompt::Negotiate)
        );
        assert_eq!(
            prompt(StatusCode::UNAUTHORIZED, &headers(&[TYPE2])),
            Some(Prompt::Challenge(TYPE2.to_owned()))
        );
        assert_eq!(
            prompt(StatusCode::UNAUTHORIZED, &headers(&["Basic realm=\"x\""])),
            None
        );
        assert_eq!(prompt(StatusCode::FORBIDDEN, &headers(&["NTLM"])), None);
        assert_eq!(prompt(StatusCode::OK, &headers(&[TYPE2])), None);
    }

    #[test]
    fn prompt_length_threshold() {
        let short = format!("NTLM {}", "A".repeat(NEGOTIATE_PROMPT_MAX_LEN - 6));
        assert_eq!(short.len(), NEGOTIATE_PROMPT_MAX_LEN - 1);
        assert_eq!(
            prompt(StatusCode::UNAUTHORIZED, &headers(&[&short])),
            Some(Prompt::Negotiate)
        );

        let long = format!("NTLM {}", "A".repeat(NEGOTIATE_PROMPT_MAX_LEN - 5));
        assert_eq!(
            prompt(StatusCode::UNAUTHORIZED, &headers(&[&long])),
            Some(Prompt::Challenge(long.clone()))
        );
    }

    #[test]
    fn builder_defaults() {
        let client = NegotiationClient::builder(Credentials::new("u", "p"))
            .drain_timeout(Duration::from_millis(250))
            .build()
            .unwrap();
        assert_eq!(client.config.drain_timeout, Duration::from_millis(250));
        assert_eq!(client.credentials().username(), "u");
    }
}
