//! reqwest implementation of [`VotingApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use retrovote_network::ProxyEndpoint;
use retrovote_types::{Address, Ballot, BallotLookup, Project, ProjectId};
use serde::Serialize;

use crate::cookies::{extract_cookie_value, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::envelope::{
    Envelope, NonceData, MSG_VOTES_CONFIRMED, MSG_VOTE_DELETED, MSG_VOTING_SUCCESSFUL,
};
use crate::{ApiConnector, ApiError, BearerTokens, VotingApi};

pub const DEFAULT_API_BASE_URL: &str = "https://api-retro-9000.avax.network/api";
pub const DEFAULT_SITE_ORIGIN: &str = "https://retro9000.avax.network";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const SUBMISSIONS_PER_PAGE: &str = "1000";

/// Endpoint and header settings shared by every connection of a run.
#[derive(Clone, Debug)]
pub struct HttpApiConfig {
    pub base_url: String,
    /// Sent as `origin`; `referer` is the origin with a trailing slash.
    pub site_origin: String,
    pub round_id: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpApiConfig {
    pub fn new(round_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            round_id: round_id.into(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn default_headers(&self) -> Result<HeaderMap, ApiError> {
        let value = |raw: &str| {
            HeaderValue::from_str(raw)
                .map_err(|e| ApiError::ClientBuild(format!("invalid header value {raw:?}: {e}")))
        };
        let origin = self.site_origin.trim_end_matches('/');

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, value("application/json, text/plain, */*")?);
        headers.insert(header::ACCEPT_LANGUAGE, value("en-US,en;q=0.9")?);
        headers.insert(header::ORIGIN, value(origin)?);
        headers.insert(header::REFERER, value(&format!("{origin}/"))?);
        Ok(headers)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    wallet_address: String,
    signature: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CastVoteRequest {
    vote_count: i64,
}

#[derive(Serialize)]
struct ConfirmVotesRequest<'a> {
    votes: Vec<VoteRef<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoteRef<'a> {
    vote_id: &'a str,
}

/// Pre-serialize a request body so an unencodable payload is a fatal
/// [`ApiError::Payload`] rather than a retried transport failure.
fn json_body<T: Serialize>(payload: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(payload).map_err(|e| ApiError::Payload(e.to_string()))
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ApiError::Transport(format!("connection failed: {e}"))
    } else {
        ApiError::Transport(e.to_string())
    }
}

/// Client for one account, optionally routed through a proxy.
pub struct HttpVotingApi {
    http: reqwest::Client,
    config: Arc<HttpApiConfig>,
}

impl HttpVotingApi {
    pub fn new(config: Arc<HttpApiConfig>, proxy: Option<&ProxyEndpoint>) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .default_headers(config.default_headers()?);
        if let Some(proxy) = proxy {
            let route = reqwest::Proxy::all(proxy.to_string()).map_err(|e| {
                ApiError::ClientBuild(format!("proxy {}: {e}", proxy.redacted()))
            })?;
            builder = builder.proxy(route);
        }
        let http = builder
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, config })
    }

    fn authed(&self, request: RequestBuilder, tokens: &BearerTokens) -> RequestBuilder {
        request.header(header::COOKIE, tokens.cookie_header())
    }

    fn with_json(request: RequestBuilder, body: Vec<u8>) -> RequestBuilder {
        request
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
    }

    /// Send and decode the envelope. The HTTP status is not checked here:
    /// the service mirrors it in `statusCode`, which each endpoint inspects.
    async fn exchange(&self, request: RequestBuilder) -> Result<(HeaderMap, Envelope), ApiError> {
        let response = request.send().await.map_err(transport_error)?;
        let headers = response.headers().clone();
        let body = response.text().await.map_err(transport_error)?;
        Ok((headers, Envelope::parse(&body)?))
    }
}

#[async_trait]
impl VotingApi for HttpVotingApi {
    async fn challenge(&self, address: &Address) -> Result<String, ApiError> {
        let url = self.config.url(&format!("/auth/get-nonce/{address}"));
        let (_, envelope) = self.exchange(self.http.get(url)).await?;
        let data: NonceData = envelope.require_ok()?.into_data()?;
        if data.nonce.is_empty() {
            return Err(ApiError::Incomplete("empty nonce".into()));
        }
        Ok(data.nonce)
    }

    async fn login(&self, address: &Address, signature: &str) -> Result<BearerTokens, ApiError> {
        let body = json_body(&LoginRequest {
            wallet_address: address.to_string(),
            signature,
        })?;
        let request = Self::with_json(self.http.post(self.config.url("/auth/login")), body);
        let (headers, envelope) = self.exchange(request).await?;
        envelope.require_ok()?;

        let cookie = |name: &str| {
            headers
                .get_all(header::SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .find_map(|raw| extract_cookie_value(raw, name).map(str::to_string))
                .ok_or_else(|| ApiError::Incomplete(format!("login response has no {name} cookie")))
        };
        Ok(BearerTokens {
            access: cookie(ACCESS_TOKEN_COOKIE)?,
            refresh: cookie(REFRESH_TOKEN_COOKIE)?,
        })
    }

    async fn ballot(&self, tokens: &BearerTokens) -> Result<BallotLookup, ApiError> {
        let url = self
            .config
            .url(&format!("/vote/rounds/{}/ballot-votes", self.config.round_id));
        let (_, envelope) = self.exchange(self.authed(self.http.get(url), tokens)).await?;
        if envelope.is_ballot_not_found() {
            return Ok(BallotLookup::NotFound);
        }
        let ballot: Ballot = envelope.require_ok()?.into_data()?;
        Ok(BallotLookup::Found(ballot))
    }

    async fn projects(&self, tokens: &BearerTokens) -> Result<Vec<Project>, ApiError> {
        let round = self.config.round_id.as_str();
        let url = self.config.url(&format!("/rounds/{round}/submissions"));
        let request = self.http.get(url).query(&[
            ("roundId", round),
            ("page", "1"),
            ("perPage", SUBMISSIONS_PER_PAGE),
            ("sortBy", "votes"),
            ("sortOrder", "desc"),
            ("includeField", "userVotes"),
        ]);
        let (_, envelope) = self.exchange(self.authed(request, tokens)).await?;
        envelope.require_ok()?.into_data()
    }

    async fn cast_vote(
        &self,
        tokens: &BearerTokens,
        project: &ProjectId,
        count: i64,
    ) -> Result<(), ApiError> {
        let body = json_body(&CastVoteRequest { vote_count: count })?;
        let url = self.config.url(&format!(
            "/vote/rounds/{}/projects/{project}/vote",
            self.config.round_id
        ));
        let request = Self::with_json(self.authed(self.http.post(url), tokens), body);
        let (_, envelope) = self.exchange(request).await?;
        envelope.require_message(MSG_VOTING_SUCCESSFUL).map(drop)
    }

    async fn confirm_votes(
        &self,
        tokens: &BearerTokens,
        vote_ids: &[String],
    ) -> Result<(), ApiError> {
        let body = json_body(&ConfirmVotesRequest {
            votes: vote_ids.iter().map(|id| VoteRef { vote_id: id }).collect(),
        })?;
        let url = self
            .config
            .url(&format!("/vote/rounds/{}/confirm-votes", self.config.round_id));
        let request = Self::with_json(self.authed(self.http.post(url), tokens), body);
        let (_, envelope) = self.exchange(request).await?;
        envelope.require_message(MSG_VOTES_CONFIRMED).map(drop)
    }

    async fn delete_vote(&self, tokens: &BearerTokens, project: &ProjectId) -> Result<(), ApiError> {
        let url = self.config.url(&format!("/vote/projects/{project}/vote"));
        let (_, envelope) = self
            .exchange(self.authed(self.http.delete(url), tokens))
            .await?;
        envelope.require_message(MSG_VOTE_DELETED).map(drop)
    }
}

/// Builds one [`HttpVotingApi`] per account.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    config: Arc<HttpApiConfig>,
}

impl HttpConnector {
    pub fn new(config: HttpApiConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &HttpApiConfig {
        &self.config
    }
}

impl ApiConnector for HttpConnector {
    fn connect(&self, proxy: Option<&ProxyEndpoint>) -> Result<Arc<dyn VotingApi>, ApiError> {
        let api = HttpVotingApi::new(Arc::clone(&self.config), proxy)?;
        Ok(Arc::new(api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrovote_network::parse_proxy;

    #[test]
    fn url_joins_without_double_slash() {
        let mut config = HttpApiConfig::new("1");
        config.base_url = "http://localhost:9/api/".into();
        assert_eq!(config.url("/auth/login"), "http://localhost:9/api/auth/login");
    }

    #[test]
    fn default_headers_carry_origin_and_referer() {
        let headers = HttpApiConfig::new("1").default_headers().unwrap();
        assert_eq!(headers[header::ORIGIN], DEFAULT_SITE_ORIGIN);
        assert_eq!(headers[header::REFERER], format!("{DEFAULT_SITE_ORIGIN}/"));
    }

    #[test]
    fn invalid_origin_is_client_build_error() {
        let mut config = HttpApiConfig::new("1");
        config.site_origin = "bad\norigin".into();
        assert!(matches!(
            config.default_headers(),
            Err(ApiError::ClientBuild(_))
        ));
    }

    #[test]
    fn request_bodies_use_wire_names() {
        let login = serde_json::to_value(LoginRequest {
            wallet_address: "0xabc".into(),
            signature: "0xsig",
        })
        .unwrap();
        assert_eq!(login, serde_json::json!({"walletAddress": "0xabc", "signature": "0xsig"}));

        let ids = vec!["v1".to_string(), "v2".to_string()];
        let confirm = serde_json::to_value(ConfirmVotesRequest {
            votes: ids.iter().map(|id| VoteRef { vote_id: id }).collect(),
        })
        .unwrap();
        assert_eq!(
            confirm,
            serde_json::json!({"votes": [{"voteId": "v1"}, {"voteId": "v2"}]})
        );

        let cast = serde_json::to_value(CastVoteRequest { vote_count: 4 }).unwrap();
        assert_eq!(cast, serde_json::json!({"voteCount": 4}));
    }

    #[test]
    fn connector_accepts_every_proxy_scheme() {
        let connector = HttpConnector::new(HttpApiConfig::new("1"));
        assert!(connector.connect(None).is_ok());
        for raw in [
            "1.2.3.4:8080",
            "https://1.2.3.4:443",
            "socks5://u:p@1.2.3.4:1080",
        ] {
            let proxy = parse_proxy(raw).unwrap();
            assert!(connector.connect(Some(&proxy)).is_ok(), "{raw}");
        }
    }
}
