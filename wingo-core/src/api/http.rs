use super::{ApiResult, GameApi};
use crate::error::{ApiError, Result};
use crate::types::{
    Balance, BetOutcome, BetRequest, Credential, Deposit, DepositRequest, SessionToken,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 200;

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct DepositResponse {
    deposit: Deposit,
}

/// [`GameApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpGameApi {
    base_url: String,
    client: Client,
}

impl HttpGameApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::from)?;

        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("{} returned {}: {}", what, status, body);
            return Err(ApiError::UnexpectedStatus {
                status,
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::malformed(format!("{} response: {}", what, e)))
    }

    /// Like [`send`](Self::send) but ignores the body of a 200.
    async fn send_empty(&self, request: RequestBuilder, what: &str) -> ApiResult<()> {
        let response = request.send().await?;
        let status = response.status();

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("{} returned {}: {}", what, status, body);
            return Err(ApiError::UnexpectedStatus {
                status,
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn register(&self, credential: &Credential) -> ApiResult<SessionToken> {
        let request = self.client.post(self.endpoint("/auth/register")).json(credential);
        let body: TokenResponse = self.send(request, "register").await?;
        SessionToken::new(body.token)
    }

    async fn login(&self, credential: &Credential) -> ApiResult<SessionToken> {
        let request = self.client.post(self.endpoint("/auth/login")).json(&LoginBody {
            email: &credential.email,
            password: &credential.password,
        });
        let body: TokenResponse = self.send(request, "login").await?;
        SessionToken::new(body.token)
    }

    async fn request_deposit(
        &self,
        session: &SessionToken,
        request: &DepositRequest,
    ) -> ApiResult<Deposit> {
        let request = self
            .client
            .post(self.endpoint("/deposit/request"))
            .bearer_auth(session.as_str())
            .json(request);
        let body: DepositResponse = self.send(request, "deposit request").await?;
        Ok(body.deposit)
    }

    async fn approve_deposit(&self, operator: &SessionToken, deposit_id: &str) -> ApiResult<()> {
        let path = format!("/admin/deposit/{}/approve", deposit_id);
        let request = self
            .client
            .put(self.endpoint(&path))
            .bearer_auth(operator.as_str());
        self.send_empty(request, "deposit approval").await
    }

    async fn balance(&self, session: &SessionToken) -> ApiResult<Balance> {
        let request = self
            .client
            .get(self.endpoint("/user/balance"))
            .bearer_auth(session.as_str());
        self.send(request, "balance").await
    }

    async fn place_bet(&self, session: &SessionToken, bet: &BetRequest) -> ApiResult<BetOutcome> {
        let request = self
            .client
            .post(self.endpoint("/game/bet"))
            .bearer_auth(session.as_str())
            .json(bet);
        self.send(request, "bet").await
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
