//! Client surface of the game service.

pub mod http;

pub use http::HttpGameApi;

use crate::error::ApiError;
use crate::types::{Balance, BetOutcome, BetRequest, Credential, Deposit, DepositRequest, SessionToken};
use async_trait::async_trait;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The endpoints the harness drives. Every call either yields the decoded
/// success payload or an [`ApiError`]; there are no retries.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `POST /auth/register`
    async fn register(&self, credential: &Credential) -> ApiResult<SessionToken>;

    /// `POST /auth/login`
    async fn login(&self, credential: &Credential) -> ApiResult<SessionToken>;

    /// `POST /deposit/request`
    async fn request_deposit(
        &self,
        session: &SessionToken,
        request: &DepositRequest,
    ) -> ApiResult<Deposit>;

    /// `PUT /admin/deposit/{id}/approve`
    async fn approve_deposit(&self, operator: &SessionToken, deposit_id: &str) -> ApiResult<()>;

    /// `GET /user/balance`
    async fn balance(&self, session: &SessionToken) -> ApiResult<Balance>;

    /// `POST /game/bet`
    async fn place_bet(&self, session: &SessionToken, bet: &BetRequest) -> ApiResult<BetOutcome>;
}
