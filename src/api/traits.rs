//! Trait abstraction over the backend so screens can be tested with mocks

use super::error::ApiError;
use crate::state::{
    ClientSettings, EntityId, EntityKind, EntitySummary, FormRecord, OptionItem, SessionUser,
};
use async_trait::async_trait;

pub type ApiResult<T> = Result<T, ApiError>;

/// Session handling: CSRF token, login, logout and session checks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Acquire a CSRF token for state-changing requests. The HTTP client
    /// fetches one lazily before its first mutation, so screens never call this.
    #[allow(dead_code)] // gateway contract; exercised by the client and memory tests
    async fn csrf_token(&self) -> ApiResult<String>;

    async fn login(&self, username: &str, password: &str) -> ApiResult<SessionUser>;

    async fn logout(&self) -> ApiResult<()>;

    /// Returns the signed-in user, or `None` when there is no session
    async fn check_session(&self) -> ApiResult<Option<SessionUser>>;
}

/// CRUD over clients, admins, teachers and students
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<EntitySummary>>;

    /// Fetch one record. Not reached from a screen yet; the create-then-get
    /// contract test holds every implementation to it.
    #[allow(dead_code)] // gateway contract; exercised by the contract tests
    async fn get(&self, kind: EntityKind, id: EntityId) -> ApiResult<EntitySummary>;

    async fn create(&self, kind: EntityKind, record: &FormRecord) -> ApiResult<EntityId>;

    /// Replace a record; clients answer `ApiError::Unsupported`. There is no
    /// edit screen, so only tests call this.
    #[allow(dead_code)] // gateway contract; exercised by the client and memory tests
    async fn update(&self, kind: EntityKind, id: EntityId, record: &FormRecord) -> ApiResult<()>;

    async fn delete(&self, kind: EntityKind, id: EntityId) -> ApiResult<()>;
}

/// Country, state and city lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationGateway: Send + Sync {
    async fn countries(&self) -> ApiResult<Vec<OptionItem>>;

    async fn states(&self, country_id: i64) -> ApiResult<Vec<OptionItem>>;

    async fn cities(&self, state_id: i64) -> ApiResult<Vec<OptionItem>>;
}

/// Client settings and the program/batch/course catalog
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgramCourseGateway: Send + Sync {
    async fn client_settings(&self, client_id: i64) -> ApiResult<ClientSettings>;

    async fn programs_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>>;

    async fn batches_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>>;

    async fn courses_for_program(&self, program_id: i64) -> ApiResult<Vec<OptionItem>>;

    async fn courses_for_batch(&self, batch_id: i64) -> ApiResult<Vec<OptionItem>>;
}
