//! HTTP client for the Examlyx REST backend
//!
//! Keeps the session cookie in its own jar and attaches the CSRF token to
//! every state-changing request, fetching it first when none is cached.

use super::error::ApiError;
use super::traits::{
    ApiResult, AuthGateway, EntityGateway, LocationGateway, ProgramCourseGateway,
};
use crate::config::AppContext;
use crate::state::{
    ClientSettings, EntityId, EntityKind, EntitySummary, FormRecord, OptionItem, SessionUser,
};
use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;

/// Header Django reads the CSRF token from
const CSRF_HEADER: &str = "X-CSRFToken";

const ACCOUNTS: &str = "/api/accounts";
const CATALOG: &str = "/api/course_program_batch";

/// Status and JSON body of a response; non-JSON bodies read as `Value::Null`
async fn read_body(response: reqwest::Response) -> ApiResult<(StatusCode, Value)> {
    let status = response.status();
    let bytes = response.bytes().await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    Ok((status, value))
}

/// Client for communicating with the Examlyx backend
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    csrf: RwLock<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct CsrfResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    user: SessionUser,
}

impl ApiClient {
    /// Create a new client for the backend named in `context`
    pub fn new(context: &AppContext) -> ApiResult<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: context.api_url.trim_end_matches('/').to_string(),
            csrf: RwLock::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Return the cached CSRF token, fetching one if needed
    async fn ensure_csrf(&self) -> ApiResult<String> {
        if let Some(token) = self.csrf.read().await.clone() {
            return Ok(token);
        }
        self.fetch_csrf().await
    }

    async fn fetch_csrf(&self) -> ApiResult<String> {
        let response = self
            .http
            .get(self.url(&format!("{ACCOUNTS}/csrf/")))
            .send()
            .await?;
        let (status, body) = read_body(response).await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body));
        }
        let token = serde_json::from_value::<CsrfResponse>(body)?.csrf_token;
        *self.csrf.write().await = Some(token.clone());
        tracing::debug!("acquired CSRF token");
        Ok(token)
    }

    /// Send a request and return the status with the parsed body
    async fn send_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<&FormRecord>,
    ) -> ApiResult<(StatusCode, Value)> {
        let mutating = !matches!(method, Method::GET | Method::HEAD | Method::OPTIONS);
        let mut request = self.http.request(method.clone(), self.url(path));

        if mutating {
            let token = self.ensure_csrf().await?;
            request = request
                .header(CSRF_HEADER, token)
                .header(header::REFERER, self.base_url.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(%method, path, "sending request");
        let response = request.send().await?;
        let (status, value) = read_body(response).await?;

        if status == StatusCode::FORBIDDEN && is_csrf_failure(&value) {
            // Token rotated server-side; the next mutating call refetches it
            *self.csrf.write().await = None;
        }

        Ok((status, value))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&FormRecord>,
    ) -> ApiResult<Value> {
        let (status, value) = self.send_raw(method, path, body).await?;
        if status.is_success() {
            Ok(value)
        } else {
            Err(ApiError::from_response(status.as_u16(), &value))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let value = self.execute(Method::GET, path, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn get_collection<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let value = self.execute(Method::GET, path, None).await?;
        Ok(serde_json::from_value(unwrap_collection(value))?)
    }
}

/// Accept both bare arrays and paginated `{"results": [...]}` bodies
fn unwrap_collection(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.get("results").is_some_and(Value::is_array) => {
            map.remove("results").unwrap_or_else(|| json!([]))
        }
        Value::Null => json!([]),
        other => other,
    }
}

/// Find the id of a freshly created record, either at the top level or
/// inside a wrapper object such as `{"client": {...}}`
fn extract_id(body: &Value) -> Option<i64> {
    if let Some(id) = body.get("id").and_then(Value::as_i64) {
        return Some(id);
    }
    body.as_object()?
        .values()
        .filter(|v| v.is_object())
        .find_map(|v| v.get("id").and_then(Value::as_i64))
}

fn is_csrf_failure(body: &Value) -> bool {
    body.get("detail")
        .and_then(Value::as_str)
        .is_some_and(|d| d.contains("CSRF"))
}

fn list_path(kind: EntityKind) -> String {
    match kind {
        EntityKind::Client => format!("{ACCOUNTS}/clients/"),
        EntityKind::Admin => format!("{ACCOUNTS}/admins/list/"),
        EntityKind::Teacher => format!("{ACCOUNTS}/teachers/"),
        EntityKind::Student => format!("{ACCOUNTS}/students/"),
    }
}

fn create_path(kind: EntityKind) -> String {
    match kind {
        EntityKind::Client => format!("{ACCOUNTS}/clients/create/"),
        EntityKind::Admin => format!("{ACCOUNTS}/admins/create/"),
        EntityKind::Teacher => format!("{ACCOUNTS}/teachers/create/"),
        EntityKind::Student => format!("{ACCOUNTS}/students/create/"),
    }
}

/// Detail endpoint; clients have none
fn item_path(kind: EntityKind, id: EntityId) -> Option<String> {
    match kind {
        EntityKind::Client => None,
        EntityKind::Admin => Some(format!("{ACCOUNTS}/admins/{id}/")),
        EntityKind::Teacher => Some(format!("{ACCOUNTS}/teachers/{id}/")),
        EntityKind::Student => Some(format!("{ACCOUNTS}/students/{id}/")),
    }
}

fn delete_path(kind: EntityKind, id: EntityId) -> String {
    match kind {
        EntityKind::Client => format!("{ACCOUNTS}/clients/{id}/delete/"),
        _ => format!("{ACCOUNTS}/users/{id}/delete/"),
    }
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn csrf_token(&self) -> ApiResult<String> {
        self.fetch_csrf().await
    }

    async fn login(&self, username: &str, password: &str) -> ApiResult<SessionUser> {
        let mut body = FormRecord::new();
        body.insert("username".into(), json!(username));
        body.insert("password".into(), json!(password));

        let (status, value) = self
            .send_raw(Method::POST, &format!("{ACCOUNTS}/login/"), Some(&body))
            .await?;

        if status == StatusCode::UNAUTHORIZED {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("Login failed")
                .to_string();
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &value));
        }

        // Django rotates the CSRF token on login
        *self.csrf.write().await = None;

        let session: SessionResponse = serde_json::from_value(value)?;
        tracing::info!(user = %session.user.username, "signed in");
        Ok(session.user)
    }

    async fn logout(&self) -> ApiResult<()> {
        self.execute(Method::POST, &format!("{ACCOUNTS}/logout/"), None)
            .await?;
        *self.csrf.write().await = None;
        Ok(())
    }

    async fn check_session(&self) -> ApiResult<Option<SessionUser>> {
        match self
            .get_json::<SessionResponse>(&format!("{ACCOUNTS}/check-auth/"))
            .await
        {
            Ok(session) => Ok(Some(session.user)),
            Err(ApiError::SessionExpired) => Ok(None),
            Err(ApiError::Rejected { status: 403, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl EntityGateway for ApiClient {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<EntitySummary>> {
        self.get_collection(&list_path(kind)).await
    }

    async fn get(&self, kind: EntityKind, id: EntityId) -> ApiResult<EntitySummary> {
        if let Some(path) = item_path(kind, id) {
            return self.get_json(&path).await;
        }
        self.list(kind)
            .await?
            .into_iter()
            .find(|e| e.id == id.0)
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: format!("{kind} #{id} not found"),
            })
    }

    async fn create(&self, kind: EntityKind, record: &FormRecord) -> ApiResult<EntityId> {
        let body = self
            .execute(Method::POST, &create_path(kind), Some(record))
            .await?;
        extract_id(&body)
            .map(EntityId)
            .ok_or_else(|| ApiError::Decode(format!("create {kind} response carried no id")))
    }

    async fn update(&self, kind: EntityKind, id: EntityId, record: &FormRecord) -> ApiResult<()> {
        let path = item_path(kind, id).ok_or(ApiError::Unsupported {
            operation: "update",
            kind,
        })?;
        self.execute(Method::PUT, &path, Some(record)).await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> ApiResult<()> {
        self.execute(Method::DELETE, &delete_path(kind, id), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LocationGateway for ApiClient {
    async fn countries(&self) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{ACCOUNTS}/countries/")).await
    }

    async fn states(&self, country_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{ACCOUNTS}/states/{country_id}/"))
            .await
    }

    async fn cities(&self, state_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{ACCOUNTS}/cities/{state_id}/"))
            .await
    }
}

#[async_trait]
impl ProgramCourseGateway for ApiClient {
    async fn client_settings(&self, client_id: i64) -> ApiResult<ClientSettings> {
        self.get_json(&format!("{ACCOUNTS}/clients/{client_id}/settings/"))
            .await
    }

    async fn programs_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{CATALOG}/clients/{client_id}/programs/"))
            .await
    }

    async fn batches_for_client(&self, client_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{CATALOG}/clients/{client_id}/batches/"))
            .await
    }

    async fn courses_for_program(&self, program_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{CATALOG}/programs/{program_id}/courses/"))
            .await
    }

    async fn courses_for_batch(&self, batch_id: i64) -> ApiResult<Vec<OptionItem>> {
        self.get_collection(&format!("{CATALOG}/batches/{batch_id}/courses/"))
            .await
    }
}
