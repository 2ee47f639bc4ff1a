/// Analytics backend access.
///
/// [`DashboardApi`] is the seam between the dashboard controller and the
/// network: the controller only ever sees a payload or a [`RefreshError`].
/// [`client::HttpDashboardApi`] is the production implementation over
/// synchronous `ureq`.
///
/// # Failure classes
///
/// | Response                         | Error                          | Logs out |
/// |----------------------------------|--------------------------------|----------|
/// | any non-2xx status               | [`RefreshError::Authorization`] | yes      |
/// | 2xx, `success: false`            | [`RefreshError::Application`]   | no       |
/// | connect/read failure, bad JSON   | [`RefreshError::Transport`]     | no       |
///
/// Every non-2xx status is read as an authorization failure, including 5xx.
/// The backend only signals a bad key through the status code.
///
/// The rest of the admin blueprint (users, events, per-section analytics)
/// sits behind [`AdminApi`]. Those queries fail with a [`QueryError`] that
/// keeps 401, 404 and 5xx apart, since nothing there drives a logout.
pub mod client;

use anyhow::Result;
use thiserror::Error;

use crate::credential::Credential;
use crate::model::{
    AnalyticsEvent, ConversionMetrics, DashboardEnvelope, DashboardPayload, Envelope,
    FunnelAnalysis, HealthStatus, TopProduct, UserPage, UserStats,
};

/// Shown for authorization and transport failures.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to load dashboard - check the client log";

/// Shown when the backend reports failure without saying why.
pub const DEFAULT_APPLICATION_MESSAGE: &str = "Failed to load dashboard data";

/// Why a dashboard refresh did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The backend answered with a non-success HTTP status.
    #[error("dashboard request rejected with HTTP {status}")]
    Authorization { status: u16 },
    /// The backend answered 2xx but reported `success: false`.
    #[error("{0}")]
    Application(String),
    /// The request never completed or the body was unusable.
    #[error("dashboard request failed: {0}")]
    Transport(String),
}

impl RefreshError {
    /// Whether this failure invalidates the stored credential.
    pub fn forces_logout(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Text for the error region.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Application(message) => message,
            Self::Authorization { .. } | Self::Transport(_) => GENERIC_FAILURE_MESSAGE,
        }
    }
}

/// Source of dashboard data.
pub trait DashboardApi {
    /// Fetch the summary for the last `days` days.
    fn fetch_dashboard(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<DashboardPayload, RefreshError>;

    /// Query the backend health endpoint. Needs no credential.
    fn health(&self) -> Result<HealthStatus>;
}

/// Turn a decoded 2xx body into a payload or an error.
pub fn interpret_envelope(
    envelope: DashboardEnvelope,
) -> std::result::Result<DashboardPayload, RefreshError> {
    if !envelope.success {
        let message = envelope
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_APPLICATION_MESSAGE.to_string());
        return Err(RefreshError::Application(message));
    }

    envelope
        .data
        .ok_or_else(|| RefreshError::Transport("success response carried no data".to_string()))
}

// ---------------------------------------------------------------------------
// Admin queries
// ---------------------------------------------------------------------------

/// Why an admin query did not produce data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// 401/403: the stored key is wrong.
    #[error("admin key rejected (HTTP {status})")]
    Unauthorized { status: u16 },
    /// 404, e.g. an unknown user id.
    #[error("{0}")]
    NotFound(String),
    /// Any other non-2xx status.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },
    /// 2xx with `success: false`.
    #[error("{0}")]
    Application(String),
    /// The request never completed or the body was unusable.
    #[error("request failed: {0}")]
    Transport(String),
}

impl QueryError {
    /// Classify a non-2xx response. `message` is the body's `error` field.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.is_empty());
        match status {
            401 | 403 => Self::Unauthorized { status },
            404 => Self::NotFound(message.unwrap_or_else(|| "not found".to_string())),
            _ => Self::Backend {
                status,
                message: message.unwrap_or_else(|| "no details".to_string()),
            },
        }
    }
}

/// The key-protected read endpoints beside `/dashboard`.
pub trait AdminApi {
    /// `GET /analytics/conversion?days=N`
    fn conversion(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<ConversionMetrics, QueryError>;

    /// `GET /analytics/products?days=N&limit=N`
    fn top_products(
        &self,
        days: u32,
        limit: u32,
        credential: &Credential,
    ) -> std::result::Result<Vec<TopProduct>, QueryError>;

    /// `GET /analytics/funnel?days=N`
    fn funnel(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<FunnelAnalysis, QueryError>;

    /// `GET /users?page=N&limit=N`
    fn users(
        &self,
        page: u32,
        limit: u32,
        credential: &Credential,
    ) -> std::result::Result<UserPage, QueryError>;

    /// `GET /users/<id>`
    fn user(
        &self,
        user_id: i64,
        credential: &Credential,
    ) -> std::result::Result<UserStats, QueryError>;

    /// `GET /analytics/events?limit=N[&type=T]`
    fn events(
        &self,
        limit: u32,
        event_type: Option<&str>,
        credential: &Credential,
    ) -> std::result::Result<Vec<AnalyticsEvent>, QueryError>;
}

/// Pull `data` out of a decoded 2xx admin response.
pub fn envelope_data<T>(envelope: Envelope<T>) -> std::result::Result<T, QueryError> {
    if !envelope.success {
        let message = envelope
            .error
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "request failed".to_string());
        return Err(QueryError::Application(message));
    }
    envelope
        .data
        .ok_or_else(|| QueryError::Transport("success response carried no data".to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
