/// HTTP client for the analytics backend.
///
/// Talks to the admin blueprint using the synchronous `ureq` client:
///
/// - `GET {url}/dashboard?days=N&api_key=KEY` for the summary payload.
/// - `GET {url}/health` for the backend health check.
/// - `GET {url}/users`, `/users/<id>`, and `/analytics/*` for admin queries.
///
/// The key travels as a query parameter; `ureq` percent-encodes it.
use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

use super::{AdminApi, DashboardApi, QueryError, RefreshError, envelope_data, interpret_envelope};
use crate::config::schema::ApiConfig;
use crate::credential::Credential;
use crate::model::{
    AnalyticsEvent, ConversionMetrics, DashboardEnvelope, DashboardPayload, Envelope,
    FunnelAnalysis, HealthStatus, TopProduct, UserPage, UserStats, UserSummary,
};

/// Synchronous backend client.
#[derive(Debug, Clone)]
pub struct HttpDashboardApi {
    base_url: String,
    timeout: Duration,
}

impl HttpDashboardApi {
    /// Build a client from the `[api]` section.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.url, Duration::from_millis(config.timeout_ms))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Key-protected GET, decoded as an envelope.
    fn admin_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        credential: &Credential,
    ) -> std::result::Result<Envelope<T>, QueryError> {
        let mut request = ureq::get(&self.endpoint(path)).timeout(self.timeout);
        for (name, value) in params {
            request = request.query(name, value);
        }
        let result = request.query("api_key", credential.as_str()).call();

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<Envelope<serde_json::Value>>()
                    .ok()
                    .and_then(|body| body.error);
                return Err(QueryError::from_status(status, message));
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(QueryError::Transport(transport.to_string()));
            }
        };

        response
            .into_json()
            .map_err(|e| QueryError::Transport(format!("invalid JSON from /{path}: {e}")))
    }
}

impl DashboardApi for HttpDashboardApi {
    fn fetch_dashboard(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<DashboardPayload, RefreshError> {
        let result = ureq::get(&self.endpoint("dashboard"))
            .timeout(self.timeout)
            .query("days", &days.to_string())
            .query("api_key", credential.as_str())
            .call();

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(RefreshError::Authorization { status });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(RefreshError::Transport(transport.to_string()));
            }
        };

        let envelope: DashboardEnvelope = response
            .into_json()
            .map_err(|e| RefreshError::Transport(format!("invalid dashboard JSON: {e}")))?;

        interpret_envelope(envelope)
    }

    fn health(&self) -> Result<HealthStatus> {
        let url = self.endpoint("health");
        let response = match ureq::get(&url).timeout(self.timeout).call() {
            Ok(response) => response,
            // An unhealthy backend answers 500 with the same body shape.
            Err(ureq::Error::Status(_, response)) => response,
            Err(e) => return Err(e).with_context(|| format!("health request to {url} failed")),
        };

        response
            .into_json()
            .context("failed to parse health response")
    }
}

impl AdminApi for HttpDashboardApi {
    fn conversion(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<ConversionMetrics, QueryError> {
        let params = [("days", days.to_string())];
        envelope_data(self.admin_get("analytics/conversion", &params, credential)?)
    }

    fn top_products(
        &self,
        days: u32,
        limit: u32,
        credential: &Credential,
    ) -> std::result::Result<Vec<TopProduct>, QueryError> {
        let params = [("days", days.to_string()), ("limit", limit.to_string())];
        envelope_data(self.admin_get("analytics/products", &params, credential)?)
    }

    fn funnel(
        &self,
        days: u32,
        credential: &Credential,
    ) -> std::result::Result<FunnelAnalysis, QueryError> {
        let params = [("days", days.to_string())];
        envelope_data(self.admin_get("analytics/funnel", &params, credential)?)
    }

    fn users(
        &self,
        page: u32,
        limit: u32,
        credential: &Credential,
    ) -> std::result::Result<UserPage, QueryError> {
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        let envelope: Envelope<Vec<UserSummary>> = self.admin_get("users", &params, credential)?;
        let pagination = envelope.pagination;
        let users = envelope_data(envelope)?;
        Ok(UserPage { users, pagination })
    }

    fn user(
        &self,
        user_id: i64,
        credential: &Credential,
    ) -> std::result::Result<UserStats, QueryError> {
        envelope_data(self.admin_get(&format!("users/{user_id}"), &[], credential)?)
    }

    fn events(
        &self,
        limit: u32,
        event_type: Option<&str>,
        credential: &Credential,
    ) -> std::result::Result<Vec<AnalyticsEvent>, QueryError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(event_type) = event_type {
            params.push(("type", event_type.to_string()));
        }
        envelope_data(self.admin_get("analytics/events", &params, credential)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_from_default_config() {
        let client = HttpDashboardApi::from_config(&ApiConfig::default());
        assert_eq!(client.base_url, "http://127.0.0.1:5000/admin");
        assert_eq!(client.timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpDashboardApi::new("http://shop.local/admin/", Duration::from_secs(1));
        assert_eq!(client.endpoint("dashboard"), "http://shop.local/admin/dashboard");
    }

    #[test]
    fn unreachable_backend_is_transport_failure() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let client = HttpDashboardApi::new("http://127.0.0.1:9/admin", Duration::from_secs(2));
        let cred = Credential::new("k").unwrap();
        let err = client.fetch_dashboard(7, &cred).unwrap_err();
        assert!(matches!(err, RefreshError::Transport(_)));
        assert!(!err.forces_logout());
    }

    #[test]
    fn unreachable_backend_fails_admin_queries_as_transport() {
        let client = HttpDashboardApi::new("http://127.0.0.1:9/admin", Duration::from_secs(2));
        let cred = Credential::new("k").unwrap();
        assert!(matches!(
            client.users(1, 20, &cred),
            Err(QueryError::Transport(_))
        ));
    }
}
