/// Dashboard controller behavior: authentication, logout, refresh outcomes,
/// and what ends up on the page.
///
/// Uses a fake backend so every test is deterministic; the HTTP client is
/// covered separately in `http_client_tests.rs`.
use std::cell::Cell;

use shopdash::api::{DashboardApi, GENERIC_FAILURE_MESSAGE, RefreshError};
use shopdash::config::schema::DashboardConfig;
use shopdash::controller::{AuthOutcome, DashboardClient, EMPTY_KEY_MESSAGE, RefreshOutcome};
use shopdash::credential::{CREDENTIAL_KEY, Credential, CredentialStore, FileStore, MemoryStore};
use shopdash::logging::EventLog;
use shopdash::model::{ConversionMetrics, DashboardPayload, FunnelAnalysis, HealthStatus};
use shopdash::render::NO_PRODUCTS_PLACEHOLDER;
use shopdash::view::{ElementId, Mode};

/// Backend returning the same result for every request.
struct FakeApi {
    result: Result<DashboardPayload, RefreshError>,
    calls: Cell<usize>,
}

impl FakeApi {
    fn ok() -> Self {
        Self::with(Ok(payload()))
    }

    fn with(result: Result<DashboardPayload, RefreshError>) -> Self {
        Self {
            result,
            calls: Cell::new(0),
        }
    }
}

impl DashboardApi for FakeApi {
    fn fetch_dashboard(
        &self,
        _days: u32,
        _credential: &Credential,
    ) -> Result<DashboardPayload, RefreshError> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }

    fn health(&self) -> anyhow::Result<HealthStatus> {
        anyhow::bail!("not used")
    }
}

fn payload() -> DashboardPayload {
    DashboardPayload {
        conversion_metrics: ConversionMetrics {
            conversion_rate: 12.5,
            conversion_events: 10,
            total_events: 80,
            total_revenue: 500.0,
            average_order_value: 50.0,
        },
        funnel_analysis: FunnelAnalysis {
            greeting: 100,
            browsing: 80,
            browsing_conversion: 80.0,
            consideration: 40,
            consideration_conversion: 50.0,
            purchase: 10,
            purchase_conversion: 25.0,
        },
        top_products: Vec::new(),
        generated_at: Some("2026-10-19T08:00:00".to_string()),
    }
}

fn client_with(api: FakeApi) -> DashboardClient<FakeApi, MemoryStore> {
    DashboardClient::new(
        api,
        MemoryStore::new(),
        &DashboardConfig::default(),
        EventLog::disabled(),
    )
    .unwrap()
}

fn stored_key<A: DashboardApi>(client: &DashboardClient<A, MemoryStore>) -> Option<String> {
    client.store().get(CREDENTIAL_KEY).unwrap()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[test]
fn empty_key_is_rejected_without_state_change() {
    let mut client = client_with(FakeApi::ok());

    assert_eq!(client.authenticate("").unwrap(), AuthOutcome::Rejected);
    assert!(!client.is_authenticated());
    assert_eq!(stored_key(&client), None);
    assert_eq!(client.page().mode(), Mode::Unauthenticated);
    assert!(!client.page().is_visible(ElementId::Dashboard));
    assert_eq!(client.page().error_message(), Some(EMPTY_KEY_MESSAGE));
}

#[test]
fn empty_key_does_not_replace_existing_session() {
    let mut client = client_with(FakeApi::ok());
    client.authenticate("first").unwrap();
    client.authenticate("").unwrap();
    assert_eq!(client.credential().unwrap().as_str(), "first");
    assert_eq!(stored_key(&client).as_deref(), Some("first"));
}

#[test]
fn non_empty_keys_are_stored_verbatim() {
    for key in ["k", "  spaced  ", "ünïcode-🔑", "a&b=c"] {
        let mut client = client_with(FakeApi::ok());
        client.authenticate(key).unwrap();
        assert_eq!(client.credential().unwrap().as_str(), key);
        assert_eq!(stored_key(&client).as_deref(), Some(key));
        assert_eq!(client.page().mode(), Mode::Authenticated);
    }
}

#[test]
fn authenticate_triggers_immediate_refresh() {
    let mut client = client_with(FakeApi::ok());
    let outcome = client.authenticate("k").unwrap();
    assert!(matches!(
        outcome,
        AuthOutcome::Accepted(RefreshOutcome::Rendered(_))
    ));
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

#[test]
fn logout_clears_signed_in_session() {
    let mut client = client_with(FakeApi::ok());
    client.authenticate("k").unwrap();

    client.logout().unwrap();
    assert!(client.credential().is_none());
    assert_eq!(stored_key(&client), None);
    assert_eq!(client.page().mode(), Mode::Unauthenticated);
    assert!(client.page().is_visible(ElementId::AuthSection));
}

#[test]
fn logout_when_signed_out_is_harmless() {
    let mut client = client_with(FakeApi::ok());
    client.logout().unwrap();
    client.logout().unwrap();
    assert!(client.credential().is_none());
    assert_eq!(client.page().mode(), Mode::Unauthenticated);
}

// ---------------------------------------------------------------------------
// Refresh outcomes
// ---------------------------------------------------------------------------

#[test]
fn refresh_without_key_shows_auth_and_skips_request() {
    let mut client = client_with(FakeApi::ok());
    assert_eq!(
        client.refresh_dashboard().unwrap(),
        RefreshOutcome::NotAuthenticated
    );
    assert_eq!(client.page().mode(), Mode::Unauthenticated);
}

#[test]
fn successful_refresh_renders_all_regions() {
    let mut client = client_with(FakeApi::ok());
    client.authenticate("k").unwrap();

    let page = client.page();
    assert!(!page.is_loading());
    assert!(page.is_visible(ElementId::ContentContainer));

    let metrics = page.inner_html(ElementId::MetricsGrid).unwrap();
    for needle in ["12.5%", "10 conversions", "80", "$500", "AOV: $50"] {
        assert!(metrics.contains(needle), "metrics missing {needle}");
    }

    let funnel = page.inner_html(ElementId::FunnelContainer).unwrap();
    assert!(funnel.contains("width: 100%;"));
    assert!(funnel.contains("width: 10%;"));

    assert_eq!(
        page.inner_html(ElementId::TopProducts).unwrap(),
        NO_PRODUCTS_PLACEHOLDER
    );
    assert!(page.to_html().contains("Generated at 2026-10-19T08:00:00"));
}

#[test]
fn authorization_failure_logs_out() {
    let mut client = client_with(FakeApi::with(Err(RefreshError::Authorization {
        status: 403,
    })));

    client.authenticate("stale").unwrap();

    assert!(client.credential().is_none());
    assert_eq!(stored_key(&client), None);
    assert_eq!(client.page().mode(), Mode::Unauthenticated);
    assert_eq!(client.page().error_message(), Some(GENERIC_FAILURE_MESSAGE));
}

#[test]
fn application_failure_keeps_credential() {
    let mut client = client_with(FakeApi::with(Err(RefreshError::Application(
        "bad key".to_string(),
    ))));

    let outcome = client.authenticate("k").unwrap();

    assert!(matches!(
        outcome,
        AuthOutcome::Accepted(RefreshOutcome::Failed(RefreshError::Application(_)))
    ));
    assert_eq!(client.page().error_message(), Some("bad key"));
    assert_eq!(client.credential().unwrap().as_str(), "k");
    assert_eq!(stored_key(&client).as_deref(), Some("k"));
    assert_eq!(client.page().mode(), Mode::Authenticated);
}

#[test]
fn transport_failure_keeps_credential_even_with_unauthorized_text() {
    let mut client = client_with(FakeApi::with(Err(RefreshError::Transport(
        "Unauthorized".to_string(),
    ))));

    client.authenticate("k").unwrap();

    assert!(client.is_authenticated());
    assert_eq!(client.page().error_message(), Some(GENERIC_FAILURE_MESSAGE));
}

// ---------------------------------------------------------------------------
// Persistence across runs
// ---------------------------------------------------------------------------

#[test]
fn file_store_restores_session_on_next_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let mut first = DashboardClient::new(
            FakeApi::ok(),
            FileStore::new(&path),
            &DashboardConfig::default(),
            EventLog::disabled(),
        )
        .unwrap();
        first.authenticate("persisted").unwrap();
    }

    let mut second = DashboardClient::new(
        FakeApi::ok(),
        FileStore::new(&path),
        &DashboardConfig::default(),
        EventLog::disabled(),
    )
    .unwrap();
    assert_eq!(second.page().mode(), Mode::Authenticated);
    assert!(matches!(
        second.start().unwrap(),
        Some(RefreshOutcome::Rendered(_))
    ));

    second.logout().unwrap();
    let third = DashboardClient::new(
        FakeApi::ok(),
        FileStore::new(&path),
        &DashboardConfig::default(),
        EventLog::disabled(),
    )
    .unwrap();
    assert!(!third.is_authenticated());
}
