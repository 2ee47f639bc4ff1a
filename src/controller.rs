//! The dashboard controller.
//!
//! [`DashboardClient`] owns the session, the page, and the backend handle,
//! and implements the user-facing operations: authenticate, logout, refresh,
//! and the periodic timer tick. All operations take `&mut self`, so a manual
//! refresh and a timer refresh can never interleave; whichever completes
//! last owns the page.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::api::{DashboardApi, RefreshError};
use crate::config::schema::DashboardConfig;
use crate::credential::{Credential, CredentialStore, Session};
use crate::logging::EventLog;
use crate::model::DashboardPayload;
use crate::render::render_dashboard;
use crate::view::{MAX_SCHEDULE_DELAY, Page, deadline};

/// Shown when `authenticate` is called with an empty key.
pub const EMPTY_KEY_MESSAGE: &str = "Please enter admin key";

/// What a refresh did.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The payload was fetched and the regions re-rendered. The payload is
    /// handed back for callers that present it another way (CLI table).
    Rendered(DashboardPayload),
    /// No credential; the auth view is showing and nothing was requested.
    NotAuthenticated,
    /// The request failed. If the error forces logout, the session is gone.
    Failed(RefreshError),
}

/// What `authenticate` did.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthOutcome {
    /// Empty key; nothing changed beyond the error region.
    Rejected,
    /// Key stored, dashboard shown, and the first refresh ran.
    Accepted(RefreshOutcome),
}

/// Single-page dashboard client.
pub struct DashboardClient<A, S> {
    api: A,
    session: Session<S>,
    page: Page,
    log: EventLog,
    refresh_interval: Duration,
    next_refresh: Instant,
}

impl<A: DashboardApi, S: CredentialStore> DashboardClient<A, S> {
    /// Build a client, loading any persisted credential from `store`.
    ///
    /// The page starts in the view matching the stored state. Call
    /// [`start`](Self::start) to issue the initial refresh.
    pub fn new(api: A, store: S, config: &DashboardConfig, log: EventLog) -> Result<Self> {
        let session = Session::init(store)?;
        let refresh_interval =
            Duration::from_secs(config.refresh_interval_secs.max(1)).min(MAX_SCHEDULE_DELAY);

        let mut page = Page::new(
            config.default_days,
            config.period_options.clone(),
            Duration::from_secs(config.error_display_secs),
            refresh_interval,
        );
        if session.is_authenticated() {
            page.show_dashboard();
        }

        Ok(Self {
            api,
            session,
            page,
            log,
            refresh_interval,
            next_refresh: deadline(Instant::now(), refresh_interval),
        })
    }

    /// Initial load: refresh right away when a credential was restored.
    pub fn start(&mut self) -> Result<Option<RefreshOutcome>> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        self.log.info("restored saved admin key");
        self.refresh_dashboard().map(Some)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.session.credential()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn store(&self) -> &S {
        self.session.store()
    }

    /// Change the period picker. Takes effect on the next refresh.
    pub fn select_period(&mut self, days: u32) {
        self.page.select_period(days);
    }

    // -- Operations --

    /// Adopt `input_key` as the credential and load the dashboard.
    ///
    /// The key is not checked here; a wrong key surfaces as an
    /// authorization failure on the refresh.
    pub fn authenticate(&mut self, input_key: &str) -> Result<AuthOutcome> {
        let Some(credential) = Credential::new(input_key) else {
            self.page.show_error(EMPTY_KEY_MESSAGE, Instant::now());
            self.log.debug("authenticate rejected: empty key");
            return Ok(AuthOutcome::Rejected);
        };

        self.session.establish(credential)?;
        self.page.show_dashboard();
        self.log.info("admin key stored");

        self.refresh_dashboard().map(AuthOutcome::Accepted)
    }

    /// Forget the credential and return to the auth view.
    pub fn logout(&mut self) -> Result<()> {
        // Switch views first so a storage failure still leaves the page
        // signed out.
        self.page.show_auth();
        let result = self.session.teardown();
        self.log.info("logged out");
        result
    }

    /// Fetch the payload for the selected period and re-render.
    pub fn refresh_dashboard(&mut self) -> Result<RefreshOutcome> {
        let Some(credential) = self.session.credential().cloned() else {
            self.page.show_auth();
            return Ok(RefreshOutcome::NotAuthenticated);
        };

        let days = self.page.period_days();
        self.page.show_loading();

        let started = Instant::now();
        let result = self.api.fetch_dashboard(days, &credential);
        let latency_ms = started.elapsed().as_millis();

        match result {
            Ok(payload) => {
                let rendered = render_dashboard(&payload);
                self.page.set_regions(rendered, payload.generated_at.clone());
                self.page.hide_loading();
                self.log.info(&format!(
                    "refresh days={days} outcome=rendered products={} latency_ms={latency_ms}",
                    payload.top_products.len()
                ));
                Ok(RefreshOutcome::Rendered(payload))
            }
            Err(err) => {
                self.page.show_error(err.user_message(), Instant::now());
                self.log.warn(&format!(
                    "refresh days={days} outcome=failed error=\"{err}\" latency_ms={latency_ms}"
                ));
                if err.forces_logout()
                    && let Err(e) = self.logout()
                {
                    // The page is already signed out; keep the refresh result.
                    self.log.error(&format!("failed to clear stored key: {e:#}"));
                }
                Ok(RefreshOutcome::Failed(err))
            }
        }
    }

    /// Timer entry point.
    ///
    /// Clears an expired error and, when the refresh interval has elapsed
    /// while the dashboard view is active, refreshes. The schedule is fixed:
    /// manual refreshes do not push the next timer refresh back.
    pub fn tick(&mut self, now: Instant) -> Result<Option<RefreshOutcome>> {
        self.page.clear_expired_error(now);

        if now < self.next_refresh {
            return Ok(None);
        }
        self.next_refresh = deadline(self.next_refresh, self.refresh_interval);
        if self.next_refresh <= now {
            // Fell behind (suspended process, slow request); skip the
            // missed slots instead of firing them back to back.
            self.next_refresh = deadline(now, self.refresh_interval);
        }

        if !(self.session.is_authenticated() && self.page.is_dashboard_active()) {
            return Ok(None);
        }

        self.log.debug("timer refresh");
        self.refresh_dashboard().map(Some)
    }

    /// When the timer next wants to run.
    pub fn next_refresh(&self) -> Instant {
        self.next_refresh
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
