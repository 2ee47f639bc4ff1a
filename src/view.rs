//! In-memory model of the dashboard page.
//!
//! The page is a fixed set of regions addressed by [`ElementId`]. The
//! controller mutates it (mode switches, loading flag, error banner, region
//! content); [`Page::to_html`] serializes the whole thing for the local
//! server and `show --format html`.

use std::time::{Duration, Instant};

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::render::RenderedDashboard;

/// Longest delay honored for the refresh timer and the error banner.
pub const MAX_SCHEDULE_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// `now + delay`, with `delay` capped at [`MAX_SCHEDULE_DELAY`] so an
/// oversized setting cannot overflow the clock.
pub fn deadline(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay.min(MAX_SCHEDULE_DELAY)).unwrap_or(now)
}

// ---------------------------------------------------------------------------
// Element ids
// ---------------------------------------------------------------------------

/// Fixed identifiers of the page regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementId {
    AuthSection,
    Dashboard,
    AdminKey,
    ErrorContainer,
    LoadingContainer,
    ContentContainer,
    PeriodSelect,
    MetricsGrid,
    FunnelContainer,
    TopProducts,
}

impl ElementId {
    pub const ALL: [ElementId; 10] = [
        Self::AuthSection,
        Self::Dashboard,
        Self::AdminKey,
        Self::ErrorContainer,
        Self::LoadingContainer,
        Self::ContentContainer,
        Self::PeriodSelect,
        Self::MetricsGrid,
        Self::FunnelContainer,
        Self::TopProducts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthSection => "authSection",
            Self::Dashboard => "dashboard",
            Self::AdminKey => "adminKey",
            Self::ErrorContainer => "errorContainer",
            Self::LoadingContainer => "loadingContainer",
            Self::ContentContainer => "contentContainer",
            Self::PeriodSelect => "periodSelect",
            Self::MetricsGrid => "metricsGrid",
            Self::FunnelContainer => "funnelContainer",
            Self::TopProducts => "topProducts",
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Which view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Unauthenticated,
    Authenticated,
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ErrorBanner {
    message: String,
    expires_at: Instant,
}

/// The dashboard page.
#[derive(Debug, Clone)]
pub struct Page {
    mode: Mode,
    loading: bool,
    content_visible: bool,
    error: Option<ErrorBanner>,
    error_ttl: Duration,
    period_days: u32,
    period_options: Vec<u32>,
    regions: Option<RenderedDashboard>,
    generated_at: Option<String>,
    refresh_interval: Duration,
}

impl Page {
    pub fn new(
        period_days: u32,
        period_options: Vec<u32>,
        error_ttl: Duration,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            mode: Mode::Unauthenticated,
            loading: false,
            content_visible: false,
            error: None,
            error_ttl: error_ttl.min(MAX_SCHEDULE_DELAY),
            period_days,
            period_options,
            regions: None,
            generated_at: None,
            refresh_interval,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True while the dashboard view is the active one.
    pub fn is_dashboard_active(&self) -> bool {
        self.mode == Mode::Authenticated
    }

    pub fn show_auth(&mut self) {
        self.mode = Mode::Unauthenticated;
    }

    pub fn show_dashboard(&mut self) {
        self.mode = Mode::Authenticated;
    }

    pub fn show_loading(&mut self) {
        self.loading = true;
        self.content_visible = false;
    }

    pub fn hide_loading(&mut self) {
        self.loading = false;
        self.content_visible = true;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    // -- Period picker --

    pub fn period_days(&self) -> u32 {
        self.period_days
    }

    pub fn select_period(&mut self, days: u32) {
        self.period_days = days;
    }

    // -- Error region --

    /// Replace the error region content. It clears itself `error_ttl` after
    /// `now` (see [`clear_expired_error`](Self::clear_expired_error)).
    pub fn show_error(&mut self, message: impl Into<String>, now: Instant) {
        self.error = Some(ErrorBanner {
            message: message.into(),
            expires_at: deadline(now, self.error_ttl),
        });
    }

    /// Drop the error once its display window has passed. Returns whether
    /// anything was cleared.
    pub fn clear_expired_error(&mut self, now: Instant) -> bool {
        match &self.error {
            Some(banner) if now >= banner.expires_at => {
                self.error = None;
                true
            }
            _ => false,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|b| b.message.as_str())
    }

    // -- Data regions --

    /// Replace all three data regions.
    pub fn set_regions(&mut self, rendered: RenderedDashboard, generated_at: Option<String>) {
        self.regions = Some(rendered);
        self.generated_at = generated_at;
    }

    // -- Element queries --

    /// Whether the element would be displayed.
    pub fn is_visible(&self, id: ElementId) -> bool {
        let authed = self.is_dashboard_active();
        match id {
            ElementId::AuthSection | ElementId::AdminKey => !authed,
            ElementId::Dashboard | ElementId::PeriodSelect => authed,
            ElementId::ErrorContainer => true,
            ElementId::LoadingContainer => authed && self.loading,
            ElementId::ContentContainer
            | ElementId::MetricsGrid
            | ElementId::FunnelContainer
            | ElementId::TopProducts => authed && self.content_visible,
        }
    }

    /// Inner HTML of a content-bearing element.
    pub fn inner_html(&self, id: ElementId) -> Option<String> {
        match id {
            ElementId::ErrorContainer => Some(self.error_html()),
            ElementId::MetricsGrid => self.regions.as_ref().map(|r| r.metrics.clone()),
            ElementId::FunnelContainer => self.regions.as_ref().map(|r| r.funnel.clone()),
            ElementId::TopProducts => self.regions.as_ref().map(|r| r.top_products.clone()),
            _ => None,
        }
    }

    fn error_html(&self) -> String {
        self.error_markup().into_string()
    }

    fn error_markup(&self) -> Markup {
        html! {
            @if let Some(banner) = &self.error {
                div class="error" { (banner.message) }
            }
        }
    }

    // -- Document --

    /// Serialize the full page as a standalone HTML document.
    pub fn to_html(&self) -> String {
        let authed = self.is_dashboard_active();
        let display = |id: ElementId| {
            if self.is_visible(id) {
                "display: block;"
            } else {
                "display: none;"
            }
        };
        let (metrics, funnel, top_products) = match &self.regions {
            Some(r) => (r.metrics.as_str(), r.funnel.as_str(), r.top_products.as_str()),
            None => ("", "", ""),
        };

        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    @if authed {
                        meta http-equiv="refresh" content=(self.refresh_interval.as_secs().max(1));
                    }
                    title { "Shop Analytics Dashboard" }
                    style { (PreEscaped(PAGE_CSS)) }
                }
                body {
                    div class="app" {
                        header { h1 { "Shop Analytics" } }
                        div id=(ElementId::ErrorContainer.as_str()) { (self.error_markup()) }
                        section id=(ElementId::AuthSection.as_str())
                            style=(display(ElementId::AuthSection)) {
                            form method="post" action="/login" {
                                input id=(ElementId::AdminKey.as_str()) name="adminKey"
                                    type="password" placeholder="Admin key";
                                button type="submit" { "Sign in" }
                            }
                        }
                        section id=(ElementId::Dashboard.as_str())
                            class=(if authed { "dashboard active" } else { "dashboard" }) {
                            div class="toolbar" {
                                form method="get" action="/refresh" {
                                    select id=(ElementId::PeriodSelect.as_str()) name="days"
                                        onchange="this.form.submit()" {
                                        @for &days in &self.period_options {
                                            option value=(days) selected[days == self.period_days] {
                                                "Last " (days) " " (if days == 1 { "day" } else { "days" })
                                            }
                                        }
                                        @if !self.period_options.contains(&self.period_days) {
                                            option value=(self.period_days) selected {
                                                "Last " (self.period_days) " days"
                                            }
                                        }
                                    }
                                    button type="submit" { "Refresh" }
                                }
                                form method="post" action="/logout" {
                                    button type="submit" { "Log out" }
                                }
                            }
                            div id=(ElementId::LoadingContainer.as_str())
                                style=(display(ElementId::LoadingContainer)) { "Loading…" }
                            div id=(ElementId::ContentContainer.as_str())
                                style=(display(ElementId::ContentContainer)) {
                                div id=(ElementId::MetricsGrid.as_str()) class="metrics-grid" {
                                    (PreEscaped(metrics))
                                }
                                h2 { "Conversion Funnel" }
                                div id=(ElementId::FunnelContainer.as_str()) {
                                    (PreEscaped(funnel))
                                }
                                h2 { "Top Products" }
                                div id=(ElementId::TopProducts.as_str()) class="products-grid" {
                                    (PreEscaped(top_products))
                                }
                            }
                            @if let Some(ts) = &self.generated_at {
                                footer { "Generated at " (ts) }
                            }
                        }
                    }
                }
            }
        }
        .into_string()
    }
}

const PAGE_CSS: &str = r#"
body { font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; background: #0d1117; color: #e6edf3; margin: 0; }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
.dashboard { display: none; }
.dashboard.active { display: block; }
.error { background: #3d1d1d; border: 1px solid #f85149; color: #f85149; padding: 10px 14px; border-radius: 8px; margin-bottom: 16px; }
.toolbar { display: flex; gap: 8px; margin-bottom: 16px; }
.metrics-grid, .products-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 16px; }
.metric-card, .product-card { background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px; }
.metric-value { font-size: 28px; font-weight: 700; color: #58a6ff; }
.metric-label, .metric-sub, .stat-label { color: #8b949e; font-size: 12px; }
.funnel-stage { margin-bottom: 12px; }
.funnel-label { display: flex; justify-content: space-between; font-size: 13px; }
.funnel-bar { background: #58a6ff; color: #fff; padding: 4px 8px; border-radius: 4px; min-width: 24px; }
.product-stat { display: flex; justify-content: space-between; }
footer { color: #8b949e; font-size: 12px; margin-top: 24px; }
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Page {
        Page::new(
            7,
            vec![1, 7, 30],
            Duration::from_secs(5),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn element_ids_match_page_contract() {
        let names: Vec<&str> = ElementId::ALL.iter().map(|id| id.as_str()).collect();
        assert_eq!(
            names,
            [
                "authSection",
                "dashboard",
                "adminKey",
                "errorContainer",
                "loadingContainer",
                "contentContainer",
                "periodSelect",
                "metricsGrid",
                "funnelContainer",
                "topProducts",
            ]
        );
    }

    #[test]
    fn new_page_shows_auth() {
        let page = page();
        assert_eq!(page.mode(), Mode::Unauthenticated);
        assert!(page.is_visible(ElementId::AuthSection));
        assert!(!page.is_visible(ElementId::Dashboard));
    }

    #[test]
    fn loading_toggles_content() {
        let mut page = page();
        page.show_dashboard();
        page.show_loading();
        assert!(page.is_visible(ElementId::LoadingContainer));
        assert!(!page.is_visible(ElementId::ContentContainer));

        page.hide_loading();
        assert!(!page.is_visible(ElementId::LoadingContainer));
        assert!(page.is_visible(ElementId::MetricsGrid));
    }

    #[test]
    fn error_clears_after_display_window() {
        let mut page = page();
        let t0 = Instant::now();
        page.show_error("bad key", t0);
        assert_eq!(page.error_message(), Some("bad key"));

        assert!(!page.clear_expired_error(t0 + Duration::from_secs(4)));
        assert_eq!(page.error_message(), Some("bad key"));

        assert!(page.clear_expired_error(t0 + Duration::from_secs(5)));
        assert_eq!(page.error_message(), None);
        assert_eq!(page.inner_html(ElementId::ErrorContainer).unwrap(), "");
    }

    #[test]
    fn newer_error_replaces_older_one() {
        let mut page = page();
        let t0 = Instant::now();
        page.show_error("first", t0);
        page.show_error("second", t0 + Duration::from_secs(3));
        assert!(!page.clear_expired_error(t0 + Duration::from_secs(6)));
        assert_eq!(page.error_message(), Some("second"));
    }

    #[test]
    fn error_html_is_escaped() {
        let mut page = page();
        page.show_error("<b>oops</b>", Instant::now());
        assert_eq!(
            page.inner_html(ElementId::ErrorContainer).unwrap(),
            r#"<div class="error">&lt;b&gt;oops&lt;/b&gt;</div>"#
        );
    }

    #[test]
    fn document_reflects_mode() {
        let mut page = page();
        let html = page.to_html();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"id="authSection" style="display: block;""#));
        assert!(html.contains(r#"class="dashboard""#));
        assert!(!html.contains("http-equiv=\"refresh\""));

        page.show_dashboard();
        let html = page.to_html();
        assert!(html.contains(r#"id="authSection" style="display: none;""#));
        assert!(html.contains(r#"class="dashboard active""#));
        assert!(html.contains(r#"content="30""#));
    }

    #[test]
    fn document_embeds_regions_and_escapes_server_text() {
        let mut page = page();
        page.show_dashboard();
        page.hide_loading();
        page.set_regions(
            RenderedDashboard {
                metrics: r#"<div class="metric-card">m</div>"#.to_string(),
                funnel: String::new(),
                top_products: "<p>No product data available</p>".to_string(),
            },
            Some("<2026-10-19>".to_string()),
        );
        let html = page.to_html();
        assert!(html.contains(
            r#"<div id="metricsGrid" class="metrics-grid"><div class="metric-card">m</div></div>"#
        ));
        assert!(html.contains("<footer>Generated at &lt;2026-10-19&gt;</footer>"));
        assert!(html.contains(r#"id="contentContainer" style="display: block;""#));
    }

    #[test]
    fn oversized_error_ttl_is_capped() {
        let mut page = Page::new(7, vec![7], Duration::MAX, Duration::from_secs(30));
        let t0 = Instant::now();
        page.show_error("slow", t0);
        assert!(!page.clear_expired_error(t0 + Duration::from_secs(3600)));
        assert!(page.clear_expired_error(t0 + MAX_SCHEDULE_DELAY));
    }

    #[test]
    fn document_marks_selected_period() {
        let mut page = page();
        page.select_period(30);
        let html = page.to_html();
        assert!(html.contains(r#"<option value="30" selected>Last 30 days</option>"#));
        assert!(html.contains(r#"<option value="1">Last 1 day</option>"#));

        page.select_period(14);
        assert!(page.to_html().contains(r#"<option value="14" selected>"#));
    }
}
