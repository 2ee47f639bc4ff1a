//! HTML projection of the dashboard payload.
//!
//! Pure functions: each takes one section of the payload and returns the
//! complete inner HTML for its region. Output is a full replacement of the
//! region, so rendering the same payload twice yields the same page.
//! Markup is built with `maud`, which escapes every spliced value.

use maud::html;

use crate::model::{ConversionMetrics, DashboardPayload, FunnelAnalysis, TopProduct};

/// Exact content of the products region when there is nothing to show.
pub const NO_PRODUCTS_PLACEHOLDER: &str = "<p>No product data available</p>";

/// Rendered inner HTML for the three data regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDashboard {
    pub metrics: String,
    pub funnel: String,
    pub top_products: String,
}

/// Render every region of the payload.
pub fn render_dashboard(payload: &DashboardPayload) -> RenderedDashboard {
    RenderedDashboard {
        metrics: render_metrics(&payload.conversion_metrics),
        funnel: render_funnel(&payload.funnel_analysis),
        top_products: render_top_products(&payload.top_products),
    }
}

/// Three cards: conversion rate, event volume, revenue.
pub fn render_metrics(metrics: &ConversionMetrics) -> String {
    html! {
        div class="metric-card" {
            div class="metric-label" { "Conversion Rate" }
            div class="metric-value" { (format_number(metrics.conversion_rate)) "%" }
            div class="metric-sub" { (metrics.conversion_events) " conversions" }
        }
        div class="metric-card" {
            div class="metric-label" { "Total Events" }
            div class="metric-value" { (metrics.total_events) }
            div class="metric-sub" { "User interactions" }
        }
        div class="metric-card" {
            div class="metric-label" { "Total Revenue" }
            div class="metric-value" { "$" (format_number(metrics.total_revenue)) }
            div class="metric-sub" { "AOV: $" (format_number(metrics.average_order_value)) }
        }
    }
    .into_string()
}

/// One bar per stage, width relative to the largest stage.
///
/// When every stage is zero all bars render at `0%`.
pub fn render_funnel(funnel: &FunnelAnalysis) -> String {
    let stages = funnel.stages();
    let max_value = stages.iter().map(|s| s.value).max().unwrap_or(0);

    html! {
        @for stage in &stages {
            div class="funnel-stage" {
                div class="funnel-label" {
                    span { (stage.label) }
                    span {
                        (stage.value) " users"
                        @if let Some(conv) = stage.conversion.filter(|c| *c != 0.0) {
                            " (" (format_number(conv)) "% conv.)"
                        }
                    }
                }
                div class="funnel-bar"
                    style={ "width: " (format_number(bar_width_pct(stage.value, max_value))) "%;" } {
                    (stage.value)
                }
            }
        }
    }
    .into_string()
}

/// One card per product, or [`NO_PRODUCTS_PLACEHOLDER`].
pub fn render_top_products(products: &[TopProduct]) -> String {
    html! {
        @if products.is_empty() {
            p { "No product data available" }
        }
        @for product in products {
            div class="product-card" {
                div class="product-name" { "📦 " (product.product_name) }
                div class="product-stat" {
                    span class="stat-label" { "Views:" }
                    span class="stat-value" { (product.total_views) }
                }
                div class="product-stat" {
                    span class="stat-label" { "Price Inquiries:" }
                    span class="stat-value" { (product.price_inquiries) }
                }
                div class="product-stat" {
                    span class="stat-label" { "Purchase Attempts:" }
                    span class="stat-value" { (product.purchase_attempts) }
                }
                div class="product-stat" {
                    span class="stat-label" { "Interest → Action:" }
                    span class="stat-value" { (format_number(product.interest_conversion)) "%" }
                }
            }
        }
    }
    .into_string()
}

/// Bar width as a percentage of `max`. Zero when `max` is zero.
pub fn bar_width_pct(value: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (value as f64 / max as f64) * 100.0
}

/// Format a number the way the dashboard has always shown them: integral
/// values without a fraction (`500`, not `500.0`), others in shortest
/// round-trip form (`12.5`).
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // Also folds -0.0.
        return "0".to_string();
    }
    format!("{value}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> ConversionMetrics {
        ConversionMetrics {
            conversion_rate: 12.5,
            conversion_events: 10,
            total_events: 80,
            total_revenue: 500.0,
            average_order_value: 50.0,
        }
    }

    fn sample_funnel() -> FunnelAnalysis {
        FunnelAnalysis {
            greeting: 100,
            browsing: 80,
            browsing_conversion: 80.0,
            consideration: 40,
            consideration_conversion: 50.0,
            purchase: 10,
            purchase_conversion: 25.0,
        }
    }

    fn product(name: &str) -> TopProduct {
        TopProduct {
            product_name: name.to_string(),
            total_views: 42,
            price_inquiries: 9,
            purchase_attempts: 3,
            interest_conversion: 7.14,
        }
    }

    /// Return the inner text of the first funnel bar following `label`.
    fn bar_style_after(html: &str, label: &str) -> String {
        let start = html.find(&format!("<span>{label}</span>")).unwrap();
        let rest = &html[start..];
        let style = rest.find("style=\"").unwrap() + "style=\"".len();
        let end = rest[style..].find('"').unwrap();
        rest[style..style + end].to_string()
    }

    #[test]
    fn metrics_show_rate_totals_and_revenue() {
        let html = render_metrics(&sample_metrics());
        assert!(html.contains("12.5%"));
        assert!(html.contains("10 conversions"));
        assert!(html.contains(">80<"));
        assert!(html.contains("$500"));
        assert!(html.contains("AOV: $50"));
        assert!(!html.contains("500.0"));
        assert_eq!(html.matches("metric-card").count(), 3);
    }

    #[test]
    fn funnel_widths_are_relative_to_largest_stage() {
        let html = render_funnel(&sample_funnel());
        assert_eq!(bar_style_after(&html, "Greeting"), "width: 100%;");
        assert_eq!(bar_style_after(&html, "Browsing"), "width: 80%;");
        assert_eq!(bar_style_after(&html, "Consideration"), "width: 40%;");
        assert_eq!(bar_style_after(&html, "Purchase"), "width: 10%;");
    }

    #[test]
    fn funnel_shows_conversion_for_later_stages_only() {
        let html = render_funnel(&sample_funnel());
        assert!(html.contains("100 users</span>"));
        assert!(html.contains("80 users (80% conv.)"));
        assert!(html.contains("10 users (25% conv.)"));
    }

    #[test]
    fn funnel_hides_zero_conversion() {
        let mut funnel = sample_funnel();
        funnel.purchase = 0;
        funnel.purchase_conversion = 0.0;
        let html = render_funnel(&funnel);
        assert!(html.contains("0 users</span>"));
        assert!(!html.contains("(0% conv.)"));
    }

    #[test]
    fn all_zero_funnel_renders_empty_bars() {
        let funnel = FunnelAnalysis {
            greeting: 0,
            browsing: 0,
            browsing_conversion: 0.0,
            consideration: 0,
            consideration_conversion: 0.0,
            purchase: 0,
            purchase_conversion: 0.0,
        };
        let html = render_funnel(&funnel);
        assert_eq!(html.matches("width: 0%;").count(), 4);
        assert!(!html.contains("NaN"));
    }

    #[test]
    fn empty_products_render_placeholder_only() {
        let html = render_top_products(&[]);
        assert_eq!(html, NO_PRODUCTS_PLACEHOLDER);
        assert!(!html.contains("product-card"));
    }

    #[test]
    fn products_render_one_card_each_in_order() {
        let html = render_top_products(&[product("Earbuds"), product("Smart Watch")]);
        assert_eq!(html.matches("class=\"product-card\"").count(), 2);
        assert!(html.find("Earbuds").unwrap() < html.find("Smart Watch").unwrap());
        assert!(html.contains("7.14%"));
        assert!(html.contains(r#"<span class="stat-value">42</span>"#));
    }

    #[test]
    fn product_names_with_quotes_and_ampersands_are_escaped() {
        let html = render_top_products(&[product(r#"Salt & "Pepper""#)]);
        assert!(html.contains("Salt &amp; &quot;Pepper&quot;"));
    }

    #[test]
    fn product_names_are_escaped() {
        let html = render_top_products(&[product("<script>alert(1)</script>")]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("📦 &lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn rendering_is_idempotent() {
        let payload = DashboardPayload {
            conversion_metrics: sample_metrics(),
            funnel_analysis: sample_funnel(),
            top_products: vec![product("Earbuds")],
            generated_at: None,
        };
        assert_eq!(render_dashboard(&payload), render_dashboard(&payload));
    }

    #[test]
    fn format_number_matches_dashboard_conventions() {
        assert_eq!(format_number(500.0), "500");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn bar_width_guards_zero_max() {
        assert_eq!(bar_width_pct(0, 0), 0.0);
        assert_eq!(bar_width_pct(10, 100), 10.0);
        assert_eq!(bar_width_pct(100, 100), 100.0);
    }
}
