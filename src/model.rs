//! Wire types for the analytics backend.
//!
//! Mirrors the JSON emitted by the admin endpoints. The payload is
//! pre-aggregated server-side; nothing here computes, it only carries.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Dashboard payload
// ---------------------------------------------------------------------------

/// The `data` object of a successful `GET /dashboard` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub conversion_metrics: ConversionMetrics,
    pub funnel_analysis: FunnelAnalysis,
    #[serde(default)]
    pub top_products: Vec<TopProduct>,
    /// ISO-8601 timestamp of when the backend built the summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

/// Headline conversion numbers for the selected window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionMetrics {
    pub conversion_rate: f64,
    pub conversion_events: u64,
    pub total_events: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
}

/// Four-stage funnel: greeting → browsing → consideration → purchase.
///
/// Each `*_conversion` is the percentage carried over from the prior stage.
/// Counts are expected to be non-increasing but the backend does not
/// guarantee it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelAnalysis {
    pub greeting: u64,
    pub browsing: u64,
    pub browsing_conversion: f64,
    pub consideration: u64,
    pub consideration_conversion: f64,
    pub purchase: u64,
    pub purchase_conversion: f64,
}

/// One funnel step, flattened for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunnelStage {
    pub label: &'static str,
    pub value: u64,
    /// `None` for the first stage, which has nothing to convert from.
    pub conversion: Option<f64>,
}

impl FunnelAnalysis {
    /// The stages in journey order.
    pub fn stages(&self) -> [FunnelStage; 4] {
        [
            FunnelStage {
                label: "Greeting",
                value: self.greeting,
                conversion: None,
            },
            FunnelStage {
                label: "Browsing",
                value: self.browsing,
                conversion: Some(self.browsing_conversion),
            },
            FunnelStage {
                label: "Consideration",
                value: self.consideration,
                conversion: Some(self.consideration_conversion),
            },
            FunnelStage {
                label: "Purchase",
                value: self.purchase,
                conversion: Some(self.purchase_conversion),
            },
        ]
    }
}

/// Per-product engagement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_name: String,
    pub total_views: u64,
    pub price_inquiries: u64,
    pub purchase_attempts: u64,
    pub interest_conversion: f64,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Response body shared by the key-protected admin endpoints.
///
/// `success: false` responses carry `error` and no `data`. `period_days`,
/// `count`, and `pagination` appear only on the endpoints that send them.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub period_days: Option<u32>,
    pub count: Option<usize>,
    pub pagination: Option<Pagination>,
}

/// Response body of `GET /dashboard`.
pub type DashboardEnvelope = Envelope<DashboardPayload>;

// ---------------------------------------------------------------------------
// Users and events
// ---------------------------------------------------------------------------

/// Page position reported by `GET /users`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// One row of `GET /users`, most recently active first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_purchases: u64,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_active: Option<String>,
}

/// A page of users plus where it sits in the full list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub pagination: Option<Pagination>,
}

/// `data` of `GET /users/<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub total_conversations: u64,
    #[serde(default)]
    pub total_purchases: u64,
    #[serde(default)]
    pub total_spent: f64,
    #[serde(default)]
    pub conversion_rate: f64,
    #[serde(default)]
    pub top_products: Vec<ProductInterest>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_active: Option<String>,
}

/// A product one user looked at, from their stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInterest {
    pub product_name: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub price_inquiries: u64,
    #[serde(default)]
    pub purchase_attempts: u64,
}

/// One row of `GET /analytics/events`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub metric_id: i64,
    pub user_id: i64,
    pub event_type: String,
    #[serde(default)]
    pub product_viewed: Option<String>,
    #[serde(default)]
    pub is_conversion: bool,
    #[serde(default)]
    pub conversion_value: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub database_connected: bool,
    #[serde(default)]
    pub total_users: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
