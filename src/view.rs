//! Display projections.
//!
//! These types carry everything a page needs to render the results card,
//! the breakdown and the history list, with numbers already formatted.
//! Rounding happens here and nowhere else.

use serde::Serialize;

use crate::estimator::{Category, EstimationResult};
use crate::model::{HistoryEntry, Impact, ServerResult};
use crate::resolver::{ResolvedDisplay, ResolvedSource, split_recommendations};

/// Placeholder for a missing value.
pub const MISSING: &str = "—";

/// Format a total as `612.5 kg CO₂e`, or the placeholder when absent.
pub fn format_total(total: Option<f64>) -> String {
    match total {
        Some(value) => format!("{:.1} kg CO\u{2082}e", value),
        None => MISSING.to_string(),
    }
}

/// Format a period as `MM/YYYY`.
pub fn format_period(month: Option<u32>, year: Option<i32>) -> String {
    let month = month.map_or_else(|| MISSING.to_string(), |m| format!("{:02}", m));
    let year = year.map_or_else(|| MISSING.to_string(), |y| y.to_string());
    format!("{}/{}", month, year)
}

/// One segment of the breakdown bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
    pub category: Category,
    pub label: &'static str,
    pub value: f64,

    /// Value in kg, one decimal.
    pub value_text: String,

    /// Share of the local total, 0-100.
    pub percent: f64,

    /// Share as a whole percentage, e.g. `42%`.
    pub percent_text: String,
}

/// Rows for categories that contribute something.
///
/// Empty when the local total is not positive.
pub fn breakdown_rows(estimate: &EstimationResult) -> Vec<BreakdownRow> {
    if estimate.is_empty() {
        return Vec::new();
    }

    estimate
        .items
        .iter()
        .filter(|item| item.value > 0.0)
        .map(|item| {
            let percent = item.value / estimate.total * 100.0;
            BreakdownRow {
                category: item.category,
                label: item.label,
                value: item.value,
                value_text: format!("{:.1} kg", item.value),
                percent,
                percent_text: format!("{:.0}%", percent),
            }
        })
        .collect()
}

/// The results card for a completed calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub total: Option<f64>,
    pub total_text: String,
    pub source: ResolvedSource,
    pub impact: Impact,
    pub impact_tone: &'static str,

    /// Service rating, or the computed level when the service gave none.
    pub badge: String,

    pub narrative: Option<String>,
    pub recommendations: Vec<String>,
    pub breakdown: Vec<BreakdownRow>,
}

impl ResultView {
    pub fn new(
        result: &ServerResult,
        display: &ResolvedDisplay,
        estimate: &EstimationResult,
    ) -> Self {
        Self {
            total: display.total,
            total_text: format_total(display.total),
            source: display.source,
            impact: display.impact,
            impact_tone: display.impact.tone(),
            badge: display.badge_label().to_string(),
            narrative: result.narrative().map(str::to_string),
            recommendations: result
                .recommendations_text
                .as_deref()
                .map(split_recommendations)
                .unwrap_or_default(),
            breakdown: breakdown_rows(estimate),
        }
    }
}

/// One row of the history list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: Option<String>,
    pub period: String,
    pub user_id: String,
    pub total: Option<f64>,
    pub total_text: String,
    pub impact: Impact,
    pub impact_tone: &'static str,
    pub badge: String,
    pub deletable: bool,
}

impl HistoryRow {
    /// Project an entry; `fallback_user` is shown when the entry has no user.
    pub fn new(entry: &HistoryEntry, fallback_user: &str) -> Self {
        let impact = Impact::classify(entry.total_co2_kg);

        Self {
            id: entry.id.clone(),
            period: format_period(entry.month, entry.year),
            user_id: entry
                .user_id
                .clone()
                .filter(|user| !user.is_empty())
                .unwrap_or_else(|| fallback_user.to_string()),
            total: entry.total_co2_kg,
            total_text: format_total(entry.total_co2_kg),
            impact,
            impact_tone: impact.tone(),
            badge: entry
                .rating()
                .unwrap_or_else(|| impact.level.label())
                .to_string(),
            deletable: entry.id.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate;
    use crate::model::{ActivityInput, ImpactLevel};
    use crate::resolver::resolve;

    #[test]
    fn test_format_total() {
        assert_eq!(format_total(Some(612.54)), "612.5 kg CO₂e");
        assert_eq!(format_total(Some(0.0)), "0.0 kg CO₂e");
        assert_eq!(format_total(None), "—");
    }

    #[test]
    fn test_format_period() {
        assert_eq!(format_period(Some(3), Some(2025)), "03/2025");
        assert_eq!(format_period(Some(11), Some(2024)), "11/2024");
        assert_eq!(format_period(None, Some(2024)), "—/2024");
    }

    #[test]
    fn test_breakdown_rows_skip_zero_categories() {
        let local = estimate(&ActivityInput {
            road_kilometers: 400.0,
            meals_meat: 20.0,
            ..Default::default()
        });

        let rows = breakdown_rows(&local);

        // 100 + 90 = 190
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, Category::Road);
        assert_eq!(rows[0].value_text, "100.0 kg");
        assert_eq!(rows[0].percent_text, "53%");
        assert_eq!(rows[1].category, Category::MeatMeals);
        assert_eq!(rows[1].percent_text, "47%");
    }

    #[test]
    fn test_breakdown_empty_without_total() {
        assert!(breakdown_rows(&estimate(&ActivityInput::default())).is_empty());
    }

    #[test]
    fn test_result_view() {
        let result = ServerResult {
            total_co2_kg: Some(512.34),
            narrative: Some("A moderate month.".to_string()),
            recommendations_text: Some("Use public transit\n\nSwitch to LED bulbs\n".to_string()),
            ..Default::default()
        };
        let local = estimate(&ActivityInput {
            road_kilometers: 100.0,
            ..Default::default()
        });
        let display = resolve(Some(&result), &local);

        let view = ResultView::new(&result, &display, &local);

        assert_eq!(view.total_text, "512.3 kg CO₂e");
        assert_eq!(view.source, ResolvedSource::Server);
        assert_eq!(view.badge, "MODERATE");
        assert_eq!(view.impact_tone, "moderate");
        assert_eq!(view.narrative.as_deref(), Some("A moderate month."));
        assert_eq!(
            view.recommendations,
            vec!["Use public transit", "Switch to LED bulbs"]
        );
        assert_eq!(view.breakdown.len(), 1);
        assert_eq!(view.breakdown[0].percent_text, "100%");
    }

    #[test]
    fn test_history_row() {
        let entry = HistoryEntry {
            user_id: None,
            month: Some(4),
            year: Some(2025),
            total_co2_kg: Some(820.0),
            impact_rating: None,
            id: Some("abc".to_string()),
        };

        let row = HistoryRow::new(&entry, "user-001");

        assert_eq!(row.period, "04/2025");
        assert_eq!(row.user_id, "user-001");
        assert_eq!(row.total_text, "820.0 kg CO₂e");
        assert_eq!(row.impact.level, ImpactLevel::High);
        assert_eq!(row.badge, "HIGH");
        assert!(row.deletable);
    }

    #[test]
    fn test_history_row_keeps_service_rating() {
        let entry = HistoryEntry {
            user_id: Some("user-002".to_string()),
            total_co2_kg: Some(120.0),
            impact_rating: Some("VERY LOW".to_string()),
            ..Default::default()
        };

        let row = HistoryRow::new(&entry, "user-001");

        assert_eq!(row.user_id, "user-002");
        assert_eq!(row.badge, "VERY LOW");
        assert_eq!(row.impact.level, ImpactLevel::Low);
        assert!(!row.deletable);
    }

    #[test]
    fn test_history_row_without_total() {
        let row = HistoryRow::new(&HistoryEntry::default(), "user-001");

        assert_eq!(row.total_text, "—");
        assert_eq!(row.impact_tone, "neutral");
        assert_eq!(row.badge, "LOW");
    }
}
