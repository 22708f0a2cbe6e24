//! Reconciles the service's answer with the local estimate.
//!
//! The total shown to the user comes from the first source that yields a
//! positive number:
//!
//! 1. the service's numeric total,
//! 2. a total stated in the service's narrative (see [`crate::narrative`]),
//! 3. the local estimate.
//!
//! If none does, there is no total. The chosen source is always reported
//! alongside the value.

use serde::Serialize;

use crate::estimator::EstimationResult;
use crate::model::{Impact, ServerResult};
use crate::narrative::parse_total;

/// Where the displayed total came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedSource {
    Server,
    ParsedNarrative,
    LocalEstimate,
    None,
}

/// What to display for the current period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDisplay {
    /// kg CO2e, absent when no source produced a positive total.
    pub total: Option<f64>,

    pub source: ResolvedSource,

    /// Severity computed from `total` by the fixed thresholds.
    pub impact: Impact,

    /// The service's own label, which may disagree with `impact`.
    pub rating: Option<String>,
}

impl ResolvedDisplay {
    /// Text for the impact badge: the service's label when it gave one.
    pub fn badge_label(&self) -> &str {
        self.rating
            .as_deref()
            .unwrap_or_else(|| self.impact.level.label())
    }
}

/// Resolve the display for an optional service result and the local estimate.
pub fn resolve(server: Option<&ServerResult>, local: &EstimationResult) -> ResolvedDisplay {
    let (total, source) = select_total(server, local);

    ResolvedDisplay {
        total,
        source,
        impact: Impact::classify(total),
        rating: server.and_then(ServerResult::rating).map(str::to_string),
    }
}

fn select_total(
    server: Option<&ServerResult>,
    local: &EstimationResult,
) -> (Option<f64>, ResolvedSource) {
    if let Some(total) = server.and_then(ServerResult::total).filter(|t| *t > 0.0) {
        return (Some(total), ResolvedSource::Server);
    }

    let parsed = server
        .and_then(ServerResult::narrative)
        .and_then(parse_total)
        .map(|found| found.value)
        .filter(|value| *value > 0.0);
    if let Some(total) = parsed {
        return (Some(total), ResolvedSource::ParsedNarrative);
    }

    if local.total > 0.0 {
        return (Some(local.total), ResolvedSource::LocalEstimate);
    }

    (None, ResolvedSource::None)
}

/// Split newline-delimited recommendations into trimmed, non-empty lines.
pub fn split_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::estimate;
    use crate::model::{ActivityInput, ImpactLevel};

    /// A local estimate whose total is `total` (all of it from road travel).
    fn local_total(total: f64) -> EstimationResult {
        estimate(&ActivityInput {
            road_kilometers: total / 0.25,
            ..Default::default()
        })
    }

    fn server(total: Option<f64>, narrative: Option<&str>) -> ServerResult {
        ServerResult {
            total_co2_kg: total,
            narrative: narrative.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_server_total_wins() {
        let result = server(Some(500.0), Some("TOTAL_CO2: 300"));

        let display = resolve(Some(&result), &local_total(100.0));

        assert_eq!(display.total, Some(500.0));
        assert_eq!(display.source, ResolvedSource::Server);
        assert_eq!(display.impact.level, ImpactLevel::Moderate);
    }

    #[test]
    fn test_parsed_narrative_beats_local() {
        let result = server(Some(0.0), Some("Your footprint is 612.5 kg CO2e this month"));

        let display = resolve(Some(&result), &local_total(100.0));

        assert_eq!(display.total, Some(612.5));
        assert_eq!(display.source, ResolvedSource::ParsedNarrative);
    }

    #[test]
    fn test_absent_server_total_uses_narrative() {
        let result = server(None, Some("TOTAL_CO2: 850"));

        let display = resolve(Some(&result), &local_total(100.0));

        assert_eq!(display.total, Some(850.0));
        assert_eq!(display.source, ResolvedSource::ParsedNarrative);
        assert_eq!(display.impact.level, ImpactLevel::High);
    }

    #[test]
    fn test_local_estimate_fallback() {
        let result = server(None, Some("Nice work, keep it up."));

        let display = resolve(Some(&result), &local_total(275.4));

        assert!((display.total.unwrap() - 275.4).abs() < 1e-9);
        assert_eq!(display.source, ResolvedSource::LocalEstimate);
        assert_eq!(display.impact.level, ImpactLevel::Low);
        assert!(display.impact.has_data);
    }

    #[test]
    fn test_zero_narrative_total_falls_back_to_local() {
        let result = server(None, Some("TOTAL_CO2: 0, about 400 kg CO2"));

        let display = resolve(Some(&result), &local_total(50.0));

        assert_eq!(display.source, ResolvedSource::LocalEstimate);
    }

    #[test]
    fn test_nothing_available() {
        let display = resolve(None, &local_total(0.0));

        assert_eq!(display.total, None);
        assert_eq!(display.source, ResolvedSource::None);
        assert_eq!(display.impact.level, ImpactLevel::Low);
        assert!(!display.impact.has_data);
        assert_eq!(display.badge_label(), "LOW");
    }

    #[test]
    fn test_negative_server_total_is_ignored() {
        let result = server(Some(-10.0), None);

        let display = resolve(Some(&result), &local_total(120.0));

        assert_eq!(display.source, ResolvedSource::LocalEstimate);
    }

    #[test]
    fn test_rating_and_level_may_disagree() {
        let result = ServerResult {
            total_co2_kg: Some(900.0),
            impact_rating: Some("LOW".to_string()),
            ..Default::default()
        };

        let display = resolve(Some(&result), &local_total(0.0));

        assert_eq!(display.badge_label(), "LOW");
        assert_eq!(display.impact.level, ImpactLevel::High);
    }

    #[test]
    fn test_badge_falls_back_to_level() {
        let result = server(Some(450.0), None);

        let display = resolve(Some(&result), &local_total(0.0));

        assert_eq!(display.rating, None);
        assert_eq!(display.badge_label(), "MODERATE");
    }

    #[test]
    fn test_split_recommendations() {
        assert_eq!(
            split_recommendations("Use public transit\n\nSwitch to LED bulbs\n"),
            vec!["Use public transit", "Switch to LED bulbs"]
        );
    }

    #[test]
    fn test_split_recommendations_crlf_and_padding() {
        assert_eq!(
            split_recommendations("  - Eat less meat \r\n\r\n   \r\n- Fly less"),
            vec!["- Eat less meat", "- Fly less"]
        );
        assert!(split_recommendations("").is_empty());
    }
}
