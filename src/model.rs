//! Data models for Footprint.
//!
//! Two families of types live here:
//!
//! - Domain inputs ([`ActivityInput`], [`ActivityForm`]) and the impact
//!   classification ([`ImpactLevel`], [`Impact`]).
//! - Wire types exchanged with the calculation service
//!   ([`CalculationRequest`], [`ServerResult`], [`HistoryEntry`]).
//!
//! The service is an external collaborator, so its responses are read
//! leniently: a field of an unexpected JSON type is treated as absent
//! instead of failing the whole response.

use serde::{Deserialize, Serialize};

/// Threshold at which a monthly total becomes [`ImpactLevel::Moderate`].
pub const MODERATE_THRESHOLD_KG: f64 = 400.0;

/// Threshold at which a monthly total becomes [`ImpactLevel::High`].
pub const HIGH_THRESHOLD_KG: f64 = 800.0;

/// One month of household activity, as numbers.
///
/// Values are taken as given: negative quantities are neither rejected nor
/// clamped, so they reduce the estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInput {
    /// Distance travelled by road, in kilometers.
    #[serde(default)]
    pub road_kilometers: f64,

    /// Distance flown, in kilometers.
    #[serde(default)]
    pub flight_kilometers: f64,

    /// Electricity consumed, in units (kWh).
    #[serde(default)]
    pub electricity_units: f64,

    /// Whether the electricity comes from a renewable supply.
    #[serde(default)]
    pub uses_renewable_energy: bool,

    /// Cooking gas cylinders consumed.
    #[serde(default)]
    pub lpg_cylinders: f64,

    /// Meals containing meat.
    #[serde(default)]
    pub meals_meat: f64,

    /// Vegetarian meals.
    #[serde(default)]
    pub meals_vegetarian: f64,

    /// Vegan meals.
    #[serde(default)]
    pub meals_vegan: f64,

    /// Free-text notes passed through to the service; never used in estimates.
    #[serde(default)]
    pub other_activities: Option<String>,
}

/// The activity form exactly as entered: numeric fields are raw text.
///
/// Text that is empty or does not parse as a finite number counts as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityForm {
    pub car_kilometers: String,
    pub flight_kilometers: String,
    pub electricity_units: String,
    pub lpg_cylinders: String,
    pub meat_meals: String,
    pub vegetarian_meals: String,
    pub vegan_meals: String,
    pub uses_renewable_energy: bool,
    pub other_activities: String,
}

impl ActivityForm {
    /// Coerce the form into numeric activity input.
    pub fn to_activity(&self) -> ActivityInput {
        ActivityInput {
            road_kilometers: coerce_number(&self.car_kilometers),
            flight_kilometers: coerce_number(&self.flight_kilometers),
            electricity_units: coerce_number(&self.electricity_units),
            uses_renewable_energy: self.uses_renewable_energy,
            lpg_cylinders: coerce_number(&self.lpg_cylinders),
            meals_meat: coerce_number(&self.meat_meals),
            meals_vegetarian: coerce_number(&self.vegetarian_meals),
            meals_vegan: coerce_number(&self.vegan_meals),
            other_activities: Some(self.other_activities.clone()).filter(|text| !text.is_empty()),
        }
    }
}

/// Parse user-entered text as a number, falling back to 0.
///
/// Surrounding whitespace is ignored. Non-finite results (`inf`, `NaN`)
/// count as unparsable.
pub fn coerce_number(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Request body for `POST /api/footprint/calculate` on the calculation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub user_id: String,

    /// Month of the period, 1-12.
    pub month: u32,

    /// Four-digit year of the period.
    pub year: i32,

    pub car_kilometers: f64,
    pub flight_kilometers: f64,
    pub electricity_units: f64,
    pub lpg_cylinders: f64,
    pub meat_meals: f64,
    pub vegetarian_meals: f64,
    pub vegan_meals: f64,
    pub uses_renewable_energy: bool,

    /// Serialized as `null` when there is nothing to report.
    pub other_activities: Option<String>,
}

impl CalculationRequest {
    /// Build the payload for one user and period.
    pub fn new(user_id: &str, month: u32, year: i32, input: &ActivityInput) -> Self {
        Self {
            user_id: user_id.to_string(),
            month,
            year,
            car_kilometers: input.road_kilometers,
            flight_kilometers: input.flight_kilometers,
            electricity_units: input.electricity_units,
            lpg_cylinders: input.lpg_cylinders,
            meat_meals: input.meals_meat,
            vegetarian_meals: input.meals_vegetarian,
            vegan_meals: input.meals_vegan,
            uses_renewable_energy: input.uses_renewable_energy,
            other_activities: input.other_activities.clone(),
        }
    }
}

/// Response from the calculation service.
///
/// The service has used two spellings for the total and the rating over
/// time; both are accepted, the newer one taking precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerResult {
    /// NaN when the field was sent but is not a number. It still shadows
    /// `totalCo2` without counting as a total.
    #[serde(
        default,
        rename = "totalCO2Kg",
        deserialize_with = "lenient::shadowing_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_co2_kg: Option<f64>,

    #[serde(
        default,
        rename = "totalCo2",
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_co2: Option<f64>,

    #[serde(
        default,
        rename = "impactRating",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub impact_rating: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<String>,

    /// Free-text analysis of the month.
    #[serde(
        default,
        rename = "aiAnalysis",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub narrative: Option<String>,

    /// Newline-delimited recommendations.
    #[serde(
        default,
        rename = "recommendations",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommendations_text: Option<String>,
}

impl ServerResult {
    /// The total reported by the service, if it sent a number.
    ///
    /// `totalCo2` is only consulted when `totalCO2Kg` is missing or null.
    pub fn total(&self) -> Option<f64> {
        match self.total_co2_kg {
            Some(total) => Some(total).filter(|t| !t.is_nan()),
            None => self.total_co2,
        }
    }

    /// The service's own impact label, ignoring empty strings.
    pub fn rating(&self) -> Option<&str> {
        self.impact_rating
            .as_deref()
            .or(self.rating.as_deref())
            .filter(|label| !label.is_empty())
    }

    pub fn narrative(&self) -> Option<&str> {
        self.narrative.as_deref().filter(|text| !text.is_empty())
    }
}

/// One stored calculation, as returned by the history endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, rename = "userId", deserialize_with = "lenient::text")]
    pub user_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::month")]
    pub month: Option<u32>,

    #[serde(default, deserialize_with = "lenient::year")]
    pub year: Option<i32>,

    /// Accepts numbers and numeric strings.
    #[serde(default, rename = "totalCO2Kg", deserialize_with = "lenient::numeric")]
    pub total_co2_kg: Option<f64>,

    #[serde(default, rename = "impactRating", deserialize_with = "lenient::text")]
    pub impact_rating: Option<String>,

    /// Entry identifier; entries without one cannot be deleted.
    #[serde(default, deserialize_with = "lenient::identifier")]
    pub id: Option<String>,
}

impl HistoryEntry {
    pub fn rating(&self) -> Option<&str> {
        self.impact_rating
            .as_deref()
            .filter(|label| !label.is_empty())
    }
}

/// Three-tier severity of a monthly total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpactLevel {
    /// Below 400 kg CO2e, or no total at all.
    Low,

    /// From 400 up to (not including) 800 kg CO2e.
    Moderate,

    /// 800 kg CO2e and above.
    High,
}

impl ImpactLevel {
    /// Classify a known total. Thresholds are inclusive at the lower bound.
    pub fn from_total(total: f64) -> Self {
        if total < MODERATE_THRESHOLD_KG {
            ImpactLevel::Low
        } else if total < HIGH_THRESHOLD_KG {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "LOW",
            ImpactLevel::Moderate => "MODERATE",
            ImpactLevel::High => "HIGH",
        }
    }
}

/// Severity of a total plus whether there was a total to judge.
///
/// A missing total is reported as [`ImpactLevel::Low`] with `has_data`
/// false, which selects neutral styling instead of the low-impact one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Impact {
    pub level: ImpactLevel,
    pub has_data: bool,
}

impl Impact {
    pub fn classify(total: Option<f64>) -> Self {
        match total.filter(|value| !value.is_nan()) {
            Some(value) => Impact {
                level: ImpactLevel::from_total(value),
                has_data: true,
            },
            None => Impact {
                level: ImpactLevel::Low,
                has_data: false,
            },
        }
    }

    /// Styling tone: `neutral` when there is no data, else the level.
    pub fn tone(&self) -> &'static str {
        if !self.has_data {
            return "neutral";
        }
        match self.level {
            ImpactLevel::Low => "low",
            ImpactLevel::Moderate => "moderate",
            ImpactLevel::High => "high",
        }
    }
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Only JSON numbers count.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    /// Like [`number`], but a present non-null value of another type
    /// becomes NaN instead of absent.
    pub fn shadowing_number<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.map(|v| v.as_f64().unwrap_or(f64::NAN)))
    }

    /// JSON numbers or strings that parse as finite numbers.
    pub fn numeric<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| as_numeric(&v)))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn month<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| as_numeric(&v))
            .filter(|m| m.fract() == 0.0 && (1.0..=12.0).contains(m))
            .map(|m| m as u32))
    }

    pub fn year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .and_then(|v| as_numeric(&v))
            .filter(|y| y.fract() == 0.0 && y.abs() < f64::from(i32::MAX))
            .map(|y| y as i32))
    }

    /// Strings or numbers; empty strings and zero do not identify anything.
    pub fn identifier<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        })
    }

    fn as_numeric(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }
}
