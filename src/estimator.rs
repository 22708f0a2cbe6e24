//! Local emission estimate.
//!
//! Maps one month of [`ActivityInput`] to a CO2e value per category and a
//! total. The factors are illustrative constants, not a scientific model,
//! and mirror the ones the calculation service applies.
//!
//! Every value is `factor * input` with no rounding and no clamping;
//! rounding to one decimal is left to [`crate::view`].

use serde::Serialize;

use crate::model::ActivityInput;

/// kg CO2e per kilometer by road.
pub const ROAD_KG_PER_KM: f64 = 0.25;

/// kg CO2e per kilometer flown.
pub const FLIGHT_KG_PER_KM: f64 = 0.12;

/// kg CO2e per unit of grid electricity.
pub const GRID_ELECTRICITY_KG_PER_UNIT: f64 = 0.7;

/// kg CO2e per unit of renewable electricity.
pub const RENEWABLE_ELECTRICITY_KG_PER_UNIT: f64 = 0.1;

/// kg CO2e per LPG cylinder.
pub const LPG_KG_PER_CYLINDER: f64 = 45.0;

/// kg CO2e per meal containing meat.
pub const MEAT_MEAL_KG: f64 = 4.5;

/// kg CO2e per vegetarian meal.
pub const VEGETARIAN_MEAL_KG: f64 = 1.2;

/// kg CO2e per vegan meal.
pub const VEGAN_MEAL_KG: f64 = 0.8;

/// Per-unit emission factors, in kg CO2e.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmissionFactors {
    pub road_per_km: f64,
    pub flight_per_km: f64,
    pub grid_electricity_per_unit: f64,
    pub renewable_electricity_per_unit: f64,
    pub lpg_per_cylinder: f64,
    pub meat_meal: f64,
    pub vegetarian_meal: f64,
    pub vegan_meal: f64,
}

impl Default for EmissionFactors {
    fn default() -> Self {
        Self {
            road_per_km: ROAD_KG_PER_KM,
            flight_per_km: FLIGHT_KG_PER_KM,
            grid_electricity_per_unit: GRID_ELECTRICITY_KG_PER_UNIT,
            renewable_electricity_per_unit: RENEWABLE_ELECTRICITY_KG_PER_UNIT,
            lpg_per_cylinder: LPG_KG_PER_CYLINDER,
            meat_meal: MEAT_MEAL_KG,
            vegetarian_meal: VEGETARIAN_MEAL_KG,
            vegan_meal: VEGAN_MEAL_KG,
        }
    }
}

impl EmissionFactors {
    /// Electricity factor for the given supply.
    pub fn electricity(&self, renewable: bool) -> f64 {
        if renewable {
            self.renewable_electricity_per_unit
        } else {
            self.grid_electricity_per_unit
        }
    }

    /// Factor and quantity that produce the value for `category`.
    fn term(&self, category: Category, input: &ActivityInput) -> (f64, f64) {
        match category {
            Category::Road => (self.road_per_km, input.road_kilometers),
            Category::Flight => (self.flight_per_km, input.flight_kilometers),
            Category::Electricity => (
                self.electricity(input.uses_renewable_energy),
                input.electricity_units,
            ),
            Category::Lpg => (self.lpg_per_cylinder, input.lpg_cylinders),
            Category::MeatMeals => (self.meat_meal, input.meals_meat),
            Category::VegetarianMeals => (self.vegetarian_meal, input.meals_vegetarian),
            Category::VeganMeals => (self.vegan_meal, input.meals_vegan),
        }
    }
}

/// An emission category of the breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Road,
    Flight,
    Electricity,
    Lpg,
    MeatMeals,
    VegetarianMeals,
    VeganMeals,
}

impl Category {
    /// All categories, in breakdown order.
    pub const ALL: [Category; 7] = [
        Category::Road,
        Category::Flight,
        Category::Electricity,
        Category::Lpg,
        Category::MeatMeals,
        Category::VegetarianMeals,
        Category::VeganMeals,
    ];

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Road => "Road (km)",
            Category::Flight => "Flights (km)",
            Category::Electricity => "Electricity (units)",
            Category::Lpg => "LPG (cylinders)",
            Category::MeatMeals => "Meat meals",
            Category::VegetarianMeals => "Vegetarian meals",
            Category::VeganMeals => "Vegan meals",
        }
    }
}

/// The estimate for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryEstimate {
    pub category: Category,
    pub label: &'static str,

    /// kg CO2e.
    pub value: f64,

    /// Display weight of the category's bar segment; equal to `value`.
    pub weight: f64,
}

/// Estimate for a whole month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimationResult {
    /// Sum of every item's value, kg CO2e.
    pub total: f64,

    /// One item per category, in [`Category::ALL`] order.
    pub items: Vec<CategoryEstimate>,
}

impl EstimationResult {
    /// Value of a single category.
    pub fn value(&self, category: Category) -> f64 {
        self.items
            .iter()
            .find(|item| item.category == category)
            .map_or(0.0, |item| item.value)
    }

    /// Whether there is anything to break down.
    pub fn is_empty(&self) -> bool {
        self.total <= 0.0
    }

    /// Percentage of the total contributed by `category`, if there is a total.
    pub fn share(&self, category: Category) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.value(category) / self.total * 100.0)
    }
}

/// Estimate emissions with the default factors.
pub fn estimate(input: &ActivityInput) -> EstimationResult {
    estimate_with(&EmissionFactors::default(), input)
}

/// Estimate emissions with the given factors.
pub fn estimate_with(factors: &EmissionFactors, input: &ActivityInput) -> EstimationResult {
    let items: Vec<CategoryEstimate> = Category::ALL
        .iter()
        .map(|&category| {
            let (factor, quantity) = factors.term(category, input);
            let value = factor * quantity;
            CategoryEstimate {
                category,
                label: category.label(),
                value,
                weight: value,
            }
        })
        .collect();

    let total = items.iter().map(|item| item.value).sum();

    EstimationResult { total, items }
}

/// The numeric part of an [`ActivityInput`]; free text does not affect estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EstimateKey {
    quantities: [f64; 7],
    renewable: bool,
}

impl From<&ActivityInput> for EstimateKey {
    fn from(input: &ActivityInput) -> Self {
        Self {
            quantities: [
                input.road_kilometers,
                input.flight_kilometers,
                input.electricity_units,
                input.lpg_cylinders,
                input.meals_meat,
                input.meals_vegetarian,
                input.meals_vegan,
            ],
            renewable: input.uses_renewable_energy,
        }
    }
}

/// Remembers the estimate for the most recent input.
///
/// Asking again with the same numeric input returns the stored result;
/// any change recomputes from scratch.
#[derive(Debug, Default)]
pub struct EstimateMemo {
    entry: Option<(EstimateKey, EstimationResult)>,
    computations: u64,
}

impl EstimateMemo {
    pub fn get(&mut self, input: &ActivityInput) -> &EstimationResult {
        let key = EstimateKey::from(input);

        if self
            .entry
            .as_ref()
            .is_some_and(|(cached, _)| *cached != key)
        {
            self.entry = None;
        }

        let computations = &mut self.computations;
        let (_, result) = self.entry.get_or_insert_with(|| {
            *computations += 1;
            (key, estimate(input))
        });
        result
    }

    /// How many times an estimate has actually been computed.
    pub fn computations(&self) -> u64 {
        self.computations
    }
}
