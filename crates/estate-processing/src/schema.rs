//! Column names and value domains of the listings table.
//!
//! The input file carries a fixed 22-column schema. Columns produced by the
//! pipeline are listed separately so that analysis code never has to spell
//! a column name by hand.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOTAL_IMAGES: &str = "total_images";
pub const LAST_PRICE: &str = "last_price";
pub const TOTAL_AREA: &str = "total_area";
pub const FIRST_DAY_EXPOSITION: &str = "first_day_exposition";
pub const ROOMS: &str = "rooms";
pub const CEILING_HEIGHT: &str = "ceiling_height";
pub const FLOORS_TOTAL: &str = "floors_total";
pub const LIVING_AREA: &str = "living_area";
pub const FLOOR: &str = "floor";
pub const IS_APARTMENT: &str = "is_apartment";
pub const STUDIO: &str = "studio";
pub const OPEN_PLAN: &str = "open_plan";
pub const KITCHEN_AREA: &str = "kitchen_area";
pub const BALCONY: &str = "balcony";
pub const LOCALITY_NAME: &str = "locality_name";
pub const AIRPORTS_NEAREST: &str = "airports_nearest";
pub const CITY_CENTERS_NEAREST: &str = "cityCenters_nearest";
pub const PARKS_AROUND_3000: &str = "parks_around3000";
pub const PARKS_NEAREST: &str = "parks_nearest";
pub const PONDS_AROUND_3000: &str = "ponds_around3000";
pub const PONDS_NEAREST: &str = "ponds_nearest";
pub const DAYS_EXPOSITION: &str = "days_exposition";

// Derived columns
pub const SQUARE_METER_PRICE: &str = "square_meter_price";
pub const DAY_EXPOSITION: &str = "day_exposition";
pub const MONTH_EXPOSITION: &str = "month_exposition";
pub const YEAR_EXPOSITION: &str = "year_exposition";
pub const FLOOR_KIND: &str = "floor_kind";
pub const LIVING_TO_TOTAL_AREA: &str = "living_to_total_area";
pub const KITCHEN_TO_TOTAL_AREA: &str = "kitchen_to_total_area";

/// The 22 columns every input file must provide, in file order.
pub const INPUT_COLUMNS: [&str; 22] = [
    TOTAL_IMAGES,
    LAST_PRICE,
    TOTAL_AREA,
    FIRST_DAY_EXPOSITION,
    ROOMS,
    CEILING_HEIGHT,
    FLOORS_TOTAL,
    LIVING_AREA,
    FLOOR,
    IS_APARTMENT,
    STUDIO,
    OPEN_PLAN,
    KITCHEN_AREA,
    BALCONY,
    LOCALITY_NAME,
    AIRPORTS_NEAREST,
    CITY_CENTERS_NEAREST,
    PARKS_AROUND_3000,
    PARKS_NEAREST,
    PONDS_AROUND_3000,
    PONDS_NEAREST,
    DAYS_EXPOSITION,
];

/// Location and proximity columns that receive the numeric "unknown" sentinel.
pub const PROXIMITY_COLUMNS: [&str; 6] = [
    AIRPORTS_NEAREST,
    CITY_CENTERS_NEAREST,
    PARKS_AROUND_3000,
    PARKS_NEAREST,
    PONDS_AROUND_3000,
    PONDS_NEAREST,
];

/// Default out-of-domain value meaning "unknown distance or count".
pub const DEFAULT_SENTINEL: f64 = -999.99;

/// Default marker for a listing without a locality.
pub const UNDEFINED_LOCALITY: &str = "undefined";

/// Columns whose correlation with `last_price` is reported as a price factor.
pub const PRICE_FACTOR_COLUMNS: [&str; 7] = [
    SQUARE_METER_PRICE,
    FLOOR_KIND,
    ROOMS,
    CITY_CENTERS_NEAREST,
    DAY_EXPOSITION,
    MONTH_EXPOSITION,
    YEAR_EXPOSITION,
];

/// Columns whose medians are compared between the city and its center.
pub const SEGMENT_MEDIAN_COLUMNS: [&str; 5] =
    [LAST_PRICE, CEILING_HEIGHT, LIVING_AREA, KITCHEN_AREA, ROOMS];

/// Numeric columns included in the correlation matrix.
pub const CORRELATION_COLUMNS: [&str; 14] = [
    LAST_PRICE,
    TOTAL_AREA,
    LIVING_AREA,
    KITCHEN_AREA,
    ROOMS,
    CEILING_HEIGHT,
    FLOORS_TOTAL,
    FLOOR,
    BALCONY,
    CITY_CENTERS_NEAREST,
    AIRPORTS_NEAREST,
    DAYS_EXPOSITION,
    SQUARE_METER_PRICE,
    YEAR_EXPOSITION,
];

/// Columns summarized with count/mean/median/min/max.
pub const DESCRIBED_COLUMNS: [&str; 6] = [
    TOTAL_AREA,
    LAST_PRICE,
    ROOMS,
    CEILING_HEIGHT,
    DAYS_EXPOSITION,
    SQUARE_METER_PRICE,
];

/// Returns the input columns absent from `present`.
pub fn missing_input_columns<S: AsRef<str>>(present: &[S]) -> Vec<String> {
    INPUT_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|p| p.as_ref() == **required))
        .map(|s| s.to_string())
        .collect()
}

/// Position of a flat inside its building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorKind {
    First,
    Last,
    Other,
}

impl FloorKind {
    /// Classify a floor against the building height.
    ///
    /// The ground floor wins over "last" for single-storey buildings.
    pub fn classify(floor: i64, floors_total: i64) -> Self {
        if floor == 1 {
            FloorKind::First
        } else if floor == floors_total {
            FloorKind::Last
        } else {
            FloorKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FloorKind::First => "first",
            FloorKind::Last => "last",
            FloorKind::Other => "other",
        }
    }

    /// Category code used when correlating floor position with price.
    pub fn code(&self) -> i32 {
        match self {
            FloorKind::Other => 0,
            FloorKind::First => 1,
            FloorKind::Last => 2,
        }
    }
}

impl fmt::Display for FloorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
