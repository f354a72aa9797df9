use std::collections::HashMap;

use serde::Deserialize;

/// Error policy for converters that enumerate independent units
/// (route legs, isolines): fail the whole call or skip the bad unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    #[default]
    Strict,
    Skip,
}

/// Options for CSV to trace point conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvOptions {
    /// Maps caller column names onto the canonical columns
    /// (`latitude`, `longitude`, `speed_kmh`, `speed_mps`, `speed_mph`,
    /// `timestamp`, `heading`). Keys are the caller's names.
    #[serde(default)]
    pub column_mapping: HashMap<String, String>,

    /// Column names for headerless input. When set, the first row is data.
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

/// Options for route response to GeoJSON conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesOptions {
    /// Flatten nested route/leg/step properties into dot-indexed keys
    /// (default: true).
    #[serde(default = "default_true")]
    pub flatten_properties: bool,

    /// Emit one LineString feature per leg in addition to the stitched
    /// route line (default: false).
    #[serde(default)]
    pub include_legs: bool,

    /// Emit a LineString feature per travel step (default: false).
    #[serde(default)]
    pub include_travel_step_geometry: bool,

    /// Emit a Point feature at each travel step's start (default: false).
    #[serde(default)]
    pub include_travel_step_start_positions: bool,

    /// Emit a LineString feature per span (default: false).
    #[serde(default)]
    pub include_span_geometry: bool,

    /// What to do with a leg or isoline that has no usable geometry
    /// (default: strict — fail the call).
    #[serde(default)]
    pub on_error: ErrorPolicy,
}

impl Default for RoutesOptions {
    fn default() -> Self {
        Self {
            flatten_properties: true,
            include_legs: false,
            include_travel_step_geometry: false,
            include_travel_step_start_positions: false,
            include_span_geometry: false,
            on_error: ErrorPolicy::Strict,
        }
    }
}

/// Options for snap-to-roads result conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapOptions {
    /// Include the snapped line geometry (default: true).
    #[serde(default = "default_true")]
    pub include_snapped_geometry: bool,

    /// Emit a Point feature per snapped trace point (default: true).
    #[serde(default = "default_true")]
    pub include_snapped_trace_points: bool,

    /// Emit a Point feature at each submitted original position
    /// (default: false).
    #[serde(default)]
    pub include_original_positions: bool,

    #[serde(default = "default_true")]
    pub flatten_properties: bool,
}

impl Default for SnapOptions {
    fn default() -> Self {
        Self {
            include_snapped_geometry: true,
            include_snapped_trace_points: true,
            include_original_positions: false,
            flatten_properties: true,
        }
    }
}

fn default_true() -> bool {
    true
}
