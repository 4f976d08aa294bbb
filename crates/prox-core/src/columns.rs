//! Column contract between pipeline stages.

use serde::{Deserialize, Serialize};

/// Derived column holding the `start~end` operating interval.
pub const OPERATING_PERIOD: &str = "operating_period";
/// Derived column holding the time-averaged nearest competitor distance.
pub const AVG_NEAREST_DISTANCE: &str = "avg_nearest_distance";
/// Derived column holding the number of competitors within the adjacency radius.
pub const ADJACENT_COUNT: &str = "adjacent_count";
/// Derived column naming why a record was excluded from the distance computation.
pub const PROXIMITY_FLAG: &str = "proximity_flag";

/// Names of the input columns read by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Permit (opening) date, `YYYY-MM-DD`.
    #[serde(default = "ColumnSchema::default_permit_date")]
    pub permit_date: String,
    /// Closure date, `YYYY-MM-DD`, blank while open.
    #[serde(default = "ColumnSchema::default_closure_date")]
    pub closure_date: String,
    /// Planar x coordinate.
    #[serde(default = "ColumnSchema::default_x")]
    pub x: String,
    /// Planar y coordinate.
    #[serde(default = "ColumnSchema::default_y")]
    pub y: String,
    /// Business identity (name).
    #[serde(default = "ColumnSchema::default_identity")]
    pub identity: String,
    /// Operating status text used by the filter and labeler.
    #[serde(default = "ColumnSchema::default_status")]
    pub status: String,
    /// Full address used by the region filter.
    #[serde(default = "ColumnSchema::default_address")]
    pub address: String,
    /// Boolean survival label produced by the labeler.
    #[serde(default = "ColumnSchema::default_survival")]
    pub survival: String,
}

impl ColumnSchema {
    fn default_permit_date() -> String {
        "인허가일자".to_string()
    }
    fn default_closure_date() -> String {
        "폐업일자".to_string()
    }
    fn default_x() -> String {
        "좌표정보x(epsg5174)".to_string()
    }
    fn default_y() -> String {
        "좌표정보y(epsg5174)".to_string()
    }
    fn default_identity() -> String {
        "사업장명".to_string()
    }
    fn default_status() -> String {
        "영업상태명".to_string()
    }
    fn default_address() -> String {
        "소재지전체주소".to_string()
    }
    fn default_survival() -> String {
        "survival_label".to_string()
    }

    /// Columns that must be present before the proximity engine accepts a table.
    pub fn proximity_required(&self) -> [&str; 5] {
        [
            self.permit_date.as_str(),
            self.closure_date.as_str(),
            self.x.as_str(),
            self.y.as_str(),
            self.identity.as_str(),
        ]
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            permit_date: Self::default_permit_date(),
            closure_date: Self::default_closure_date(),
            x: Self::default_x(),
            y: Self::default_y(),
            identity: Self::default_identity(),
            status: Self::default_status(),
            address: Self::default_address(),
            survival: Self::default_survival(),
        }
    }
}
