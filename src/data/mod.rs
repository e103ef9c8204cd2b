pub mod anomaly;
pub mod cleaning;
pub mod data_lector;
pub mod filters;
pub mod series;
pub mod stats;
pub mod trip_struct;

pub use data_lector::{load_records, parse_json_records, parse_records, write_records};
pub use filters::{FilterCriteria, TripFilter, filter_records};
pub use series::{CountSeries, DashboardSeries, ScatterPoint, build_series};
pub use stats::{TripStats, compute_stats};
pub use trip_struct::{FieldValue, TripRecord};
