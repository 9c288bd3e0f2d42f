/// SmokeStats - Smoking Statistics Dashboard Pipeline
///
/// Loads a CSV of smoking prevalence by country and year, filters it by the
/// years and countries picked in the UI, and derives the data behind the
/// dashboard: the KPI row, the top countries, the gender split, the yearly
/// trend and the per-country means for the world map.
///
/// The pipeline is five pure functions (`load`, `filter` and the four
/// derivations in [`aggregate`]). [`DashboardSession`] wires them to filter
/// change events, and [`DashboardSnapshot`] is what the renderer receives.

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod dataset;
pub mod error;
pub mod schema;
pub mod session;
pub mod snapshot;
pub mod view;

pub use aggregate::{
    country_means, gender_split, kpis, top_countries, yearly_trend, CountryRate, GenderRate,
    Kpis, YearRate, DEFAULT_TOP_N,
};
pub use cache::{load, shared_cache, DatasetCache};
pub use config::DashboardConfig;
pub use dataset::{Dataset, Row};
pub use error::{DashboardError, Result};
pub use schema::{ColumnType, CsvLayout, Schema};
pub use session::{DashboardSession, SelectionChange};
pub use snapshot::{ChartPayload, DashboardSnapshot};
pub use view::{filter, FilterSelection, FilteredView};
