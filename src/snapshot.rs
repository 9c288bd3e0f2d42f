/// Dashboard snapshot handed to the rendering layer
///
/// A snapshot bundles the KPI row and the four derived tables for one
/// selection. [`DashboardSnapshot::charts`] turns it into chart payloads:
/// plain data plus the chart kind, title and field names. Styling and
/// drawing belong to the renderer.
use crate::aggregate::{self, CountryRate, GenderRate, Kpis, YearRate};
use crate::view::FilteredView;
use serde::Serialize;

/// Location mode for the choropleth: countries are matched by name.
///
/// Names the renderer cannot resolve are its to handle; the pipeline does
/// not validate them.
pub const LOCATION_MODE: &str = "country names";

pub const NO_GENDER_MESSAGE: &str = "No gender split in data.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub kpis: Kpis,
    pub top_countries: Vec<CountryRate>,
    /// Absent (not empty) when the dataset has no gender columns.
    pub gender_split: Option<Vec<GenderRate>>,
    pub yearly_trend: Vec<YearRate>,
    pub country_means: Vec<CountryRate>,
}

impl DashboardSnapshot {
    /// Runs every derivation over the view.
    pub fn compute(view: &FilteredView<'_>, top_n: usize) -> Self {
        DashboardSnapshot {
            kpis: aggregate::kpis(view),
            top_countries: aggregate::top_countries(view, top_n),
            gender_split: aggregate::gender_split(view),
            yearly_trend: aggregate::yearly_trend(view),
            country_means: aggregate::country_means(view),
        }
    }

    /// True when the selection matched no rows.
    pub fn is_empty(&self) -> bool {
        self.kpis.records == 0
    }

    /// Chart payloads in dashboard order: bar, box (or placeholder), line, map.
    pub fn charts(&self) -> Vec<ChartPayload> {
        let gender = match &self.gender_split {
            Some(rows) => ChartPayload::Box {
                title: "Smoking by Gender".to_string(),
                x: "gender".to_string(),
                y: "rate".to_string(),
                rows: rows.clone(),
            },
            None => ChartPayload::Info {
                message: NO_GENDER_MESSAGE.to_string(),
            },
        };

        vec![
            ChartPayload::Bar {
                title: "Smoking Rate by Country".to_string(),
                x: "country".to_string(),
                y: "rate".to_string(),
                rows: self.top_countries.clone(),
            },
            gender,
            ChartPayload::Line {
                title: "Avg Smoking Rate Over Years".to_string(),
                x: "year".to_string(),
                y: "rate".to_string(),
                rows: self.yearly_trend.clone(),
            },
            ChartPayload::Choropleth {
                title: "Smoking Prevalence by Country".to_string(),
                locations: "country".to_string(),
                location_mode: LOCATION_MODE.to_string(),
                color: "rate".to_string(),
                rows: self.country_means.clone(),
            },
        ]
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One chart for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ChartPayload {
    Bar {
        title: String,
        x: String,
        y: String,
        rows: Vec<CountryRate>,
    },

    Box {
        title: String,
        x: String,
        y: String,
        rows: Vec<GenderRate>,
    },

    Line {
        title: String,
        x: String,
        y: String,
        rows: Vec<YearRate>,
    },

    Choropleth {
        title: String,
        locations: String,
        location_mode: String,
        color: String,
        rows: Vec<CountryRate>,
    },

    /// Shown in place of a chart that does not apply to this dataset
    Info { message: String },
}
