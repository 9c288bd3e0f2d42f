/// SmokeStats aggregations
///
/// The four derived tables and the KPI row are pure functions of a
/// [`FilteredView`]. None of them fail: an empty view produces empty tables
/// and an undefined mean.
///
/// Grouping keeps the order in which keys are first encountered in the
/// view, and all sorts are stable, so equal means stay in encounter order.
///
/// # Examples
///
/// ```
/// use smokestats::{aggregate, Dataset, FilteredView};
///
/// let csv = "Country,Year,Data.Percentage.Total\nUS,2010,20.0\nUS,2011,22.0\nFR,2010,30.0\n";
/// let dataset = Dataset::from_reader(csv.as_bytes()).unwrap();
/// let view = FilteredView::unfiltered(&dataset);
///
/// let top = aggregate::top_countries(&view, 10);
/// assert_eq!(top[0].country, "FR");
/// assert_eq!(top[1].rate, 21.0);
/// ```

use crate::dataset::Row;
use crate::view::FilteredView;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Number of countries shown in the bar chart.
pub const DEFAULT_TOP_N: usize = 10;

/// Mean rate for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryRate {
    pub country: String,
    pub rate: f64,
}

/// Mean rate for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRate {
    pub year: i32,
    pub rate: f64,
}

/// One row of the long-format gender table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderRate {
    pub country: String,
    pub year: i32,
    pub gender: String,
    /// `None` when the source cell was empty; the renderer skips it.
    pub rate: Option<f64>,
}

/// Headline numbers for the filtered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub records: usize,
    pub countries: usize,
    /// Mean of `percentage_total`, `None` when the view is empty.
    pub mean_rate: Option<f64>,
}

impl Kpis {
    /// The mean rate with two decimals, or `"n/a"` for an empty view.
    pub fn mean_rate_label(&self) -> String {
        match self.mean_rate {
            Some(rate) => format!("{:.2}", rate),
            None => "n/a".to_string(),
        }
    }
}

/// Running sum for an arithmetic mean.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }
}

/// Groups rows by country, keeping first-encounter order.
fn group_by_country<'a>(rows: impl Iterator<Item = &'a Row>) -> Vec<(&'a str, MeanAccumulator)> {
    let mut positions: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<(&'a str, MeanAccumulator)> = Vec::new();

    for row in rows {
        let idx = *positions.entry(row.country.as_str()).or_insert_with(|| {
            groups.push((row.country.as_str(), MeanAccumulator::default()));
            groups.len() - 1
        });
        groups[idx].1.push(row.percentage_total);
    }

    groups
}

fn to_country_rates(groups: Vec<(&str, MeanAccumulator)>) -> Vec<CountryRate> {
    groups
        .into_iter()
        .filter_map(|(country, acc)| {
            acc.mean().map(|rate| CountryRate {
                country: country.to_string(),
                rate,
            })
        })
        .collect()
}

/// Countries with the highest mean rate, descending, at most `n` of them.
pub fn top_countries(view: &FilteredView<'_>, n: usize) -> Vec<CountryRate> {
    let mut rates = to_country_rates(group_by_country(view.iter_rows()));
    rates.sort_by(|a, b| b.rate.partial_cmp(&a.rate).unwrap_or(Ordering::Equal));
    rates.truncate(n);
    rates
}

/// Long-format male/female rates, or `None` when the dataset has no
/// gender columns.
///
/// Like a dataframe melt, all rows for the first gender come first, then
/// all rows for the second, each block in view order.
pub fn gender_split(view: &FilteredView<'_>) -> Option<Vec<GenderRate>> {
    let [male, female] = view.dataset().schema().gender_labels()?;

    let mut out = Vec::with_capacity(view.len() * 2);
    out.extend(view.iter_rows().map(|row| melt(row, &male, row.percentage_male)));
    out.extend(view.iter_rows().map(|row| melt(row, &female, row.percentage_female)));
    Some(out)
}

fn melt(row: &Row, gender: &str, rate: Option<f64>) -> GenderRate {
    GenderRate {
        country: row.country.clone(),
        year: row.year,
        gender: gender.to_string(),
        rate,
    }
}

/// Mean rate per year, ascending by year.
pub fn yearly_trend(view: &FilteredView<'_>) -> Vec<YearRate> {
    let mut by_year: BTreeMap<i32, MeanAccumulator> = BTreeMap::new();
    for row in view.iter_rows() {
        by_year.entry(row.year).or_default().push(row.percentage_total);
    }

    by_year
        .into_iter()
        .filter_map(|(year, acc)| acc.mean().map(|rate| YearRate { year, rate }))
        .collect()
}

/// Mean rate per country, in first-encounter order.
pub fn country_means(view: &FilteredView<'_>) -> Vec<CountryRate> {
    to_country_rates(group_by_country(view.iter_rows()))
}

/// Record count, distinct country count and mean rate.
pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    let mut acc = MeanAccumulator::default();
    let mut countries = std::collections::HashSet::new();
    for row in view.iter_rows() {
        acc.push(row.percentage_total);
        countries.insert(row.country.as_str());
    }

    Kpis {
        records: view.len(),
        countries: countries.len(),
        mean_rate: acc.mean(),
    }
}
