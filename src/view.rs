/// SmokeStats filtered views
///
/// A [`FilteredView`] is a read-only window over a [`Dataset`]: it keeps a
/// mapping from view positions to dataset row indices and never copies rows.
/// Views are cheap to rebuild, and every selection change rebuilds one from
/// scratch.

use crate::dataset::{Dataset, Row};
use log::{debug, log_enabled, warn, Level};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The years and countries chosen by the user.
///
/// An empty set selects nothing. There is no implicit "all": use
/// [`FilterSelection::all`] to select every value present in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub years: BTreeSet<i32>,
    pub countries: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new<Y, C, S>(years: Y, countries: C) -> Self
    where
        Y: IntoIterator<Item = i32>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterSelection {
            years: years.into_iter().collect(),
            countries: countries.into_iter().map(Into::into).collect(),
        }
    }

    /// Selects every year and every country of the dataset.
    pub fn all(dataset: &Dataset) -> Self {
        FilterSelection::new(dataset.years().iter().copied(), dataset.countries())
    }

    /// Builds a selection from optional per-axis choices.
    ///
    /// `None` selects every value of that axis in the dataset, like the
    /// dashboard's default widgets. `Some` selects exactly the given
    /// values, so `Some` of an empty list selects nothing.
    pub fn from_choices<C, S>(
        dataset: &Dataset,
        years: Option<Vec<i32>>,
        countries: Option<C>,
    ) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let years = match years {
            Some(years) => years.into_iter().collect(),
            None => dataset.years().iter().copied().collect(),
        };
        let countries = match countries {
            Some(countries) => countries.into_iter().map(Into::into).collect(),
            None => dataset.countries().iter().cloned().collect(),
        };
        FilterSelection { years, countries }
    }

    /// Selects nothing.
    pub fn none() -> Self {
        FilterSelection::default()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.countries.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.years.contains(&row.year) && self.countries.contains(row.country.as_str())
    }
}

/// The rows of a dataset that match a [`FilterSelection`], in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    view_to_parent: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// Keeps rows whose year AND country are both selected.
    pub fn new(dataset: &'a Dataset, selection: &FilterSelection) -> Self {
        let view_to_parent: Vec<usize> = dataset
            .iter_rows()
            .enumerate()
            .filter(|(_, row)| selection.matches(row))
            .map(|(i, _)| i)
            .collect();

        debug!(
            "filter kept {} of {} rows ({} years, {} countries selected)",
            view_to_parent.len(),
            dataset.len(),
            selection.years.len(),
            selection.countries.len()
        );

        FilteredView {
            dataset,
            view_to_parent,
        }
    }

    /// A view over every row of the dataset.
    pub fn unfiltered(dataset: &'a Dataset) -> Self {
        FilteredView {
            dataset,
            view_to_parent: (0..dataset.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.view_to_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_parent.is_empty()
    }

    pub fn get_row(&self, index: usize) -> Option<&'a Row> {
        let dataset = self.dataset;
        self.view_to_parent
            .get(index)
            .and_then(|&parent| dataset.get_row(parent))
    }

    /// Returns the dataset row index for a given view position
    pub fn get_parent_index(&self, view_index: usize) -> Option<usize> {
        self.view_to_parent.get(view_index).copied()
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &'a Row> + '_ {
        let rows = self.dataset.rows();
        self.view_to_parent.iter().map(move |&i| &rows[i])
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }
}

/// Applies a selection to a dataset.
///
/// Values in the selection that do not occur in the dataset contribute
/// nothing; they are logged but not rejected.
pub fn filter<'a>(dataset: &'a Dataset, selection: &FilterSelection) -> FilteredView<'a> {
    if log_enabled!(Level::Warn) {
        let unknown_years = selection.years.iter().filter(|y| !dataset.has_year(**y)).count();
        let unknown_countries = selection
            .countries
            .iter()
            .filter(|c| !dataset.has_country(c))
            .count();
        if unknown_years + unknown_countries > 0 {
            warn!(
                "selection references {} year(s) and {} country(ies) not present in the dataset",
                unknown_years, unknown_countries
            );
        }
    }

    FilteredView::new(dataset, selection)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Country,Year,Data.Percentage.Total
US,2010,20.0
US,2011,22.0
FR,2010,30.0
DE,2012,25.0
";

    fn dataset() -> Dataset {
        Dataset::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_filter_view() {
        let dataset = dataset();
        let selection = FilterSelection::new([2010], ["US", "FR"]);
        let view = filter(&dataset, &selection);

        assert_eq!(view.len(), 2);
        assert_eq!(view.get_row(0).unwrap().country, "US");
        assert_eq!(view.get_row(1).unwrap().country, "FR");
        assert_eq!(view.get_parent_index(1), Some(2));
        assert!(view.get_row(2).is_none());
    }

    #[test]
    fn test_filter_is_conjunction() {
        let dataset = dataset();
        // DE is selected but only has 2012; 2011 is selected but only US has it.
        let selection = FilterSelection::new([2011], ["DE", "FR"]);
        assert!(filter(&dataset, &selection).is_empty());
    }

    #[test]
    fn test_filter_matches_predicate_exactly() {
        let dataset = dataset();
        let selection = FilterSelection::new([2010, 2012], ["US", "DE"]);
        let view = filter(&dataset, &selection);

        let kept: Vec<usize> = (0..view.len())
            .map(|i| view.get_parent_index(i).unwrap())
            .collect();
        let expected: Vec<usize> = dataset
            .iter_rows()
            .enumerate()
            .filter(|(_, r)| selection.matches(r))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(kept, expected);
        assert_eq!(kept, vec![0, 3]);
    }

    #[test]
    fn test_empty_selection_shows_nothing() {
        let dataset = dataset();
        assert!(filter(&dataset, &FilterSelection::none()).is_empty());

        // Years without countries is still empty.
        let years_only = FilterSelection::new([2010, 2011], Vec::<String>::new());
        assert!(years_only.is_empty());
        assert!(filter(&dataset, &years_only).is_empty());
    }

    #[test]
    fn test_select_all() {
        let dataset = dataset();
        let selection = FilterSelection::all(&dataset);
        assert_eq!(selection.years.len(), 3);
        assert_eq!(selection.countries.len(), 3);
        assert_eq!(filter(&dataset, &selection).len(), dataset.len());
    }

    #[test]
    fn test_from_choices_defaults_to_everything() {
        let dataset = dataset();
        let selection = FilterSelection::from_choices(&dataset, None, None::<Vec<String>>);
        assert_eq!(selection, FilterSelection::all(&dataset));
        assert_eq!(filter(&dataset, &selection).len(), 4);
    }

    #[test]
    fn test_from_choices_explicit_values() {
        let dataset = dataset();
        let selection =
            FilterSelection::from_choices(&dataset, Some(vec![2010]), None::<Vec<String>>);
        assert_eq!(selection.years.len(), 1);
        assert_eq!(selection.countries.len(), 3);
        assert_eq!(filter(&dataset, &selection).len(), 2);

        let selection = FilterSelection::from_choices(&dataset, None, Some(["DE"]));
        assert_eq!(filter(&dataset, &selection).len(), 1);
    }

    #[test]
    fn test_from_choices_explicit_empty_selects_nothing() {
        let dataset = dataset();

        let no_years =
            FilterSelection::from_choices(&dataset, Some(Vec::new()), None::<Vec<String>>);
        assert!(no_years.is_empty());
        assert!(filter(&dataset, &no_years).is_empty());

        let no_countries =
            FilterSelection::from_choices(&dataset, None, Some(Vec::<String>::new()));
        assert!(no_countries.is_empty());
        assert!(filter(&dataset, &no_countries).is_empty());
    }

    #[test]
    fn test_unknown_values_contribute_nothing() {
        let dataset = dataset();
        let selection = FilterSelection::new([1999, 2010], ["Atlantis", "FR"]);
        let view = filter(&dataset, &selection);
        assert_eq!(view.len(), 1);
        assert_eq!(view.get_row(0).unwrap().country, "FR");
    }

    #[test]
    fn test_iter_rows_follows_dataset_order() {
        let dataset = dataset();
        let view = FilteredView::unfiltered(&dataset);
        let years: Vec<i32> = view.iter_rows().map(|r| r.year).collect();
        assert_eq!(years, vec![2010, 2011, 2010, 2012]);
    }
}
