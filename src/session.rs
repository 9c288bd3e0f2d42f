/// Filter-change session
///
/// A session owns the shared dataset, the current [`FilterSelection`] and
/// the snapshot computed from it. The UI layer reports each interaction as
/// a [`SelectionChange`]; when the change alters the selection the session
/// recomputes the full snapshot and calls every subscriber with it.
///
/// There is no incremental update. Each change rebuilds the filtered view
/// and all derived tables from the dataset.
///
/// # Usage Pattern
///
/// 1. Load a dataset (usually through [`crate::cache::load`])
/// 2. Create a session; it starts with every year and country selected
/// 3. `subscribe()` a callback that hands snapshots to the renderer
/// 4. Forward widget events to `apply()`
use crate::aggregate::DEFAULT_TOP_N;
use crate::dataset::Dataset;
use crate::snapshot::DashboardSnapshot;
use crate::view::{filter, FilterSelection};
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A user interaction on the filter widgets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionChange {
    /// Replace the selected years
    SetYears(BTreeSet<i32>),

    /// Replace the selected countries
    SetCountries(BTreeSet<String>),

    /// Add the year if absent, remove it if present
    ToggleYear(i32),

    /// Add the country if absent, remove it if present
    ToggleCountry(String),

    /// Replace the whole selection
    Replace(FilterSelection),

    /// Select every year and country in the dataset
    SelectAll,

    /// Select nothing
    Clear,
}

type Listener = Box<dyn Fn(&DashboardSnapshot)>;

pub struct DashboardSession {
    dataset: Arc<Dataset>,
    selection: FilterSelection,
    top_n: usize,
    snapshot: DashboardSnapshot,
    listeners: Vec<Listener>,
    /// Incremented on every recompute
    generation: u64,
}

impl DashboardSession {
    pub fn new(dataset: Arc<Dataset>) -> Self {
        Self::with_top_n(dataset, DEFAULT_TOP_N)
    }

    pub fn with_top_n(dataset: Arc<Dataset>, top_n: usize) -> Self {
        let selection = FilterSelection::all(&dataset);
        let snapshot = DashboardSnapshot::compute(&filter(&dataset, &selection), top_n);
        DashboardSession {
            dataset,
            selection,
            top_n,
            snapshot,
            listeners: Vec::new(),
            generation: 0,
        }
    }

    /// Registers a callback invoked with every recomputed snapshot.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&DashboardSnapshot) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Applies one interaction.
    ///
    /// Returns true if the selection changed, in which case the snapshot was
    /// recomputed and subscribers were notified.
    pub fn apply(&mut self, change: SelectionChange) -> bool {
        let mut next = self.selection.clone();
        match change {
            SelectionChange::SetYears(years) => next.years = years,
            SelectionChange::SetCountries(countries) => next.countries = countries,
            SelectionChange::ToggleYear(year) => {
                if !next.years.remove(&year) {
                    next.years.insert(year);
                }
            }
            SelectionChange::ToggleCountry(country) => {
                if !next.countries.remove(&country) {
                    next.countries.insert(country);
                }
            }
            SelectionChange::Replace(selection) => next = selection,
            SelectionChange::SelectAll => next = FilterSelection::all(&self.dataset),
            SelectionChange::Clear => next = FilterSelection::none(),
        }

        if next == self.selection {
            return false;
        }

        self.selection = next;
        self.recompute();
        true
    }

    /// Recomputes the snapshot and notifies subscribers unconditionally.
    pub fn refresh(&mut self) {
        self.recompute();
    }

    fn recompute(&mut self) {
        let view = filter(&self.dataset, &self.selection);
        self.snapshot = DashboardSnapshot::compute(&view, self.top_n);
        self.generation += 1;
        debug!(
            "recomputed dashboard generation {}: {} records",
            self.generation, self.snapshot.kpis.records
        );

        for listener in &self.listeners {
            listener(&self.snapshot);
        }
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    /// Returns the number of recomputes since the session was created
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
