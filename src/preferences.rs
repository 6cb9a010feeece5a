use std::collections::BTreeMap;
use log::warn;
use serde::{Deserialize, Serialize};
use crate::cache::{read_cache_value, store_cache_value};

const STORAGE_KEY: &str = "visibleMonths";

pub const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthToggle {
    pub month: &'static str,
    pub visible: bool,
}

/// Which months the daily energy chart shows, keyed by English month name
///
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisibleMonths(BTreeMap<String, bool>);

impl VisibleMonths {
    /// Builds the preference from what was saved. Months after the current one are
    /// dropped, without a saved entry every month up to the current one is visible,
    /// and the current month is visible in any case
    ///
    /// # Arguments
    ///
    /// * 'saved' - the saved preference, if any
    /// * 'current_month0' - zero based index of the current month
    pub fn restore(saved: Option<VisibleMonths>, current_month0: usize) -> Self {
        let mut months = match saved {
            Some(VisibleMonths(mut saved)) => {
                saved.retain(|month, _| month_index(month).is_some_and(|i| i <= current_month0));
                VisibleMonths(saved)
            }
            None => VisibleMonths(MONTHS.iter()
                .take(current_month0 + 1)
                .map(|m| (m.to_string(), true))
                .collect()),
        };

        if let Some(current) = MONTHS.get(current_month0) {
            months.0.insert(current.to_string(), true);
        }
        months
    }

    /// Flips a month, returns its new state or None for an unknown month or one
    /// after the current month
    ///
    /// # Arguments
    ///
    /// * 'month' - English month name
    /// * 'current_month0' - zero based index of the current month
    pub fn toggle(&mut self, month: &str, current_month0: usize) -> Option<bool> {
        let idx = month_index(month).filter(|&i| i <= current_month0)?;
        let flag = self.0.entry(MONTHS[idx].to_string()).or_insert(false);
        *flag = !*flag;
        Some(*flag)
    }

    /// Months in calendar order with their flags, absent months are hidden
    pub fn ordered(&self) -> Vec<MonthToggle> {
        MONTHS.iter()
            .map(|&month| MonthToggle { month, visible: self.0.get(month).copied().unwrap_or(false) })
            .collect()
    }
}

fn month_index(month: &str) -> Option<usize> {
    MONTHS.iter().position(|m| m.eq_ignore_ascii_case(month.trim()))
}

/// Loads the month visibility preference from the local cache, an unreadable entry
/// counts as not saved
///
/// # Arguments
///
/// * 'cache_dir' - cache directory
/// * 'current_month0' - zero based index of the current month
pub async fn load_visible_months(cache_dir: &str, current_month0: usize) -> VisibleMonths {
    let saved = read_cache_value::<VisibleMonths>(cache_dir, STORAGE_KEY).await
        .unwrap_or_else(|e| {
            warn!("ignoring unreadable month preference: {}", e);
            None
        });

    VisibleMonths::restore(saved, current_month0)
}

/// Persists the month visibility preference
///
/// # Arguments
///
/// * 'cache_dir' - cache directory
/// * 'months' - the preference
pub async fn save_visible_months(cache_dir: &str, months: &VisibleMonths) -> Result<(), std::io::Error> {
    store_cache_value(cache_dir, STORAGE_KEY, months).await
}
