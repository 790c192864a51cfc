use std::collections::BTreeMap;

use thiserror::Error;

use super::model::Dataset;

#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
}

// ---------------------------------------------------------------------------
// Aggregation outputs
// ---------------------------------------------------------------------------

/// Mean of each requested numeric column for one category value.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMeans {
    pub category: String,
    pub means: Vec<f64>,
}

/// Five-number summary plus outliers, Tukey style (whiskers at 1.5 IQR).
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Grouped access on the dataset
// ---------------------------------------------------------------------------

impl Dataset {
    fn require(&self, column: &str) -> Result<(), DataError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DataError::UnknownColumn(column.to_string()))
        }
    }

    /// Numeric values of one column in row order; nulls and text are skipped.
    pub fn column_values(&self, column: &str) -> Result<Vec<f64>, DataError> {
        self.require(column)?;
        Ok(self
            .records()
            .iter()
            .filter_map(|r| r.get(column).as_f64())
            .collect())
    }

    /// Row count per distinct cell text, in order of first appearance.
    /// Empty cells are not counted, so the total can fall short of `len()`.
    pub fn value_counts(&self, column: &str) -> Result<Vec<(String, u64)>, DataError> {
        self.require(column)?;
        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut slot: BTreeMap<&str, usize> = BTreeMap::new();
        for value in self.records().iter().filter_map(|r| r.text(column)) {
            match slot.get(value) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    slot.insert(value, counts.len());
                    counts.push((value.to_string(), 1));
                }
            }
        }
        Ok(counts)
    }

    /// Row count for each of a fixed list of categories. Every category gets
    /// an entry, zero included; values outside the list are ignored.
    pub fn counts_of(
        &self,
        column: &str,
        categories: &[&str],
    ) -> Result<Vec<(String, u64)>, DataError> {
        self.require(column)?;
        Ok(categories
            .iter()
            .map(|&cat| {
                let n = self
                    .records()
                    .iter()
                    .filter(|r| r.text(column) == Some(cat))
                    .count() as u64;
                (cat.to_string(), n)
            })
            .collect())
    }

    /// Mean of every column in `numeric` per distinct text of `category`,
    /// groups sorted by that text.
    ///
    /// * Rows with an empty category belong to no group.
    /// * Nulls in a numeric column are skipped for that column's mean.
    /// * A group where any requested mean is undefined is dropped entirely.
    pub fn group_means(
        &self,
        category: &str,
        numeric: &[&str],
    ) -> Result<Vec<GroupMeans>, DataError> {
        self.require(category)?;
        for col in numeric {
            self.require(col)?;
        }

        // category → per-column (sum, count)
        let mut acc: BTreeMap<&str, Vec<(f64, u64)>> = BTreeMap::new();
        for record in self.records() {
            let Some(key) = record.text(category) else {
                continue;
            };
            let sums = acc
                .entry(key)
                .or_insert_with(|| vec![(0.0, 0); numeric.len()]);
            for (slot, col) in sums.iter_mut().zip(numeric) {
                if let Some(v) = record.get(col).as_f64() {
                    slot.0 += v;
                    slot.1 += 1;
                }
            }
        }

        Ok(acc
            .into_iter()
            .filter_map(|(key, sums)| {
                let means = sums
                    .iter()
                    .map(|&(sum, n)| (n > 0).then(|| sum / n as f64))
                    .collect::<Option<Vec<f64>>>()?;
                Some(GroupMeans {
                    category: key.to_string(),
                    means,
                })
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Distribution summaries
// ---------------------------------------------------------------------------

/// Quantile of an ascending slice with linear interpolation between ranks.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

impl BoxStats {
    /// Summarise `values`; `None` for an empty input.
    pub fn from_values(values: &[f64]) -> Option<BoxStats> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
            .iter()
            .partition(|v| (low_fence..=high_fence).contains(*v));
        let lower_whisker = inside.first().copied().unwrap_or(q1);
        let upper_whisker = inside.last().copied().unwrap_or(q3);

        Some(BoxStats {
            q1,
            median,
            q3,
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::dataset_from;

    const COLS: &[&str] = &["Gender", "EthnicGroup", "MathScore", "ReadingScore"];

    fn sample() -> Dataset {
        dataset_from(
            COLS,
            &[
                &["male", "group A", "70", "80"],
                &["female", "group B", "60", ""],
                &["female", "group A", "90", "70"],
                &["", "group Z", "50", "50"],
            ],
        )
    }

    fn s(v: &str) -> String {
        v.to_string()
    }

    #[test]
    fn value_counts_keep_first_appearance_order_and_skip_nulls() {
        let counts = sample().value_counts("Gender").unwrap();
        assert_eq!(counts, vec![(s("male"), 1), (s("female"), 2)]);
    }

    #[test]
    fn counts_of_reports_every_fixed_category() {
        let counts = sample()
            .counts_of("EthnicGroup", &["group A", "group B", "group C"])
            .unwrap();
        assert_eq!(
            counts,
            vec![(s("group A"), 2), (s("group B"), 1), (s("group C"), 0)]
        );
    }

    #[test]
    fn group_means_sorted_and_null_aware() {
        let groups = sample()
            .group_means("Gender", &["MathScore", "ReadingScore"])
            .unwrap();
        assert_eq!(
            groups,
            vec![
                GroupMeans {
                    category: s("female"),
                    means: vec![75.0, 70.0],
                },
                GroupMeans {
                    category: s("male"),
                    means: vec![70.0, 80.0],
                },
            ]
        );
    }

    #[test]
    fn group_with_undefined_mean_is_dropped() {
        let ds = dataset_from(
            &["Status", "MathScore"],
            &[&["married", "70"], &["widowed", ""], &["single", "55"]],
        );
        let groups = ds.group_means("Status", &["MathScore"]).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["married", "single"]);
    }

    #[test]
    fn categories_keep_their_source_text() {
        let ds = dataset_from(
            &["WklyStudyHours", "MathScore"],
            &[&["5.0", "60"], &["10", "80"], &["007", "70"], &["5.0", "70"]],
        );
        let groups = ds.group_means("WklyStudyHours", &["MathScore"]).unwrap();
        let names: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["007", "10", "5.0"]);
        assert_eq!(groups[2].means, vec![65.0]);

        let counts = ds.value_counts("WklyStudyHours").unwrap();
        assert_eq!(counts, vec![(s("5.0"), 2), (s("10"), 1), (s("007"), 1)]);
    }

    #[test]
    fn empty_cells_are_left_out_of_counts() {
        let ds = dataset_from(&["Gender"], &[&[""], &["female"], &["female"]]);
        let counts = ds.value_counts("Gender").unwrap();
        assert_eq!(counts, vec![(s("female"), 2)]);
        let total: u64 = counts.iter().map(|(_, n)| n).sum();
        assert_eq!(total, ds.len() as u64 - 1);
    }

    #[test]
    fn unknown_column_is_an_error() {
        assert_eq!(
            sample().group_means("Nope", &["MathScore"]),
            Err(DataError::UnknownColumn("Nope".into()))
        );
        assert!(sample().column_values("Nope").is_err());
    }

    #[test]
    fn column_values_skip_nulls() {
        assert_eq!(
            sample().column_values("ReadingScore").unwrap(),
            vec![80.0, 70.0, 50.0]
        );
    }

    #[test]
    fn quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.5), Some(2.5));
        assert_eq!(quantile(&v, 0.25), Some(1.75));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn box_stats_flag_outliers() {
        let values = [10.0, 11.0, 12.0, 13.0, 14.0, 100.0];
        let stats = BoxStats::from_values(&values).unwrap();
        assert_eq!(stats.median, 12.5);
        assert_eq!(stats.lower_whisker, 10.0);
        assert_eq!(stats.upper_whisker, 14.0);
        assert_eq!(stats.outliers, vec![100.0]);
        assert!(BoxStats::from_values(&[]).is_none());
    }
}
