use crate::data::aggregate::DataError;
use crate::data::model::Dataset;

use super::SCORE_COLUMNS;

/// The aggregation a chart is drawn from.
#[derive(Debug, Clone, Copy)]
pub enum Recipe {
    /// Rows per distinct value of a column.
    CountBy(&'static str),
    /// Rows per value of a fixed category list; absent categories count 0.
    CountOf {
        column: &'static str,
        categories: &'static [&'static str],
    },
    /// Mean Math/Reading/Writing score per distinct value of a column.
    MeanScoresBy(&'static str),
    /// Raw values of one numeric column.
    Column(&'static str),
}

/// A recipe's output, handed to the renderer and then discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    /// category → row count
    Counts(Vec<(String, u64)>),
    /// category → one mean per entry of `series`
    Means {
        series: &'static [&'static str],
        groups: Vec<(String, Vec<f64>)>,
    },
    Values(Vec<f64>),
}

impl Recipe {
    pub fn run(&self, dataset: &Dataset) -> Result<Aggregation, DataError> {
        let aggregation = match *self {
            Recipe::CountBy(column) => Aggregation::Counts(dataset.value_counts(column)?),
            Recipe::CountOf { column, categories } => {
                Aggregation::Counts(dataset.counts_of(column, categories)?)
            }
            Recipe::MeanScoresBy(column) => Aggregation::Means {
                series: SCORE_COLUMNS,
                groups: dataset
                    .group_means(column, SCORE_COLUMNS)?
                    .into_iter()
                    .map(|g| (g.category, g.means))
                    .collect(),
            },
            Recipe::Column(column) => Aggregation::Values(dataset.column_values(column)?),
        };
        Ok(aggregation)
    }
}

impl Aggregation {
    /// Whether there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            Aggregation::Counts(c) => c.is_empty(),
            Aggregation::Means { groups, .. } => groups.is_empty(),
            Aggregation::Values(v) => v.is_empty(),
        }
    }

    /// Whether every number in the aggregation is finite. Means of huge
    /// scores can overflow even when each cell is finite.
    pub fn is_finite(&self) -> bool {
        match self {
            Aggregation::Counts(_) => true,
            Aggregation::Means { groups, .. } => groups
                .iter()
                .all(|(_, means)| means.iter().all(|m| m.is_finite())),
            Aggregation::Values(v) => v.iter().all(|x| x.is_finite()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{lookup, ETHNIC_GROUPS};
    use crate::data::model::tests::dataset_from;

    const COLS: &[&str] = &[
        "Gender",
        "EthnicGroup",
        "ParentEduc",
        "ParentMaritalStatus",
        "LunchType",
        "PracticeSport",
        "WklyStudyHours",
        "MathScore",
        "ReadingScore",
        "WritingScore",
    ];

    #[rustfmt::skip]
    fn students() -> Dataset {
        dataset_from(
            COLS,
            &[
                &["male", "group A", "high school", "married", "standard", "never",
                  "< 5", "60", "70", "80"],
                &["female", "group C", "high school", "single", "standard", "regularly",
                  "5 - 10", "80", "90", "100"],
                &["female", "group X", "master's degree", "", "free/reduced", "regularly",
                  "< 5", "70", "65", "60"],
            ],
        )
    }

    fn counts(agg: Aggregation) -> Vec<(String, u64)> {
        match agg {
            Aggregation::Counts(c) => c,
            other => panic!("expected counts, got {other:?}"),
        }
    }

    #[test]
    fn gender_counts_for_three_rows() {
        let ds = dataset_from(&["Gender"], &[&["male"], &["female"], &["female"]]);
        let out = counts(lookup("gender_distribution").unwrap().recipe.run(&ds).unwrap());
        assert_eq!(out, vec![("male".to_string(), 1), ("female".to_string(), 2)]);
    }

    #[test]
    fn gender_counts_sum_to_row_count() {
        let ds = students();
        let out = counts(Recipe::CountBy("Gender").run(&ds).unwrap());
        assert_eq!(out.iter().map(|(_, n)| n).sum::<u64>(), ds.len() as u64);
    }

    #[test]
    fn ethnic_counts_cover_five_groups_and_skip_others() {
        let ds = students();
        let out = counts(lookup("ethnic_distribution").unwrap().recipe.run(&ds).unwrap());
        let names: Vec<&str> = out.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ETHNIC_GROUPS);
        assert_eq!(
            out.iter().map(|(_, n)| *n).collect::<Vec<_>>(),
            vec![1, 0, 1, 0, 0]
        );
        // "group X" is outside the fixed list and is counted nowhere
        assert_eq!(out.iter().map(|(_, n)| n).sum::<u64>(), 2);
    }

    #[test]
    fn mean_scores_per_category() {
        let agg = lookup("parent_educ_vs_score").unwrap().recipe.run(&students()).unwrap();
        assert_eq!(
            agg,
            Aggregation::Means {
                series: SCORE_COLUMNS,
                groups: vec![
                    ("high school".to_string(), vec![70.0, 80.0, 90.0]),
                    ("master's degree".to_string(), vec![70.0, 65.0, 60.0]),
                ],
            }
        );
    }

    #[test]
    fn null_category_rows_form_no_group() {
        let agg = lookup("parent_marital_vs_score").unwrap().recipe.run(&students()).unwrap();
        let Aggregation::Means { groups, .. } = agg else {
            panic!("expected means");
        };
        let names: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["married", "single"]);
    }

    #[test]
    fn boxplot_recipe_extracts_raw_column() {
        let agg = lookup("writing_boxplot").unwrap().recipe.run(&students()).unwrap();
        assert_eq!(agg, Aggregation::Values(vec![80.0, 100.0, 60.0]));
    }

    #[test]
    fn overflowing_means_are_not_finite() {
        let ds = dataset_from(
            &["LunchType", "MathScore", "ReadingScore", "WritingScore"],
            &[&["standard", "1e308", "1", "1"], &["standard", "1e308", "1", "1"]],
        );
        let agg = Recipe::MeanScoresBy("LunchType").run(&ds).unwrap();
        assert!(!agg.is_finite());
        assert!(Recipe::Column("MathScore").run(&ds).unwrap().is_finite());
    }

    #[test]
    fn every_chart_recipe_runs_on_full_columns() {
        let ds = students();
        for spec in crate::charts::CHARTS {
            let agg = spec.recipe.run(&ds).unwrap();
            assert!(!agg.is_empty(), "{} produced nothing", spec.id);
        }
    }
}
