/// Chart layer: the static chart table, the recipes that feed it, and the
/// raster pipeline.
///
/// ```text
///   chart id ──lookup──▶ ChartSpec ──recipe──▶ Aggregation
///                                                  │
///                                   render (plotters, PNG)
///                                                  │
///                                           encode (base64)
/// ```

pub mod encode;
pub mod recipe;
pub mod render;

use anyhow::Result;
use serde::Serialize;

use crate::data::model::Dataset;
pub use recipe::{Aggregation, Recipe};

/// How a chart is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// One bar per category, labelled with its count.
    CountPlot,
    /// Math/Reading/Writing bars side by side per category.
    GroupedBar,
    /// Category × score matrix of annotated cells.
    Heatmap,
    Pie,
    /// Horizontal box-and-whisker of one numeric column.
    Boxplot,
}

/// Static description of one chart type.
#[derive(Debug)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub kind: ChartKind,
    pub recipe: Recipe,
    pub x_label: &'static str,
    pub y_label: &'static str,
    /// Output size in pixels.
    pub size: (u32, u32),
}

pub const SCORE_COLUMNS: &[&str] = &["MathScore", "ReadingScore", "WritingScore"];

pub const ETHNIC_GROUPS: &[&str] = &["group A", "group B", "group C", "group D", "group E"];

const fn heatmap(id: &'static str, column: &'static str, title: &'static str) -> ChartSpec {
    ChartSpec {
        id,
        title,
        kind: ChartKind::Heatmap,
        recipe: Recipe::MeanScoresBy(column),
        x_label: "",
        y_label: column,
        size: (700, 500),
    }
}

const fn boxplot(id: &'static str, column: &'static str, title: &'static str) -> ChartSpec {
    ChartSpec {
        id,
        title,
        kind: ChartKind::Boxplot,
        recipe: Recipe::Column(column),
        x_label: column,
        y_label: "",
        size: (700, 500),
    }
}

/// Every chart the dashboard can draw. Adding a chart is one entry here.
pub static CHARTS: &[ChartSpec] = &[
    ChartSpec {
        id: "gender_distribution",
        title: "Gender Distribution",
        kind: ChartKind::CountPlot,
        recipe: Recipe::CountBy("Gender"),
        x_label: "Gender",
        y_label: "count",
        size: (600, 400),
    },
    ChartSpec {
        id: "parent_educ_vs_score",
        title: "Student Scores Based on Parent's Education Level",
        kind: ChartKind::GroupedBar,
        recipe: Recipe::MeanScoresBy("ParentEduc"),
        x_label: "Parent's Education Level",
        y_label: "Scores",
        size: (1000, 600),
    },
    heatmap(
        "parent_marital_vs_score",
        "ParentMaritalStatus",
        "Parent's Marital Status vs Student's Score",
    ),
    ChartSpec {
        id: "ethnic_distribution",
        title: "Distribution of Ethnic Group",
        kind: ChartKind::Pie,
        recipe: Recipe::CountOf {
            column: "EthnicGroup",
            categories: ETHNIC_GROUPS,
        },
        x_label: "",
        y_label: "",
        size: (600, 600),
    },
    boxplot("math_boxplot", "MathScore", "Boxplot of Math Scores"),
    boxplot("reading_boxplot", "ReadingScore", "Boxplot of Reading Scores"),
    boxplot("writing_boxplot", "WritingScore", "Boxplot of Writing Scores"),
    heatmap(
        "weekly_study_vs_score",
        "WklyStudyHours",
        "Relationship between Weekly Study Hours and Student's Score",
    ),
    heatmap(
        "practice_sport_vs_score",
        "PracticeSport",
        "Relationship between Practice Sport and Student's Score",
    ),
    heatmap(
        "lunch_type_vs_score",
        "LunchType",
        "Relationship between Lunch Type and Student's Score",
    ),
];

/// Chart spec registered under `id`, if any. Ids match exactly.
pub fn lookup(id: &str) -> Option<&'static ChartSpec> {
    CHARTS.iter().find(|spec| spec.id == id)
}

/// Run the chart's recipe, draw it and return the base64-encoded PNG.
pub fn render_chart(spec: &ChartSpec, dataset: &Dataset) -> Result<String> {
    let aggregation = spec.recipe.run(dataset)?;
    let png = render::render_png(spec, &aggregation)?;
    Ok(encode::to_base64(&png))
}
