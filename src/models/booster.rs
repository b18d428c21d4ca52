//! Gradient boosted tree model
//!
//! This module loads a trained XGBoost booster saved in its JSON model format
//! (`booster.save_model("strike_model.json")`) and evaluates it on a single
//! feature row. Only inference is supported; the model is read-only once
//! loaded.

use crate::features::{EncodingError, FeatureRow, FEATURE_COLUMNS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Failed to read model file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse model: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Feature row does not match the model: {0}")]
    FeatureMismatch(#[from] EncodingError),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),
}

/// Output transform applied to the summed tree margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Objective {
    /// `binary:logistic`
    BinaryLogistic,
    /// `reg:logistic`
    RegLogistic,
    /// `reg:squarederror`
    SquaredError,
}

impl Objective {
    fn from_name(name: &str) -> Result<Self, ModelError> {
        match name {
            "binary:logistic" => Ok(Objective::BinaryLogistic),
            "reg:logistic" => Ok(Objective::RegLogistic),
            "reg:squarederror" => Ok(Objective::SquaredError),
            other => Err(ModelError::UnsupportedModel(format!(
                "objective {other:?} does not produce a probability"
            ))),
        }
    }

    /// XGBoost objective name
    pub fn name(&self) -> &'static str {
        match self {
            Objective::BinaryLogistic => "binary:logistic",
            Objective::RegLogistic => "reg:logistic",
            Objective::SquaredError => "reg:squarederror",
        }
    }

    fn is_logistic(&self) -> bool {
        matches!(self, Objective::BinaryLogistic | Objective::RegLogistic)
    }

    /// Convert a base score from output space to margin space
    fn base_margin(&self, base_score: f32) -> Result<f32, ModelError> {
        if !self.is_logistic() {
            return Ok(base_score);
        }
        if !(base_score > 0.0 && base_score < 1.0) {
            return Err(ModelError::InvalidModel(format!(
                "base_score {base_score} must lie in (0, 1) for {}",
                self.name()
            )));
        }
        Ok((base_score / (1.0 - base_score)).ln())
    }

    fn transform(&self, margin: f32) -> f32 {
        if self.is_logistic() {
            1.0 / (1.0 + (-margin).exp())
        } else {
            margin
        }
    }
}

// ---- on-disk layout -------------------------------------------------------

#[derive(Deserialize)]
struct ModelFile {
    learner: LearnerJson,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Deserialize)]
struct LearnerJson {
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: GradientBoosterJson,
    learner_model_param: LearnerModelParamJson,
    objective: ObjectiveJson,
}

#[derive(Deserialize)]
struct GradientBoosterJson {
    name: String,
    model: Option<GbTreeJson>,
}

#[derive(Deserialize)]
struct GbTreeJson {
    trees: Vec<TreeJson>,
}

#[derive(Deserialize)]
struct LearnerModelParamJson {
    base_score: String,
    #[serde(default)]
    num_class: Option<String>,
    #[serde(default)]
    num_feature: Option<String>,
}

#[derive(Deserialize)]
struct ObjectiveJson {
    name: String,
}

#[derive(Deserialize)]
struct TreeJson {
    left_children: Vec<i64>,
    right_children: Vec<i64>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<i64>,
}

/// Older writers emit `default_left` as integers, newer ones as booleans.
#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Int(i) => *i != 0,
        }
    }
}

/// Parse `"5E-1"` or the bracketed `"[5E-1]"` written by newer releases.
fn parse_base_score(raw: &str) -> Result<f32, ModelError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    if trimmed.contains(',') {
        return Err(ModelError::UnsupportedModel(format!(
            "multi-target base_score {raw:?}"
        )));
    }
    trimmed
        .trim()
        .parse::<f32>()
        .map_err(|_| ModelError::InvalidModel(format!("unparseable base_score {raw:?}")))
}

fn parse_count(raw: Option<&str>, what: &str) -> Result<Option<usize>, ModelError> {
    raw.map(|s| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| ModelError::InvalidModel(format!("unparseable {what} {s:?}")))
    })
    .transpose()
}

// ---- in-memory model ------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
struct Node {
    left: usize,
    right: usize,
    split_index: usize,
    /// Threshold for internal nodes, leaf weight for leaves
    value: f32,
    default_left: bool,
    is_leaf: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(idx: usize, raw: TreeJson) -> Result<Self, ModelError> {
        let n = raw.left_children.len();
        let invalid = |msg: String| ModelError::InvalidModel(format!("tree {idx}: {msg}"));

        if n == 0 {
            return Err(invalid("no nodes".to_string()));
        }
        if raw.right_children.len() != n
            || raw.split_indices.len() != n
            || raw.split_conditions.len() != n
            || raw.default_left.len() != n
        {
            return Err(invalid("node arrays have different lengths".to_string()));
        }
        if raw.split_type.iter().any(|&t| t != 0) {
            return Err(ModelError::UnsupportedModel(format!(
                "tree {idx} uses categorical splits"
            )));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (raw.left_children[i], raw.right_children[i]);
            let is_leaf = l == -1;
            if is_leaf {
                nodes.push(Node {
                    left: 0,
                    right: 0,
                    split_index: 0,
                    value: raw.split_conditions[i],
                    default_left: false,
                    is_leaf,
                });
                continue;
            }

            let in_bounds = |c: i64| c > 0 && (c as usize) < n;
            if !in_bounds(l) || !in_bounds(r) {
                return Err(invalid(format!("node {i} has children ({l}, {r}) out of bounds")));
            }
            if raw.split_indices[i] < 0 {
                return Err(invalid(format!("node {i} has negative split index")));
            }

            nodes.push(Node {
                left: l as usize,
                right: r as usize,
                split_index: raw.split_indices[i] as usize,
                value: raw.split_conditions[i],
                default_left: raw.default_left[i].is_set(),
                is_leaf,
            });
        }

        Ok(Self { nodes })
    }

    fn max_split_index(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter(|n| !n.is_leaf)
            .map(|n| n.split_index)
            .max()
    }

    /// Leaf weight reached by `x`. NaN features follow the default direction.
    fn leaf_value(&self, x: &[f32]) -> Option<f32> {
        let mut idx = 0;
        // A well-formed tree is acyclic, so a path never revisits a node.
        for _ in 0..self.nodes.len() {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return Some(node.value);
            }
            let fvalue = x[node.split_index];
            idx = if fvalue.is_nan() {
                if node.default_left {
                    node.left
                } else {
                    node.right
                }
            } else if fvalue < node.value {
                node.left
            } else {
                node.right
            };
        }
        None
    }
}

/// Summary of a loaded model for logging and the `inspect` command
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    /// Number of boosted trees
    pub num_trees: usize,
    /// Number of input features the trees index into
    pub num_feature: usize,
    /// Column names the model was fit on (empty if unnamed)
    pub feature_names: Vec<String>,
    /// Objective name
    pub objective: &'static str,
    /// Base score in output space
    pub base_score: f32,
    /// Library version that wrote the file, e.g. "1.7.6"
    pub version: Option<String>,
}

/// Trained gradient boosted tree ensemble
#[derive(Debug, Clone)]
pub struct Booster {
    feature_names: Vec<String>,
    num_feature: usize,
    objective: Objective,
    base_score: f32,
    base_margin: f32,
    trees: Vec<Tree>,
    version: Option<String>,
}

impl Booster {
    /// Load a model from a JSON file on disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let booster = Self::from_json_str(&text)?;
        info!(
            "Loaded {} model from {} ({} trees, {} features)",
            booster.objective.name(),
            path.display(),
            booster.trees.len(),
            booster.num_feature
        );
        Ok(booster)
    }

    /// Parse a model from its JSON text
    pub fn from_json_str(text: &str) -> Result<Self, ModelError> {
        let file: ModelFile = serde_json::from_str(text)?;
        let learner = file.learner;

        if learner.gradient_booster.name != "gbtree" {
            return Err(ModelError::UnsupportedModel(format!(
                "booster type {:?}",
                learner.gradient_booster.name
            )));
        }
        let gbtree = learner
            .gradient_booster
            .model
            .ok_or_else(|| ModelError::InvalidModel("gbtree has no model section".to_string()))?;

        let params = &learner.learner_model_param;
        if parse_count(params.num_class.as_deref(), "num_class")?.unwrap_or(0) > 1 {
            return Err(ModelError::UnsupportedModel(
                "multi-class models are not supported".to_string(),
            ));
        }

        let objective = Objective::from_name(&learner.objective.name)?;
        let base_score = parse_base_score(&params.base_score)?;
        let base_margin = objective.base_margin(base_score)?;

        let trees = gbtree
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_json(i, t))
            .collect::<Result<Vec<_>, _>>()?;

        let feature_names = learner.feature_names;
        let declared = parse_count(params.num_feature.as_deref(), "num_feature")?;
        let used = trees
            .iter()
            .filter_map(Tree::max_split_index)
            .max()
            .map_or(0, |m| m + 1);
        let num_feature = match declared {
            Some(0) | None if !feature_names.is_empty() => feature_names.len(),
            Some(0) | None => used,
            Some(n) => n,
        };

        if used > num_feature {
            return Err(ModelError::InvalidModel(format!(
                "trees split on feature {} but the model declares {} features",
                used - 1,
                num_feature
            )));
        }
        if !feature_names.is_empty() && feature_names.len() != num_feature {
            return Err(ModelError::InvalidModel(format!(
                "{} feature names for {} features",
                feature_names.len(),
                num_feature
            )));
        }

        let version = (!file.version.is_empty()).then(|| {
            file.version
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(".")
        });

        Ok(Self {
            feature_names,
            num_feature,
            objective,
            base_score,
            base_margin,
            trees,
            version,
        })
    }

    /// Column names the model was fit on, in model order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of trees in the ensemble
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Describe the loaded model
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            num_trees: self.trees.len(),
            num_feature: self.num_feature,
            feature_names: self.feature_names.clone(),
            objective: self.objective.name(),
            base_score: self.base_score,
            version: self.version.clone(),
        }
    }

    /// Arrange a named row in model feature order.
    ///
    /// Unnamed models consume the canonical column order.
    fn model_inputs(&self, row: &FeatureRow) -> Result<Vec<f32>, ModelError> {
        let x = if self.feature_names.is_empty() {
            row.select(&FEATURE_COLUMNS)
        } else {
            row.select(&self.feature_names)
        }?;

        if x.len() < self.num_feature {
            return Err(ModelError::PredictionFailed(format!(
                "model expects {} features, row provides {}",
                self.num_feature,
                x.len()
            )));
        }
        Ok(x)
    }

    /// Raw summed margin for one row, before the objective transform
    pub fn predict_margin(&self, row: &FeatureRow) -> Result<f32, ModelError> {
        let x = self.model_inputs(row)?;

        let mut margin = self.base_margin;
        for (i, tree) in self.trees.iter().enumerate() {
            margin += tree
                .leaf_value(&x)
                .ok_or_else(|| ModelError::PredictionFailed(format!("tree {i} contains a cycle")))?;
        }
        Ok(margin)
    }

    /// Model output for one row (a probability for logistic objectives)
    pub fn predict_row(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let margin = self.predict_margin(row)?;
        let output = self.objective.transform(margin) as f64;
        debug!("margin={:.6} output={:.6}", margin, output);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const FIXTURE: &str = include_str!("../../tests/fixtures/strike_model.json");

    fn row(age: f32, sbp: f32, smoking: f32) -> FeatureRow {
        FeatureRow::new(
            FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            vec![age, 80.0, sbp, 0.0, 1.0, smoking],
        )
        .unwrap()
    }

    fn sigmoid(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }

    #[test]
    fn test_load_fixture() {
        let booster = Booster::from_json_str(FIXTURE).unwrap();
        let summary = booster.summary();

        assert_eq!(summary.num_trees, 2);
        assert_eq!(summary.num_feature, 6);
        assert_eq!(summary.objective, "binary:logistic");
        assert_eq!(summary.version.as_deref(), Some("1.7.6"));
        assert_eq!(booster.feature_names(), &FEATURE_COLUMNS.map(String::from));
    }

    #[test]
    fn test_tree_traversal() {
        let booster = Booster::from_json_str(FIXTURE).unwrap();

        // age < 65 -> -0.5; smoking < 1.5 and sbp < 140 -> -0.2
        assert_abs_diff_eq!(
            booster.predict_margin(&row(60.0, 120.0, 0.0)).unwrap(),
            -0.7,
            epsilon = 1e-6
        );
        // age >= 65 -> 0.3; smoking < 1.5 and sbp >= 140 -> 0.1
        assert_abs_diff_eq!(
            booster.predict_margin(&row(70.0, 150.0, 1.0)).unwrap(),
            0.4,
            epsilon = 1e-6
        );
        // split value goes right
        assert_abs_diff_eq!(
            booster.predict_margin(&row(65.0, 140.0, 2.0)).unwrap(),
            0.7,
            epsilon = 1e-6
        );

        let p = booster.predict_row(&row(60.0, 120.0, 0.0)).unwrap();
        assert_abs_diff_eq!(p, sigmoid(-0.7), epsilon = 1e-6);
    }

    #[test]
    fn test_missing_value_follows_default() {
        let booster = Booster::from_json_str(FIXTURE).unwrap();
        // age NaN defaults left (-0.5), smoking NaN defaults right (0.4)
        let margin = booster
            .predict_margin(&row(f32::NAN, 120.0, f32::NAN))
            .unwrap();
        assert_abs_diff_eq!(margin, -0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let booster = Booster::from_json_str(FIXTURE).unwrap();
        let shuffled = FeatureRow::new(
            ["smoking", "sex", "sbp", "dbp", "diabetes", "age"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![0.0, 1.0, 120.0, 80.0, 0.0, 60.0],
        )
        .unwrap();

        assert_eq!(
            booster.predict_row(&shuffled).unwrap(),
            booster.predict_row(&row(60.0, 120.0, 0.0)).unwrap()
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let booster = Booster::from_json_str(FIXTURE).unwrap();
        let partial = FeatureRow::new(
            vec!["age".to_string(), "sbp".to_string()],
            vec![60.0, 120.0],
        )
        .unwrap();

        match booster.predict_row(&partial) {
            Err(ModelError::FeatureMismatch(EncodingError::MissingColumn(name))) => {
                assert_eq!(name, "dbp")
            }
            other => panic!("expected feature mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_base_score_formats() {
        assert_eq!(parse_base_score("5E-1").unwrap(), 0.5);
        assert_eq!(parse_base_score("[2.5E-2]").unwrap(), 0.025);
        assert!(parse_base_score("[1E-1,2E-1]").is_err());
        assert!(parse_base_score("abc").is_err());
    }

    #[test]
    fn test_base_score_shifts_margin() {
        let text = FIXTURE.replace("\"5E-1\"", "\"[2E-1]\"");
        let booster = Booster::from_json_str(&text).unwrap();
        let expected = (0.2f64 / 0.8).ln() - 0.7;
        assert_abs_diff_eq!(
            booster.predict_margin(&row(60.0, 120.0, 0.0)).unwrap() as f64,
            expected,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_rejects_unsupported_objective() {
        let text = FIXTURE.replace("binary:logistic", "multi:softprob");
        assert!(matches!(
            Booster::from_json_str(&text),
            Err(ModelError::UnsupportedModel(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_bounds_children() {
        let text = FIXTURE.replace(
            "\"left_children\": [1, -1, -1]",
            "\"left_children\": [7, -1, -1]",
        );
        assert!(matches!(
            Booster::from_json_str(&text),
            Err(ModelError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = Booster::load("/nonexistent/strike_model.json").unwrap_err();
        assert!(matches!(err, ModelError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/strike_model.json"));
    }
}
