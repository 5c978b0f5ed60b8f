//! Gradient-boosted decision trees with a softmax objective.
//!
//! Each boosting round fits one regression tree per class on the softmax
//! gradients (`p - y`) and hessians (`2p(1 - p)`). Split finding works on
//! quantile bins of each feature; a split on bin `b` sends rows with
//! `x <= cut[b]` to the left child, and the same comparison is used at
//! inference on raw values.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use crate::DxError;

const MIN_HESSIAN: f64 = 1e-6;
const MIN_SPLIT_GAIN: f64 = 1e-9;

/// Hyper-parameters for [`GradientBoostedClassifier::fit`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_rounds: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    /// Fraction of rows drawn per round.
    pub subsample: f64,
    /// Fraction of features drawn per tree.
    pub colsample: f64,
    pub min_child_weight: f64,
    /// L2 regularization on leaf values.
    pub lambda: f64,
    /// At most 256.
    pub max_bins: usize,
    pub seed: u64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_rounds: 300,
            max_depth: 8,
            learning_rate: 0.1,
            subsample: 0.8,
            colsample: 0.8,
            min_child_weight: 1.0,
            lambda: 1.0,
            max_bins: 64,
            seed: 42,
        }
    }
}

impl BoostingParams {
    /// # Errors
    /// Returns a description of the first out-of-range parameter.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_rounds == 0 {
            return Err("n_rounds must be at least 1".into());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".into());
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(format!("learning_rate {} out of range (0, 1]", self.learning_rate));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(format!("subsample {} out of range (0, 1]", self.subsample));
        }
        if !(self.colsample > 0.0 && self.colsample <= 1.0) {
            return Err(format!("colsample {} out of range (0, 1]", self.colsample));
        }
        if !(self.min_child_weight >= 0.0 && self.lambda >= 0.0) {
            return Err("min_child_weight and lambda must be non-negative".into());
        }
        if !(2..=256).contains(&self.max_bins) {
            return Err(format!("max_bins {} out of range [2, 256]", self.max_bins));
        }
        Ok(())
    }
}

/// Quantile-binned, column-major copy of a dense matrix.
struct BinnedMatrix {
    cuts: Vec<Vec<f64>>,
    bins: Vec<Vec<u8>>,
}

impl BinnedMatrix {
    fn new(rows: &[Vec<f64>], n_features: usize, max_bins: usize) -> Self {
        let mut cuts = Vec::with_capacity(n_features);
        let mut bins = Vec::with_capacity(n_features);
        let mut column = Vec::with_capacity(rows.len());

        for f in 0..n_features {
            column.clear();
            column.extend(rows.iter().map(|r| r[f]));
            let feature_cuts = quantile_cuts(&column, max_bins);
            // bin(x) = number of cuts strictly below x, so x <= cut[b] <=> bin(x) <= b.
            let feature_bins = column
                .iter()
                .map(|&x| feature_cuts.partition_point(|&c| c < x) as u8)
                .collect();
            cuts.push(feature_cuts);
            bins.push(feature_bins);
        }

        Self { cuts, bins }
    }
}

/// Strictly increasing cut points between distinct values, at most
/// `max_bins - 1` of them.
fn quantile_cuts(values: &[f64], max_bins: usize) -> Vec<f64> {
    let mut distinct = values.to_vec();
    distinct.sort_by(f64::total_cmp);
    distinct.dedup();

    if distinct.len() < 2 {
        return Vec::new();
    }
    if distinct.len() <= max_bins {
        return distinct.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
    }
    (1..max_bins)
        .map(|q| {
            let i = q * distinct.len() / max_bins;
            (distinct[i - 1] + distinct[i]) / 2.0
        })
        .collect()
}

/// A node of a regression tree. Children always follow their parent in
/// the node vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree producing an additive score for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    #[must_use]
    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        while let Some(node) = self.nodes.get(i) {
            match *node {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let v = x.get(feature).copied().unwrap_or(0.0);
                    i = if v <= threshold { left } else { right };
                }
            }
        }
        0.0
    }

    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn check(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".into());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                if feature >= n_features {
                    return Err(format!("node {i} splits on unknown feature {feature}"));
                }
                if left <= i || right <= i || left >= self.nodes.len() || right >= self.nodes.len()
                {
                    return Err(format!("node {i} has invalid children"));
                }
            }
        }
        Ok(())
    }
}

struct TreeBuilder<'a> {
    data: &'a BinnedMatrix,
    grad: &'a [f64],
    hess: &'a [f64],
    features: &'a [usize],
    params: &'a BoostingParams,
    nodes: Vec<TreeNode>,
    hist: Vec<(f64, f64)>,
}

struct SplitCandidate {
    feature: usize,
    bin: usize,
    gain: f64,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, rows: Vec<usize>) -> RegressionTree {
        self.grow(rows, 0);
        RegressionTree { nodes: self.nodes }
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.params.lambda)
    }

    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let (g, h) = rows
            .iter()
            .fold((0.0, 0.0), |(g, h), &r| (g + self.grad[r], h + self.hess[r]));

        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: -g / (h + self.params.lambda) * self.params.learning_rate,
        });

        if depth >= self.params.max_depth || rows.len() < 2 {
            return idx;
        }

        if let Some(split) = self.best_split(&rows, g, h) {
            let data = self.data;
            let column = &data.bins[split.feature];
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| usize::from(column[r]) <= split.bin);
            let threshold = data.cuts[split.feature][split.bin];

            let left = self.grow(left_rows, depth + 1);
            let right = self.grow(right_rows, depth + 1);
            self.nodes[idx] = TreeNode::Split {
                feature: split.feature,
                threshold,
                gain: split.gain,
                left,
                right,
            };
        }
        idx
    }

    fn best_split(&mut self, rows: &[usize], g: f64, h: f64) -> Option<SplitCandidate> {
        let data = self.data;
        let parent = self.score(g, h);
        let min_child = self.params.min_child_weight;
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let cuts = &data.cuts[feature];
            if cuts.is_empty() {
                continue;
            }
            let n_bins = cuts.len() + 1;
            self.hist.clear();
            self.hist.resize(n_bins, (0.0, 0.0));

            let column = &data.bins[feature];
            for &r in rows {
                let slot = &mut self.hist[usize::from(column[r])];
                slot.0 += self.grad[r];
                slot.1 += self.hess[r];
            }

            let (mut gl, mut hl) = (0.0, 0.0);
            for bin in 0..cuts.len() {
                gl += self.hist[bin].0;
                hl += self.hist[bin].1;
                let (gr, hr) = (g - gl, h - hl);
                if hl < min_child || hr < min_child {
                    continue;
                }
                let gain = self.score(gl, hl) + self.score(gr, hr) - parent;
                let threshold = best.as_ref().map_or(MIN_SPLIT_GAIN, |b| b.gain);
                if gain > threshold {
                    best = Some(SplitCandidate { feature, bin, gain });
                }
            }
        }
        best
    }
}

/// Multiclass classifier: `n_rounds` rounds of one tree per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedClassifier {
    n_features: usize,
    n_classes: usize,
    rounds: Vec<Vec<RegressionTree>>,
}

impl GradientBoostedClassifier {
    /// Fit on a dense matrix with class indices in `0..n_classes`.
    ///
    /// # Errors
    /// Returns `Validation` if the inputs or parameters are malformed.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[usize],
        n_classes: usize,
        params: &BoostingParams,
    ) -> crate::Result<Self> {
        params.validate().map_err(DxError::Validation)?;
        if x.is_empty() {
            return Err(DxError::Validation("cannot fit on an empty matrix".into()));
        }
        if x.len() != y.len() {
            return Err(DxError::Validation(format!(
                "{} rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if n_classes == 0 || y.iter().any(|&c| c >= n_classes) {
            return Err(DxError::Validation(format!(
                "labels must lie in 0..{n_classes}"
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|r| r.len() != n_features) {
            return Err(DxError::Validation(
                "all rows must have the same non-zero length".into(),
            ));
        }

        let n = x.len();
        let k = n_classes;
        let data = BinnedMatrix::new(x, n_features, params.max_bins);
        let mut rng = ChaCha20Rng::seed_from_u64(params.seed);
        let n_cols = ((params.colsample * n_features as f64).ceil() as usize).clamp(1, n_features);

        let mut scores = vec![0.0; n * k];
        let mut probs = vec![0.0; n * k];
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];
        let mut rounds = Vec::with_capacity(params.n_rounds);

        tracing::debug!(
            "Boosting {} rounds over {} rows, {} features, {} classes",
            params.n_rounds,
            n,
            n_features,
            k
        );

        for round in 0..params.n_rounds {
            for (s, p) in scores.chunks_exact(k).zip(probs.chunks_exact_mut(k)) {
                softmax_into(s, p);
            }

            let mut rows: Vec<usize> = if params.subsample < 1.0 {
                (0..n).filter(|_| rng.gen::<f64>() < params.subsample).collect()
            } else {
                (0..n).collect()
            };
            if rows.is_empty() {
                rows = (0..n).collect();
            }

            let mut trees = Vec::with_capacity(k);
            for class in 0..k {
                for i in 0..n {
                    let p = probs[i * k + class];
                    let target = if y[i] == class { 1.0 } else { 0.0 };
                    grad[i] = p - target;
                    hess[i] = (2.0 * p * (1.0 - p)).max(MIN_HESSIAN);
                }

                let mut features = index::sample(&mut rng, n_features, n_cols).into_vec();
                features.sort_unstable();

                let tree = TreeBuilder {
                    data: &data,
                    grad: &grad,
                    hess: &hess,
                    features: &features,
                    params,
                    nodes: Vec::new(),
                    hist: Vec::with_capacity(params.max_bins),
                }
                .build(rows.clone());

                for (i, row) in x.iter().enumerate() {
                    scores[i * k + class] += tree.predict(row);
                }
                trees.push(tree);
            }
            rounds.push(trees);

            if (round + 1) % 50 == 0 {
                tracing::debug!(
                    "Round {}: train mlogloss {:.4}",
                    round + 1,
                    log_loss(&scores, y, k)
                );
            }
        }

        Ok(Self {
            n_features,
            n_classes,
            rounds,
        })
    }

    /// Class probabilities for one encoded row; sums to 1.
    ///
    /// # Errors
    /// Returns `Encoding` if the row length differs from the fitted one.
    pub fn predict_proba(&self, x: &[f64]) -> crate::Result<Vec<f64>> {
        if x.len() != self.n_features {
            return Err(DxError::Encoding(format!(
                "expected {} features, got {}",
                self.n_features,
                x.len()
            )));
        }
        let mut scores = vec![0.0; self.n_classes];
        for trees in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(trees) {
                *score += tree.predict(x);
            }
        }
        let mut probs = vec![0.0; self.n_classes];
        softmax_into(&scores, &mut probs);
        Ok(probs)
    }

    /// Index of the most probable class (lowest index on ties).
    ///
    /// # Errors
    /// Returns `Encoding` if the row length differs from the fitted one.
    pub fn predict(&self, x: &[f64]) -> crate::Result<usize> {
        let probs = self.predict_proba(x)?;
        Ok(argmax(&probs))
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn n_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Total split gain per feature, normalized to sum to 1.
    #[must_use]
    pub fn feature_importance(&self) -> Vec<f64> {
        let mut importance = vec![0.0; self.n_features];
        for tree in self.rounds.iter().flatten() {
            for node in &tree.nodes {
                if let TreeNode::Split { feature, gain, .. } = *node {
                    if let Some(slot) = importance.get_mut(feature) {
                        *slot += gain;
                    }
                }
            }
        }
        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            importance.iter_mut().for_each(|v| *v /= total);
        }
        importance
    }

    /// Structural check for deserialized models.
    ///
    /// # Errors
    /// Returns a description of the first defect found.
    pub fn check(&self) -> Result<(), String> {
        if self.n_classes == 0 || self.rounds.is_empty() {
            return Err("classifier has no classes or no rounds".into());
        }
        for (r, trees) in self.rounds.iter().enumerate() {
            if trees.len() != self.n_classes {
                return Err(format!(
                    "round {r} has {} trees for {} classes",
                    trees.len(),
                    self.n_classes
                ));
            }
            for tree in trees {
                tree.check(self.n_features)
                    .map_err(|e| format!("round {r}: {e}"))?;
            }
        }
        Ok(())
    }
}

fn softmax_into(scores: &[f64], out: &mut [f64]) {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for (o, &s) in out.iter_mut().zip(scores) {
        *o = (s - max).exp();
        sum += *o;
    }
    for o in out.iter_mut() {
        *o /= sum;
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn log_loss(scores: &[f64], y: &[usize], k: usize) -> f64 {
    let mut probs = vec![0.0; k];
    let total: f64 = scores
        .chunks_exact(k)
        .zip(y)
        .map(|(s, &c)| {
            softmax_into(s, &mut probs);
            -probs[c].max(1e-15).ln()
        })
        .sum();
    total / y.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> BoostingParams {
        BoostingParams {
            n_rounds: 20,
            max_depth: 3,
            learning_rate: 0.3,
            subsample: 1.0,
            colsample: 1.0,
            min_child_weight: 0.1,
            ..Default::default()
        }
    }

    /// Three well separated clusters on the first feature, noise on the second.
    fn clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            x.push(vec![class as f64 * 10.0 + (i as f64 * 0.1), (i * 7 % 5) as f64]);
            y.push(class);
        }
        (x, y)
    }

    #[test]
    fn test_quantile_cuts() {
        assert!(quantile_cuts(&[1.0, 1.0, 1.0], 64).is_empty());
        assert_eq!(quantile_cuts(&[0.0, 2.0, 2.0, 4.0], 64), vec![1.0, 3.0]);

        let many: Vec<f64> = (0..1000).map(f64::from).collect();
        let cuts = quantile_cuts(&many, 16);
        assert_eq!(cuts.len(), 15);
        assert!(cuts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_bins_agree_with_thresholds() {
        let rows: Vec<Vec<f64>> = [0.0, 0.0, 5.0, 7.5, 7.5, 100.0]
            .iter()
            .map(|&v| vec![v])
            .collect();
        let data = BinnedMatrix::new(&rows, 1, 64);
        for (r, row) in rows.iter().enumerate() {
            for (b, &cut) in data.cuts[0].iter().enumerate() {
                assert_eq!(usize::from(data.bins[0][r]) <= b, row[0] <= cut);
            }
        }
    }

    #[test]
    fn test_fit_separates_clusters() {
        let (x, y) = clusters();
        let model = GradientBoostedClassifier::fit(&x, &y, 3, &small_params()).expect("Should fit");

        assert_eq!(model.n_rounds(), 20);
        assert!(model.check().is_ok());
        for (row, &label) in x.iter().zip(&y) {
            assert_eq!(model.predict(row).expect("Should predict"), label);
        }

        let probs = model.predict_proba(&[20.5, 1.0]).expect("Should predict");
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(probs[2] > 0.8);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = clusters();
        let params = BoostingParams {
            subsample: 0.8,
            colsample: 0.5,
            ..small_params()
        };
        let a = GradientBoostedClassifier::fit(&x, &y, 3, &params).expect("Should fit");
        let b = GradientBoostedClassifier::fit(&x, &y, 3, &params).expect("Should fit");
        assert_eq!(a, b);
    }

    #[test]
    fn test_feature_importance_prefers_signal() {
        let (x, y) = clusters();
        let model = GradientBoostedClassifier::fit(&x, &y, 3, &small_params()).expect("Should fit");
        let importance = model.feature_importance();
        assert!(importance[0] > importance[1]);
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_width_is_encoding_error() {
        let (x, y) = clusters();
        let model = GradientBoostedClassifier::fit(&x, &y, 3, &small_params()).expect("Should fit");
        assert!(matches!(
            model.predict_proba(&[1.0]),
            Err(DxError::Encoding(_))
        ));
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let params = small_params();
        assert!(GradientBoostedClassifier::fit(&[], &[], 2, &params).is_err());
        assert!(GradientBoostedClassifier::fit(&[vec![1.0]], &[3], 2, &params).is_err());
        let bad = BoostingParams {
            learning_rate: 0.0,
            ..params
        };
        assert!(GradientBoostedClassifier::fit(&[vec![1.0]], &[0], 1, &bad).is_err());
    }

    #[test]
    fn test_serde_roundtrip_predicts_identically() {
        let (x, y) = clusters();
        let model = GradientBoostedClassifier::fit(&x, &y, 3, &small_params()).expect("Should fit");
        let json = serde_json::to_string(&model).expect("Should serialize");
        let restored: GradientBoostedClassifier = serde_json::from_str(&json).expect("Should parse");
        assert_eq!(
            model.predict_proba(&x[4]).expect("Should predict"),
            restored.predict_proba(&x[4]).expect("Should predict")
        );
    }

    #[test]
    fn test_check_rejects_cyclic_tree() {
        let tree = RegressionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.0,
                gain: 1.0,
                left: 0,
                right: 0,
            }],
        };
        assert!(tree.check(1).is_err());
    }
}
