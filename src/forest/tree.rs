//! CART classification tree (Gini impurity) stored as a flat node arena.
//!
//! Nodes reference their children by index into `nodes`; the root is
//! always node 0. Samples with `value <= threshold` go left.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::NUM_FEATURES;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split before accepting the best found so far
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Class probabilities, indexed like the forest's `classes`
        distribution: Vec<f64>,
    },
}

impl Node {
    fn leaf(counts: &[usize]) -> Self {
        let total: usize = counts.iter().sum();
        let distribution = counts
            .iter()
            .map(|&c| if total == 0 { 0.0 } else { c as f64 / total as f64 })
            .collect();
        Self::Leaf { distribution }
    }
}

/// Training view shared by every node of a tree: feature matrix and class
/// indices for all rows, addressed by the bootstrap's sample indices.
struct TrainingData<'a> {
    x: &'a [[f64; NUM_FEATURES]],
    y: &'a [usize],
    n_classes: usize,
}

impl TrainingData<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }
}

#[derive(Debug, Clone, Copy)]
struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the rows named by `indices` (a bootstrap sample; may
    /// contain repeats).
    pub fn fit<R: Rng>(
        x: &[[f64; NUM_FEATURES]],
        y: &[usize],
        n_classes: usize,
        mut indices: Vec<usize>,
        params: TreeParams,
        rng: &mut R,
    ) -> Self {
        let data = TrainingData { x, y, n_classes };
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(&data, &mut indices, 0, params, rng);
        tree
    }

    fn grow<R: Rng>(
        &mut self,
        data: &TrainingData<'_>,
        indices: &mut [usize],
        depth: usize,
        params: TreeParams,
        rng: &mut R,
    ) -> usize {
        let node_id = self.nodes.len();
        let counts = data.class_counts(indices);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_small = indices.len() < params.min_samples_split;
        let too_deep = params.max_depth.is_some_and(|d| depth >= d);
        if pure || too_small || too_deep {
            self.nodes.push(Node::leaf(&counts));
            return node_id;
        }

        let Some(split) = best_split(data, indices, params.max_features, rng) else {
            self.nodes.push(Node::leaf(&counts));
            return node_id;
        };

        // Reserve the slot; children are appended after it.
        self.nodes.push(Node::leaf(&counts));

        let mid = partition(indices, |i| data.x[i][split.feature] <= split.threshold);
        let (left_idx, right_idx) = indices.split_at_mut(mid);
        let left = self.grow(data, left_idx, depth + 1, params, rng);
        let right = self.grow(data, right_idx, depth + 1, params, rng);

        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    /// Class distribution of the leaf `row` falls into.
    pub fn leaf_distribution(&self, row: &[f64; NUM_FEATURES]) -> &[f64] {
        let mut id = 0;
        loop {
            match &self.nodes[id] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    id = if row[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { distribution } => return distribution,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((id, d)) = stack.pop() {
            match &self.nodes[id] {
                Node::Split { left, right, .. } => {
                    stack.push((*left, d + 1));
                    stack.push((*right, d + 1));
                }
                Node::Leaf { .. } => max_depth = max_depth.max(d),
            }
        }
        max_depth
    }
}

/// Reorder `indices` so every element satisfying `goes_left` comes first;
/// returns the number of such elements.
fn partition(indices: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for j in 0..indices.len() {
        if goes_left(indices[j]) {
            indices.swap(mid, j);
            mid += 1;
        }
    }
    mid
}

/// Lowest weighted-Gini split over a random feature subset.
///
/// At least `max_features` features are examined; if none of them can split
/// the node (all constant), the remaining features are tried too.
fn best_split<R: Rng>(
    data: &TrainingData<'_>,
    indices: &[usize],
    max_features: usize,
    rng: &mut R,
) -> Option<Split> {
    let mut features: Vec<usize> = (0..NUM_FEATURES).collect();
    features.shuffle(rng);

    let n = indices.len();
    if n < 2 {
        return None;
    }
    let mut best: Option<Split> = None;
    let mut sorted: Vec<(f64, usize)> = Vec::with_capacity(n);

    for (visited, &feature) in features.iter().enumerate() {
        if visited >= max_features && best.is_some() {
            break;
        }

        sorted.clear();
        sorted.extend(indices.iter().map(|&i| (data.x[i][feature], data.y[i])));
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total = data.class_counts(indices);
        let mut left = vec![0usize; data.n_classes];

        for k in 0..n - 1 {
            let (value, class) = sorted[k];
            left[class] += 1;

            let next = sorted[k + 1].0;
            if value >= next {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            let right: Vec<usize> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;

            if best.map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
    }

    best
}
