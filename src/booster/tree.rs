//! Tree construction
//!
//! Split finding is exact greedy over sorted feature values or quantile-binned
//! (hist), parallelized across candidate features. Growth is level-wise
//! (depthwise) or best-first leaf-wise (lossguide).

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::config::GrowPolicy;

/// A single node of a boosted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Node {
    Leaf {
        weight: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub(crate) fn predict(&self, sample: &ArrayView1<f64>) -> f64 {
        match self {
            Node::Leaf { weight } => *weight,
            Node::Split { feature, threshold, left, right } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }

    pub(crate) fn count_splits(&self, counts: &mut [f64]) {
        match self {
            Node::Leaf { .. } => {}
            Node::Split { feature, left, right, .. } => {
                if *feature < counts.len() {
                    counts[*feature] += 1.0;
                }
                left.count_splits(counts);
                right.count_splits(counts);
            }
        }
    }
}

/// Per-tree construction parameters
pub(crate) struct TreeParams<'a> {
    pub max_depth: usize,
    pub min_child_weight: f64,
    pub reg_lambda: f64,
    pub reg_alpha: f64,
    pub gamma: f64,
    pub grow_policy: GrowPolicy,
    /// Candidate thresholds per feature; `None` means exact split finding
    pub cuts: Option<&'a [Vec<f64>]>,
}

/// Optimal leaf weight with L1 (alpha) soft-thresholding and L2 (lambda)
fn leaf_weight(g_sum: f64, h_sum: f64, lambda: f64, alpha: f64) -> f64 {
    if alpha > 0.0 {
        let g_adj = if g_sum > alpha {
            g_sum - alpha
        } else if g_sum < -alpha {
            g_sum + alpha
        } else {
            return 0.0;
        };
        -g_adj / (h_sum + lambda)
    } else {
        -g_sum / (h_sum + lambda)
    }
}

fn split_gain(g_left: f64, h_left: f64, g_right: f64, h_right: f64, lambda: f64) -> f64 {
    let g_total = g_left + g_right;
    let h_total = h_left + h_right;
    0.5 * ((g_left * g_left) / (h_left + lambda)
        + (g_right * g_right) / (h_right + lambda)
        - (g_total * g_total) / (h_total + lambda))
}

fn sorted_by_feature(x: &Array2<f64>, rows: &[usize], feature: usize) -> Vec<(usize, f64)> {
    let mut sorted: Vec<(usize, f64)> = rows.iter().map(|&i| (i, x[[i, feature]])).collect();
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    sorted
}

/// Exact greedy sweep over distinct adjacent values of one feature
fn feature_split_exact(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    feature: usize,
    p: &TreeParams,
) -> Option<(f64, f64)> {
    let sorted = sorted_by_feature(x, rows, feature);
    let g_total: f64 = sorted.iter().map(|&(i, _)| grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&(i, _)| hess[i]).sum();

    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for pos in 0..sorted.len() - 1 {
        g_left += grad[sorted[pos].0];
        h_left += hess[sorted[pos].0];

        if sorted[pos].1 == sorted[pos + 1].1 {
            continue;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < p.min_child_weight || h_right < p.min_child_weight {
            continue;
        }

        let gain = split_gain(g_left, h_left, g_right, h_right, p.reg_lambda);
        if best.map_or(true, |(_, bg)| gain > bg) {
            let threshold = (sorted[pos].1 + sorted[pos + 1].1) / 2.0;
            best = Some((threshold, gain));
        }
    }

    best
}

/// Histogram sweep over precomputed candidate thresholds of one feature
fn feature_split_hist(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    feature: usize,
    cuts: &[f64],
    p: &TreeParams,
) -> Option<(f64, f64)> {
    if cuts.is_empty() {
        return None;
    }
    let sorted = sorted_by_feature(x, rows, feature);
    let g_total: f64 = sorted.iter().map(|&(i, _)| grad[i]).sum();
    let h_total: f64 = sorted.iter().map(|&(i, _)| hess[i]).sum();

    let mut pos = 0;
    let mut g_left = 0.0;
    let mut h_left = 0.0;
    let mut best: Option<(f64, f64)> = None;

    for &threshold in cuts {
        while pos < sorted.len() && sorted[pos].1 <= threshold {
            g_left += grad[sorted[pos].0];
            h_left += hess[sorted[pos].0];
            pos += 1;
        }
        if pos == 0 {
            continue;
        }
        if pos == sorted.len() {
            break;
        }

        let g_right = g_total - g_left;
        let h_right = h_total - h_left;
        if h_left < p.min_child_weight || h_right < p.min_child_weight {
            continue;
        }

        let gain = split_gain(g_left, h_left, g_right, h_right, p.reg_lambda);
        if best.map_or(true, |(_, bg)| gain > bg) {
            best = Some((threshold, gain));
        }
    }

    best
}

/// Best split over the sampled feature set: `(feature, threshold, gain)`
fn best_split(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    cols: &[usize],
    p: &TreeParams,
) -> Option<(usize, f64, f64)> {
    cols.par_iter()
        .filter_map(|&f| {
            let found = match p.cuts {
                Some(cuts) => feature_split_hist(x, grad, hess, rows, f, &cuts[f], p),
                None => feature_split_exact(x, grad, hess, rows, f, p),
            };
            found.map(|(threshold, gain)| (f, threshold, gain))
        })
        .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
}

fn partition_rows(x: &Array2<f64>, rows: &[usize], feature: usize, threshold: f64) -> (Vec<usize>, Vec<usize>) {
    rows.iter().partition(|&&i| x[[i, feature]] <= threshold)
}

/// Build one boosted tree on the given gradient pair
pub(crate) fn build_tree(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    cols: &[usize],
    p: &TreeParams,
) -> Node {
    match p.grow_policy {
        GrowPolicy::Depthwise => build_depthwise(x, grad, hess, rows, cols, p, 0),
        GrowPolicy::Lossguide => build_lossguide(x, grad, hess, rows, cols, p),
    }
}

fn node_weight(grad: &[f64], hess: &[f64], rows: &[usize], p: &TreeParams) -> (f64, f64, f64) {
    let g_sum: f64 = rows.iter().map(|&i| grad[i]).sum();
    let h_sum: f64 = rows.iter().map(|&i| hess[i]).sum();
    (g_sum, h_sum, leaf_weight(g_sum, h_sum, p.reg_lambda, p.reg_alpha))
}

fn build_depthwise(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    cols: &[usize],
    p: &TreeParams,
    depth: usize,
) -> Node {
    let (_, h_sum, weight) = node_weight(grad, hess, rows, p);

    if depth >= p.max_depth || rows.len() < 2 || h_sum < p.min_child_weight {
        return Node::Leaf { weight };
    }

    match best_split(x, grad, hess, rows, cols, p) {
        Some((feature, threshold, gain)) if gain > p.gamma => {
            let (left_rows, right_rows) = partition_rows(x, rows, feature, threshold);
            if left_rows.is_empty() || right_rows.is_empty() {
                return Node::Leaf { weight };
            }
            Node::Split {
                feature,
                threshold,
                left: Box::new(build_depthwise(x, grad, hess, &left_rows, cols, p, depth + 1)),
                right: Box::new(build_depthwise(x, grad, hess, &right_rows, cols, p, depth + 1)),
            }
        }
        _ => Node::Leaf { weight },
    }
}

// Arena representation for best-first growth; assembled into `Node` at the end.
enum Slot {
    Leaf { weight: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

struct Candidate {
    slot: usize,
    rows: Vec<usize>,
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn build_lossguide(
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: &[usize],
    cols: &[usize],
    p: &TreeParams,
) -> Node {
    let max_leaves = 1usize << p.max_depth.min(31);

    let (_, _, root_weight) = node_weight(grad, hess, rows, p);
    let mut slots = vec![Slot::Leaf { weight: root_weight }];
    let mut candidates: Vec<Candidate> = Vec::new();

    push_candidate(&mut candidates, x, grad, hess, rows.to_vec(), cols, p, 0);

    let mut leaves = 1;
    while leaves < max_leaves {
        let best_idx = candidates
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.gain.partial_cmp(&b.1.gain).unwrap_or(Ordering::Equal))
            .map(|(i, _)| i);
        let Some(idx) = best_idx else { break };
        let cand = candidates.swap_remove(idx);

        let (left_rows, right_rows) = partition_rows(x, &cand.rows, cand.feature, cand.threshold);
        if left_rows.is_empty() || right_rows.is_empty() {
            continue;
        }

        let (_, _, left_weight) = node_weight(grad, hess, &left_rows, p);
        let (_, _, right_weight) = node_weight(grad, hess, &right_rows, p);
        let left_id = slots.len();
        slots.push(Slot::Leaf { weight: left_weight });
        let right_id = slots.len();
        slots.push(Slot::Leaf { weight: right_weight });
        slots[cand.slot] = Slot::Split {
            feature: cand.feature,
            threshold: cand.threshold,
            left: left_id,
            right: right_id,
        };
        leaves += 1;

        push_candidate(&mut candidates, x, grad, hess, left_rows, cols, p, left_id);
        push_candidate(&mut candidates, x, grad, hess, right_rows, cols, p, right_id);
    }

    assemble(&slots, 0)
}

#[allow(clippy::too_many_arguments)]
fn push_candidate(
    candidates: &mut Vec<Candidate>,
    x: &Array2<f64>,
    grad: &[f64],
    hess: &[f64],
    rows: Vec<usize>,
    cols: &[usize],
    p: &TreeParams,
    slot: usize,
) {
    if rows.len() < 2 {
        return;
    }
    if let Some((feature, threshold, gain)) = best_split(x, grad, hess, &rows, cols, p) {
        if gain > p.gamma {
            candidates.push(Candidate { slot, rows, feature, threshold, gain });
        }
    }
}

fn assemble(slots: &[Slot], id: usize) -> Node {
    match &slots[id] {
        Slot::Leaf { weight } => Node::Leaf { weight: *weight },
        Slot::Split { feature, threshold, left, right } => Node::Split {
            feature: *feature,
            threshold: *threshold,
            left: Box::new(assemble(slots, *left)),
            right: Box::new(assemble(slots, *right)),
        },
    }
}

/// Quantile candidate thresholds per feature, at most `max_bin - 1` each
pub(crate) fn quantile_cuts(x: &Array2<f64>, max_bin: usize) -> Vec<Vec<f64>> {
    (0..x.ncols())
        .map(|f| {
            let mut vals: Vec<f64> = x.column(f).iter().copied().collect();
            vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            vals.dedup();
            if vals.len() < 2 {
                return Vec::new();
            }
            let mut cuts: Vec<f64> = if vals.len() <= max_bin {
                vals.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
            } else {
                (1..max_bin)
                    .map(|b| {
                        let idx = b * vals.len() / max_bin;
                        (vals[idx - 1] + vals[idx]) / 2.0
                    })
                    .collect()
            };
            cuts.dedup();
            cuts
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::config::GrowPolicy;
    use ndarray::array;

    fn step_data() -> (Array2<f64>, Vec<f64>, Vec<f64>) {
        // One clean split at x0 = 0.5: negative gradients left, positive right
        let x = array![[0.0], [0.2], [0.4], [0.6], [0.8], [1.0]];
        let grad = vec![-1.0, -1.0, -1.0, 1.0, 1.0, 1.0];
        let hess = vec![1.0; 6];
        (x, grad, hess)
    }

    fn params(policy: GrowPolicy) -> TreeParams<'static> {
        TreeParams {
            max_depth: 3,
            min_child_weight: 1.0,
            reg_lambda: 1.0,
            reg_alpha: 0.0,
            gamma: 0.0,
            grow_policy: policy,
            cuts: None,
        }
    }

    #[test]
    fn test_depthwise_finds_step_split() {
        let (x, grad, hess) = step_data();
        let rows: Vec<usize> = (0..6).collect();
        let tree = build_tree(&x, &grad, &hess, &rows, &[0], &params(GrowPolicy::Depthwise));

        let low = tree.predict(&array![0.1].view());
        let high = tree.predict(&array![0.9].view());
        assert!(low > 0.0, "left leaf should move predictions up, got {low}");
        assert!(high < 0.0, "right leaf should move predictions down, got {high}");
    }

    #[test]
    fn test_lossguide_matches_step_split() {
        let (x, grad, hess) = step_data();
        let rows: Vec<usize> = (0..6).collect();
        let tree = build_tree(&x, &grad, &hess, &rows, &[0], &params(GrowPolicy::Lossguide));

        assert!(tree.predict(&array![0.0].view()) > 0.0);
        assert!(tree.predict(&array![1.0].view()) < 0.0);
    }

    #[test]
    fn test_gamma_prunes_weak_split() {
        let (x, grad, hess) = step_data();
        let rows: Vec<usize> = (0..6).collect();
        let mut p = params(GrowPolicy::Depthwise);
        p.gamma = 1e6;
        let tree = build_tree(&x, &grad, &hess, &rows, &[0], &p);
        assert!(matches!(tree, Node::Leaf { .. }));
    }

    #[test]
    fn test_leaf_weight_l1_soft_threshold() {
        assert_eq!(leaf_weight(0.5, 1.0, 0.0, 1.0), 0.0);
        assert!(leaf_weight(2.0, 1.0, 0.0, 1.0) < 0.0);
        assert!((leaf_weight(-4.0, 1.0, 1.0, 0.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_cuts_bounded() {
        let x = Array2::from_shape_vec((100, 1), (0..100).map(|i| i as f64).collect()).unwrap();
        let cuts = quantile_cuts(&x, 16);
        assert!(cuts[0].len() <= 15);
        assert!(!cuts[0].is_empty());
        assert!(cuts[0].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_hist_split_close_to_exact() {
        let (x, grad, hess) = step_data();
        let rows: Vec<usize> = (0..6).collect();
        let cuts = quantile_cuts(&x, 256);
        let mut p = params(GrowPolicy::Depthwise);
        p.cuts = Some(&cuts);
        let tree = build_tree(&x, &grad, &hess, &rows, &[0], &p);
        assert!(tree.predict(&array![0.0].view()) > 0.0);
        assert!(tree.predict(&array![1.0].view()) < 0.0);
    }
}
