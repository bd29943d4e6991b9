//! Conversion strategies: fitted ensembles to portable graph nodes
//!
//! Each estimator family becomes a single tree-ensemble operator node whose
//! attributes carry the flattened tree structure as parallel arrays.

use crate::booster::{GbtEstimator, Tree};
use crate::booster::tree::Node;
use crate::export::graph::{AttrValue, DataType, GraphNode, TensorInfo};

/// Feature toggles carried by a converter registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterOptions {
    /// Omit the class-label output tensor
    pub suppress_class_labels: bool,
    /// Emit probabilities as a per-class map instead of a plain tensor
    pub probability_map: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            suppress_class_labels: false,
            probability_map: true,
        }
    }
}

/// Declares input/output tensors for a converted model
pub type ShapeCalculator =
    fn(&GbtEstimator, &[Option<usize>], &ConverterOptions) -> (Vec<TensorInfo>, Vec<TensorInfo>);

/// Translates a fitted estimator into operator nodes
pub type ConverterFn = fn(&GbtEstimator, &ConverterOptions) -> Vec<GraphNode>;

pub const INPUT_NAME: &str = "model_input";

/// Flattened ensemble: one entry per node across all trees
struct FlatEnsemble {
    node_treeids: Vec<i64>,
    node_ids: Vec<i64>,
    node_featureids: Vec<i64>,
    node_values: Vec<f64>,
    node_modes: Vec<String>,
    node_true_ids: Vec<i64>,
    node_false_ids: Vec<i64>,
    leaf_treeids: Vec<i64>,
    leaf_nodeids: Vec<i64>,
    leaf_groups: Vec<i64>,
    leaf_weights: Vec<f64>,
}

impl FlatEnsemble {
    fn new() -> Self {
        Self {
            node_treeids: Vec::new(),
            node_ids: Vec::new(),
            node_featureids: Vec::new(),
            node_values: Vec::new(),
            node_modes: Vec::new(),
            node_true_ids: Vec::new(),
            node_false_ids: Vec::new(),
            leaf_treeids: Vec::new(),
            leaf_nodeids: Vec::new(),
            leaf_groups: Vec::new(),
            leaf_weights: Vec::new(),
        }
    }

    /// Preorder walk assigning consecutive node ids within one tree
    fn push_node(&mut self, tree_idx: i64, tree: &Tree, node: &Node, next_id: &mut i64) -> i64 {
        let id = *next_id;
        *next_id += 1;
        match node {
            Node::Leaf { weight } => {
                self.node_treeids.push(tree_idx);
                self.node_ids.push(id);
                self.node_featureids.push(0);
                self.node_values.push(0.0);
                self.node_modes.push("LEAF".to_string());
                self.node_true_ids.push(0);
                self.node_false_ids.push(0);
                self.leaf_treeids.push(tree_idx);
                self.leaf_nodeids.push(id);
                self.leaf_groups.push(tree.group as i64);
                self.leaf_weights.push(weight * tree.weight);
            }
            Node::Split { feature, threshold, left, right } => {
                // Reserve this slot, children ids are known only after recursion
                let slot = self.node_treeids.len();
                self.node_treeids.push(tree_idx);
                self.node_ids.push(id);
                self.node_featureids.push(*feature as i64);
                self.node_values.push(*threshold);
                self.node_modes.push("BRANCH_LEQ".to_string());
                self.node_true_ids.push(0);
                self.node_false_ids.push(0);

                let left_id = self.push_node(tree_idx, tree, left, next_id);
                let right_id = self.push_node(tree_idx, tree, right, next_id);
                self.node_true_ids[slot] = left_id;
                self.node_false_ids[slot] = right_id;
            }
        }
        id
    }
}

fn flatten(trees: &[Tree]) -> FlatEnsemble {
    let mut flat = FlatEnsemble::new();
    for (tree_idx, tree) in trees.iter().enumerate() {
        let mut next_id = 0i64;
        flat.push_node(tree_idx as i64, tree, &tree.root, &mut next_id);
    }
    flat
}

fn ensemble_node(op: &str, estimator: &GbtEstimator) -> GraphNode {
    let flat = flatten(estimator.trees());
    GraphNode::new(op, format!("{op}_0"))
        .with_input(INPUT_NAME)
        .with_attr("n_features", AttrValue::Int(estimator.n_features() as i64))
        .with_attr("base_values", AttrValue::Floats(estimator.base_score().to_vec()))
        .with_attr("nodes_treeids", AttrValue::Ints(flat.node_treeids))
        .with_attr("nodes_nodeids", AttrValue::Ints(flat.node_ids))
        .with_attr("nodes_featureids", AttrValue::Ints(flat.node_featureids))
        .with_attr("nodes_values", AttrValue::Floats(flat.node_values))
        .with_attr("nodes_modes", AttrValue::Strings(flat.node_modes))
        .with_attr("nodes_truenodeids", AttrValue::Ints(flat.node_true_ids))
        .with_attr("nodes_falsenodeids", AttrValue::Ints(flat.node_false_ids))
        .with_attr("leaf_treeids", AttrValue::Ints(flat.leaf_treeids))
        .with_attr("leaf_nodeids", AttrValue::Ints(flat.leaf_nodeids))
        .with_attr("leaf_targetids", AttrValue::Ints(flat.leaf_groups))
        .with_attr("leaf_weights", AttrValue::Floats(flat.leaf_weights))
}

/// Regressor conversion strategy
pub fn convert_gbt_regressor(estimator: &GbtEstimator, _options: &ConverterOptions) -> Vec<GraphNode> {
    let node = ensemble_node("TreeEnsembleRegressor", estimator)
        .with_attr("post_transform", AttrValue::Str("NONE".to_string()))
        .with_output("variable");
    vec![node]
}

/// Classifier conversion strategy
pub fn convert_gbt_classifier(estimator: &GbtEstimator, options: &ConverterOptions) -> Vec<GraphNode> {
    let mut node = ensemble_node("TreeEnsembleClassifier", estimator)
        .with_attr("post_transform", AttrValue::Str("SOFTMAX".to_string()))
        .with_attr("class_labels", AttrValue::Floats(estimator.classes().to_vec()));
    if !options.suppress_class_labels {
        node = node.with_output("label");
    }
    let prob_output = if options.probability_map {
        "output_probability"
    } else {
        "probabilities"
    };
    node = node.with_output(prob_output);
    vec![node]
}

/// Regressor shape-calculation strategy: one float32 input, one score column
pub fn regressor_output_shapes(
    _estimator: &GbtEstimator,
    input_shape: &[Option<usize>],
    _options: &ConverterOptions,
) -> (Vec<TensorInfo>, Vec<TensorInfo>) {
    let inputs = vec![TensorInfo::new(INPUT_NAME, DataType::Float32, input_shape.to_vec())];
    let outputs = vec![TensorInfo::new("variable", DataType::Float32, vec![None, Some(1)])];
    (inputs, outputs)
}

/// Classifier shape-calculation strategy: label column plus per-class scores
pub fn classifier_output_shapes(
    estimator: &GbtEstimator,
    input_shape: &[Option<usize>],
    options: &ConverterOptions,
) -> (Vec<TensorInfo>, Vec<TensorInfo>) {
    let inputs = vec![TensorInfo::new(INPUT_NAME, DataType::Float32, input_shape.to_vec())];
    let num_class = estimator.num_class().unwrap_or(0);

    let mut outputs = Vec::new();
    if !options.suppress_class_labels {
        outputs.push(TensorInfo::new("label", DataType::Int64, vec![None]));
    }
    let prob_name = if options.probability_map {
        "output_probability"
    } else {
        "probabilities"
    };
    outputs.push(TensorInfo::new(prob_name, DataType::Float32, vec![None, Some(num_class)]));
    (inputs, outputs)
}
