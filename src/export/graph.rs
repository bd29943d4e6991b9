//! Portable computation graph model
//!
//! A framework-neutral description of a trained model's inference computation:
//! named tensors with dtypes and optionally-unbound shapes, plus operator nodes
//! with attribute maps. Serializes to JSON for interchange.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Tensor element type marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Float32,
    Float64,
    Int64,
    String,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Float32 => "FLOAT32",
            DataType::Float64 => "FLOAT64",
            DataType::Int64 => "INT64",
            DataType::String => "STRING",
        }
    }
}

/// Declared tensor: name, dtype and shape (`None` = unbound dimension)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorInfo {
    pub name: String,
    pub dtype: DataType,
    pub shape: Vec<Option<usize>>,
}

impl TensorInfo {
    pub fn new(name: impl Into<String>, dtype: DataType, shape: Vec<Option<usize>>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
        }
    }
}

/// Node attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f64),
    Int(i64),
    Str(String),
    Floats(Vec<f64>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
}

/// One operator node of the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub op: String,
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl GraphNode {
    pub fn new(op: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            op: op.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(name.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Portable computation graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    pub inputs: Vec<TensorInfo>,
    pub outputs: Vec<TensorInfo>,
    pub nodes: Vec<GraphNode>,
}

impl Graph {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.to_json()?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// A converted model together with its interface summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedModel {
    pub graph: Graph,
    pub n_inputs: usize,
    pub n_outputs: usize,
    /// Declared output dtype markers; a single `Float32` entry by convention
    pub output_dtypes: Vec<DataType>,
    pub input_shapes: Vec<Vec<Option<usize>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_graph() -> Graph {
        Graph {
            name: "toy".to_string(),
            inputs: vec![TensorInfo::new("model_input", DataType::Float32, vec![None, Some(4)])],
            outputs: vec![TensorInfo::new("variable", DataType::Float32, vec![None, Some(1)])],
            nodes: vec![GraphNode::new("Identity", "id")
                .with_input("model_input")
                .with_output("variable")],
        }
    }

    #[test]
    fn test_graph_json_round_trip() {
        let graph = toy_graph();
        let json = graph.to_json().unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn test_graph_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        toy_graph().save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("model_input"));
    }

    #[test]
    fn test_dtype_markers() {
        assert_eq!(DataType::Float32.as_str(), "FLOAT32");
        assert_eq!(DataType::Int64.as_str(), "INT64");
    }
}
