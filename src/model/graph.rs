//! GraphModel - the computation-graph description.
//!
//! The model is a value: the resize propagator clones it, mutates the clone
//! and hands the clone back, so a caller always keeps a consistent model.
//! Vertices whose width is derived from their inputs (pass-through, merge,
//! elementwise) store no width at all; [`GraphModel::width_of`] computes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::ResizeError;
use crate::model::{LayerOp, VertexId, VertexSpec};

/// A computation-graph description: an ordered map of vertices.
///
/// The graph is a DAG by construction: every input named when a vertex is
/// added must already be part of the model, so a cycle cannot be expressed.
///
/// # Example
///
/// ```
/// use netmorph::model::GraphModel;
///
/// let mut model = GraphModel::new();
/// let a = model.dense_source(4, 8);
/// let b = model.pool(a);
/// let c = model.dense(8, &[b]);
/// assert_eq!(model.width_of(c).unwrap(), 8);
/// assert_eq!(model.input_width_of(c).unwrap(), 8);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphModel {
    vertices: BTreeMap<VertexId, VertexSpec>,
    next_id: u32,
}

impl GraphModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a vertex with the given operation and ordered inputs.
    ///
    /// # Panics
    ///
    /// Panics if any input id is not already part of the model.
    pub fn insert(&mut self, op: LayerOp, inputs: Vec<VertexId>) -> VertexId {
        for input in &inputs {
            assert!(
                self.vertices.contains_key(input),
                "Input {input} must be added to the model before its consumer"
            );
        }
        let id = VertexId(self.next_id);
        self.next_id += 1;
        self.vertices.insert(id, VertexSpec::new(op, inputs));
        id
    }

    /// Adds a dense layer with no producers — an entry point of the graph.
    /// `input_width` is the external feature count it consumes.
    pub fn dense_source(&mut self, input_width: u32, output_width: u32) -> VertexId {
        self.insert(LayerOp::dense(input_width, output_width), Vec::new())
    }

    /// Adds a dense layer fed by `inputs`; its input width is the combined
    /// width of the inputs.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` is empty.
    pub fn dense(&mut self, output_width: u32, inputs: &[VertexId]) -> VertexId {
        assert!(!inputs.is_empty(), "Dense requires at least 1 input");
        let input_width = self.combined_width(inputs);
        self.insert(LayerOp::dense(input_width, output_width), inputs.to_vec())
    }

    /// Adds a batch-normalization vertex over `input`.
    pub fn batch_norm(&mut self, input: VertexId) -> VertexId {
        let width = self.width_of(input).expect("Input must be in the model");
        self.insert(LayerOp::batch_norm(width), vec![input])
    }

    /// Adds a pooling vertex over `input`.
    pub fn pool(&mut self, input: VertexId) -> VertexId {
        self.insert(LayerOp::Pool, vec![input])
    }

    /// Adds a softmax vertex over `input`.
    pub fn softmax(&mut self, input: VertexId) -> VertexId {
        self.insert(LayerOp::Softmax, vec![input])
    }

    /// Adds a concatenation vertex over `inputs`.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` is empty.
    pub fn concat(&mut self, inputs: &[VertexId]) -> VertexId {
        assert!(!inputs.is_empty(), "Concat requires at least 1 input");
        self.insert(LayerOp::Concat, inputs.to_vec())
    }

    /// Adds an element-wise addition vertex over `inputs`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 inputs are given or their widths differ.
    pub fn add(&mut self, inputs: &[VertexId]) -> VertexId {
        self.assert_elementwise(inputs, "Add");
        self.insert(LayerOp::Add, inputs.to_vec())
    }

    /// Adds an element-wise multiplication vertex over `inputs`.
    ///
    /// # Panics
    ///
    /// Panics if fewer than 2 inputs are given or their widths differ.
    pub fn multiply(&mut self, inputs: &[VertexId]) -> VertexId {
        self.assert_elementwise(inputs, "Multiply");
        self.insert(LayerOp::Multiply, inputs.to_vec())
    }

    fn assert_elementwise(&self, inputs: &[VertexId], op_name: &str) {
        assert!(inputs.len() >= 2, "{op_name} requires at least 2 inputs");
        let width = self.width_of(inputs[0]).expect("Input must be in the model");
        for input in &inputs[1..] {
            assert_eq!(
                self.width_of(*input).expect("Input must be in the model"),
                width,
                "All inputs to {op_name} must have the same width"
            );
        }
    }

    fn combined_width(&self, inputs: &[VertexId]) -> u32 {
        inputs
            .iter()
            .map(|v| self.width_of(*v).expect("Input must be in the model"))
            .sum()
    }

    /// Returns the vertex spec for `id`, if present.
    pub fn get(&self, id: VertexId) -> Option<&VertexSpec> {
        self.vertices.get(&id)
    }

    /// Returns true if the model contains `id`.
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Number of vertices in the model.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the model has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Iterates vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexSpec)> {
        self.vertices.iter().map(|(id, spec)| (*id, spec))
    }

    /// Returns the output width of `id`.
    ///
    /// Widths of pass-through, merge and elementwise vertices are derived
    /// from their inputs; size-bearing and coupled vertices own theirs.
    pub fn width_of(&self, id: VertexId) -> Result<u32, ResizeError> {
        let spec = self
            .vertices
            .get(&id)
            .ok_or(ResizeError::UnknownVertex(id))?;
        if let Some(width) = spec.op.owned_output_width() {
            return Ok(width);
        }
        match &spec.op {
            LayerOp::Concat => {
                let mut total = 0u32;
                for input in &spec.inputs {
                    total += self.width_of(*input)?;
                }
                Ok(total)
            }
            LayerOp::Pool | LayerOp::Softmax | LayerOp::Add | LayerOp::Multiply => {
                let first = spec.inputs.first().ok_or_else(|| {
                    ResizeError::InvalidGraph(format!("{id} derives its width but has no inputs"))
                })?;
                self.width_of(*first)
            }
            LayerOp::Dense { .. } | LayerOp::BatchNorm { .. } => unreachable!(),
        }
    }

    /// Returns the input-facing width of `id`: its owned input width if it
    /// has one, otherwise the combined width of its producers.
    pub fn input_width_of(&self, id: VertexId) -> Result<u32, ResizeError> {
        let spec = self
            .vertices
            .get(&id)
            .ok_or(ResizeError::UnknownVertex(id))?;
        if let Some(width) = spec.op.owned_input_width() {
            return Ok(width);
        }
        let mut total = 0u32;
        for input in &spec.inputs {
            total += self.width_of(*input)?;
        }
        Ok(total)
    }

    /// Builds the producer→consumer index: for every vertex, the vertices
    /// that list it as an input, in ascending consumer-id order.
    pub fn consumers(&self) -> BTreeMap<VertexId, Vec<VertexId>> {
        let mut index: BTreeMap<VertexId, Vec<VertexId>> = BTreeMap::new();
        for (&consumer, spec) in &self.vertices {
            for input in &spec.inputs {
                let entry = index.entry(*input).or_default();
                if entry.last() != Some(&consumer) {
                    entry.push(consumer);
                }
            }
        }
        index
    }

    pub(crate) fn set_output_width(&mut self, id: VertexId, width: u32) -> Result<(), ResizeError> {
        let spec = self
            .vertices
            .get_mut(&id)
            .ok_or(ResizeError::UnknownVertex(id))?;
        match &mut spec.op {
            LayerOp::Dense { output_width, .. } => {
                *output_width = width;
                Ok(())
            }
            LayerOp::BatchNorm { width: w } => {
                *w = width;
                Ok(())
            }
            _ => Err(ResizeError::InvalidGraph(format!(
                "{id} does not own an output width"
            ))),
        }
    }

    pub(crate) fn set_input_width(&mut self, id: VertexId, width: u32) -> Result<(), ResizeError> {
        let spec = self
            .vertices
            .get_mut(&id)
            .ok_or(ResizeError::UnknownVertex(id))?;
        match &mut spec.op {
            LayerOp::Dense { input_width, .. } => {
                *input_width = width;
                Ok(())
            }
            LayerOp::BatchNorm { width: w } => {
                *w = width;
                Ok(())
            }
            _ => Err(ResizeError::InvalidGraph(format!(
                "{id} does not own an input width"
            ))),
        }
    }

    /// Serializes the graph description to JSON for downstream collaborators
    /// (model assembly, weight transfer). Widths and wiring only; no weights.
    pub fn to_json(&self) -> Result<String, ResizeError> {
        let description = GraphDescription {
            vertices: self
                .vertices()
                .map(|(id, spec)| {
                    Ok(VertexDescription {
                        id,
                        op: spec.op.clone(),
                        inputs: spec.inputs.clone(),
                        input_width: self.input_width_of(id)?,
                        output_width: self.width_of(id)?,
                    })
                })
                .collect::<Result<_, ResizeError>>()?,
        };
        Ok(serde_json::to_string(&description)?)
    }
}

/// Export format for a complete graph description.
#[derive(Debug, Clone, Serialize)]
pub struct GraphDescription {
    pub vertices: Vec<VertexDescription>,
}

/// Export format for one vertex, with both computed widths resolved.
#[derive(Debug, Clone, Serialize)]
pub struct VertexDescription {
    pub id: VertexId,
    pub op: LayerOp,
    pub inputs: Vec<VertexId>,
    pub input_width: u32,
    pub output_width: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths_in_a_chain() {
        let mut model = GraphModel::new();
        let a = model.dense_source(4, 8);
        let b = model.pool(a);
        let c = model.batch_norm(b);
        assert_eq!(model.width_of(a).unwrap(), 8);
        assert_eq!(model.width_of(b).unwrap(), 8);
        assert_eq!(model.width_of(c).unwrap(), 8);
        assert_eq!(model.input_width_of(c).unwrap(), 8);
    }

    #[test]
    fn test_concat_width_is_sum() {
        let mut model = GraphModel::new();
        let p = model.dense_source(4, 4);
        let q = model.dense_source(4, 6);
        let m = model.concat(&[p, q]);
        assert_eq!(model.width_of(m).unwrap(), 10);
    }

    #[test]
    fn test_dense_input_width_derived_from_inputs() {
        let mut model = GraphModel::new();
        let p = model.dense_source(4, 4);
        let q = model.dense_source(4, 6);
        let m = model.concat(&[p, q]);
        let r = model.dense(3, &[m]);
        assert_eq!(model.input_width_of(r).unwrap(), 10);
        assert_eq!(model.width_of(r).unwrap(), 3);
    }

    #[test]
    fn test_consumers_index() {
        let mut model = GraphModel::new();
        let a = model.dense_source(4, 8);
        let b = model.pool(a);
        let c = model.softmax(a);
        let d = model.add(&[b, c]);
        let consumers = model.consumers();
        assert_eq!(consumers[&a], vec![b, c]);
        assert_eq!(consumers[&b], vec![d]);
        assert_eq!(consumers[&c], vec![d]);
        assert!(consumers.get(&d).is_none());
    }

    #[test]
    fn test_unknown_vertex_width() {
        let model = GraphModel::new();
        assert!(matches!(
            model.width_of(VertexId(3)),
            Err(ResizeError::UnknownVertex(_))
        ));
    }

    #[test]
    #[should_panic(expected = "must be added to the model before its consumer")]
    fn test_insert_requires_existing_inputs() {
        let mut model = GraphModel::new();
        model.insert(LayerOp::Pool, vec![VertexId(42)]);
    }

    #[test]
    #[should_panic(expected = "All inputs to Add must have the same width")]
    fn test_add_requires_equal_widths() {
        let mut model = GraphModel::new();
        let p = model.dense_source(4, 4);
        let q = model.dense_source(4, 5);
        model.add(&[p, q]);
    }

    #[test]
    fn test_to_json_contains_ops() {
        let mut model = GraphModel::new();
        let a = model.dense_source(4, 8);
        model.pool(a);
        let json = model.to_json().unwrap();
        assert!(json.contains("DENSE"));
        assert!(json.contains("POOL"));
    }

    #[test]
    fn test_structural_equality() {
        let mut m1 = GraphModel::new();
        let a = m1.dense_source(4, 8);
        m1.pool(a);
        let m2 = m1.clone();
        assert_eq!(m1, m2);
    }
}
