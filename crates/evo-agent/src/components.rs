//! Data-shaped components exchanged with the brain evaluator and the
//! genetic algorithm.
//!
//! The evaluator and the GA live outside this workspace.  They read and
//! write these records through the world's generic component accessors; the
//! core only knows their shape.

/// Sensor values fed to the brain, one row per input layer.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputComponent {
    pub inputs: Vec<Vec<f32>>,
}

/// Brain activations, one row per output group.
///
/// Row [`OutputComponent::SENSES`] carries the decision signals consumed by
/// [`BrainDecisionSystem`](crate::BrainDecisionSystem):
///
/// | Column | Meaning                        |
/// |--------|--------------------------------|
/// | 0      | food signal (≥ 0)              |
/// | 1      | threat signal (≥ 0)            |
/// | 2      | preferred heading, x           |
/// | 3      | preferred heading, y           |
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputComponent {
    pub outputs: Vec<Vec<f32>>,
}

impl OutputComponent {
    pub const SENSES: usize = 0;

    pub fn new(outputs: Vec<Vec<f32>>) -> Self {
        Self { outputs }
    }

    /// Value at `(row, col)`, or `None` if the evaluator wrote fewer values.
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        self.outputs.get(row)?.get(col).copied()
    }
}

/// One dense layer of a brain.  `weights[j]` holds neuron `j`'s incoming
/// weights.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuronLayer {
    pub weights: Vec<Vec<f32>>,
    pub biases:  Vec<f32>,
}

impl NeuronLayer {
    pub fn neurons(&self) -> usize {
        self.biases.len()
    }
}

/// Brain parameters plus the fitness history the GA selects on.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NeuralNetComponent {
    pub layers:  Vec<NeuronLayer>,
    pub fitness: Vec<f32>,
}

impl NeuralNetComponent {
    pub fn record_fitness(&mut self, value: f32) {
        self.fitness.push(value);
    }

    pub fn best_fitness(&self) -> Option<f32> {
        self.fitness.iter().copied().reduce(f32::max)
    }
}
