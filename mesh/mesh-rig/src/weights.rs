//! Per-vertex joint influences.

/// Up to four joint influences for one vertex, as stored in glTF
/// `JOINTS_0` / `WEIGHTS_0`.
///
/// Joint slots index into the skeleton's joint list. A slot with zero weight
/// is ignored regardless of its joint index.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VertexWeights {
    /// Joint indices.
    pub joints: [u16; 4],
    /// Influence weights, matching `joints` slot by slot.
    pub weights: [f32; 4],
}

impl VertexWeights {
    /// A vertex with no influences.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            joints: [0; 4],
            weights: [0.0; 4],
        }
    }

    /// A vertex fully bound to a single joint.
    #[must_use]
    pub const fn single(joint: u16) -> Self {
        Self {
            joints: [joint, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Build from raw slots.
    #[must_use]
    pub const fn new(joints: [u16; 4], weights: [f32; 4]) -> Self {
        Self { joints, weights }
    }

    /// Sum of all positive weights.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.weights.iter().filter(|w| **w > 0.0).sum()
    }

    /// Whether any slot carries a positive weight.
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.total() > 0.0
    }

    /// Iterate over `(joint, weight)` pairs with positive weight.
    pub fn influences(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.joints
            .iter()
            .zip(&self.weights)
            .filter(|(_, w)| **w > 0.0)
            .map(|(j, w)| (usize::from(*j), f64::from(*w)))
    }

    /// Return a copy whose positive weights sum to one.
    ///
    /// Negative weights are clamped to zero. Unweighted vertices are returned
    /// unchanged.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return *self;
        }
        Self {
            joints: self.joints,
            weights: self.weights.map(|w| if w > 0.0 { w / total } else { 0.0 }),
        }
    }
}
