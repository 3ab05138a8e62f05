// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Piecewise-linear transfer functions.

use crate::params::ParamMap;

/// One control point of a piecewise-linear transfer function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Position in the normalized [0, 1] domain.
    pub x: f32,
    /// The function value at `x`, in [0, 1].
    pub value: f32,
}

/// Kind-specific state for a transfer function.
///
/// The control-point set always spans the full domain: the first point is
/// pinned to x = 0, the last to x = 1, and neither can be removed. Interior
/// points keep their x between their neighbors. Commit resamples the
/// function into a uniform lookup table.
#[derive(Debug)]
pub struct TransferFunctionState {
    points: Vec<ControlPoint>,
    samples: Vec<f32>,
}

impl Default for TransferFunctionState {
    fn default() -> TransferFunctionState {
        TransferFunctionState::new()
    }
}

impl TransferFunctionState {
    /// Creates the identity ramp over [0, 1].
    pub fn new() -> TransferFunctionState {
        TransferFunctionState {
            points: vec![
                ControlPoint { x: 0.0, value: 0.0 },
                ControlPoint { x: 1.0, value: 1.0 },
            ],
            samples: Vec::new(),
        }
    }

    /// The control points, ascending in x.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Inserts a control point, keeping the set sorted by x.
    ///
    /// Coordinates are clamped to the unit square. Among points sharing an
    /// x, the new point lands last. Returns the new point's index.
    pub fn insert_point(&mut self, x: f32, value: f32) -> usize {
        let point = ControlPoint {
            x: x.clamp(0.0, 1.0),
            value: value.clamp(0.0, 1.0),
        };
        let index = self
            .points
            .iter()
            .rposition(|p| p.x <= point.x)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.points.insert(index, point);
        index
    }

    /// Removes an interior control point; the endpoints cannot be removed.
    ///
    /// Returns whether a point was removed.
    pub fn remove_point(&mut self, index: usize) -> bool {
        if index == 0 || index >= self.points.len() - 1 {
            return false;
        }
        self.points.remove(index);
        true
    }

    /// Moves a control point.
    ///
    /// The first point's x stays 0 and the last point's x stays 1;
    /// interior points clamp between their neighbors. Values clamp to
    /// [0, 1]. Returns the point's final position.
    pub fn move_point(&mut self, index: usize, x: f32, value: f32) -> Option<ControlPoint> {
        let last = self.points.len() - 1;
        if index > last {
            return None;
        }
        let x = if index == 0 {
            0.0
        } else if index == last {
            1.0
        } else {
            x.clamp(self.points[index - 1].x, self.points[index + 1].x)
        };
        let moved = ControlPoint {
            x,
            value: value.clamp(0.0, 1.0),
        };
        self.points[index] = moved;
        Some(moved)
    }

    /// Evaluates the piecewise-linear interpolation at `x`.
    pub fn interpolated_value(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return self.points[0].value;
        }
        if x >= 1.0 {
            return self.points[self.points.len() - 1].value;
        }
        for window in self.points.windows(2) {
            let (a, b) = (window[0], window[1]);
            if x <= b.x {
                let delta = x - a.x;
                let interval = b.x - a.x;
                if delta == 0.0 || interval == 0.0 {
                    return a.value;
                }
                return a.value + delta / interval * (b.value - a.value);
            }
        }
        // The last point sits at x = 1, so some window above matched.
        unreachable!("control points span the domain")
    }

    /// Resamples the function uniformly over [0, 1].
    pub fn sample(&self, count: usize) -> Vec<f32> {
        match count {
            0 => Vec::new(),
            1 => vec![self.interpolated_value(0.0)],
            _ => (0..count)
                .map(|i| self.interpolated_value(i as f32 / (count - 1) as f32))
                .collect(),
        }
    }

    /// Rebuilds the sampled lookup table from the parameter bag.
    pub fn commit(&mut self, params: &ParamMap) {
        let count = params.get_i32("numSamples").unwrap_or(256).max(2);
        self.samples = self.sample(count as usize);
    }

    /// The lookup table built by the last commit.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn assert_close(got: &[f32], want: &[f32]) {
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want) {
            assert!((g - w).abs() < EPSILON, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn test_tent_interpolation() {
        let mut tf = TransferFunctionState::new();
        tf.move_point(1, 1.0, 0.0);
        tf.insert_point(0.5, 1.0);
        assert_close(&tf.sample(5), &[0.0, 0.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_identity_ramp_samples() {
        let tf = TransferFunctionState::new();
        assert_close(&tf.sample(3), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_endpoints_are_pinned() {
        let mut tf = TransferFunctionState::new();
        let first = tf.move_point(0, 0.7, 0.5).unwrap();
        assert_eq!(first.x, 0.0);
        let last = tf.move_point(1, 0.2, 0.5).unwrap();
        assert_eq!(last.x, 1.0);

        assert!(!tf.remove_point(0));
        assert!(!tf.remove_point(1));
        assert_eq!(tf.points().len(), 2);
    }

    #[test]
    fn test_interior_x_clamps_between_neighbors() {
        let mut tf = TransferFunctionState::new();
        tf.insert_point(0.4, 0.5);
        tf.insert_point(0.6, 0.5);
        // Try to drag the first interior point past the second.
        let moved = tf.move_point(1, 0.9, 0.5).unwrap();
        assert_eq!(moved.x, 0.6);
        // And before the left endpoint.
        let moved = tf.move_point(1, -0.5, 0.5).unwrap();
        assert_eq!(moved.x, 0.0);
    }

    #[test]
    fn test_interior_points_can_be_removed() {
        let mut tf = TransferFunctionState::new();
        tf.insert_point(0.5, 1.0);
        assert!(tf.remove_point(1));
        assert_eq!(tf.points().len(), 2);
    }

    #[test]
    fn test_commit_builds_lut() {
        let mut tf = TransferFunctionState::new();
        let mut params = ParamMap::new();
        params.set("numSamples", crate::params::StoredParam::Int(5));
        tf.commit(&params);
        assert_close(tf.samples(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
    }
}
