// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Pixel reconstruction filter profiles.
//!
//! One-dimensional profiles, applied separably by the sample kernels. All
//! profiles peak at the origin and vanish outside `[-width/2, width/2]`.

use lux_repr::PixelFilterKind;

/// The support width of a filter, in pixels.
pub fn filter_width(kind: PixelFilterKind) -> f32 {
    match kind {
        PixelFilterKind::Box => 1.0,
        PixelFilterKind::Point => 0.0,
        PixelFilterKind::Gauss => 3.0,
        PixelFilterKind::BlackmanHarris => 3.0,
        PixelFilterKind::Mitchell => 4.0,
    }
}

/// Evaluates a filter profile at distance `x` from the sample.
pub fn filter_weight(kind: PixelFilterKind, x: f32) -> f32 {
    let half = filter_width(kind) / 2.0;
    match kind {
        PixelFilterKind::Box => {
            if x.abs() <= half {
                1.0
            } else {
                0.0
            }
        }
        PixelFilterKind::Point => {
            if x == 0.0 {
                1.0
            } else {
                0.0
            }
        }
        PixelFilterKind::Gauss => {
            if x.abs() > half {
                return 0.0;
            }
            // Truncated Gaussian, rescaled to reach zero at the support edge.
            const ALPHA: f32 = 2.0;
            let edge = (-ALPHA * half * half).exp();
            ((-ALPHA * x * x).exp() - edge).max(0.0)
        }
        PixelFilterKind::BlackmanHarris => {
            if x.abs() > half {
                return 0.0;
            }
            const A0: f32 = 0.35875;
            const A1: f32 = 0.48829;
            const A2: f32 = 0.14128;
            const A3: f32 = 0.01168;
            let n = x / (2.0 * half) + 0.5;
            let t = 2.0 * std::f32::consts::PI * n;
            A0 - A1 * t.cos() + A2 * (2.0 * t).cos() - A3 * (3.0 * t).cos()
        }
        PixelFilterKind::Mitchell => {
            const B: f32 = 1.0 / 3.0;
            const C: f32 = 1.0 / 3.0;
            let t = x.abs() * 2.0 / half;
            if t < 1.0 {
                ((12.0 - 9.0 * B - 6.0 * C) * t.powi(3)
                    + (-18.0 + 12.0 * B + 6.0 * C) * t.powi(2)
                    + (6.0 - 2.0 * B))
                    / 6.0
            } else if t < 2.0 {
                ((-B - 6.0 * C) * t.powi(3)
                    + (6.0 * B + 30.0 * C) * t.powi(2)
                    + (-12.0 * B - 48.0 * C) * t
                    + (8.0 * B + 24.0 * C))
                    / 6.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PixelFilterKind; 5] = [
        PixelFilterKind::Box,
        PixelFilterKind::Point,
        PixelFilterKind::Gauss,
        PixelFilterKind::BlackmanHarris,
        PixelFilterKind::Mitchell,
    ];

    #[test]
    fn test_profiles_peak_at_origin() {
        for kind in ALL {
            let peak = filter_weight(kind, 0.0);
            assert!(peak > 0.0, "{kind:?} has no central weight");
            for x in [0.25, 0.5, 1.0, 2.0] {
                assert!(
                    filter_weight(kind, x) <= peak + 1e-6,
                    "{kind:?} exceeds its central weight at {x}"
                );
            }
        }
    }

    #[test]
    fn test_profiles_vanish_outside_support() {
        for kind in ALL {
            let beyond = filter_width(kind) / 2.0 + 0.1;
            assert_eq!(filter_weight(kind, beyond), 0.0, "{kind:?}");
            assert_eq!(filter_weight(kind, -beyond), 0.0, "{kind:?}");
        }
    }

    #[test]
    fn test_profiles_are_symmetric() {
        for kind in ALL {
            for x in [0.1, 0.5, 1.0, 1.4] {
                let diff = (filter_weight(kind, x) - filter_weight(kind, -x)).abs();
                assert!(diff < 1e-6, "{kind:?} is asymmetric at {x}");
            }
        }
    }
}
