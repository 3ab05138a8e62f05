// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Warnings that fire at most once per call site.

/// Logs a warning at most once per call site, via [`tracing::warn!`].
///
/// Some misconfigurations (a texture with the wrong format, a pixel op
/// factory that refuses to produce an instance) are detected on a per-frame
/// or per-command path where repeating the same warning would drown the log.
/// The warning latches after its first emission; subsequent executions of the
/// same call site are free.
///
/// Callers must have `tracing` in scope as a dependency.
#[macro_export]
macro_rules! warn_once {
    ($($arg:tt)*) => {{
        static ONCE: ::std::sync::Once = ::std::sync::Once::new();
        ONCE.call_once(|| ::tracing::warn!($($arg)*));
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_warn_once_latches() {
        // The macro must expand in expression position inside a loop body
        // without redeclaring its latch.
        for _ in 0..3 {
            crate::warn_once!("repeated warning");
        }
    }
}
