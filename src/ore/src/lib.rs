// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Internal utility libraries for Lux.
//!
//! **lux-ore** is meant to be a home for small, lightweight utilities that
//! the other Lux crates share. It should not contain any domain types; those
//! belong in [`lux-repr`]. Think of it as an extension of the Rust standard
//! library, scoped to the needs of this workspace.
//!
//! [`lux-repr`]: ../lux_repr/index.html

#![warn(missing_docs)]

pub mod cast;
pub mod id_gen;
pub mod warn;
