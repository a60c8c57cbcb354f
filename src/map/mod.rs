// SPDX-License-Identifier: MPL-2.0

mod sync;

pub use sync::{MarkerDiff, MarkerSpec, desired_markers, plan, polyline, visible};
