//! Batched suspension ground queries.
//!
//! Wheel raycasts are the hot loop of any vehicle solver, so they are issued
//! in shared batches of at most [`MAX_VEHICLES_PER_BATCH`] vehicles rather
//! than one query per wheel.  The built-in engine resolves them against a
//! flat ground plane; a rigid-body binding substitutes its scene query here
//! while keeping the same batching shape.

use urb_core::Point3;

/// Vehicles sharing one batched query.
pub const MAX_VEHICLES_PER_BATCH: usize = 32;

/// One suspension query: the wheel's downward ray origin.
#[derive(Copy, Clone, Debug)]
pub struct SuspensionRay {
    pub origin: Point3,
}

/// Ground height under each ray, index-aligned with the input.
///
/// With the `parallel` feature, batches run on Rayon's thread pool; the call
/// still returns only when every batch has completed.
pub fn batch_ground_heights(rays: &[SuspensionRay]) -> Vec<f32> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let mut heights = vec![0.0f32; rays.len()];
        rays.par_chunks(MAX_VEHICLES_PER_BATCH)
            .zip(heights.par_chunks_mut(MAX_VEHICLES_PER_BATCH))
            .for_each(|(batch, out)| resolve_batch(batch, out));
        heights
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut heights = vec![0.0f32; rays.len()];
        for (batch, out) in rays
            .chunks(MAX_VEHICLES_PER_BATCH)
            .zip(heights.chunks_mut(MAX_VEHICLES_PER_BATCH))
        {
            resolve_batch(batch, out);
        }
        heights
    }
}

/// Resolve one shared batch against the ground model (flat plane z = 0).
fn resolve_batch(batch: &[SuspensionRay], out: &mut [f32]) {
    for (_ray, height) in batch.iter().zip(out.iter_mut()) {
        *height = 0.0;
    }
}
