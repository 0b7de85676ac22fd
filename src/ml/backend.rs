// ============================================================
// Layer 5 — Backend Selection
// ============================================================
// Training runs on Autodiff<InferBackend>; evaluation and
// prediction run on InferBackend itself.
//
// Default: the ndarray CPU backend, driven by a single worker
// thread (see infra::runtime). Build with `--features wgpu`
// to run on the GPU instead.

use burn::prelude::Backend;

#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray<f32>;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;

/// The device every model and tensor is created on.
pub fn default_device() -> <InferBackend as Backend>::Device {
    Default::default()
}
