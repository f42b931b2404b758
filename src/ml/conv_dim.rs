// ============================================================
// Layer 5 — Layer Dimension Derivation
// ============================================================
// 1-D convolution and pooling layers share one output-length
// formula:
//
//   L_out = floor((L_in + 2*padding - dilation*(kernel-1) - 1) / stride) + 1
//
// Pooling stages use padding = 0 and dilation = 1.
// The last length of the chain sizes the first linear layer.

use crate::domain::error::{BodaError, Result};

/// Geometry of one windowed stage (convolution or pooling)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub kernel_size: usize,
    pub stride:      usize,
    pub padding:     usize,
    pub dilation:    usize,
}

impl WindowGeometry {
    pub fn conv(kernel_size: usize, stride: usize, padding: usize, dilation: usize) -> Self {
        Self { kernel_size, stride, padding, dilation }
    }

    pub fn pool(kernel_size: usize, stride: usize) -> Self {
        Self { kernel_size, stride, padding: 0, dilation: 1 }
    }
}

/// Raw formula, signed so invalid geometries are visible to callers.
///
/// Uses floor division, so a negative numerator rounds toward -inf.
pub fn conv1d_out_len(l_in: i64, kernel_size: i64, stride: i64, padding: i64, dilation: i64) -> i64 {
    let numerator = l_in + 2 * padding - dilation * (kernel_size - 1) - 1;
    numerator.div_euclid(stride) + 1
}

/// Checked output length of one stage
pub fn stage_out_len(stage: &str, l_in: usize, g: &WindowGeometry) -> Result<usize> {
    if g.stride == 0 || g.kernel_size == 0 || g.dilation == 0 {
        return Err(BodaError::InvalidGeometry { stage: stage.to_string(), length: 0 });
    }
    let len = conv1d_out_len(
        l_in as i64,
        g.kernel_size as i64,
        g.stride as i64,
        g.padding as i64,
        g.dilation as i64,
    );
    if len <= 0 {
        return Err(BodaError::InvalidGeometry { stage: stage.to_string(), length: len });
    }
    Ok(len as usize)
}

/// Apply a chain of named stages, returning every intermediate length
pub fn derive_chain(l_in: usize, stages: &[(&str, WindowGeometry)]) -> Result<Vec<usize>> {
    let mut lengths = Vec::with_capacity(stages.len());
    let mut current = l_in;
    for (name, geometry) in stages {
        current = stage_out_len(name, current, geometry)?;
        tracing::debug!("{}: length {}", name, current);
        lengths.push(current);
    }
    Ok(lengths)
}
