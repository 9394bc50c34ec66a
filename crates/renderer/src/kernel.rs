//! Compact smoothing kernel.
//!
//! Weight falls off as `max(0, 1 - d/n)^2` over a disk of radius `n` pixels:
//! finite support keeps the cost per sample bounded, and squaring the taper
//! avoids a hard edge at the boundary.

/// One tap of the kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelEntry {
    pub dx: i64,
    pub dy: i64,
    pub weight: f64,
}

/// Symmetric smoothing weights covering `[-n, n]` on both axes.
#[derive(Debug, Clone)]
pub struct Kernel {
    radius: u32,
    entries: Vec<KernelEntry>,
    total_weight: f64,
}

impl Kernel {
    /// Build the kernel for radius `n`.
    ///
    /// All `(2n+1)^2` offsets are listed, including the corners whose weight is
    /// zero. Radius 0 is the identity kernel.
    pub fn new(radius: u32) -> Self {
        let n = radius as i64;
        let mut entries = Vec::with_capacity(((2 * n + 1) * (2 * n + 1)) as usize);

        for dy in -n..=n {
            for dx in -n..=n {
                let weight = if n == 0 {
                    1.0
                } else {
                    let d = ((dx * dx + dy * dy) as f64).sqrt();
                    (1.0 - d / n as f64).max(0.0).powi(2)
                };
                entries.push(KernelEntry { dx, dy, weight });
            }
        }

        let total_weight = entries.iter().map(|e| e.weight).sum();

        Self {
            radius,
            entries,
            total_weight,
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// Sum of all weights, the normalizer for weighted averages.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
