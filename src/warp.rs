//! Warp function: a dense per-pixel horizontal displacement curve built
//! from the sparse note→onset anchors of an [`AlignmentIndex`].
//!
//! Between two neighbouring anchors the displacement is interpolated
//! linearly; before the first and after the last anchor it stays flat at
//! that anchor's gap, so nothing outside the matched span is warped.

use serde::Serialize;

use crate::alignment::AlignmentIndex;
use crate::config::WarpDomain;
use crate::metrics::SceneMetrics;

/// Horizontal displacement (local units) for every integer x of the scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WarpFunction {
    values: Vec<f64>,
}

/// Fold state carried from one x to the next.
#[derive(Debug, Clone, Copy)]
struct Carry {
    /// Next anchor not yet passed
    j: usize,
    /// The x at which `j` last advanced
    last_x: f64,
    /// Value emitted for the previous x
    value: f64,
}

impl WarpFunction {
    /// Build the displacement array for a scene, sized by `domain`.
    pub fn build(index: &AlignmentIndex, metrics: &SceneMetrics, domain: WarpDomain) -> Self {
        Self::build_with_len(index, metrics.warp_len(domain))
    }

    pub fn build_with_len(index: &AlignmentIndex, len: usize) -> Self {
        Self::from_anchors(index.note_positions(), index.onset_positions(), len)
    }

    /// Build a displacement array of length `len` from parallel anchor
    /// arrays. Extra entries in the longer array are ignored.
    pub fn from_anchors(notes: &[f64], onsets: &[f64], len: usize) -> Self {
        let n = notes.len().min(onsets.len());
        if n == 0 {
            return Self {
                values: vec![0.0; len],
            };
        }

        let gap = |k: usize| onsets[k] - notes[k];
        let head = gap(0);
        let tail = gap(n - 1);

        let start = Carry {
            j: 0,
            last_x: 0.0,
            value: head,
        };
        let values = (0..len)
            .scan(start, |carry, x| {
                let x = x as f64;
                while carry.j < n && notes[carry.j] <= x {
                    carry.j += 1;
                    carry.last_x = x;
                }
                let (value, next) = step(*carry, x, notes, &gap, head, tail, n);
                *carry = next;
                Some(value)
            })
            .collect();

        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Displacement at `x`, read from entry `round(x)`. Indices past
    /// either end read the nearest entry; an empty function or a
    /// non-finite `x` reads 0.
    pub fn shift_at(&self, x: f64) -> f64 {
        let Some(last) = self.values.len().checked_sub(1) else {
            return 0.0;
        };
        if !x.is_finite() {
            return 0.0;
        }
        let i = x.round().clamp(0.0, last as f64) as usize;
        self.values[i]
    }
}

/// One fold step: the value at `x` and the carry for the next x.
fn step(
    carry: Carry,
    x: f64,
    notes: &[f64],
    gap: &impl Fn(usize) -> f64,
    head: f64,
    tail: f64,
    n: usize,
) -> (f64, Carry) {
    let value = match carry.j {
        0 => head,
        j if j >= n => tail,
        j => {
            let diff_last = gap(j - 1);
            let diff_curr = gap(j.min(n - 1));
            let span = notes[j] - notes[j - 1];
            interpolate(diff_last, diff_curr, (x - carry.last_x) / span)
                .filter(|_| span > 0.0)
                .unwrap_or(carry.value)
        }
    };
    (value, Carry { value, ..carry })
}

fn interpolate(a: f64, b: f64, t: f64) -> Option<f64> {
    let v = (1.0 - t) * a + t * b;
    v.is_finite().then_some(v)
}
