use serde_derive::{Deserialize, Serialize};

use crate::numberer::Numberer;
use crate::system::Actions;

use super::{AttachIndex, Scorer};

/// Weights of one retained feature in the compact model.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub enum CompactEntry {
    /// A single action carries weight for this feature.
    Sparse { action: usize, weight: i16 },
    /// Dense weight row over the whole action inventory.
    Dense(Vec<i16>),
}

/// Immutable, compact scoring model.
///
/// Produced by [`Finalizer`](super::Finalizer) from a trained model:
/// averaged weights rescaled into 16 bits, zero rows dropped, features
/// renumbered densely. Scoring is `&self` and side-effect free, so one
/// model can serve concurrent decoders.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct CompactModel {
    features: Numberer<String>,
    actions: Actions,
    entries: Vec<CompactEntry>,
    attach: AttachIndex,
    scale: f32,
}

impl CompactModel {
    pub(crate) fn new(
        features: Numberer<String>,
        actions: Actions,
        entries: Vec<CompactEntry>,
        attach: AttachIndex,
        scale: f32,
    ) -> Self {
        CompactModel {
            features,
            actions,
            entries,
            attach,
            scale,
        }
    }

    pub fn n_features(&self) -> usize {
        self.entries.len()
    }

    /// Factor mapping the stored 16-bit weights back to averaged weights.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub(crate) fn entries(&self) -> &[CompactEntry] {
        &self.entries
    }
}

impl Scorer for CompactModel {
    fn actions(&self) -> &Actions {
        &self.actions
    }

    fn feature(&self, name: &str) -> Option<usize> {
        self.features.number(name)
    }

    fn attach_candidates(&self, left_pos: &str, right_pos: &str) -> &[usize] {
        self.attach
            .get(&(left_pos.to_owned(), right_pos.to_owned()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn score(&self, features: &[usize], action: usize) -> f32 {
        let mut raw = 0i32;
        for &feature in features {
            match self.entries[feature] {
                CompactEntry::Sparse {
                    action: sparse,
                    weight,
                } => {
                    if sparse == action {
                        raw += i32::from(weight);
                    }
                }
                CompactEntry::Dense(ref row) => {
                    raw += row.get(action).map(|&weight| i32::from(weight)).unwrap_or(0);
                }
            }
        }

        raw as f32 * self.scale
    }
}
