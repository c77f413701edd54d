use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};
use crate::numberer::Numberer;

use super::{CompactEntry, CompactModel, Scorer, TrainableModel};

/// One-shot transform of a trained model into its compact runtime form.
///
/// Features are ranked by the total absolute averaged weight over all
/// actions; the top `retention` fraction is kept, globally rescaled into
/// the 16-bit range, and encoded sparsely or densely per feature. The
/// transform is a pure function of the model and the retention fraction.
#[derive(Clone, Copy, Debug)]
pub struct Finalizer {
    retention: f32,
}

impl Finalizer {
    /// `retention` is the fraction of ranked features to keep, in (0, 1].
    pub fn new(retention: f32) -> Result<Self> {
        if retention > 0.0 && retention <= 1.0 {
            Ok(Finalizer { retention })
        } else {
            Err(Error::InvalidConfig(format!(
                "retention fraction {} outside (0, 1]",
                retention
            )))
        }
    }

    pub fn finalize(&self, model: &TrainableModel) -> CompactModel {
        let n_actions = model.actions().len();

        let mut ranked = Vec::new();
        for feature in 0..model.n_features() {
            let row: Vec<f32> = (0..n_actions)
                .map(|action| model.averaged_weight(feature, action))
                .collect();
            let mass: f32 = row.iter().map(|weight| weight.abs()).sum();
            if mass > 0.0 {
                ranked.push((feature, row, mass));
            }
        }

        // Ties resolve on the feature index so that re-finalization is
        // reproducible.
        ranked.sort_by_key(|entry| (Reverse(OrderedFloat(entry.2)), entry.0));
        let keep = (ranked.len() as f64 * f64::from(self.retention)).ceil() as usize;
        ranked.truncate(keep);

        let max_abs = ranked
            .iter()
            .flat_map(|entry| entry.1.iter())
            .fold(0.0f32, |max, weight| max.max(weight.abs()));
        if max_abs == 0.0 {
            return CompactModel::new(
                Numberer::new(0),
                model.actions().clone(),
                Vec::new(),
                model.attach_index().clone(),
                1.0,
            );
        }

        let quantize = f32::from(i16::max_value()) / max_abs;
        let scale = max_abs / f32::from(i16::max_value());

        let mut features = Numberer::new(0);
        let mut entries = Vec::with_capacity(ranked.len());
        for (feature, row, _) in ranked {
            let quantized: Vec<i16> = row
                .iter()
                .map(|weight| (weight * quantize).round() as i16)
                .collect();
            let nonzero: Vec<(usize, i16)> = quantized
                .iter()
                .cloned()
                .enumerate()
                .filter(|&(_, weight)| weight != 0)
                .collect();

            let entry = match nonzero.len() {
                // Rescaling flushed the whole row to zero.
                0 => continue,
                1 => CompactEntry::Sparse {
                    action: nonzero[0].0,
                    weight: nonzero[0].1,
                },
                _ => CompactEntry::Dense(quantized),
            };

            let name = model
                .feature_name(feature)
                .expect("weight slot without a feature name");
            features.add(name.to_owned());
            entries.push(entry);
        }

        CompactModel::new(
            features,
            model.actions().clone(),
            entries,
            model.attach_index().clone(),
            scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Reverse;

    use itertools::Itertools;
    use ordered_float::OrderedFloat;

    use crate::models::{CompactEntry, Scorer, TrainableModel};
    use crate::system::AttachDir;

    use super::Finalizer;

    fn trained_model() -> TrainableModel {
        let mut model = TrainableModel::new();
        let features: Vec<usize> = (0..4)
            .map(|idx| model.intern_feature(&format!("f{}", idx)))
            .collect();
        let det = model.register_attach("DT", "NN", "det", AttachDir::Left);
        let subj = model.register_attach("NN", "VBD", "subj", AttachDir::Left);

        model.advance_step();
        model.update(&features[..2], det, 1.0);
        model.update(&[features[2]], subj, -0.5);
        model.advance_step();
        model.update(&[features[0]], subj, 0.75);
        model.update(&[features[3]], det, 0.125);
        model.advance_step();

        model
    }

    /// Order actions by score for a feature set under a model.
    fn ranking<S>(scorer: &S, features: &[usize]) -> Vec<usize>
    where
        S: Scorer,
    {
        (0..scorer.actions().len())
            .sorted_by_key(|&action| Reverse(OrderedFloat(scorer.score(features, action))))
            .collect()
    }

    #[test]
    fn full_retention_preserves_action_ranking() {
        let model = trained_model();
        let compact = Finalizer::new(1.0).unwrap().finalize(&model);

        // Rank by averaged weights on the trainable side.
        let averaged: Vec<f32> = (0..model.actions().len())
            .map(|action| {
                (0..model.n_features())
                    .map(|feature| model.averaged_weight(feature, action))
                    .sum()
            })
            .collect();
        let trainable_ranking: Vec<usize> = (0..model.actions().len())
            .sorted_by_key(|&action| Reverse(OrderedFloat(averaged[action])))
            .collect();

        let compact_features: Vec<usize> = (0..model.n_features())
            .filter_map(|feature| {
                model
                    .feature_name(feature)
                    .and_then(|name| compact.feature(name))
            })
            .collect();
        assert_eq!(compact_features.len(), model.n_features());

        assert_eq!(ranking(&compact, &compact_features), trainable_ranking);
    }

    #[test]
    fn refinalization_is_idempotent() {
        let model = trained_model();
        let finalizer = Finalizer::new(1.0).unwrap();

        assert_eq!(finalizer.finalize(&model), finalizer.finalize(&model));
    }

    #[test]
    fn retention_drops_low_mass_features() {
        let model = trained_model();
        let compact = Finalizer::new(0.5).unwrap().finalize(&model);

        // f0 carries the largest total averaged mass and must survive.
        assert!(compact.n_features() < model.n_features());
        assert!(compact.feature("f0").is_some());
        assert!(compact.feature("f3").is_none());
    }

    #[test]
    fn sparse_and_dense_entries() {
        let model = trained_model();
        let compact = Finalizer::new(1.0).unwrap().finalize(&model);

        // f0 was updated for two actions, f1 for one.
        let f0 = compact.feature("f0").unwrap();
        let f1 = compact.feature("f1").unwrap();
        assert!(matches!(compact.entries()[f0], CompactEntry::Dense(_)));
        assert!(matches!(
            compact.entries()[f1],
            CompactEntry::Sparse { .. }
        ));
    }

    #[test]
    fn rejects_out_of_range_retention() {
        assert!(Finalizer::new(0.0).is_err());
        assert!(Finalizer::new(1.5).is_err());
        assert!(Finalizer::new(1.0).is_ok());
    }
}
