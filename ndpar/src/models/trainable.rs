use serde_derive::{Deserialize, Serialize};

use crate::numberer::Numberer;
use crate::system::{Action, Actions, AttachDir};

use super::{AttachIndex, Scorer};

/// Running weight of one (feature, action) pair.
///
/// `summed` accumulates `weight` over the steps it was live, up to
/// `last_step`. The sum at a later step is then
/// `summed + weight * (step - last_step)`, which gives the averaged
/// perceptron weight without touching every parameter every step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
struct WeightCell {
    weight: f32,
    summed: f32,
    last_step: u64,
}

impl WeightCell {
    fn tick(&mut self, step: u64) {
        self.summed += self.weight * (step - self.last_step) as f32;
        self.last_step = step;
    }

    fn summed_at(&self, step: u64) -> f32 {
        self.summed + self.weight * (step - self.last_step) as f32
    }
}

/// Per-feature weight storage.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
enum FeatureWeights {
    /// No update has touched this feature yet.
    Absent,
    /// Fast path: every update so far hit the same action.
    Single { action: usize, cell: WeightCell },
    /// Promoted from `Single` on the first collision with a second action.
    PerAction(Vec<WeightCell>),
}

/// Mutable scoring model trained with the averaged perceptron.
///
/// Scoring uses the raw weights, so the live decision boundary drives
/// training updates; the running averages only surface at finalization.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrainableModel {
    features: Numberer<String>,
    actions: Actions,
    weights: Vec<FeatureWeights>,
    attach: AttachIndex,
    step: u64,
}

impl TrainableModel {
    pub fn new() -> Self {
        TrainableModel {
            features: Numberer::new(0),
            actions: Actions::new(),
            weights: Vec::new(),
            attach: AttachIndex::new(),
            step: 0,
        }
    }

    /// Intern a feature name, creating its weight slot on first sight.
    pub fn intern_feature(&mut self, name: &str) -> usize {
        let idx = self.features.add(name.to_owned());
        if idx == self.weights.len() {
            self.weights.push(FeatureWeights::Absent);
        }
        idx
    }

    /// Intern an attach action and record it as a candidate for a POS pair.
    pub fn register_attach(
        &mut self,
        left_pos: &str,
        right_pos: &str,
        label: &str,
        dir: AttachDir,
    ) -> usize {
        let action = self.actions.add(Action::attach(label, dir));
        let candidates = self
            .attach
            .entry((left_pos.to_owned(), right_pos.to_owned()))
            .or_insert_with(Vec::new);
        if !candidates.contains(&action) {
            candidates.push(action);
        }
        action
    }

    /// Advance the global step counter; once per training sentence.
    pub fn advance_step(&mut self) {
        self.step += 1;
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub fn feature_name(&self, feature: usize) -> Option<&str> {
        self.features.value(feature).map(String::as_str)
    }

    pub(crate) fn attach_index(&self) -> &AttachIndex {
        &self.attach
    }

    /// Add `delta` to the weight of `action` for every feature.
    pub fn update(&mut self, features: &[usize], action: usize, delta: f32) {
        for &feature in features {
            self.update_one(feature, action, delta);
        }
    }

    fn update_one(&mut self, feature: usize, action: usize, delta: f32) {
        let step = self.step;
        let n_actions = self.actions.len();
        let slot = &mut self.weights[feature];

        match *slot {
            FeatureWeights::Absent => {
                *slot = FeatureWeights::Single {
                    action,
                    cell: WeightCell {
                        weight: delta,
                        summed: 0.0,
                        last_step: step,
                    },
                };
            }
            FeatureWeights::Single {
                action: single,
                ref mut cell,
            } if single == action => {
                cell.tick(step);
                cell.weight += delta;
            }
            FeatureWeights::Single {
                action: single,
                cell,
            } => {
                // Collision with a second action: promote to a full row.
                let mut cells = vec![WeightCell::default(); n_actions];
                cells[single] = cell;
                cells[action] = WeightCell {
                    weight: delta,
                    summed: 0.0,
                    last_step: step,
                };
                *slot = FeatureWeights::PerAction(cells);
            }
            FeatureWeights::PerAction(ref mut cells) => {
                if cells.len() < n_actions {
                    cells.resize(n_actions, WeightCell::default());
                }
                let cell = &mut cells[action];
                cell.tick(step);
                cell.weight += delta;
            }
        }
    }

    fn raw_weight(&self, feature: usize, action: usize) -> f32 {
        match self.weights[feature] {
            FeatureWeights::Absent => 0.0,
            FeatureWeights::Single {
                action: single,
                ref cell,
            } => {
                if single == action {
                    cell.weight
                } else {
                    0.0
                }
            }
            FeatureWeights::PerAction(ref cells) => {
                cells.get(action).map(|cell| cell.weight).unwrap_or(0.0)
            }
        }
    }

    /// Averaged weight of a (feature, action) pair at the current step,
    /// materialized lazily.
    pub fn averaged_weight(&self, feature: usize, action: usize) -> f32 {
        if self.step == 0 {
            return 0.0;
        }

        let summed = match self.weights[feature] {
            FeatureWeights::Absent => 0.0,
            FeatureWeights::Single {
                action: single,
                ref cell,
            } => {
                if single == action {
                    cell.summed_at(self.step)
                } else {
                    0.0
                }
            }
            FeatureWeights::PerAction(ref cells) => cells
                .get(action)
                .map(|cell| cell.summed_at(self.step))
                .unwrap_or(0.0),
        };

        summed / self.step as f32
    }
}

impl Default for TrainableModel {
    fn default() -> Self {
        TrainableModel::new()
    }
}

impl Scorer for TrainableModel {
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
        features
            .iter()
            .map(|&feature| self.raw_weight(feature, action))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::models::Scorer;
    use crate::system::AttachDir;

    use super::TrainableModel;

    /// Brute-force mirror of the lazy averaging: one weight history per
    /// (feature, action), summed step by step.
    struct BruteForce {
        weights: Vec<Vec<f32>>,
        summed: Vec<Vec<f32>>,
        step: u64,
    }

    impl BruteForce {
        fn new(n_features: usize, n_actions: usize) -> Self {
            BruteForce {
                weights: vec![vec![0.0; n_actions]; n_features],
                summed: vec![vec![0.0; n_actions]; n_features],
                step: 0,
            }
        }

        fn advance_step(&mut self) {
            self.step += 1;
            for (feature_weights, feature_summed) in self.weights.iter().zip(&mut self.summed) {
                for (weight, summed) in feature_weights.iter().zip(feature_summed.iter_mut()) {
                    *summed += weight;
                }
            }
        }

        // A step contributes the weight it started with; updates within the
        // step only count from the next step on.
        fn update(&mut self, features: &[usize], action: usize, delta: f32) {
            for &feature in features {
                self.weights[feature][action] += delta;
            }
        }

        fn averaged(&self, feature: usize, action: usize) -> f32 {
            self.summed[feature][action] / self.step as f32
        }
    }

    #[test]
    fn lazy_averaging_matches_brute_force() {
        let mut model = TrainableModel::new();
        let f0 = model.intern_feature("f0");
        let f1 = model.intern_feature("f1");
        let f2 = model.intern_feature("f2");
        let a0 = model.register_attach("A", "B", "x", AttachDir::Left);
        let a1 = model.register_attach("A", "B", "y", AttachDir::Right);

        let mut brute = BruteForce::new(3, 4);

        let trace: Vec<(Vec<usize>, usize, f32)> = vec![
            (vec![f0, f1], a0, 1.0),
            (vec![f1], a1, -0.5),
            (vec![f0, f2], a0, 0.25),
            (vec![f2], a1, 2.0),
            (vec![f0], a0, -1.0),
        ];

        // Updates scattered over steps; some steps see no update at all.
        for (round, (features, action, delta)) in trace.into_iter().enumerate() {
            model.advance_step();
            brute.advance_step();
            model.update(&features, action, delta);
            brute.update(&features, action, delta);

            if round % 2 == 0 {
                model.advance_step();
                brute.advance_step();
            }
        }

        for feature in 0..3 {
            for action in 0..4 {
                assert_relative_eq!(
                    model.averaged_weight(feature, action),
                    brute.averaged(feature, action)
                );
            }
        }
    }

    #[test]
    fn single_slot_promotes_on_second_action() {
        let mut model = TrainableModel::new();
        let feature = model.intern_feature("f");
        let a0 = model.register_attach("A", "B", "x", AttachDir::Left);
        let a1 = model.register_attach("A", "B", "y", AttachDir::Left);

        model.advance_step();
        model.update(&[feature], a0, 1.0);
        assert_relative_eq!(model.score(&[feature], a0), 1.0);
        assert_relative_eq!(model.score(&[feature], a1), 0.0);

        model.advance_step();
        model.update(&[feature], a1, -2.0);
        assert_relative_eq!(model.score(&[feature], a0), 1.0);
        assert_relative_eq!(model.score(&[feature], a1), -2.0);
    }

    #[test]
    fn unknown_features_score_zero() {
        let mut model = TrainableModel::new();
        let feature = model.intern_feature("f");
        model.advance_step();
        model.update(&[feature], 0, 1.0);

        assert_eq!(model.feature("g"), None);
        assert_relative_eq!(model.score(&[], 0), 0.0);
    }

    #[test]
    fn attach_candidates_are_per_pos_pair() {
        let mut model = TrainableModel::new();
        let det = model.register_attach("DT", "NN", "det", AttachDir::Left);
        model.register_attach("DT", "NN", "det", AttachDir::Left);

        assert_eq!(model.attach_candidates("DT", "NN"), &[det]);
        assert!(model.attach_candidates("NN", "DT").is_empty());
    }
}
