//! Per-sentence perceptron training.

use itertools::Itertools;
use log::warn;
use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::thread_rng;
use serde_derive::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::FeatureGenerator;
use crate::models::{Scorer, TrainableModel};
use crate::system::{
    AttachDir, DecodeContext, DependencyTree, ParserState, Sentence, ROOT_RELATION,
};

use super::oracle::Oracle;

/// Knobs of the perceptron trainer.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Iteration cap per sentence; exceeding it abandons the sentence.
    pub max_iterations: usize,
    /// Upper bound on a single update step.
    pub max_update: f32,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            max_iterations: 1_000,
            max_update: 1.0,
        }
    }
}

/// Outcome of training on one sentence.
#[derive(Clone, Copy, Debug, Default)]
pub struct SentenceReport {
    pub n_updates: usize,
    pub n_swaps: usize,
    pub n_attaches: usize,
    /// The sentence hit the iteration cap and was abandoned mid-parse.
    pub aborted: bool,
}

/// Aggregated outcome of one epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct EpochReport {
    pub n_sentences: usize,
    pub n_updates: usize,
    pub n_aborted: usize,
    pub n_failed: usize,
}

/// A possible candidate action judged by the oracle.
#[derive(Clone, Copy, Debug)]
struct Judged {
    anchor: usize,
    action: usize,
    score: f32,
    swap: bool,
    simple: bool,
    legal: bool,
}

/// Margin-relevant extremes of a judged candidate set, as indices into it.
#[derive(Clone, Copy, Debug, Default)]
struct Verdict {
    best_legal: Option<usize>,
    worst_legal: Option<usize>,
    best_illegal: Option<usize>,
}

/// Structured perceptron trainer running the transition system greedily.
///
/// Per state, all candidates over all adjacent pairs are judged against
/// the gold tree. When every legal action outscores every illegal one the
/// best legal action is taken; otherwise one capped, margin-1 update is
/// applied and the same state is rescored.
pub struct GreedyTrainer<'a, G> {
    model: &'a mut TrainableModel,
    generator: &'a G,
    config: TrainConfig,
}

impl<'a, G> GreedyTrainer<'a, G>
where
    G: FeatureGenerator,
{
    pub fn new(model: &'a mut TrainableModel, generator: &'a G, config: TrainConfig) -> Self {
        GreedyTrainer {
            model,
            generator,
            config,
        }
    }

    pub fn model(&self) -> &TrainableModel {
        self.model
    }

    /// Train on one sentence with its gold tree.
    pub fn train_sentence(
        &mut self,
        sentence: &Sentence,
        tree: &DependencyTree,
    ) -> Result<SentenceReport> {
        if tree.len() != sentence.len() {
            return Err(Error::MalformedTree(format!(
                "gold tree over {} tokens for a sentence of {}",
                tree.len(),
                sentence.len()
            )));
        }

        self.register_gold(sentence, tree);
        let oracle = Oracle::new(tree);
        let mut state = ParserState::new(sentence);
        let mut context = DecodeContext::new(sentence.len());
        self.model.advance_step();

        let mut report = SentenceReport::default();
        let mut iterations = 0;
        while !state.is_terminal() {
            iterations += 1;
            if iterations > self.config.max_iterations {
                warn!(
                    "sentence exceeded {} iterations; abandoning",
                    self.config.max_iterations
                );
                report.aborted = true;
                return Ok(report);
            }

            self.refresh_stale(&mut context, &state);
            let judged = self.judge(&context, &state, &oracle);
            let verdict = assess(&judged);

            let best_legal = match verdict.best_legal {
                Some(best_legal) => best_legal,
                None => return Err(Error::NoValidAction),
            };
            let worst_legal = verdict
                .worst_legal
                .expect("verdict with a best but no worst legal action");

            match verdict.best_illegal {
                Some(best_illegal)
                    if judged[best_illegal].score >= judged[worst_legal].score =>
                {
                    // Margin violation: update once, rescore the same state.
                    self.update(&context, &judged[worst_legal], &judged[best_illegal]);
                    context.invalidate_all();
                    report.n_updates += 1;
                }
                _ => {
                    let chosen = judged[best_legal];
                    let action = self
                        .model
                        .actions()
                        .value(chosen.action)
                        .expect("judged action missing from inventory")
                        .clone();

                    if action.is_swap() {
                        report.n_swaps += 1;
                    } else {
                        report.n_attaches += 1;
                    }

                    let right = state
                        .pending()
                        .next_of(chosen.anchor)
                        .expect("judged anchor has no pair partner");
                    action.apply(&mut state, chosen.anchor);
                    context.invalidate_after(
                        &state,
                        &action,
                        chosen.anchor,
                        right,
                        self.generator.context_width(),
                    );
                }
            }
        }

        if let Some(last) = state.pending().first() {
            state.attach(last, 0, ROOT_RELATION);
            report.n_attaches += 1;
        }

        Ok(report)
    }

    /// Sequential epochs over the corpus, reshuffled once per epoch.
    ///
    /// Fatally failed sentences are logged and skipped so that one bad
    /// tree cannot poison the remaining corpus.
    pub fn train_corpus(
        &mut self,
        corpus: &[(Sentence, DependencyTree)],
        epochs: usize,
    ) -> Vec<EpochReport> {
        let mut order: Vec<usize> = (0..corpus.len()).collect();
        let mut rng = thread_rng();
        let mut reports = Vec::with_capacity(epochs);

        for _ in 0..epochs {
            order.shuffle(&mut rng);

            let mut report = EpochReport::default();
            for &idx in &order {
                let (ref sentence, ref tree) = corpus[idx];
                report.n_sentences += 1;
                match self.train_sentence(sentence, tree) {
                    Ok(sentence_report) => {
                        report.n_updates += sentence_report.n_updates;
                        if sentence_report.aborted {
                            report.n_aborted += 1;
                        }
                    }
                    Err(err) => {
                        warn!("skipping sentence: {}", err);
                        report.n_failed += 1;
                    }
                }
            }

            reports.push(report);
        }

        reports
    }

    /// Margin-1 perceptron update between the worst legal and the best
    /// illegal action, capped for stability.
    fn update(&mut self, context: &DecodeContext, legal: &Judged, illegal: &Judged) {
        let n_features =
            context.features(illegal.anchor).len() + context.features(legal.anchor).len();
        let delta = ((illegal.score - legal.score + 1.0) / n_features as f32)
            .min(self.config.max_update);

        self.model
            .update(context.features(legal.anchor), legal.action, delta);
        self.model
            .update(context.features(illegal.anchor), illegal.action, -delta);
    }

    fn refresh_stale(&mut self, context: &mut DecodeContext, state: &ParserState) {
        let pending: Vec<usize> = state.pending().iter().collect();
        for &anchor in &pending {
            if !context.is_stale(anchor) {
                continue;
            }

            let names = self.generator.features(state, anchor);
            let features: Vec<usize> = names
                .iter()
                .map(|name| self.model.intern_feature(name))
                .collect();
            context.install(state, &*self.model, anchor, features);
        }
    }

    /// Judge every possible candidate over all adjacent pairs.
    fn judge(
        &self,
        context: &DecodeContext,
        state: &ParserState,
        oracle: &Oracle,
    ) -> Vec<Judged> {
        let mut judged = Vec::new();

        for (anchor, _) in state.pending().iter().tuple_windows::<(_, _)>() {
            for candidate in context.candidates(anchor) {
                let action = self
                    .model
                    .actions()
                    .value(candidate.action)
                    .expect("cached candidate missing from inventory");
                if !action.is_possible(state, anchor) {
                    continue;
                }

                let legal = oracle.is_legal(state, anchor, action);
                let swap = action.is_swap();
                let simple = swap && legal && oracle.is_simple_swap(state, anchor, action);
                judged.push(Judged {
                    anchor,
                    action: candidate.action,
                    score: candidate.score,
                    swap,
                    simple,
                    legal,
                });
            }
        }

        demote_nonsimple_swaps(&mut judged);
        judged
    }

    /// Register the attach actions of a gold tree under both linear
    /// arrangements of their POS pairs; swaps can present a pair either
    /// way by the time it becomes adjacent.
    fn register_gold(&mut self, sentence: &Sentence, tree: &DependencyTree) {
        for dependent in 1..=tree.len() {
            let head = tree.head(dependent);
            if head == 0 {
                continue;
            }

            let label = tree.label(dependent).to_owned();
            let dependent_pos = sentence.token(dependent).pos().to_owned();
            let head_pos = sentence.token(head).pos().to_owned();

            self.model
                .register_attach(&head_pos, &dependent_pos, &label, AttachDir::Right);
            self.model
                .register_attach(&dependent_pos, &head_pos, &label, AttachDir::Left);
        }
    }
}

/// Swaps are a last resort: a legal non-simple swap yields to any legal
/// attachment found in the same state.
fn demote_nonsimple_swaps(judged: &mut [Judged]) {
    let has_legal_attach = judged
        .iter()
        .any(|candidate| candidate.legal && !candidate.swap);
    if !has_legal_attach {
        return;
    }

    for candidate in judged.iter_mut() {
        if candidate.swap && candidate.legal && !candidate.simple {
            candidate.legal = false;
        }
    }
}

/// Fold the judged candidates into their margin-relevant extremes.
fn assess(judged: &[Judged]) -> Verdict {
    let mut verdict = Verdict::default();

    for (idx, candidate) in judged.iter().enumerate() {
        let score = OrderedFloat(candidate.score);
        if candidate.legal {
            if verdict
                .best_legal
                .map_or(true, |best| score > OrderedFloat(judged[best].score))
            {
                verdict.best_legal = Some(idx);
            }
            if verdict
                .worst_legal
                .map_or(true, |worst| score < OrderedFloat(judged[worst].score))
            {
                verdict.worst_legal = Some(idx);
            }
        } else if verdict
            .best_illegal
            .map_or(true, |best| score > OrderedFloat(judged[best].score))
        {
            verdict.best_illegal = Some(idx);
        }
    }

    verdict
}

#[cfg(test)]
mod tests {
    use crate::features::WindowFeatures;
    use crate::models::{Finalizer, TrainableModel};
    use crate::system::{Arc, DependencyTree, GreedyParser, Sentence};

    use super::{GreedyTrainer, TrainConfig};

    fn sorted_by_dependent(mut arcs: Vec<Arc>) -> Vec<(usize, usize, String)> {
        arcs.sort_by_key(|arc| arc.dependent);
        arcs.into_iter()
            .map(|arc| (arc.dependent, arc.head, arc.label))
            .collect()
    }

    /// Train until an epoch goes through without updates.
    fn train_to_convergence(
        model: &mut TrainableModel,
        generator: &WindowFeatures,
        corpus: &[(Sentence, DependencyTree)],
    ) {
        let mut trainer = GreedyTrainer::new(model, generator, TrainConfig::default());
        for _ in 0..200 {
            let report = trainer.train_corpus(corpus, 1);
            assert_eq!(report[0].n_failed, 0);
            assert_eq!(report[0].n_aborted, 0);
            if report[0].n_updates == 0 {
                return;
            }
        }

        panic!("training did not converge");
    }

    #[test]
    fn projective_scenario_is_reproduced_without_swaps() {
        let sentence =
            Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN"), ("ran", "VBD")]);
        let tree = DependencyTree::new(
            3,
            &[(1, 2, "det"), (2, 3, "subj"), (3, 0, "ROOT")],
        )
        .unwrap();
        let generator = WindowFeatures::default();
        let corpus = vec![(sentence.clone(), tree)];

        let mut model = TrainableModel::new();
        train_to_convergence(&mut model, &generator, &corpus);

        let parser = GreedyParser::new(&model, &generator);
        let report = parser.parse_report(&sentence).unwrap();

        assert_eq!(report.n_swaps, 0);
        assert_eq!(
            sorted_by_dependent(report.arcs),
            vec![
                (1, 2, "det".to_owned()),
                (2, 3, "subj".to_owned()),
                (3, 0, "ROOT".to_owned()),
            ]
        );
    }

    #[test]
    fn non_projective_scenario_swaps_into_place() {
        // Arcs (1 <- 3) and (2 <- 4) cross; token 2 must swap leftwards
        // past token 1 before the attachments can proceed.
        let sentence = Sentence::from_tagged(vec![
            ("w1", "P1"),
            ("w2", "P2"),
            ("w3", "P3"),
            ("w4", "P4"),
        ]);
        let tree = DependencyTree::new(
            4,
            &[(1, 3, "a"), (2, 4, "b"), (3, 4, "c"), (4, 0, "ROOT")],
        )
        .unwrap();
        let generator = WindowFeatures::default();
        let corpus = vec![(sentence.clone(), tree)];

        let mut model = TrainableModel::new();

        {
            let mut trainer =
                GreedyTrainer::new(&mut model, &generator, TrainConfig::default());
            let report = trainer.train_sentence(&corpus[0].0, &corpus[0].1).unwrap();
            assert!(report.n_swaps >= 1);
            assert_eq!(report.n_attaches, 4);
        }

        train_to_convergence(&mut model, &generator, &corpus);

        let parser = GreedyParser::new(&model, &generator);
        let report = parser.parse_report(&sentence).unwrap();

        assert!(report.n_swaps >= 1);
        assert_eq!(
            sorted_by_dependent(report.arcs),
            vec![
                (1, 3, "a".to_owned()),
                (2, 4, "b".to_owned()),
                (3, 4, "c".to_owned()),
                (4, 0, "ROOT".to_owned()),
            ]
        );
    }

    #[test]
    fn decoding_with_the_compact_model_matches() {
        let sentence =
            Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN"), ("ran", "VBD")]);
        let tree = DependencyTree::new(
            3,
            &[(1, 2, "det"), (2, 3, "subj"), (3, 0, "ROOT")],
        )
        .unwrap();
        let generator = WindowFeatures::default();
        let corpus = vec![(sentence.clone(), tree)];

        let mut model = TrainableModel::new();
        train_to_convergence(&mut model, &generator, &corpus);

        // Let the running averages settle on the converged weights; the
        // extra epochs are update-free.
        {
            let mut trainer =
                GreedyTrainer::new(&mut model, &generator, TrainConfig::default());
            let reports = trainer.train_corpus(&corpus, 50);
            assert!(reports.iter().all(|report| report.n_updates == 0));
        }

        let compact = Finalizer::new(1.0).unwrap().finalize(&model);
        assert!(compact.n_features() > 0);

        let parser = GreedyParser::new(&compact, &generator);
        let report = parser.parse_report(&sentence).unwrap();

        assert_eq!(report.n_swaps, 0);
        assert_eq!(
            sorted_by_dependent(report.arcs),
            vec![
                (1, 2, "det".to_owned()),
                (2, 3, "subj".to_owned()),
                (3, 0, "ROOT".to_owned()),
            ]
        );
    }

    #[test]
    fn termination_counts() {
        let sentence =
            Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN"), ("ran", "VBD")]);
        let tree = DependencyTree::new(
            3,
            &[(1, 2, "det"), (2, 3, "subj"), (3, 0, "ROOT")],
        )
        .unwrap();
        let generator = WindowFeatures::default();

        let mut model = TrainableModel::new();
        train_to_convergence(&mut model, &generator, &[(sentence.clone(), tree)]);

        let parser = GreedyParser::new(&model, &generator);
        let report = parser.parse_report(&sentence).unwrap();

        // n - 1 pair attachments plus the final ROOT arc.
        assert_eq!(report.n_attaches, 3);
        assert_eq!(report.arcs.len(), 3);
    }

    #[test]
    fn mismatched_tree_is_rejected() {
        let sentence = Sentence::from_tagged(vec![("a", "A")]);
        let tree = DependencyTree::new(2, &[(1, 2, "x"), (2, 0, "ROOT")]).unwrap();
        let generator = WindowFeatures::default();

        let mut model = TrainableModel::new();
        let mut trainer = GreedyTrainer::new(&mut model, &generator, TrainConfig::default());
        assert!(trainer.train_sentence(&sentence, &tree).is_err());
    }
}
