use itertools::Itertools;
use log::debug;

use crate::error::{Error, Result};
use crate::features::FeatureGenerator;
use crate::models::Scorer;
use crate::system::{Action, Arc, AttachDir, ParserState, Sentence, ROOT_RELATION};

/// A candidate action with its cached score.
#[derive(Clone, Copy, Debug)]
pub struct ScoredAction {
    pub action: usize,
    pub score: f32,
}

/// Per-sentence cache of resolved features and scored candidates.
///
/// Entries are keyed by the anchor (left) token of a pending pair. An
/// applied action marks only the tokens within the feature generator's
/// context width stale; everything else keeps its cached scores, which
/// bounds the amortized rescoring cost per action.
pub struct DecodeContext {
    stale: Vec<bool>,
    features: Vec<Vec<usize>>,
    candidates: Vec<Vec<ScoredAction>>,
}

impl DecodeContext {
    pub fn new(n_tokens: usize) -> Self {
        DecodeContext {
            stale: vec![true; n_tokens + 1],
            features: vec![Vec::new(); n_tokens + 1],
            candidates: vec![Vec::new(); n_tokens + 1],
        }
    }

    pub fn is_stale(&self, token: usize) -> bool {
        self.stale[token]
    }

    /// Resolved feature indices of the pair anchored at `token`.
    pub fn features(&self, token: usize) -> &[usize] {
        &self.features[token]
    }

    pub fn candidates(&self, token: usize) -> &[ScoredAction] {
        &self.candidates[token]
    }

    /// Store resolved features for `anchor` and rescore its candidates:
    /// the attach actions registered for the pair's POS tags plus the two
    /// swaps.
    pub fn install<S>(
        &mut self,
        state: &ParserState,
        scorer: &S,
        anchor: usize,
        features: Vec<usize>,
    ) where
        S: Scorer,
    {
        let mut candidates = Vec::new();

        if let Some(right) = state.pending().next_of(anchor) {
            let left_pos = state.sentence().token(anchor).pos();
            let right_pos = state.sentence().token(right).pos();

            for &action in scorer.attach_candidates(left_pos, right_pos) {
                candidates.push(ScoredAction {
                    action,
                    score: scorer.score(&features, action),
                });
            }
            for &action in &[scorer.actions().swap_left(), scorer.actions().swap_right()] {
                candidates.push(ScoredAction {
                    action,
                    score: scorer.score(&features, action),
                });
            }
        }

        self.features[anchor] = features;
        self.candidates[anchor] = candidates;
        self.stale[anchor] = false;
    }

    /// Mark every cached entry stale, e.g. after a weight update.
    pub fn invalidate_all(&mut self) {
        for stale in &mut self.stale {
            *stale = true;
        }
    }

    /// Mark `site` and the pending tokens within `width` hops of it stale.
    pub fn invalidate_around(&mut self, state: &ParserState, site: usize, width: usize) {
        self.stale[site] = true;

        let mut left = state.pending().prev_of(site);
        for _ in 0..width {
            match left {
                Some(token) => {
                    self.stale[token] = true;
                    left = state.pending().prev_of(token);
                }
                None => break,
            }
        }

        let mut right = state.pending().next_of(site);
        for _ in 0..width {
            match right {
                Some(token) => {
                    self.stale[token] = true;
                    right = state.pending().next_of(token);
                }
                None => break,
            }
        }
    }

    /// Invalidate around the site(s) an applied action touched.
    pub fn invalidate_after(
        &mut self,
        state: &ParserState,
        action: &Action,
        anchor: usize,
        right: usize,
        width: usize,
    ) {
        match *action {
            Action::SwapLeft | Action::SwapRight => {
                self.invalidate_around(state, right, width);
                self.invalidate_around(state, anchor, width);
            }
            // Only the head survives an attachment.
            Action::Attach {
                dir: AttachDir::Right,
                ..
            } => self.invalidate_around(state, anchor, width),
            Action::Attach {
                dir: AttachDir::Left,
                ..
            } => self.invalidate_around(state, right, width),
        }
    }
}

/// Greedy transition-based parser over a scoring model.
///
/// Repeatedly applies the single highest-scoring possible action over all
/// adjacent pending pairs; no beam, no backtracking.
pub struct GreedyParser<S, G> {
    scorer: S,
    generator: G,
}

/// Outcome of decoding one sentence.
#[derive(Clone, Debug)]
pub struct ParseReport {
    pub arcs: Vec<Arc>,
    pub n_swaps: usize,
    pub n_attaches: usize,
}

impl<S, G> GreedyParser<S, G>
where
    S: Scorer,
    G: FeatureGenerator,
{
    pub fn new(scorer: S, generator: G) -> Self {
        GreedyParser { scorer, generator }
    }

    pub fn parse(&self, sentence: &Sentence) -> Result<Vec<Arc>> {
        self.parse_report(sentence).map(|report| report.arcs)
    }

    /// Parse, returning action counts alongside the arcs.
    pub fn parse_report(&self, sentence: &Sentence) -> Result<ParseReport> {
        let mut state = ParserState::new(sentence);
        let mut context = DecodeContext::new(sentence.len());
        let mut n_swaps = 0;
        let mut n_attaches = 0;

        while !state.is_terminal() {
            self.refresh_stale(&mut context, &state);

            let (anchor, action) = self
                .select(&context, &state)
                .ok_or(Error::NoValidAction)?;
            let action = self
                .scorer
                .actions()
                .value(action)
                .expect("scored action missing from inventory")
                .clone();
            debug!("applying {} at {}", action, anchor);

            if action.is_swap() {
                n_swaps += 1;
            } else {
                n_attaches += 1;
            }

            let right = state
                .pending()
                .next_of(anchor)
                .expect("selected anchor has no pair partner");
            action.apply(&mut state, anchor);
            context.invalidate_after(
                &state,
                &action,
                anchor,
                right,
                self.generator.context_width(),
            );
        }

        if let Some(last) = state.pending().first() {
            state.attach(last, 0, ROOT_RELATION);
            n_attaches += 1;
        }

        Ok(ParseReport {
            arcs: state.into_arcs(),
            n_swaps,
            n_attaches,
        })
    }

    fn refresh_stale(&self, context: &mut DecodeContext, state: &ParserState) {
        let pending: Vec<usize> = state.pending().iter().collect();
        for &anchor in &pending {
            if !context.is_stale(anchor) {
                continue;
            }

            let names = self.generator.features(state, anchor);
            let features: Vec<usize> = names
                .iter()
                .filter_map(|name| self.scorer.feature(name))
                .collect();
            context.install(state, &self.scorer, anchor, features);
        }
    }

    /// The highest-scoring possible action over all adjacent pairs.
    fn select(&self, context: &DecodeContext, state: &ParserState) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize, f32)> = None;

        for (anchor, _) in state.pending().iter().tuple_windows::<(_, _)>() {
            for candidate in context.candidates(anchor) {
                let action = self
                    .scorer
                    .actions()
                    .value(candidate.action)
                    .expect("cached candidate missing from inventory");
                if !action.is_possible(state, anchor) {
                    continue;
                }

                let better = match best {
                    Some((_, _, score)) => candidate.score > score,
                    None => true,
                };
                if better {
                    best = Some((anchor, candidate.action, candidate.score));
                }
            }
        }

        best.map(|(anchor, action, _)| (anchor, action))
    }
}
