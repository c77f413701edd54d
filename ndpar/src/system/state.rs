use crate::system::{Arc, PendingList, Sentence};

/// Working state of the transition system over one sentence.
///
/// Owns the pending list, the arcs created so far, and per-token attachment
/// bookkeeping in parallel arrays keyed by token index. States are built
/// fresh per sentence and never shared, so decoding independent sentences
/// concurrently against one read-only model needs no locking.
pub struct ParserState<'a> {
    sentence: &'a Sentence,
    pending: PendingList,
    arcs: Vec<Arc>,
    head_arcs: Vec<Vec<usize>>,
    attached: Vec<bool>,
    n_children: Vec<usize>,
}

impl<'a> ParserState<'a> {
    pub fn new(sentence: &'a Sentence) -> Self {
        let n_tokens = sentence.len();
        ParserState {
            sentence,
            pending: PendingList::new(n_tokens),
            arcs: Vec::with_capacity(n_tokens),
            head_arcs: vec![Vec::new(); n_tokens + 1],
            attached: vec![false; n_tokens + 1],
            n_children: vec![0; n_tokens + 1],
        }
    }

    pub fn sentence(&self) -> &Sentence {
        self.sentence
    }

    pub fn pending(&self) -> &PendingList {
        &self.pending
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    /// Arcs headed by `head`, in creation order.
    pub fn arcs_of_head(&self, head: usize) -> impl Iterator<Item = &Arc> {
        self.head_arcs[head].iter().map(move |&idx| &self.arcs[idx])
    }

    pub fn is_attached(&self, token: usize) -> bool {
        self.attached[token]
    }

    /// Number of dependents attached under `token` so far.
    pub fn n_children(&self, token: usize) -> usize {
        self.n_children[token]
    }

    /// At most one pending token left?
    pub fn is_terminal(&self) -> bool {
        self.pending.len() <= 1
    }

    /// Create an arc and retire the dependent from the pending list.
    pub fn attach(&mut self, dependent: usize, head: usize, label: &str) {
        let index = self.arcs.len();
        self.arcs.push(Arc {
            dependent,
            head,
            label: label.to_owned(),
            index,
        });
        self.head_arcs[head].push(index);
        self.attached[dependent] = true;
        self.n_children[head] += 1;
        self.pending.remove(dependent);
    }

    /// Reorder the adjacent pending pair `(left, right)`.
    pub fn swap(&mut self, left: usize, right: usize) {
        self.pending.swap(left, right);
    }

    pub fn into_arcs(self) -> Vec<Arc> {
        self.arcs
    }
}

#[cfg(test)]
mod tests {
    use crate::system::{Action, AttachDir, Sentence};

    use super::ParserState;

    #[test]
    fn attach_retires_dependent() {
        let sentence = Sentence::from_tagged(vec![("a", "A"), ("b", "B"), ("c", "C")]);
        let mut state = ParserState::new(&sentence);

        Action::attach("x", AttachDir::Right).apply(&mut state, 2);

        assert!(state.is_attached(3));
        assert_eq!(state.n_children(2), 1);
        assert_eq!(state.pending().iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(state.arcs().len(), 1);
        assert_eq!(state.arcs()[0].dependent, 3);
        assert_eq!(state.arcs()[0].head, 2);
        assert_eq!(state.arcs()[0].index, 0);
        assert_eq!(state.arcs_of_head(2).count(), 1);
    }

    #[test]
    fn swap_conserves_pending_tokens() {
        let sentence = Sentence::from_tagged(vec![("a", "A"), ("b", "B"), ("c", "C")]);
        let mut state = ParserState::new(&sentence);

        Action::SwapRight.apply(&mut state, 1);

        assert_eq!(state.pending().iter().collect::<Vec<_>>(), vec![2, 1, 3]);
        assert_eq!(state.pending().len(), 3);
        assert!(state.arcs().is_empty());
    }

    #[test]
    fn swap_needs_a_neighbor_beyond_the_pair() {
        let sentence = Sentence::from_tagged(vec![("a", "A"), ("b", "B")]);
        let state = ParserState::new(&sentence);

        assert!(!Action::SwapRight.is_possible(&state, 1));
        assert!(!Action::SwapLeft.is_possible(&state, 1));
        assert!(Action::attach("x", AttachDir::Left).is_possible(&state, 1));
    }
}
