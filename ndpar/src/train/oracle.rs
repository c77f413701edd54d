//! Training-time legality of candidate actions.

use crate::system::{Action, AttachDir, DependencyTree, ParserState};

use super::proj::{ProjectiveOrder, Subcomponents};

/// Penalty function: judges candidate actions against a gold tree.
///
/// An attachment is legal only if it reproduces the gold arc exactly and
/// the dependent has already collected all of its gold dependents; a swap
/// is legal only if it advances the pair towards the projective visiting
/// order.
pub struct Oracle<'a> {
    tree: &'a DependencyTree,
    order: ProjectiveOrder,
    components: Subcomponents,
}

impl<'a> Oracle<'a> {
    pub fn new(tree: &'a DependencyTree) -> Self {
        Oracle {
            tree,
            order: ProjectiveOrder::of(tree),
            components: Subcomponents::of(tree),
        }
    }

    /// Penalty of `action` at `anchor`: 0 when legal, 1 otherwise.
    pub fn penalty(&self, state: &ParserState, anchor: usize, action: &Action) -> u32 {
        if self.is_legal(state, anchor, action) {
            0
        } else {
            1
        }
    }

    pub fn is_legal(&self, state: &ParserState, anchor: usize, action: &Action) -> bool {
        let right = match state.pending().next_of(anchor) {
            Some(right) => right,
            None => return false,
        };

        match *action {
            Action::SwapLeft | Action::SwapRight => {
                self.order.index(anchor) > self.order.index(right)
            }
            Action::Attach { ref label, dir } => {
                let (dependent, head) = match dir {
                    AttachDir::Right => (right, anchor),
                    AttachDir::Left => (anchor, right),
                };

                // Attaching a token that still has unattached gold
                // dependents strands them, whatever the head says.
                self.tree.head(dependent) == head
                    && self.tree.label(dependent) == label
                    && state.n_children(dependent) == self.tree.children(dependent).len()
            }
        }
    }

    /// A legal swap is *simple* when one more swap puts the traveling
    /// token next to its gold head (or the head of the subcomponent that
    /// will collapse into it) and the token is ready to attach. Simple
    /// swaps keep their priority over attachments elsewhere.
    pub fn is_simple_swap(&self, state: &ParserState, anchor: usize, action: &Action) -> bool {
        let right = match state.pending().next_of(anchor) {
            Some(right) => right,
            None => return false,
        };

        let (traveler, beyond) = match *action {
            Action::SwapRight => (anchor, state.pending().next_of(right)),
            Action::SwapLeft => (right, state.pending().prev_of(anchor)),
            Action::Attach { .. } => return false,
        };

        let beyond = match beyond {
            Some(beyond) => beyond,
            None => return false,
        };

        let head = self.tree.head(traveler);
        (beyond == head || self.components.head_of(beyond) == head)
            && state.n_children(traveler) == self.tree.children(traveler).len()
    }
}
