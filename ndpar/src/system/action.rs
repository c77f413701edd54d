use std::fmt;
use std::ops::{Deref, DerefMut};

use serde_derive::{Deserialize, Serialize};

use crate::numberer::Numberer;
use crate::system::ParserState;

/// Which member of an adjacent pending pair becomes the dependent.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum AttachDir {
    /// The left token is attached under the right token (`<label>l`).
    Left,
    /// The right token is attached under the left token (`<label>r`).
    Right,
}

/// A transition over an adjacent pending pair.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub enum Action {
    /// Reorder the pair; the right token travels leftwards.
    SwapLeft,
    /// Reorder the pair; the left token travels rightwards.
    SwapRight,
    /// Create an arc within the pair and retire the dependent.
    Attach { label: String, dir: AttachDir },
}

impl Action {
    pub fn attach<S>(label: S, dir: AttachDir) -> Self
    where
        S: Into<String>,
    {
        Action::Attach {
            label: label.into(),
            dir,
        }
    }

    pub fn is_swap(&self) -> bool {
        match *self {
            Action::SwapLeft | Action::SwapRight => true,
            Action::Attach { .. } => false,
        }
    }

    /// Can this action be applied at the pair anchored by `anchor`?
    ///
    /// Attachments only need the pair itself; swaps additionally need a
    /// pending neighbor beyond the pair on their travel side.
    pub fn is_possible(&self, state: &ParserState, anchor: usize) -> bool {
        let right = match state.pending().next_of(anchor) {
            Some(right) => right,
            None => return false,
        };

        match *self {
            Action::SwapLeft => state.pending().prev_of(anchor).is_some(),
            Action::SwapRight => state.pending().next_of(right).is_some(),
            Action::Attach { .. } => true,
        }
    }

    /// Apply this action at the pair anchored by `anchor`.
    pub fn apply(&self, state: &mut ParserState, anchor: usize) {
        let right = state
            .pending()
            .next_of(anchor)
            .expect("apply: anchor has no pair partner");

        match *self {
            Action::SwapLeft | Action::SwapRight => state.swap(anchor, right),
            Action::Attach {
                ref label,
                dir: AttachDir::Right,
            } => state.attach(right, anchor, label),
            Action::Attach {
                ref label,
                dir: AttachDir::Left,
            } => state.attach(anchor, right, label),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Action::SwapLeft => f.write_str("SWAPLEFT"),
            Action::SwapRight => f.write_str("SWAPRIGHT"),
            Action::Attach {
                ref label,
                dir: AttachDir::Left,
            } => write!(f, "{}l", label),
            Action::Attach {
                ref label,
                dir: AttachDir::Right,
            } => write!(f, "{}r", label),
        }
    }
}

/// The action inventory of a model.
///
/// The two swap actions are always present; attach actions are added as
/// labels are observed in training.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Actions(Numberer<Action>);

impl Actions {
    pub fn new() -> Self {
        let mut inner = Numberer::new(0);
        inner.add(Action::SwapLeft);
        inner.add(Action::SwapRight);
        Actions(inner)
    }

    pub fn swap_left(&self) -> usize {
        self.number(&Action::SwapLeft)
            .expect("SWAPLEFT missing from action inventory")
    }

    pub fn swap_right(&self) -> usize {
        self.number(&Action::SwapRight)
            .expect("SWAPRIGHT missing from action inventory")
    }
}

impl Default for Actions {
    fn default() -> Self {
        Actions::new()
    }
}

impl Deref for Actions {
    type Target = Numberer<Action>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Actions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Actions, AttachDir};

    #[test]
    fn action_names() {
        assert_eq!(Action::SwapLeft.to_string(), "SWAPLEFT");
        assert_eq!(Action::SwapRight.to_string(), "SWAPRIGHT");
        assert_eq!(Action::attach("det", AttachDir::Left).to_string(), "detl");
        assert_eq!(Action::attach("subj", AttachDir::Right).to_string(), "subjr");
    }

    #[test]
    fn swaps_are_preinterned() {
        let mut actions = Actions::new();
        assert_eq!(actions.swap_left(), 0);
        assert_eq!(actions.swap_right(), 1);

        let det = actions.add(Action::attach("det", AttachDir::Left));
        assert_eq!(det, 2);
        assert_eq!(actions.add(Action::attach("det", AttachDir::Left)), 2);
    }
}
