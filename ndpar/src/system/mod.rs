//! The transition system: data model, parser state, and greedy decoder.

/// Relation label of the arc attaching the last pending token to ROOT.
pub const ROOT_RELATION: &str = "ROOT";

mod action;
pub use self::action::{Action, Actions, AttachDir};

mod arcs;
pub use self::arcs::{Arc, DependencyTree};

mod decoder;
pub use self::decoder::{DecodeContext, GreedyParser, ParseReport, ScoredAction};

mod pending;
pub use self::pending::PendingList;

mod sentence;
pub use self::sentence::{Sentence, Token};

mod state;
pub use self::state::ParserState;
