//! Feature generation for parser states.

use crate::system::ParserState;

mod window;
pub use self::window::WindowFeatures;

/// Produces the feature names that apply at a pending position.
///
/// Name-to-index resolution is the caller's concern: the trainer interns
/// new names into the model, the decoder looks them up and treats unknown
/// names as legitimately absent.
pub trait FeatureGenerator {
    /// Number of pending neighbors on each side of an action site whose
    /// cached candidates the action invalidates.
    fn context_width(&self) -> usize;

    /// Feature names for the pair anchored at `anchor`.
    fn features(&self, state: &ParserState, anchor: usize) -> Vec<String>;
}

impl<'a, G> FeatureGenerator for &'a G
where
    G: FeatureGenerator,
{
    fn context_width(&self) -> usize {
        (*self).context_width()
    }

    fn features(&self, state: &ParserState, anchor: usize) -> Vec<String> {
        (*self).features(state, anchor)
    }
}
