use serde_derive::{Deserialize, Serialize};

use crate::features::FeatureGenerator;
use crate::system::ParserState;

/// Feature generator over a window of pending tokens around the pair.
///
/// Emits the forms and tags of the pair, the tags of pending neighbors out
/// to `width` on both sides, and the attachment history (dependent counts,
/// most recent dependent label) of the pair members. Serialized alongside
/// the model so that decoding uses the training-time configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct WindowFeatures {
    width: usize,
}

impl WindowFeatures {
    pub fn new(width: usize) -> Self {
        WindowFeatures { width }
    }
}

impl Default for WindowFeatures {
    fn default() -> Self {
        WindowFeatures::new(2)
    }
}

impl FeatureGenerator for WindowFeatures {
    fn context_width(&self) -> usize {
        self.width
    }

    fn features(&self, state: &ParserState, anchor: usize) -> Vec<String> {
        let sentence = state.sentence();
        let mut features = Vec::with_capacity(8 + 2 * self.width);

        features.push("b".to_owned());
        features.push(format!("f0={}", sentence.token(anchor).form()));
        features.push(format!("p0={}", sentence.token(anchor).pos()));
        features.push(format!("v0={}", state.n_children(anchor)));
        if let Some(arc) = state.arcs_of_head(anchor).last() {
            features.push(format!("d0={}", arc.label));
        }

        if let Some(right) = state.pending().next_of(anchor) {
            features.push(format!("f1={}", sentence.token(right).form()));
            features.push(format!("p1={}", sentence.token(right).pos()));
            features.push(format!(
                "pp={}+{}",
                sentence.token(anchor).pos(),
                sentence.token(right).pos()
            ));
            features.push(format!("v1={}", state.n_children(right)));
            if let Some(arc) = state.arcs_of_head(right).last() {
                features.push(format!("d1={}", arc.label));
            }

            let mut beyond = state.pending().next_of(right);
            for offset in 2..2 + self.width {
                match beyond {
                    Some(token) => {
                        features.push(format!("p{}={}", offset, sentence.token(token).pos()));
                        beyond = state.pending().next_of(token);
                    }
                    None => {
                        features.push(format!("p{}=<none>", offset));
                        break;
                    }
                }
            }
        }

        let mut left = state.pending().prev_of(anchor);
        for offset in 1..=self.width {
            match left {
                Some(token) => {
                    features.push(format!("p-{}={}", offset, sentence.token(token).pos()));
                    left = state.pending().prev_of(token);
                }
                None => {
                    features.push(format!("p-{}=<none>", offset));
                    break;
                }
            }
        }

        features
    }
}

#[cfg(test)]
mod tests {
    use crate::features::FeatureGenerator;
    use crate::system::{ParserState, Sentence};

    use super::WindowFeatures;

    #[test]
    fn features_cover_the_pair_and_its_window() {
        let sentence =
            Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN"), ("ran", "VBD")]);
        let state = ParserState::new(&sentence);
        let generator = WindowFeatures::new(2);

        let features = generator.features(&state, 2);

        assert!(features.contains(&"p0=NN".to_owned()));
        assert!(features.contains(&"f1=ran".to_owned()));
        assert!(features.contains(&"pp=NN+VBD".to_owned()));
        assert!(features.contains(&"p-1=DT".to_owned()));
        assert!(features.contains(&"p2=<none>".to_owned()));
        assert!(features.contains(&"v0=0".to_owned()));
    }

    #[test]
    fn attachment_history_shows_up() {
        let sentence =
            Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN"), ("ran", "VBD")]);
        let mut state = ParserState::new(&sentence);
        state.attach(1, 2, "det");

        let features = WindowFeatures::new(2).features(&state, 2);

        assert!(features.contains(&"v0=1".to_owned()));
        assert!(features.contains(&"d0=det".to_owned()));
        assert!(features.contains(&"p-1=<none>".to_owned()));
    }
}
