use serde_derive::{Deserialize, Serialize};

const ROOT_FORM: &str = "<root>";
const ROOT_POS: &str = "<root>";

/// A surface token with its part-of-speech tag.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct Token {
    form: String,
    pos: String,
}

impl Token {
    pub fn new<S, T>(form: S, pos: T) -> Self
    where
        S: Into<String>,
        T: Into<String>,
    {
        Token {
            form: form.into(),
            pos: pos.into(),
        }
    }

    fn root() -> Self {
        Token::new(ROOT_FORM, ROOT_POS)
    }

    pub fn form(&self) -> &str {
        &self.form
    }

    pub fn pos(&self) -> &str {
        &self.pos
    }
}

/// A tagged sentence.
///
/// The synthetic ROOT token sits at index 0, surface tokens are 1-based.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// Construct a sentence from already-tagged `(form, pos)` pairs.
    pub fn from_tagged<I, S, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        let mut tokens = vec![Token::root()];
        tokens.extend(pairs.into_iter().map(|(form, pos)| Token::new(form, pos)));
        Sentence { tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of surface tokens, the ROOT token excluded.
    pub fn len(&self) -> usize {
        self.tokens.len() - 1
    }

    pub fn token(&self, idx: usize) -> &Token {
        &self.tokens[idx]
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

#[cfg(test)]
mod tests {
    use super::Sentence;

    #[test]
    fn sentence_has_synthetic_root() {
        let sentence = Sentence::from_tagged(vec![("the", "DT"), ("dog", "NN")]);
        assert_eq!(sentence.len(), 2);
        assert_eq!(sentence.token(0).form(), "<root>");
        assert_eq!(sentence.token(1).form(), "the");
        assert_eq!(sentence.token(2).pos(), "NN");
    }

    #[test]
    fn empty_sentence() {
        let sentence = Sentence::from_tagged(Vec::<(String, String)>::new());
        assert!(sentence.is_empty());
        assert_eq!(sentence.len(), 0);
    }
}
