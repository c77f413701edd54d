use failure::Fail;

/// Errors raised by the parser core.
#[derive(Clone, Debug, Eq, Fail, PartialEq)]
pub enum Error {
    /// No action is applicable anywhere in the current parser state.
    ///
    /// During training this points at a gold tree the transition system
    /// cannot reconstruct, such as a cycle or a token outside the action
    /// vocabulary. The sentence must be abandoned; the model is left
    /// untouched by the failing step.
    #[fail(display = "no valid action in the current parser state")]
    NoValidAction,

    /// The gold dependency annotation is incomplete or not a tree.
    #[fail(display = "malformed dependency tree: {}", _0)]
    MalformedTree(String),

    /// A configuration value outside its legal range.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;
