//! Greedy transition-based dependency parsing for tagged sentences.
//!
//! `ndpar` builds single-rooted dependency trees with a greedy state
//! machine over adjacent token pairs. Non-projective structure is handled
//! inside the transition system through swap actions that reorder pairs
//! without attaching them. The scoring model is a linear multiclass model
//! with two interchangeable forms: a mutable [`TrainableModel`] updated by
//! a margin-based averaged perceptron, and an immutable [`CompactModel`]
//! produced by [`Finalizer`] for deployment.
//!
//! [`TrainableModel`]: models::TrainableModel
//! [`CompactModel`]: models::CompactModel
//! [`Finalizer`]: models::Finalizer

mod error;
pub use crate::error::{Error, Result};

mod numberer;
pub use crate::numberer::Numberer;

pub mod features;
pub mod models;
pub mod system;
pub mod train;
