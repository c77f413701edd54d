//! Training: projectivity precomputations, the oracle, and the trainer.

mod oracle;
pub use self::oracle::Oracle;

mod proj;
pub use self::proj::{ProjectiveOrder, Subcomponents};

mod trainer;
pub use self::trainer::{EpochReport, GreedyTrainer, SentenceReport, TrainConfig};
