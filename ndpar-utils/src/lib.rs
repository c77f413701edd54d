//! Configuration and model artifact glue for `ndpar`.
//!
//! The core crate keeps persistence out of its hot paths; this crate
//! supplies the TOML configuration layer and the CBOR artifact format
//! used to ship trained models together with their feature-generator
//! configuration.

mod config;
pub use crate::config::{Config, FinalizeSection, TomlRead, TrainSection};

mod ser;
pub use crate::ser::{read_model_artifact, write_model_artifact, CborRead, CborWrite};

pub type Result<T> = ::std::result::Result<T, failure::Error>;
