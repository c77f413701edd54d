use std::io::Read;

use serde_derive::{Deserialize, Serialize};

use ndpar::train::TrainConfig;

use crate::Result;

/// Read a TOML-encoded value.
pub trait TomlRead: Sized {
    fn from_toml_read<R>(read: R) -> Result<Self>
    where
        R: Read;
}

/// Training and finalization configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub train: TrainSection,
    pub finalize: FinalizeSection,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrainSection {
    /// Passes over the training corpus.
    pub epochs: usize,
    /// Per-sentence iteration cap.
    pub max_iterations: usize,
    /// Upper bound on a single perceptron update.
    pub max_update: f32,
}

impl TrainSection {
    /// The trainer knobs of this section.
    pub fn trainer(&self) -> TrainConfig {
        TrainConfig {
            max_iterations: self.max_iterations,
            max_update: self.max_update,
        }
    }
}

impl Default for TrainSection {
    fn default() -> Self {
        let trainer = TrainConfig::default();
        TrainSection {
            epochs: 10,
            max_iterations: trainer.max_iterations,
            max_update: trainer.max_update,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FinalizeSection {
    /// Fraction of ranked features the compact model keeps.
    pub retention: f32,
}

impl Default for FinalizeSection {
    fn default() -> Self {
        FinalizeSection { retention: 1.0 }
    }
}

impl TomlRead for Config {
    fn from_toml_read<R>(mut read: R) -> Result<Self>
    where
        R: Read,
    {
        let mut data = String::new();
        read.read_to_string(&mut data)?;
        Ok(toml::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, TomlRead};

    #[test]
    fn partial_config_fills_in_defaults() {
        let toml = r#"
            [train]
            epochs = 3

            [finalize]
            retention = 0.25
        "#;

        let config = Config::from_toml_read(toml.as_bytes()).unwrap();
        assert_eq!(config.train.epochs, 3);
        assert_eq!(config.train.trainer().max_iterations, 1_000);
        assert_eq!(config.finalize.retention, 0.25);
    }

    #[test]
    fn empty_config_is_all_defaults() {
        let config = Config::from_toml_read("".as_bytes()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn unknown_values_fail() {
        assert!(Config::from_toml_read("train = 3".as_bytes()).is_err());
    }
}
