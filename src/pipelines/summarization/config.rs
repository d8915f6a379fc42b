use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The unique string token for training mode
pub static TRAIN: &str = "train";

/// The unique string token for evaluation mode
pub static EVAL: &str = "eval";

/// The unique string token for decode mode
pub static DECODE: &str = "decode";

/// How the batcher groups examples
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Bucketed batches of `batch_size` examples
    Train,

    /// Same grouping as training
    Eval,

    /// Consecutive examples in file order, one batch per refill
    Decode,
}

impl TryFrom<&str> for Mode {
    type Error = ModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            v if v == TRAIN => Ok(Mode::Train),
            v if v == EVAL => Ok(Mode::Eval),
            v if v == DECODE => Ok(Mode::Decode),
            _ => Err(ModeError::Unknown(value.to_string())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Train => TRAIN,
            Mode::Eval => EVAL,
            Mode::Decode => DECODE,
        };

        write!(f, "{}", name)
    }
}

/// Mode Error
#[derive(thiserror::Error, Debug)]
pub enum ModeError {
    /// No mode found for the given string
    #[error("no mode found for {0}")]
    Unknown(String),
}

/// Hyperparameters that shape examples and batches
#[derive(burn::config::Config)]
pub struct Config {
    /// Number of examples per batch
    #[config(default = 16)]
    pub batch_size: usize,

    /// Maximum encoder length; longer articles are truncated
    #[config(default = 400)]
    pub max_enc_steps: usize,

    /// Decoder length; abstracts are truncated or padded to it
    #[config(default = 100)]
    pub max_dec_steps: usize,

    /// Whether to build the extended-vocabulary encoding for the copy mechanism
    #[config(default = true)]
    pub pointer_gen: bool,

    /// Batching mode
    #[config(default = "Mode::Train")]
    pub mode: Mode,

    /// Maximum vocabulary size when loading a vocabulary file (0 for no limit)
    #[config(default = 50_000)]
    pub vocab_size: usize,

    /// Seed for batch shuffling; shuffles from entropy when unset
    pub seed: Option<u64>,
}

impl Config {
    /// Check that the sizes can produce non-empty batches
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size"));
        }

        if self.max_enc_steps == 0 {
            return Err(ConfigError::Zero("max_enc_steps"));
        }

        if self.max_dec_steps == 0 {
            return Err(ConfigError::Zero("max_dec_steps"));
        }

        Ok(())
    }
}

/// Config Error
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A size that must be positive was zero
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[cfg(test)]
mod tests {
    use burn::config::Config as _;
    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use super::*;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!(Mode::try_from("Decode").unwrap(), Mode::Decode);
        assert_eq!(Mode::try_from("eval").unwrap(), Mode::Eval);
        assert!(Mode::try_from("beam").is_err());
        assert_eq!(Mode::Train.to_string(), "train");
    }

    #[test]
    fn defaults_validate() {
        let config = Config::new();

        assert_eq!(config.batch_size, 16);
        assert_eq!(config.mode, Mode::Train);
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(
            config.with_max_dec_steps(0).validate(),
            Err(ConfigError::Zero("max_dec_steps"))
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = TempDir::new("config_test").unwrap();
        let path = dir.path().join("config.json");
        let config = Config::new()
            .with_batch_size(4)
            .with_mode(Mode::Decode)
            .with_seed(Some(7));

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.batch_size, 4);
        assert_eq!(loaded.mode, Mode::Decode);
        assert_eq!(loaded.seed, Some(7));
    }
}
