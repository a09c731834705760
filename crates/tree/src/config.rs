use std::path::Path;

use accumulator_crypto::field::from_decimal;
use accumulator_crypto::{FieldHasher, Fr};
use serde::{Deserialize, Serialize};

use crate::error::TreeError;
use crate::tree::MerkleTree;

/// Construction parameters for one named tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Key under which the tree is registered and persisted
    pub name: String,
    /// Tree height; capacity is `2^depth`
    pub depth: usize,
    /// Padding leaf, as a decimal field element
    pub zero_value: String,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            name: "cmd".to_string(),
            depth: 4,
            zero_value: "0".to_string(),
        }
    }
}

/// Parse a tree configuration from TOML text
pub fn load_config_toml(input: &str) -> Result<TreeConfig, toml::de::Error> {
    toml::from_str::<TreeConfig>(input)
}

impl TreeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, TreeError> {
        Ok(load_config_toml(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn zero_value(&self) -> Result<Fr, TreeError> {
        Ok(from_decimal(&self.zero_value)?)
    }

    /// Build an empty tree with these parameters.
    pub fn build<H: FieldHasher>(&self, hasher: H) -> Result<MerkleTree<H>, TreeError> {
        MerkleTree::with_hasher(self.depth, self.zero_value()?, hasher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accumulator_crypto::Mimc7;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = load_config_toml("").unwrap();
        assert_eq!(config, TreeConfig::default());
        assert_eq!(config.name, "cmd");
        assert_eq!(config.depth, 4);
    }

    #[test]
    fn test_partial_override() {
        let config = TreeConfig::from_toml_str("depth = 10\nzero_value = \"7\"").unwrap();
        assert_eq!(config.name, "cmd");
        assert_eq!(config.depth, 10);
        assert_eq!(config.zero_value().unwrap(), Fr::from(7u64));

        let tree = config.build(Mimc7).unwrap();
        assert_eq!(tree.leaf_number(), 1024);
        assert_eq!(tree.zero_value(), Fr::from(7u64));
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            TreeConfig::from_toml_str("depth = \"deep\""),
            Err(TreeError::Config(_))
        ));

        let config = TreeConfig {
            zero_value: "-1".to_string(),
            ..TreeConfig::default()
        };
        assert!(config.build(Mimc7).is_err());

        let config = TreeConfig {
            depth: 0,
            ..TreeConfig::default()
        };
        assert!(matches!(config.build(Mimc7), Err(TreeError::InvalidDepth(0))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"ballots\"\ndepth = 6").unwrap();

        let config = TreeConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "ballots");
        assert_eq!(config.depth, 6);

        assert!(matches!(
            TreeConfig::load("/nonexistent/tree.toml"),
            Err(TreeError::Io(_))
        ));
    }
}
