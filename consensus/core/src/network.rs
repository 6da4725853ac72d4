use crate::field::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(thiserror::Error, PartialEq, Eq, Debug, Clone)]
pub enum NetworkTypeError {
    #[error("Invalid network type: {0}")]
    InvalidNetworkType(String),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Devnet,
}

impl NetworkType {
    /// The header field tag blocks carry on this network. Test and dev
    /// blocks are tagged HEAD_TEST so they can never be replayed on
    /// mainnet.
    pub fn header_field_type(&self) -> FieldType {
        match self {
            NetworkType::Mainnet => FieldType::Head,
            NetworkType::Testnet | NetworkType::Devnet => FieldType::HeadTest,
        }
    }
}

impl Display for NetworkType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Devnet => "devnet",
        };
        f.write_str(s)
    }
}

impl FromStr for NetworkType {
    type Err = NetworkTypeError;

    fn from_str(network_type: &str) -> Result<Self, Self::Err> {
        match network_type {
            "mainnet" => Ok(NetworkType::Mainnet),
            "testnet" => Ok(NetworkType::Testnet),
            "devnet" => Ok(NetworkType::Devnet),
            _ => Err(NetworkTypeError::InvalidNetworkType(network_type.to_string())),
        }
    }
}
