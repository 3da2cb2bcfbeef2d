/// Transaction types for proofchain
use crate::error::ChainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender used for transactions minted by the system rather than debited
/// from an account.
pub const REWARD_SENDER: &str = "0";

/// Amount credited to a node's identity for every block it mines.
pub const MINING_REWARD: u64 = 1;

/// A transaction amount.
///
/// Wraps a JSON number so an amount keeps the representation it arrived
/// with: `1` stays an integer and `1.0` stays a float. Block hashes are
/// computed over the encoded amount, so collapsing both into one numeric
/// type would change the digest of blocks received from peers.
///
/// Integers are kept exactly within the `i64`/`u64` range. A wider integer
/// (such as `100000000000000000000`) is read as a float and re-encodes in
/// float notation (`1e+20`), so a block carrying one hashes differently here
/// than on the node that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(serde_json::Number);

impl Amount {
    pub fn as_f64(&self) -> f64 {
        self.0.as_f64().unwrap_or_default()
    }

    pub fn as_number(&self) -> &serde_json::Number {
        &self.0
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value.into())
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(value.into())
    }
}

impl TryFrom<f64> for Amount {
    type Error = ChainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        serde_json::Number::from_f64(value)
            .map(Amount)
            .ok_or_else(|| ChainError::Serialization(format!("Amount must be finite, got {}", value)))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Nothing about a transaction is validated: amounts may be negative,
/// addresses are free-form and no balance is checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// The reward a miner pays itself when sealing a block.
    pub fn reward(recipient: impl Into<String>) -> Self {
        Transaction::new(REWARD_SENDER, recipient, MINING_REWARD)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
