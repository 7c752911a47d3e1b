//! Transaction records as read from a shard table

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of wallet movement recorded by a transaction
///
/// The source stores `credit`, `debit` and `transfer`; exports publish them as
/// `mint`, `burn` and `transfer`. Unknown kinds are kept verbatim and passed
/// through to the output so newer source values never break an export.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Funds created in a wallet
    Credit,
    /// Funds removed from a wallet
    Debit,
    /// Funds moved between wallets
    Transfer,
    /// Any value outside the known set
    Other(String),
}

impl ActionKind {
    /// Classify a raw action value from the store
    ///
    /// Only the exact lowercase source values are known; `"Credit"` is kept
    /// verbatim like any other unknown value.
    pub fn from_source(value: &str) -> Self {
        match value {
            "credit" => Self::Credit,
            "debit" => Self::Debit,
            "transfer" => Self::Transfer,
            other => Self::Other(other.to_string()),
        }
    }

    /// Code written in the TRANSTYPE column
    pub fn output_code(&self) -> &str {
        match self {
            Self::Credit => "mint",
            Self::Debit => "burn",
            Self::Transfer => "transfer",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "credit"),
            Self::Debit => write!(f, "debit"),
            Self::Transfer => write!(f, "transfer"),
            Self::Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// Map a raw source action to its exported code
///
/// ```
/// use txn_export::domain::record::map_action;
///
/// assert_eq!(map_action("credit"), "mint");
/// assert_eq!(map_action("debit"), "burn");
/// assert_eq!(map_action("transfer"), "transfer");
/// assert_eq!(map_action("refund"), "refund");
/// ```
pub fn map_action(value: &str) -> String {
    ActionKind::from_source(value).output_code().to_string()
}

/// One exported transaction row
///
/// `amount` is always in minor units as stored at the source. Rescaling is
/// applied by the export writer when the row is serialized and never written
/// back into the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Monotonically increasing sequence ("block") number within the shard
    pub block_num: i64,

    /// Content hash of the transaction
    pub tx_hash: String,

    /// Trace identifier
    pub trace_no: String,

    /// Action kind
    pub action: ActionKind,

    /// Amount in minor units
    pub amount: i64,

    /// Sender wallet identifier
    pub sender_id: String,

    /// Receiver wallet identifier
    pub receiver_id: String,

    /// Event timestamp
    pub system_date: NaiveDateTime,
}
