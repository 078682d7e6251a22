use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollStatus {
    NotStarted,
    Active,
    Ended,
}

impl PollStatus {
    pub fn label(self) -> &'static str {
        match self {
            PollStatus::NotStarted => "Not Started",
            PollStatus::Active => "Voting Active",
            PollStatus::Ended => "Ended",
        }
    }
}

impl TryFrom<u64> for PollStatus {
    type Error = LedgerError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PollStatus::NotStarted),
            1 => Ok(PollStatus::Active),
            2 => Ok(PollStatus::Ended),
            other => Err(LedgerError::Decode(format!("unknown poll status {other}"))),
        }
    }
}

/// 20-byte account address, rendered as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|err| LedgerError::InvalidAddress(format!("'{trimmed}': {err}")))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxHash(pub String);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The ledger's `currentPoll()` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentPoll {
    /// `None` while the ledger reports an end time of zero.
    pub end_time: Option<DateTime<Utc>>,
    pub status: PollStatus,
    /// Empty until the poll has been ended.
    pub winner: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub movie: String,
    pub votes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_address_with_and_without_prefix() {
        let with_prefix: Address = "0xdAaf05Ab90F233c51Bc9F8caEA0886DD7d60040e"
            .parse()
            .expect("address");
        let without_prefix: Address = "daaf05ab90f233c51bc9f8caea0886dd7d60040e"
            .parse()
            .expect("address");
        assert_eq!(with_prefix, without_prefix);
        assert_eq!(
            with_prefix.to_string(),
            "0xdaaf05ab90f233c51bc9f8caea0886dd7d60040e"
        );
    }

    #[test]
    fn rejects_short_address() {
        let err = "0x1234".parse::<Address>().expect_err("must fail");
        assert!(matches!(err, LedgerError::InvalidAddress(_)));
    }

    #[test]
    fn poll_status_rejects_out_of_range_values() {
        assert_eq!(PollStatus::try_from(1u64).expect("status"), PollStatus::Active);
        assert!(PollStatus::try_from(3u64).is_err());
    }

    #[test]
    fn address_serializes_as_hex_string() {
        let address = Address([0x11; 20]);
        let json = serde_json::to_string(&address).expect("serialize");
        assert_eq!(json, format!("\"{address}\""));
    }
}
