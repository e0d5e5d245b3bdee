use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Ticket identity in the ticket store. Always positive and representable
/// as a SQLite integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "u64", into = "u64")]
pub struct TicketId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    Zero,
    OutOfRange { value: u64 },
    InvalidFormat { value: String },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "ticket id must be positive"),
            Self::OutOfRange { value } => write!(f, "ticket id out of range: {value}"),
            Self::InvalidFormat { value } => write!(f, "invalid ticket id: {value}"),
        }
    }
}

impl std::error::Error for IdError {}

impl TicketId {
    pub fn new(value: u64) -> Result<Self, IdError> {
        if value == 0 {
            return Err(IdError::Zero);
        }
        if i64::try_from(value).is_err() {
            return Err(IdError::OutOfRange { value });
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        // Range checked in `new`.
        i64::try_from(self.0).unwrap_or(i64::MAX)
    }
}

impl TryFrom<u64> for TicketId {
    type Error = IdError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for TicketId {
    type Error = IdError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let value = u64::try_from(value).map_err(|_| IdError::InvalidFormat {
            value: value.to_string(),
        })?;
        Self::new(value)
    }
}

impl From<TicketId> for u64 {
    fn from(value: TicketId) -> Self {
        value.0
    }
}

impl FromStr for TicketId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('#');
        let value = trimmed.parse::<u64>().map_err(|_| IdError::InvalidFormat {
            value: s.to_string(),
        })?;
        Self::new(value)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_overflow() {
        assert_eq!(TicketId::new(0), Err(IdError::Zero));
        assert_eq!(
            TicketId::new(u64::MAX),
            Err(IdError::OutOfRange { value: u64::MAX })
        );
        assert_eq!(TicketId::new(42).unwrap().get(), 42);
    }

    #[test]
    fn test_parse_accepts_hash_prefix() {
        assert_eq!("#12".parse::<TicketId>().unwrap().get(), 12);
        assert_eq!("007".parse::<TicketId>().unwrap().get(), 7);
        assert!("abc".parse::<TicketId>().is_err());
        assert!("-3".parse::<TicketId>().is_err());
    }

    #[test]
    fn test_serde_rejects_zero() {
        assert!(serde_json::from_str::<TicketId>("0").is_err());
        assert_eq!(serde_json::from_str::<TicketId>("9").unwrap().get(), 9);
        assert_eq!(serde_json::to_string(&TicketId::new(9).unwrap()).unwrap(), "9");
    }
}
