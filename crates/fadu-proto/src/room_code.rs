//! Room codes.
//!
//! A room code is exactly [`ROOM_CODE_LEN`] characters from
//! [`ROOM_CODE_ALPHABET`]. Client input is normalised to uppercase before
//! validation, so `"abc123"` and `"ABC123"` name the same room.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::ProtocolError;

/// Length of every room code.
pub const ROOM_CODE_LEN: usize = 6;

/// Characters a room code may contain.
pub const ROOM_CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Validated, uppercase room code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parse and normalise a room code.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let code = input.trim().to_ascii_uppercase();

        if code.len() != ROOM_CODE_LEN {
            return Err(ProtocolError::InvalidRoomCode {
                code: input.to_string(),
                reason: "must be exactly 6 characters",
            });
        }

        if !code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)) {
            return Err(ProtocolError::InvalidRoomCode {
                code: input.to_string(),
                reason: "must be letters and digits only",
            });
        }

        Ok(Self(code))
    }

    /// Build a code from random bits.
    ///
    /// Each character consumes one base-36 digit of `entropy`. Six digits use
    /// 36^6 (about 2^31) of the 2^64 input space, so the modulo bias is
    /// negligible.
    #[must_use]
    pub fn from_entropy(mut entropy: u64) -> Self {
        let radix = ROOM_CODE_ALPHABET.len() as u64;
        let mut code = String::with_capacity(ROOM_CODE_LEN);
        for _ in 0..ROOM_CODE_LEN {
            code.push(char::from(ROOM_CODE_ALPHABET[(entropy % radix) as usize]));
            entropy /= radix;
        }
        Self(code)
    }

    /// Code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn parse_normalises_case() {
        let code = RoomCode::parse("abc123").unwrap();
        assert_eq!(code.as_str(), "ABC123");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(matches!(RoomCode::parse("ABC12"), Err(ProtocolError::InvalidRoomCode { .. })));
        assert!(matches!(RoomCode::parse("ABC1234"), Err(ProtocolError::InvalidRoomCode { .. })));
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn parse_rejects_symbols() {
        assert!(RoomCode::parse("ABC-12").is_err());
        assert!(RoomCode::parse("ÄBC123").is_err());
    }

    proptest! {
        #[test]
        fn prop_generated_codes_always_parse(entropy in any::<u64>()) {
            let code = RoomCode::from_entropy(entropy);
            prop_assert_eq!(RoomCode::parse(code.as_str())?, code);
        }
    }
}
