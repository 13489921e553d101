use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use uuid::Uuid;

use super::{RepositoryError, RepositoryResult};

/// Length of a food identifier in hex characters
pub const FOOD_ID_LENGTH: usize = 24;

const COUNTER_MASK: u32 = 0x00ff_ffff;
const TIMESTAMP_MASK: u64 = 0x0000_ffff_ffff_ffff;

static COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_SALT: OnceLock<u32> = OnceLock::new();

/// Identifier assigned by the document store when a food is inserted.
///
/// Layout (hex): 12 digits of creation time in milliseconds, 6 digits of a
/// per-process counter, 6 digits of per-process random salt. Ids generated by
/// one process therefore sort in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoodId(String);

impl FoodId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        let millis = (Utc::now().timestamp_millis().max(0) as u64) & TIMESTAMP_MASK;
        let counter = COUNTER.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;
        let salt = *PROCESS_SALT.get_or_init(|| {
            let bytes = Uuid::new_v4().into_bytes();
            u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
        });

        Self(format!("{:012x}{:06x}{:06x}", millis, counter, salt))
    }

    /// Parse an identifier received from a client
    pub fn parse(raw: &str) -> RepositoryResult<Self> {
        let well_formed = raw.len() == FOOD_ID_LENGTH
            && raw.chars().all(|c| c.is_ascii_hexdigit());

        if !well_formed {
            return Err(RepositoryError::InvalidId { id: raw.to_string() });
        }

        Ok(Self(raw.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FoodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
