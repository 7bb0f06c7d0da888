// Document ID Generator - Snowflake-like IDs, time ordered like database ObjectIds

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::{current_time_millis, EntityId};
use crate::error::{AppError, AppResult};

/// Custom epoch (2023-11-14T22:13:20Z) so the 42-bit timestamp never reaches
/// the sign bit.
const ID_EPOCH_MILLIS: u64 = 1_700_000_000_000;
const NODE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const TIMESTAMP_MASK: u64 = (1 << 42) - 1;

pub const MAX_NODE_ID: u16 = (1 << NODE_BITS) - 1;

/// 64-bit ID format: [timestamp:42][node_id:10][sequence:12]
///
/// IDs from one generator are strictly increasing, which lets the store use
/// the ID as a creation-order tiebreak. When the sequence overflows inside a
/// millisecond (or the clock steps backwards) the generator keeps counting on
/// the last timestamp it handed out instead of sleeping.
#[derive(Debug)]
pub struct IdGenerator {
    node_id: u16,
    // [last_timestamp:52][sequence:12]
    state: AtomicU64,
}

impl IdGenerator {
    pub fn new(node_id: u16) -> AppResult<Self> {
        if node_id > MAX_NODE_ID {
            return Err(AppError::ConfigurationError(format!(
                "node id {} exceeds {}",
                node_id, MAX_NODE_ID
            )));
        }
        Ok(Self {
            node_id,
            state: AtomicU64::new(0),
        })
    }

    pub fn next_id(&self) -> EntityId {
        loop {
            let now = (current_time_millis().max(0) as u64).saturating_sub(ID_EPOCH_MILLIS);
            let prev = self.state.load(Ordering::Acquire);
            let prev_ts = prev >> SEQUENCE_BITS;
            let prev_seq = prev & SEQUENCE_MASK;

            let (ts, seq) = if now > prev_ts {
                (now, 0)
            } else if prev_seq < SEQUENCE_MASK {
                (prev_ts, prev_seq + 1)
            } else {
                (prev_ts + 1, 0)
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            if self
                .state
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let id = ((ts & TIMESTAMP_MASK) << (NODE_BITS + SEQUENCE_BITS))
                    | ((self.node_id as u64) << SEQUENCE_BITS)
                    | seq;
                return EntityId::new(id as i64);
            }
        }
    }

    pub fn extract_node_id(id: EntityId) -> u16 {
        (((id.value() as u64) >> SEQUENCE_BITS) & ((1 << NODE_BITS) - 1)) as u16
    }

    pub fn extract_sequence(id: EntityId) -> u16 {
        ((id.value() as u64) & SEQUENCE_MASK) as u16
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}
