//! Order-preserving row keys and stored row values.
//!
//! A row key is `token | partition key | clustering values`, each part
//! encoded so that comparing the concatenated bytes gives the same order as
//! comparing (token, partition key bytes, clustering values) one after the
//! other:
//!
//! ```text
//! token:      8 bytes big-endian, sign bit flipped
//! component:  bytes with 0x00 escaped as 0x00 0xFF, terminated by 0x00 0x01
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::WriteError;
use crate::partitioner::Partitioner;
use crate::schema::InsertTemplate;

const ESCAPE: u8 = 0x00;
const ESCAPED_NUL: u8 = 0xFF;
const TERMINATOR: u8 = 0x01;

pub fn encode_token(token: i64, out: &mut Vec<u8>) {
    out.extend_from_slice(&((token as u64) ^ (1 << 63)).to_be_bytes());
}

pub fn decode_token(key: &[u8]) -> Option<i64> {
    let bytes: [u8; 8] = key.get(..8)?.try_into().ok()?;
    Some((u64::from_be_bytes(bytes) ^ (1 << 63)) as i64)
}

pub fn encode_component(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        if b == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_NUL]);
        } else {
            out.push(b);
        }
    }
    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

/// Serialized partition key, as hashed by the partitioner.
///
/// A single column is its raw bytes. Composite keys write every component
/// as `u16 BE length | bytes | 0x00`.
pub fn serialize_partition_key(components: &[&[u8]]) -> Result<Vec<u8>, WriteError> {
    if let [single] = components {
        return Ok(single.to_vec());
    }

    let capacity = components.iter().map(|c| c.len() + 3).sum();
    let mut out = Vec::with_capacity(capacity);
    for component in components {
        let len = u16::try_from(component.len()).map_err(|_| WriteError::KeyTooLarge {
            len: component.len(),
            max: u16::MAX as usize,
        })?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(component);
        out.push(0x00);
    }
    Ok(out)
}

/// Value stored under a row key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRow {
    /// Write time, microseconds since the epoch.
    pub timestamp: u64,
    /// Seconds; absent when the table has no default TTL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// Expiry, seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    pub cells: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    pub token: i64,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Turns positional insert values into a row key and stored value.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    template: InsertTemplate,
    partitioner: Arc<dyn Partitioner>,
    table: String,
}

impl RowEncoder {
    pub fn new(template: InsertTemplate, partitioner: Arc<dyn Partitioner>) -> Self {
        let table = template.schema().qualified_name();
        Self {
            template,
            partitioner,
            table,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn template(&self) -> &InsertTemplate {
        &self.template
    }

    pub fn encode(&self, values: &[&str]) -> Result<EncodedRow, WriteError> {
        self.encode_at(values, SystemTime::now())
    }

    pub fn encode_at(&self, values: &[&str], now: SystemTime) -> Result<EncodedRow, WriteError> {
        if values.len() != self.template.arity() {
            return Err(WriteError::Arity {
                table: self.table.clone(),
                expected: self.template.arity(),
                got: values.len(),
            });
        }

        let partition: Vec<&[u8]> = self
            .template
            .partition_positions()
            .iter()
            .map(|&p| values[p].as_bytes())
            .collect();
        let partition_key = serialize_partition_key(&partition)?;
        let token = self.partitioner.token(&partition_key);

        let mut key = Vec::with_capacity(8 + partition_key.len() + 32);
        encode_token(token, &mut key);
        encode_component(&partition_key, &mut key);
        for &p in self.template.clustering_positions() {
            encode_component(values[p].as_bytes(), &mut key);
        }

        let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
        let ttl = self.template.schema().default_ttl().map(|ttl| ttl.as_secs());
        let stored = StoredRow {
            timestamp: since_epoch.as_micros() as u64,
            ttl,
            expires_at: ttl.map(|ttl| since_epoch.as_secs() + ttl),
            cells: self
                .template
                .regular_positions()
                .iter()
                .map(|(name, p)| (name.clone(), values[*p].to_string()))
                .collect(),
        };
        let value = serde_json::to_vec(&stored)?;

        Ok(EncodedRow { token, key, value })
    }
}

/// Tracks the last accepted key of a sorted writer.
#[derive(Debug, Default)]
pub(crate) struct OrderCheck {
    last: Option<(i64, Vec<u8>)>,
}

impl OrderCheck {
    /// Accepts keys that are not smaller than the previous one. Returns
    /// `true` when the key repeats the previous key.
    pub(crate) fn admit(&mut self, table: &str, row: &EncodedRow) -> Result<bool, WriteError> {
        if let Some((previous_token, previous)) = &self.last {
            match row.key.as_slice().cmp(previous.as_slice()) {
                std::cmp::Ordering::Less => {
                    return Err(WriteError::OutOfOrder {
                        table: table.to_string(),
                        token: row.token,
                        previous_token: *previous_token,
                    });
                }
                std::cmp::Ordering::Equal => return Ok(true),
                std::cmp::Ordering::Greater => {}
            }
        }
        self.last = Some((row.token, row.key.clone()));
        Ok(false)
    }
}
