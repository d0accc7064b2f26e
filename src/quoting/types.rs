//! Quotation types and the upstream envelope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quoting::error::FetchError;

/// A currency quotation exactly as the upstream API reports it.
///
/// Every value stays a string so the upstream formatting is preserved.
/// All fields are required: a payload missing any of them fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationRecord {
    /// Base currency code (e.g. "USD").
    pub code: String,
    /// Counter-currency code (e.g. "BRL").
    #[serde(rename = "codein")]
    pub code_in: String,
    /// Human readable pair name.
    pub name: String,
    pub high: String,
    pub low: String,
    #[serde(rename = "varBid")]
    pub var_bid: String,
    #[serde(rename = "pctChange")]
    pub pct_change: String,
    pub bid: String,
    pub ask: String,
    /// Unix timestamp, as sent.
    pub timestamp: String,
    pub create_date: String,
}

/// The upstream response body: one record nested under the pair key
/// (e.g. `{"USDBRL": {...}}`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamEnvelope {
    pair_key: String,
    record: QuotationRecord,
}

impl UpstreamEnvelope {
    /// Wrap a record under `pair_key`.
    pub fn new(pair_key: impl Into<String>, record: QuotationRecord) -> Self {
        Self {
            pair_key: pair_key.into(),
            record,
        }
    }

    /// Decode a response body, expecting the record under `pair_key`.
    pub fn decode(body: &[u8], pair_key: &str) -> Result<Self, FetchError> {
        let mut pairs: HashMap<String, QuotationRecord> = serde_json::from_slice(body)
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let record = pairs
            .remove(pair_key)
            .ok_or_else(|| FetchError::Decode(format!("missing pair key '{}'", pair_key)))?;

        Ok(Self::new(pair_key, record))
    }

    /// Encode back into the upstream wire shape.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut pairs = HashMap::with_capacity(1);
        pairs.insert(self.pair_key.as_str(), &self.record);
        serde_json::to_vec(&pairs)
    }

    pub fn pair_key(&self) -> &str {
        &self.pair_key
    }

    pub fn into_record(self) -> QuotationRecord {
        self.record
    }
}

/// Body returned to callers of the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotationResponse {
    pub bid: String,
}

impl From<&QuotationRecord> for QuotationResponse {
    fn from(record: &QuotationRecord) -> Self {
        Self {
            bid: record.bid.clone(),
        }
    }
}

/// Envelope key for a pair such as `USD-BRL` (→ `USDBRL`).
pub fn pair_key(pair: &str) -> String {
    pair.chars().filter(|c| *c != '-').collect()
}

#[cfg(test)]
pub(crate) fn sample_record() -> QuotationRecord {
    QuotationRecord {
        code: "USD".into(),
        code_in: "BRL".into(),
        name: "Dólar Americano/Real Brasileiro".into(),
        high: "5.4655".into(),
        low: "5.4127".into(),
        var_bid: "0.0187".into(),
        pct_change: "0.35".into(),
        bid: "5.43".into(),
        ask: "5.4316".into(),
        timestamp: "1718917200".into(),
        create_date: "2024-06-20 18:00:00".into(),
    }
}
