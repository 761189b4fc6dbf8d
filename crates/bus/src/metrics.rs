// -------------------------------------------------------------------------------------------------
//  Copyright (c) 2024 Berberis Contributors
//  Licensed under the MIT License. See LICENSE in the project root for details.
// -------------------------------------------------------------------------------------------------

//! Metrics snapshot DTOs (spec §6 "External Interfaces", `MetricsToJson`).
//!
//! The JSON exporter itself is a named external collaborator, out of scope
//! for this crate to implement (spec §1). What the exporter needs is a
//! stable, serializable data contract to read from — that contract lives
//! here: one struct per row of spec §6's field-name table, each field
//! `#[serde(rename = "...")]`-tagged with its canonical name, plus a
//! sibling "mnemonic mode" serialization using the short aliases from the
//! same table. Float NaN/Infinity→null handling and the
//! `dd/MM/yyyy HH:mm:ss.fff` timestamp format are free functions here too,
//! since they are meaningful, independently testable behaviour even though
//! no exporter binary ships in this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rounds `value` to `precision` decimal digits, serializing non-finite
/// values (`NaN`, `+-Infinity`) as JSON `null` (spec §6).
#[must_use]
pub fn round_for_json(value: f64, precision: u32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let factor = 10f64.powi(precision as i32);
    Some((value * factor).round() / factor)
}

/// Formats `ts` using the exporter's fixed `dd/MM/yyyy HH:mm:ss.fff` layout
/// (spec §6 "Timestamp format used by the JSON exporter").
#[must_use]
pub fn format_exporter_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%d/%m/%Y %H:%M:%S%.3f").to_string()
}

/// Rounding precision for a `MetricsReport` (spec §6: "rate fields to 2
/// decimals, others to 6" by default).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundingPrecision {
    /// Decimal places for rate fields (publish/dequeue/process rate).
    pub rate_digits: u32,
    /// Decimal places for every other float field.
    pub other_digits: u32,
}

impl Default for RoundingPrecision {
    fn default() -> Self {
        Self {
            rate_digits: 2,
            other_digits: 6,
        }
    }
}

/// One channel's metrics row (spec §6 field table, `Channel`/`Ch`
/// prefix group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMetrics {
    /// Canonical `Channel` / mnemonic `Ch`.
    #[serde(rename = "Channel")]
    pub channel: String,
    /// Canonical `MessageBodyType` / mnemonic `Tp`.
    #[serde(rename = "MessageBodyType")]
    pub message_body_type: String,
    /// Canonical `LastPublishedBy` / mnemonic `PubBy`.
    #[serde(rename = "LastPublishedBy")]
    pub last_published_by: Option<String>,
    /// Canonical `LastPublishedAt` / mnemonic `PubAt`, formatted per
    /// [`format_exporter_timestamp`].
    #[serde(rename = "LastPublishedAt")]
    pub last_published_at: Option<String>,
    /// Canonical `IntervalMs` / mnemonic `InMs`.
    #[serde(rename = "IntervalMs")]
    pub interval_ms: Option<f64>,
    /// Canonical `PublishRate` / mnemonic `Rt`.
    #[serde(rename = "PublishRate")]
    pub publish_rate: Option<f64>,
    /// Canonical `TotalMessages` / mnemonic `TMsg`.
    #[serde(rename = "TotalMessages")]
    pub total_messages: u64,
    /// Canonical `StoredMessageCount` / mnemonic `StCnt`.
    #[serde(rename = "StoredMessageCount")]
    pub stored_message_count: usize,
}

/// One subscription's metrics row (spec §6 field table, subscription
/// group).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionMetrics {
    /// Canonical `Name` / mnemonic `Nm`.
    #[serde(rename = "Name")]
    pub name: String,
    /// Canonical `SubscribedAt` / mnemonic `SubAt`.
    #[serde(rename = "SubscribedAt")]
    pub subscribed_at: String,
    /// Canonical `ConflationInterval` / mnemonic `CfIn`, milliseconds.
    #[serde(rename = "ConflationInterval")]
    pub conflation_interval_ms: u64,
    /// Canonical `Expression` / mnemonic `Exp` — the channel name or
    /// wildcard pattern this subscription targets.
    #[serde(rename = "Expression")]
    pub expression: String,
    /// Canonical `ConflationRatio` / mnemonic `CfRat`.
    #[serde(rename = "ConflationRatio")]
    pub conflation_ratio: Option<f64>,
    /// Canonical `LatencyToResponseTimeRatio` / mnemonic `LatRsp`.
    #[serde(rename = "LatencyToResponseTimeRatio")]
    pub latency_to_response_time_ratio: Option<f64>,
    /// Canonical `DequeueRate` / mnemonic `DqRt`.
    #[serde(rename = "DequeueRate")]
    pub dequeue_rate: Option<f64>,
    /// Canonical `ProcessRate` / mnemonic `PcRt`.
    #[serde(rename = "ProcessRate")]
    pub process_rate: Option<f64>,
    /// Canonical `EstimatedAvgActiveMessages` / mnemonic `EstAvgAMsg`.
    #[serde(rename = "EstimatedAvgActiveMessages")]
    pub estimated_avg_active_messages: Option<f64>,
    /// Canonical `TotalEnqueuedMessages` / mnemonic `TEqMsg`.
    #[serde(rename = "TotalEnqueuedMessages")]
    pub total_enqueued_messages: u64,
    /// Canonical `TotalDequeuedMessages` / mnemonic `TDqMsg`.
    #[serde(rename = "TotalDequeuedMessages")]
    pub total_dequeued_messages: u64,
    /// Canonical `TotalProcessedMessages` / mnemonic `TPcMsg`.
    #[serde(rename = "TotalProcessedMessages")]
    pub total_processed_messages: u64,
    /// Canonical `QueueLength` / mnemonic `QLn`.
    #[serde(rename = "QueueLength")]
    pub queue_length: u64,
    /// Canonical `AvgLatencyTimeMs` / mnemonic `AvgLat`.
    #[serde(rename = "AvgLatencyTimeMs")]
    pub avg_latency_time_ms: Option<f64>,
    /// Canonical `MinLatencyTimeMs` / mnemonic `MinLat`.
    #[serde(rename = "MinLatencyTimeMs")]
    pub min_latency_time_ms: Option<f64>,
    /// Canonical `MaxLatencyTimeMs` / mnemonic `MaxLat`.
    #[serde(rename = "MaxLatencyTimeMs")]
    pub max_latency_time_ms: Option<f64>,
    /// Canonical `AvgServiceTimeMs` / mnemonic `AvgSvc`.
    #[serde(rename = "AvgServiceTimeMs")]
    pub avg_service_time_ms: Option<f64>,
    /// Canonical `MinServiceTimeMs` / mnemonic `MinSvc`.
    #[serde(rename = "MinServiceTimeMs")]
    pub min_service_time_ms: Option<f64>,
    /// Canonical `MaxServiceTimeMs` / mnemonic `MaxSvc`.
    #[serde(rename = "MaxServiceTimeMs")]
    pub max_service_time_ms: Option<f64>,
    /// Canonical `AvgResponseTimeMs` / mnemonic `AvgRsp`.
    #[serde(rename = "AvgResponseTimeMs")]
    pub avg_response_time_ms: Option<f64>,
    /// Canonical `StatsPercentile` / mnemonic `StPct`.
    #[serde(rename = "StatsPercentile")]
    pub stats_percentile: f64,
    /// Canonical `PctLatencyTimeMs` / mnemonic `PctLat`.
    #[serde(rename = "PctLatencyTimeMs")]
    pub pct_latency_time_ms: Option<f64>,
    /// Canonical `PctServiceTimeMs` / mnemonic `PctSvc`.
    #[serde(rename = "PctServiceTimeMs")]
    pub pct_service_time_ms: Option<f64>,
}

/// The top-level report shape (spec §6: "a top-level object with arrays
/// `channels` (or `Chs`) and `subscriptions` (or `Sbs`)").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    /// Canonical `channels` / mnemonic `Chs`.
    #[serde(rename = "channels")]
    pub channels: Vec<ChannelMetrics>,
    /// Canonical `subscriptions` / mnemonic `Sbs`.
    #[serde(rename = "subscriptions")]
    pub subscriptions: Vec<SubscriptionMetrics>,
}

impl MetricsReport {
    /// Serializes this report using the canonical (verbatim) field names.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (infallible for this type in
    /// practice, but the signature stays honest about `serde_json`'s API).
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Serializes this report using the mnemonic (short-alias) field names
    /// from spec §6 (`Chs`/`Sbs` top level, `Ch`/`Tp`/`PubBy`/... per row).
    #[must_use]
    pub fn to_mnemonic_json(&self) -> serde_json::Value {
        let chs: Vec<serde_json::Value> = self
            .channels
            .iter()
            .map(|c| {
                serde_json::json!({
                    "Ch": c.channel,
                    "Tp": c.message_body_type,
                    "PubBy": c.last_published_by,
                    "PubAt": c.last_published_at,
                    "InMs": c.interval_ms,
                    "Rt": c.publish_rate,
                    "TMsg": c.total_messages,
                    "StCnt": c.stored_message_count,
                })
            })
            .collect();
        let sbs: Vec<serde_json::Value> = self
            .subscriptions
            .iter()
            .map(|s| {
                serde_json::json!({
                    "Nm": s.name,
                    "SubAt": s.subscribed_at,
                    "CfIn": s.conflation_interval_ms,
                    "Exp": s.expression,
                    "CfRat": s.conflation_ratio,
                    "LatRsp": s.latency_to_response_time_ratio,
                    "DqRt": s.dequeue_rate,
                    "PcRt": s.process_rate,
                    "EstAvgAMsg": s.estimated_avg_active_messages,
                    "TEqMsg": s.total_enqueued_messages,
                    "TDqMsg": s.total_dequeued_messages,
                    "TPcMsg": s.total_processed_messages,
                    "QLn": s.queue_length,
                    "AvgLat": s.avg_latency_time_ms,
                    "MinLat": s.min_latency_time_ms,
                    "MaxLat": s.max_latency_time_ms,
                    "AvgSvc": s.avg_service_time_ms,
                    "MinSvc": s.min_service_time_ms,
                    "MaxSvc": s.max_service_time_ms,
                    "AvgRsp": s.avg_response_time_ms,
                    "StPct": s.stats_percentile,
                    "PctLat": s.pct_latency_time_ms,
                    "PctSvc": s.pct_service_time_ms,
                })
            })
            .collect();
        serde_json::json!({ "Chs": chs, "Sbs": sbs })
    }
}
