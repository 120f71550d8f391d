//! Session detection and compliance scoring
//!
//! The engine scans one day's readings for a contiguous "active" session using a
//! hysteresis rule on the rotation count, then scores the session against the
//! expected duration target. It is a pure, synchronous computation: no I/O, no
//! retained state, and it never errors — an empty or sessionless day yields the
//! zero result.
//!
//! # Ordering precondition
//!
//! [`compute_day_metrics`] assumes its input is sorted ascending by instant and
//! does not re-sort. Callers own the sort; feeding unsorted input produces
//! undefined session boundaries.

use crate::normalizer;
use crate::types::{
    AdherenceLevel, ComplianceCard, DailySummary, DayMetrics, PressureBand, Reading, SessionWindow,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Rotation count at or above which an inactive scan opens a session.
const OPEN_THRESHOLD: u32 = 2;

/// Drop from the previous reading's count that closes an active session.
const CLOSE_DROP: u32 = 2;

/// Expected session duration in minutes; a session this long scores 100.
const TARGET_DURATION_MINUTES: u32 = 120;

/// Compute the day's metrics from its readings.
///
/// `readings` must be sorted ascending by `timestamp` (see module docs). Returns
/// the zero result when no session opens.
pub fn compute_day_metrics(readings: &[Reading]) -> DayMetrics {
    let session = match detect_session(readings) {
        Some(s) => s,
        None => return DayMetrics::zero(),
    };

    let elapsed_min = (session.end - session.start).num_minutes();
    let duration_minutes = elapsed_min.max(1) as u32;
    let score = score_for_duration(duration_minutes);

    DayMetrics {
        start_clock: normalizer::clock_label(session.start),
        duration_minutes,
        duration_label: format_duration(duration_minutes),
        score,
        avg_pressure: Some(session.avg_pressure),
        session: Some(session),
    }
}

/// Hysteresis scan over a sorted day of readings.
///
/// Open: inactive and `rotation_count >= 2`. Close: active and the count dropped
/// by >= 2 from the previous reading, or hit exactly 0; the session is deemed to
/// have ended at the last reading that still showed flow. Each reopen overwrites
/// the previous window, so only the last detected (or still-open) session is
/// reported.
fn detect_session(readings: &[Reading]) -> Option<SessionWindow> {
    let mut active = false;
    let mut prev_turns: u32 = 0;
    let mut prev_instant = None;

    let mut start = None;
    let mut end = None;
    let mut pressure_sum = 0.0_f64;
    let mut active_count: u32 = 0;

    for reading in readings {
        let turns = reading.rotation_count;

        if !active {
            if turns >= OPEN_THRESHOLD {
                active = true;
                start = Some(reading.timestamp);
                end = Some(reading.timestamp);
                pressure_sum = reading.pressure;
                active_count = 1;
            }
        } else {
            let dropped = prev_turns >= turns + CLOSE_DROP;
            if dropped || turns == 0 {
                active = false;
                end = prev_instant;
            } else {
                end = Some(reading.timestamp);
                pressure_sum += reading.pressure;
                active_count += 1;
            }
        }

        prev_turns = turns;
        prev_instant = Some(reading.timestamp);
    }

    let (start, end) = (start?, end?);
    let avg_pressure = (pressure_sum / active_count as f64).floor() as i64;

    Some(SessionWindow {
        start,
        end,
        active_readings: active_count,
        avg_pressure,
    })
}

/// Linear score against the duration target, floored at the final conversion.
fn score_for_duration(duration_minutes: u32) -> u8 {
    let scaled = duration_minutes as u64 * 100 / TARGET_DURATION_MINUTES as u64;
    scaled.min(100) as u8
}

/// Human-readable duration label ("2h 5m", "45m", "0m").
pub fn format_duration(minutes: u32) -> String {
    if minutes >= 60 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}

/// Group readings into per-day buckets by corrected civil date.
pub fn group_by_day(readings: &[Reading]) -> BTreeMap<NaiveDate, Vec<Reading>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Reading>> = BTreeMap::new();
    for reading in readings {
        grouped
            .entry(normalizer::bucket_date(reading.timestamp))
            .or_default()
            .push(reading.clone());
    }
    grouped
}

/// Daily stats derived from one device's history.
#[derive(Debug, Clone)]
pub struct DailyStats {
    /// Compliance card for the reference day
    pub today: ComplianceCard,
    /// Recent day summaries, most recent first
    pub recent: Vec<DailySummary>,
}

/// Bucket a device's readings by day and compute per-day metrics.
///
/// The reference day is an explicit parameter so callers and tests can pin it.
/// Each bucket is sorted ascending before the scan. `history_days` bounds the
/// recent-summary list (the reference day is included when present).
pub fn process_daily_stats(
    readings: &[Reading],
    today: NaiveDate,
    history_days: usize,
) -> DailyStats {
    let mut grouped = group_by_day(readings);
    for bucket in grouped.values_mut() {
        bucket.sort_by_key(|r| r.timestamp);
    }

    let today_metrics = grouped
        .get(&today)
        .map(|bucket| compute_day_metrics(bucket))
        .unwrap_or_else(DayMetrics::zero);
    let today_card = card_for(today_metrics);

    let recent = grouped
        .iter()
        .rev()
        .take(history_days)
        .map(|(date, bucket)| {
            let metrics = compute_day_metrics(bucket);
            let pressure_band = PressureBand::from_value(metrics.avg_pressure.unwrap_or(0) as f64);
            DailySummary {
                date: *date,
                metrics,
                pressure_band,
            }
        })
        .collect();

    DailyStats {
        today: today_card,
        recent,
    }
}

fn card_for(metrics: DayMetrics) -> ComplianceCard {
    ComplianceCard {
        adherence: AdherenceLevel::from_score(metrics.score),
        pressure_band: PressureBand::from_value(metrics.avg_pressure.unwrap_or(0) as f64),
        metrics,
    }
}
