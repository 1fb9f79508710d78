//! Lost-revenue estimate shown next to the demo.

use std::ops::RangeInclusive;

/// Share of missed calls assumed to have become paid work.
pub const WIN_RATE: f64 = 0.25;
pub const WORKING_WEEKS: u32 = 50;
pub const JOB_VALUE_RANGE: RangeInclusive<u32> = 50..=1000;
pub const MISSED_CALLS_RANGE: RangeInclusive<u32> = 1..=50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueEstimate {
    pub weekly: u32,
    pub yearly: u32,
}

impl RevenueEstimate {
    /// Inputs are clamped to the slider ranges.
    pub fn compute(avg_job_value: u32, missed_calls_per_week: u32) -> Self {
        let value = avg_job_value.clamp(*JOB_VALUE_RANGE.start(), *JOB_VALUE_RANGE.end());
        let calls =
            missed_calls_per_week.clamp(*MISSED_CALLS_RANGE.start(), *MISSED_CALLS_RANGE.end());
        let weekly = (value as f64 * calls as f64 * WIN_RATE).round() as u32;
        Self {
            weekly,
            yearly: weekly * WORKING_WEEKS,
        }
    }
}
