use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Offset used for `upload_date` unless configured otherwise (UTC+6, Dhaka).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 6;

/// Source of "now" for new history records.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock pinned to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Returns `None` when the offset is outside ±23 hours.
    pub fn with_offset_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(Self::new)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
            .unwrap_or_else(|| Self::new(Utc.fix()))
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_is_utc_plus_six() {
        let now = SystemClock::default().now();
        assert_eq!(now.offset().local_minus_utc(), 6 * 3600);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(SystemClock::with_offset_hours(30).is_none());
        assert!(SystemClock::with_offset_hours(-5).is_some());
    }
}
