use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

use crate::error::{AppError, Result};
use crate::models::Settings;

/// Daily window in which crawl tasks are handed out. When `end` is earlier
/// than `start` the window wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    start: NaiveTime,
    end: NaiveTime,
}

impl WorkingHours {
    /// `Ok(None)` when either bound is unset, which means "always open".
    pub fn from_bounds(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(None);
        };

        Ok(Some(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        }))
    }

    pub fn permits(&self, now: NaiveTime) -> bool {
        if self.end < self.start {
            now > self.start || now < self.end
        } else {
            self.start < now && now < self.end
        }
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| AppError::WorkingHours(format!("{value:?}: {e}")))
}

/// Whether crawling is allowed at `now`, read in the reference time zone.
/// A malformed window is logged and treated as open.
pub fn crawl_permitted(settings: &Settings, now: DateTime<Utc>, zone: FixedOffset) -> bool {
    match WorkingHours::from_bounds(settings.start_time(), settings.end_time()) {
        Ok(Some(window)) => window.permits(now.with_timezone(&zone).time()),
        Ok(None) => true,
        Err(e) => {
            tracing::warn!("ignoring crawler working hours: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(start: &str, end: &str) -> WorkingHours {
        WorkingHours::from_bounds(Some(start), Some(end)).unwrap().unwrap()
    }

    #[test]
    fn wrapped_window_spans_midnight() {
        let w = window("22:00", "02:00");
        assert!(w.permits(at(23, 30)));
        assert!(w.permits(at(1, 15)));
        assert!(!w.permits(at(10, 0)));
    }

    #[test]
    fn plain_window_is_exclusive_at_both_ends() {
        let w = window("09:00", "18:00");
        assert!(w.permits(at(12, 0)));
        assert!(!w.permits(at(9, 0)));
        assert!(!w.permits(at(18, 0)));
        assert!(!w.permits(at(20, 0)));
    }

    #[test]
    fn missing_bound_means_always_open() {
        assert_eq!(WorkingHours::from_bounds(Some("09:00"), None).unwrap(), None);
        assert_eq!(WorkingHours::from_bounds(None, None).unwrap(), None);

        let settings = Settings::default();
        assert!(crawl_permitted(&settings, Utc::now(), FixedOffset::east_opt(0).unwrap()));
    }

    #[test]
    fn malformed_bound_is_reported_and_fails_open() {
        assert!(matches!(
            WorkingHours::from_bounds(Some("25:99"), Some("02:00")),
            Err(AppError::WorkingHours(_))
        ));

        let settings = Settings {
            crawler_start_time: "late".to_string(),
            crawler_end_time: "02:00".to_string(),
            ..Settings::default()
        };
        assert!(crawl_permitted(&settings, Utc::now(), FixedOffset::east_opt(0).unwrap()));
    }

    #[test]
    fn gate_reads_the_clock_in_the_reference_zone() {
        let settings = Settings {
            crawler_start_time: "22:00".to_string(),
            crawler_end_time: "02:00".to_string(),
            ..Settings::default()
        };
        // 15:30 UTC is 23:30 at +08:00
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 15, 30, 0).unwrap();
        assert!(crawl_permitted(&settings, now, FixedOffset::east_opt(8 * 3600).unwrap()));
        assert!(!crawl_permitted(&settings, now, FixedOffset::east_opt(0).unwrap()));
    }
}
