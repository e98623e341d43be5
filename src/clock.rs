use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

/// Wall clock used for attendance and page dates. Local server time unless
/// pinned to a fixed instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(NaiveDateTime),
}

impl Clock {
    /// Current local time, to the second.
    pub fn now(&self) -> NaiveDateTime {
        let now = match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(at) => *at,
        };
        now.with_nanosecond(0).unwrap_or(now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_never_moves() {
        let at = NaiveDate::from_ymd_opt(2026, 3, 4)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 750)
            .unwrap();
        let clock = Clock::Fixed(at);

        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().nanosecond(), 0);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 4).unwrap());
    }

    #[test]
    fn system_clock_drops_sub_seconds() {
        assert_eq!(Clock::System.now().nanosecond(), 0);
    }
}
