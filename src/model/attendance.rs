use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    HalfDay,
}

impl AttendanceStatus {
    /// Status given to a fresh check-in: late once `late_after` has passed.
    pub fn on_check_in(check_in: NaiveTime, late_after: NaiveTime) -> Self {
        if check_in > late_after {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }

    /// Status after checking out. A span shorter than `half_day` downgrades
    /// the record to a half day; otherwise the check-in status is kept.
    pub fn on_check_out(
        self,
        check_in: NaiveTime,
        check_out: NaiveTime,
        half_day: TimeDelta,
    ) -> Self {
        if check_out.signed_duration_since(check_in) < half_day {
            AttendanceStatus::HalfDay
        } else {
            self
        }
    }

    /// Whether the employee showed up at all.
    pub fn counts_as_present(self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "17:30:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}

/// Explicit attendance entry recorded by an admin.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(example = 3)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "10:30:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    #[schema(example = "Traffic delay", nullable = true)]
    pub notes: Option<String>,
}
