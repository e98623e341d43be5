use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Vacation,
    Personal,
    Emergency,
}

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveDecision {
    Approve,
    Reject,
}

impl LeaveDecision {
    pub fn target(self) -> LeaveStatus {
        match self {
            LeaveDecision::Approve => LeaveStatus::Approved,
            LeaveDecision::Reject => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Display, PartialEq, Eq)]
#[display(fmt = "leave request is already {}", _0)]
pub struct AlreadyDecided(pub LeaveStatus);

impl LeaveStatus {
    /// pending -> approved | rejected. Decided requests never move again.
    pub fn decide(self, decision: LeaveDecision) -> Result<LeaveStatus, AlreadyDecided> {
        match self {
            LeaveStatus::Pending => Ok(decision.target()),
            decided => Err(AlreadyDecided(decided)),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-12-20", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-12-27", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "Family vacation for the holidays")]
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(nullable = true)]
    pub admin_notes: Option<String>,
    #[schema(example = "2026-11-25T10:00:00Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Inclusive number of calendar days covered.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
}

impl LeaveQuery {
    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| leave.employee_id == id)
            && self.status.is_none_or(|s| leave.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_to_the_decided_state() {
        assert_eq!(
            LeaveStatus::Pending.decide(LeaveDecision::Approve),
            Ok(LeaveStatus::Approved)
        );
        assert_eq!(
            LeaveStatus::Pending.decide(LeaveDecision::Reject),
            Ok(LeaveStatus::Rejected)
        );
    }

    #[test]
    fn decided_requests_are_final() {
        for decided in [LeaveStatus::Approved, LeaveStatus::Rejected] {
            for decision in [LeaveDecision::Approve, LeaveDecision::Reject] {
                assert_eq!(decided.decide(decision), Err(AlreadyDecided(decided)));
            }
        }
    }

    #[test]
    fn day_count_is_inclusive() {
        let leave = LeaveRequest {
            id: 1,
            employee_id: 1,
            leave_type: LeaveType::Vacation,
            start_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 27).unwrap(),
            reason: "holidays".into(),
            status: LeaveStatus::Pending,
            admin_notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(leave.days(), 8);

        let single = LeaveRequest {
            end_date: leave.start_date,
            ..leave
        };
        assert_eq!(single.days(), 1);
    }
}
