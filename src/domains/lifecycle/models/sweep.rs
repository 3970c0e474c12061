use std::fmt;

use serde::{Deserialize, Serialize};

/// Sweep 종류
/// Kind of lifecycle sweep; the scheduler keeps one in-flight slot per kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    CleanUpUnverifiedUsers,
    ReminderToConfirmAccount,
    DetectAndNotifyInactiveUsers,
    CleanupUsersMarkedForDeletion,
}

impl SweepKind {
    pub const ALL: [SweepKind; 4] = [
        SweepKind::CleanUpUnverifiedUsers,
        SweepKind::ReminderToConfirmAccount,
        SweepKind::DetectAndNotifyInactiveUsers,
        SweepKind::CleanupUsersMarkedForDeletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SweepKind::CleanUpUnverifiedUsers => "clean_up_unverified_users",
            SweepKind::ReminderToConfirmAccount => "reminder_to_confirm_account",
            SweepKind::DetectAndNotifyInactiveUsers => "detect_and_notify_inactive_users",
            SweepKind::CleanupUsersMarkedForDeletion => "cleanup_users_marked_for_deletion",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 인스턴스 하나에 대한 sweep 결과
/// Per-instance outcome of one sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// 처리 완료된 사용자 / 행 수
    /// Users (or rows) fully handled
    pub processed: u64,
    /// 실패 후 건너뛴 사용자 수
    /// Users skipped after a failed step
    pub failed: u64,
}

impl SweepReport {
    pub fn merge(&mut self, other: SweepReport) {
        self.processed += other.processed;
        self.failed += other.failed;
    }
}
