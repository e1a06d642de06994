//! Ready-made requests for the common school notifications.
//!
//! Each function fixes the category and copy; the `send_*` methods on
//! [`NotificationDispatcher`] are shorthands for `send_now(helper(..))`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::notification::{DispatchResult, NotificationCategory, Priority, RecipientRole};

use super::dispatcher::NotificationDispatcher;
use super::error::DispatchError;
use super::request::PushRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn announcement(
    school_id: &str,
    title: &str,
    body: &str,
    announcement_id: &str,
    role: Option<RecipientRole>,
) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Announcements)
        .title(title)
        .body(body)
        .maybe_role(role)
        .data(json!({"type": "announcement", "id": announcement_id}))
        .build()
}

pub fn assignment(
    school_id: &str,
    assignment_title: &str,
    due_date: &str,
    assignment_id: &str,
    student_ids: &[String],
) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Assignments)
        .title("New Assignment Posted")
        .body(format!("{} is due on {}", assignment_title, due_date))
        .role(RecipientRole::Student)
        .recipients(student_ids.iter().cloned())
        .data(json!({"type": "assignment", "id": assignment_id}))
        .build()
}

pub fn grade(school_id: &str, subject: &str, grade: &str, student_id: &str) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Grades)
        .title("New Grade Posted")
        .body(format!("You received {} in {}", grade, subject))
        .role(RecipientRole::Student)
        .recipients([student_id])
        .data(json!({"type": "grade", "subject": subject}))
        .build()
}

pub fn attendance(
    school_id: &str,
    student_name: &str,
    status: AttendanceStatus,
    parent_id: &str,
) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Attendance)
        .title("Attendance Update")
        .body(format!("{} was marked {} today", student_name, status))
        .role(RecipientRole::Parent)
        .recipients([parent_id])
        .data(json!({"type": "attendance", "status": status.as_str()}))
        .build()
}

pub fn event(
    school_id: &str,
    event_title: &str,
    event_date: &str,
    event_id: &str,
    role: Option<RecipientRole>,
) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Events)
        .title("Upcoming Event")
        .body(format!("{} is scheduled for {}", event_title, event_date))
        .maybe_role(role)
        .data(json!({"type": "event", "id": event_id}))
        .build()
}

pub fn message(
    school_id: &str,
    sender_name: &str,
    preview: &str,
    recipient_id: &str,
    message_id: &str,
) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Messages)
        .title(format!("Message from {}", sender_name))
        .body(preview)
        .recipients([recipient_id])
        .data(json!({"type": "message", "id": message_id}))
        .build()
}

/// Whole school, high priority, never subject to opt-out.
pub fn emergency(school_id: &str, title: &str, body: &str, emergency_id: &str) -> PushRequest {
    PushRequest::builder(school_id, NotificationCategory::Emergencies)
        .title(title)
        .body(body)
        .priority(Priority::High)
        .data(json!({"type": "emergency", "id": emergency_id}))
        .build()
}

impl NotificationDispatcher {
    pub async fn send_announcement(
        &self,
        school_id: &str,
        title: &str,
        body: &str,
        announcement_id: &str,
        role: Option<RecipientRole>,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(announcement(school_id, title, body, announcement_id, role))
            .await
    }

    pub async fn send_assignment(
        &self,
        school_id: &str,
        assignment_title: &str,
        due_date: &str,
        assignment_id: &str,
        student_ids: &[String],
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(assignment(school_id, assignment_title, due_date, assignment_id, student_ids))
            .await
    }

    pub async fn send_grade(
        &self,
        school_id: &str,
        subject: &str,
        grade_value: &str,
        student_id: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(grade(school_id, subject, grade_value, student_id)).await
    }

    pub async fn send_attendance(
        &self,
        school_id: &str,
        student_name: &str,
        status: AttendanceStatus,
        parent_id: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(attendance(school_id, student_name, status, parent_id))
            .await
    }

    pub async fn send_event(
        &self,
        school_id: &str,
        event_title: &str,
        event_date: &str,
        event_id: &str,
        role: Option<RecipientRole>,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(event(school_id, event_title, event_date, event_id, role))
            .await
    }

    pub async fn send_message(
        &self,
        school_id: &str,
        sender_name: &str,
        preview: &str,
        recipient_id: &str,
        message_id: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(message(school_id, sender_name, preview, recipient_id, message_id))
            .await
    }

    pub async fn send_emergency(
        &self,
        school_id: &str,
        title: &str,
        body: &str,
        emergency_id: &str,
    ) -> Result<DispatchResult, DispatchError> {
        self.send_now(emergency(school_id, title, body, emergency_id)).await
    }
}
