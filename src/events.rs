use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::types::ActivityId;

/// kinds of audit records the fund keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    LoanCreated,
    PaymentMade,
    LoanLiquidated,
    MemberAdded,
    MeetingCreated,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivityType::LoanCreated => "loan_created",
            ActivityType::PaymentMade => "payment_made",
            ActivityType::LoanLiquidated => "loan_liquidated",
            ActivityType::MemberAdded => "member_added",
            ActivityType::MeetingCreated => "meeting_created",
        };
        write!(f, "{}", name)
    }
}

/// entity an activity refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Loan,
    Member,
    Meeting,
}

/// append-only audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub description: String,
    pub entity_id: Option<Uuid>,
    pub entity_type: Option<EntityType>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    pub fn new(
        activity_type: ActivityType,
        description: impl Into<String>,
        entity_id: Uuid,
        entity_type: EntityType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_type,
            description: description.into(),
            entity_id: Some(entity_id),
            entity_type: Some(entity_type),
            created_at,
        }
    }
}

/// accepts audit records; records are never changed once recorded
pub trait ActivitySink {
    fn record(&mut self, activity: Activity);
}

/// collects activities during an operation before they are committed
#[derive(Debug, Default)]
pub struct PendingActivities {
    activities: Vec<Activity>,
}

impl PendingActivities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    /// hand everything over to a sink, leaving this buffer empty
    pub fn flush_into(&mut self, sink: &mut dyn ActivitySink) {
        for activity in std::mem::take(&mut self.activities) {
            sink.record(activity);
        }
    }
}

impl ActivitySink for PendingActivities {
    fn record(&mut self, activity: Activity) {
        self.activities.push(activity);
    }
}

/// the fund's activity history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityLog {
    entries: Vec<Activity>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// all entries, oldest first
    pub fn entries(&self) -> &[Activity] {
        &self.entries
    }

    /// newest first, at most `limit`
    pub fn recent(&self, limit: usize) -> Vec<&Activity> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn of_type(&self, activity_type: ActivityType) -> Vec<&Activity> {
        self.entries
            .iter()
            .filter(|a| a.activity_type == activity_type)
            .collect()
    }

    /// every entry that mentions an entity
    pub fn for_entity(&self, entity_id: Uuid) -> Vec<&Activity> {
        self.entries
            .iter()
            .filter(|a| a.entity_id == Some(entity_id))
            .collect()
    }

    /// case-insensitive match on description or type name, newest first
    pub fn search(&self, text: &str) -> Vec<&Activity> {
        let needle = text.to_lowercase();
        self.entries
            .iter()
            .rev()
            .filter(|a| {
                a.description.to_lowercase().contains(&needle)
                    || a.activity_type.to_string().contains(&needle)
            })
            .collect()
    }

    pub fn counts_by_type(&self) -> BTreeMap<ActivityType, usize> {
        let mut counts = BTreeMap::new();
        for activity in &self.entries {
            *counts.entry(activity.activity_type).or_insert(0) += 1;
        }
        counts
    }
}

impl ActivitySink for ActivityLog {
    fn record(&mut self, activity: Activity) {
        tracing::debug!(
            activity = %activity.activity_type,
            entity = ?activity.entity_id,
            "activity recorded"
        );
        self.entries.push(activity);
    }
}
