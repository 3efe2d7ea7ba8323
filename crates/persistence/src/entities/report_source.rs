//! Read-model rows consumed by the report engine.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::ReportRecord;
use serde_json::{json, Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSourceEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub status: String,
    pub plan: String,
    pub revenue: f64,
    pub credits: f64,
    pub created_at: DateTime<Utc>,
}

impl From<UserSourceEntity> for ReportRecord {
    fn from(entity: UserSourceEntity) -> Self {
        Self {
            id: Some(entity.id.to_string()),
            name: Some(entity.name),
            created_at: Some(entity.created_at),
            status: Some(entity.status),
            plan: Some(entity.plan),
            revenue: Some(entity.revenue),
            credits: Some(entity.credits),
            extra: extra([("email", json!(entity.email))]),
            ..Default::default()
        }
    }
}

/// Database row mapping for the financial_entries table.
#[derive(Debug, Clone, FromRow)]
pub struct FinancialEntryEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub description: String,
    pub entry_type: String,
    pub status: String,
    pub plan: Option<String>,
    pub revenue: f64,
    pub entry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<FinancialEntryEntity> for ReportRecord {
    fn from(entity: FinancialEntryEntity) -> Self {
        Self {
            id: Some(entity.id.to_string()),
            name: Some(entity.description),
            date: Some(entity.entry_date),
            created_at: Some(entity.created_at),
            status: Some(entity.status),
            plan: entity.plan,
            revenue: Some(entity.revenue),
            kind: Some(entity.entry_type),
            extra: extra([("userId", json!(entity.user_id))]),
            ..Default::default()
        }
    }
}

/// Database row mapping for the activity_logs table.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityLogEntity {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<ActivityLogEntity> for ReportRecord {
    fn from(entity: ActivityLogEntity) -> Self {
        Self {
            id: Some(entity.id.to_string()),
            name: entity.description,
            date: Some(entity.occurred_at),
            kind: Some(entity.action),
            extra: extra([("userId", json!(entity.user_id))]),
            ..Default::default()
        }
    }
}

/// Database row mapping for the analytics_snapshots table.
#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsSnapshotEntity {
    pub id: Uuid,
    pub snapshot_date: NaiveDate,
    pub metric: String,
    pub value: f64,
    pub credits_used: f64,
    pub created_at: DateTime<Utc>,
}

impl From<AnalyticsSnapshotEntity> for ReportRecord {
    fn from(entity: AnalyticsSnapshotEntity) -> Self {
        let date = entity
            .snapshot_date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc());
        Self {
            id: Some(entity.id.to_string()),
            name: Some(entity.metric.clone()),
            date,
            created_at: Some(entity.created_at),
            credits: Some(entity.credits_used),
            kind: Some(entity.metric),
            extra: extra([("value", json!(entity.value))]),
            ..Default::default()
        }
    }
}

fn extra<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
