//! Report source repository: PostgreSQL read models for data collection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::{DateRange, ReportRecord, ReportType};
use domain::services::{CollectError, DataCollector};
use sqlx::PgPool;

use crate::entities::{
    ActivityLogEntity, AnalyticsSnapshotEntity, FinancialEntryEntity, UserSourceEntity,
};
use crate::metrics::QueryTimer;

/// Repository reading raw report records from PostgreSQL.
#[derive(Clone)]
pub struct ReportSourceRepository {
    pool: PgPool,
}

impl ReportSourceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Users registered within the range.
    pub async fn fetch_users(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserSourceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("report_source_users");
        let result = sqlx::query_as::<_, UserSourceEntity>(
            r#"
            SELECT id, name, email, status, plan, revenue, credits, created_at
            FROM users
            WHERE created_at >= $1 AND created_at <= $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Financial entries dated within the range.
    pub async fn fetch_financial_entries(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<FinancialEntryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("report_source_financial");
        let result = sqlx::query_as::<_, FinancialEntryEntity>(
            r#"
            SELECT id, user_id, description, entry_type, status, plan, revenue, entry_date, created_at
            FROM financial_entries
            WHERE entry_date >= $1 AND entry_date <= $2
            ORDER BY entry_date ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Activity log entries within the range.
    pub async fn fetch_activity_logs(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ActivityLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("report_source_activity");
        let result = sqlx::query_as::<_, ActivityLogEntity>(
            r#"
            SELECT id, user_id, action, description, occurred_at
            FROM activity_logs
            WHERE occurred_at >= $1 AND occurred_at <= $2
            ORDER BY occurred_at ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Analytics snapshots whose day falls within the range.
    pub async fn fetch_analytics_snapshots(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AnalyticsSnapshotEntity>, sqlx::Error> {
        let timer = QueryTimer::new("report_source_analytics");
        let result = sqlx::query_as::<_, AnalyticsSnapshotEntity>(
            r#"
            SELECT id, snapshot_date, metric, value, credits_used, created_at
            FROM analytics_snapshots
            WHERE snapshot_date >= $1 AND snapshot_date <= $2
            ORDER BY snapshot_date ASC
            "#,
        )
        .bind(from.date_naive())
        .bind(to.date_naive())
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    async fn collect_type(
        &self,
        report_type: ReportType,
        range: &DateRange,
    ) -> Result<Vec<ReportRecord>, sqlx::Error> {
        let (from, to) = (range.from, range.to);
        let records = match report_type {
            ReportType::Users => into_records(self.fetch_users(from, to).await?),
            ReportType::Financial => into_records(self.fetch_financial_entries(from, to).await?),
            ReportType::Activity => into_records(self.fetch_activity_logs(from, to).await?),
            ReportType::Analytics => into_records(self.fetch_analytics_snapshots(from, to).await?),
            ReportType::Custom => {
                let mut records = into_records(self.fetch_users(from, to).await?);
                records.extend(into_records(self.fetch_financial_entries(from, to).await?));
                records.extend(into_records(self.fetch_activity_logs(from, to).await?));
                records.extend(into_records(self.fetch_analytics_snapshots(from, to).await?));
                records
            }
        };
        Ok(records)
    }
}

fn into_records<E: Into<ReportRecord>>(rows: Vec<E>) -> Vec<ReportRecord> {
    rows.into_iter().map(Into::into).collect()
}

#[async_trait]
impl DataCollector for ReportSourceRepository {
    async fn collect(
        &self,
        report_type: ReportType,
        range: &DateRange,
    ) -> Result<Vec<ReportRecord>, CollectError> {
        self.collect_type(report_type, range).await.map_err(|e| {
            tracing::error!(report_type = %report_type, error = %e, "Report source query failed");
            CollectError::Unavailable(e.to_string())
        })
    }
}
