use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::db::DbConn;
use crate::error::Result;
use crate::middleware::ClientMeta;
use crate::models::audit_log::{self, AuditAction, ResourceType};
use crate::models::user;

/// Audit service for logging account, registry and borrowing events
#[derive(Clone)]
pub struct AuditService {
    db: DbConn,
}

impl AuditService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Log an audit event
    #[allow(clippy::too_many_arguments)]
    pub async fn log(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
        client: &ClientMeta,
        success: bool,
        error_message: Option<String>,
    ) -> Result<()> {
        let log_entry = audit_log::ActiveModel {
            timestamp: Set(chrono::Utc::now()),
            user_id: Set(actor.map(|u| u.id)),
            username: Set(actor.map(|u| u.username.clone())),
            action: Set(action.to_string()),
            resource_type: Set(resource_type.to_string()),
            resource_id: Set(resource_id),
            details: Set(details.map(|d| d.to_string())),
            ip_address: Set(client.ip_address.clone()),
            user_agent: Set(client.user_agent.clone()),
            success: Set(success),
            error_message: Set(error_message),
            ..Default::default()
        };

        log_entry.insert(&self.db).await?;
        Ok(())
    }

    /// Log a successful action. Failures to write are logged and ignored.
    pub async fn log_success(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
        client: &ClientMeta,
    ) {
        if let Err(e) = self
            .log(action, resource_type, resource_id, actor, details, client, true, None)
            .await
        {
            tracing::warn!("Failed to write audit event {}: {}", action, e);
        }
    }

    /// Log a failed action. Failures to write are logged and ignored.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_failure(
        &self,
        action: AuditAction,
        resource_type: ResourceType,
        resource_id: Option<String>,
        actor: Option<&user::Model>,
        details: Option<serde_json::Value>,
        client: &ClientMeta,
        error: &str,
    ) {
        if let Err(e) = self
            .log(
                action,
                resource_type,
                resource_id,
                actor,
                details,
                client,
                false,
                Some(error.to_string()),
            )
            .await
        {
            tracing::warn!("Failed to write audit event {}: {}", action, e);
        }
    }
}

/// Query parameters for fetching audit logs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub resource_type: Option<String>,
    pub success: Option<bool>,
}

/// Paginated audit log response
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogResponse {
    pub logs: Vec<audit_log::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

/// Get audit logs with filtering and pagination
pub async fn get_audit_logs(db: &DbConn, query: AuditLogQuery) -> Result<AuditLogResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(50).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let mut select = audit_log::Entity::find();

    if let Some(user_id) = query.user_id {
        select = select.filter(audit_log::Column::UserId.eq(user_id));
    }

    if let Some(action) = &query.action {
        select = select.filter(audit_log::Column::Action.eq(action.clone()));
    }

    if let Some(resource_type) = &query.resource_type {
        select = select.filter(audit_log::Column::ResourceType.eq(resource_type.clone()));
    }

    if let Some(success) = query.success {
        select = select.filter(audit_log::Column::Success.eq(success));
    }

    let total = select.clone().count(db).await?;

    let logs = select
        .order_by_desc(audit_log::Column::Timestamp)
        .order_by_desc(audit_log::Column::Id)
        .offset(offset)
        .limit(per_page)
        .all(db)
        .await?;

    let total_pages = total.div_ceil(per_page);

    Ok(AuditLogResponse {
        logs,
        total,
        page,
        per_page,
        total_pages,
    })
}
