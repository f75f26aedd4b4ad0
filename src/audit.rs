use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;
use crate::kv::{self, KvStore, keys};

/// One administrative action, stored under a timestamp-ordered key so the
/// admin listing can return newest entries with a plain prefix scan.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Email of the acting user, when the action happened inside a session.
    pub actor: Option<String>,
    pub action: String,
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
    pub at: DateTime<Utc>,
}

pub async fn log_audit(
    kv: &dyn KvStore,
    actor: Option<&str>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let at = Utc::now();
    let entry = AuditEntry {
        id: Uuid::new_v4(),
        actor: actor.map(str::to_string),
        action: action.to_string(),
        resource: resource.map(str::to_string),
        metadata,
        at,
    };

    kv::set_as(kv, &keys::audit(at.timestamp_millis(), entry.id), &entry).await?;

    Ok(())
}
