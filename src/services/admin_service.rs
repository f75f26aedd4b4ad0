use crate::audit::AuditEntry;
use crate::error::AppResult;
use crate::kv::keys;
use crate::middleware::auth::{AuthUser, ensure_admin};
use crate::response::{ApiResponse, Meta};
use crate::routes::admin::{AuditList, AuditQuery};
use crate::state::AppState;

/// Most recent audit entries, newest first. Audit keys are ordered by write
/// time, so the scan comes back oldest first and gets reversed here.
pub async fn list_audit(
    state: &AppState,
    user: &AuthUser,
    query: AuditQuery,
) -> AppResult<ApiResponse<AuditList>> {
    ensure_admin(user)?;

    let raw = state.kv.get_by_prefix(keys::AUDIT_PREFIX).await?;
    let total = raw.len() as i64;

    let mut entries = Vec::with_capacity(raw.len());
    for value in raw {
        match serde_json::from_value::<AuditEntry>(value) {
            Ok(entry) => entries.push(entry),
            Err(err) => tracing::warn!(error = %err, "skipping unreadable audit record"),
        }
    }
    entries.reverse();

    let limit = query.limit.unwrap_or(50).clamp(1, 200) as usize;
    entries.truncate(limit);

    Ok(ApiResponse::success(
        "Audit log",
        AuditList { entries },
        Some(Meta::total(total)),
    ))
}
