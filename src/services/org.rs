//! Organization settings and billing gate, consumed but not computed here.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MemberSettings {
    pub member_id: Uuid,
    pub organization_id: Uuid,
    pub timezone: String,
    pub default_language: String,
    /// Billing gate for adaptive generation.
    pub ai_enabled: bool,
}

#[async_trait]
pub trait OrgDirectory: Send + Sync {
    async fn member_settings(&self, member_id: Uuid) -> Result<Option<MemberSettings>>;
    async fn organization_language(&self, organization_id: Uuid) -> Result<Option<String>>;
}
