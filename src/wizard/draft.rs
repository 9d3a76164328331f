use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::form::{FieldErrors, FormData};
use crate::cache::ExpiringCache;
use crate::context::AppContext;

/// In-flight wizard state mirrored into local storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportDraft {
    pub current_step: i64,
    pub form_data: FormData,
    pub errors: FieldErrors,
    pub last_saved: DateTime<Utc>,
}

pub type DraftCache<'a> = ExpiringCache<'a, Option<ReportDraft>>;

pub fn draft_key(user_id: &str) -> String {
    format!("draft_{user_id}")
}

/// The current user's draft slot.
pub fn open_draft_cache(ctx: &AppContext) -> DraftCache<'_> {
    ExpiringCache::new(
        ctx.kv(),
        ctx.clock.as_ref(),
        draft_key(&ctx.identity.id),
        None,
        ctx.settings.draft_expiry_hours,
    )
}
