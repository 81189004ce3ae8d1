use std::sync::Arc;

use rre_db::Database;
use rre_mailer::Mailer;

use crate::storage::MediaStore;

pub type AppState = Arc<AppStateInner>;

/// Everything the handlers need, injected once at startup (and rebuilt
/// per-test with an in-memory database).
pub struct AppStateInner {
    pub db: Database,
    pub mailer: Mailer,
    pub media: MediaStore,
}
