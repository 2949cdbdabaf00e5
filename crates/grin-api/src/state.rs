use std::sync::Arc;

use grin_db::Database;

use crate::upload::Uploader;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub uploader: Uploader,
}
