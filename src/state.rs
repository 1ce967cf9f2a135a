use std::{sync::Arc, time::Duration};

use crate::{
    config::{AppConfig, MAX_SESSION_TTL_MINUTES},
    db::OrmConn,
    session::Sessions,
};

#[derive(Clone)]
pub struct AppState {
    pub orm: OrmConn,
    pub sessions: Sessions,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(orm: OrmConn, config: AppConfig) -> Self {
        Self {
            orm,
            sessions: Sessions::in_memory(session_ttl(config.session_ttl_minutes)),
            config: Arc::new(config),
        }
    }
}

fn session_ttl(minutes: i64) -> Duration {
    let minutes = minutes.clamp(1, MAX_SESSION_TTL_MINUTES) as u64;
    Duration::from_secs(minutes.saturating_mul(60))
}
