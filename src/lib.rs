// src/lib.rs

use services::analytics_sync::AnalyticsSyncService;

#[derive(Clone)]
pub struct AppState {
    pub sync_service: AnalyticsSyncService,
}

pub mod entities {
    pub mod prelude;
    pub mod analytics_sync;
    pub mod ad_module;
    pub mod ad_process;
    pub mod ad_session;
    pub mod ad_session_usage_audit;
    pub mod ad_system_info;
    pub mod ad_tab;
    pub mod ad_window;
}

pub mod services {
    pub mod analytics_sync;
    pub mod data_source;
    pub mod host_context;
    pub mod payload_builder;
    pub mod receiver_client;
    pub mod sync_state;
}

pub mod error;
pub mod models;
pub mod handlers;
pub mod jobs;
