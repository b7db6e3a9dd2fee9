//! `SeaORM` Entity prelude

pub use super::ad_module::Entity as AdModule;
pub use super::ad_process::Entity as AdProcess;
pub use super::ad_session::Entity as AdSession;
pub use super::ad_session_usage_audit::Entity as AdSessionUsageAudit;
pub use super::ad_system_info::Entity as AdSystemInfo;
pub use super::ad_tab::Entity as AdTab;
pub use super::ad_window::Entity as AdWindow;
pub use super::analytics_sync::Entity as AnalyticsSync;
