pub mod analytics_sync;
