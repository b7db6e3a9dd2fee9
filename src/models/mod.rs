pub mod feed;
pub mod health;
pub mod payload;
pub mod records;
pub mod sync_state;
pub mod summary;
