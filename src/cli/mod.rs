pub mod holdings;
pub mod notify;
pub mod prices;
pub mod setup;
pub mod summary;
pub mod ui;
