pub mod discord;
pub mod metals_dev;

pub use discord::DiscordWebhook;
pub use metals_dev::MetalsDevProvider;
