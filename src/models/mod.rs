pub mod location;
pub mod order;
pub mod order_media;
pub mod request_log;
pub mod telegram_user;

// Re-export models for easy access
pub use location::Location;
pub use order::{NewOrder, Order, OrderColumns, OrderRow};
pub use order_media::OrderMedia;
pub use request_log::{AutoForwardQuery, InboundRecord, LogStore, PgLogStore};
pub use telegram_user::TelegramUser;
