//! Telegram Bot API adapters: result delivery and input download.

mod api;
mod media;
mod notifier;

pub use api::{TELEGRAM_API_URL, TelegramApi, TelegramConfig, TelegramFile, Upload, UploadKind};
pub use media::TelegramMediaSource;
pub use notifier::TelegramNotifier;
