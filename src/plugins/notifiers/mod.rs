// Notifier implementations
pub mod telegram;

pub use telegram::TelegramNotifier;
