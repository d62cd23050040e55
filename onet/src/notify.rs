//! User-facing notices published by the transport and the editor.
//!
//! Nothing here renders anything: a front-end subscribes and decides how to show
//! a notice (toast, status line, stderr...). Publishing with no subscriber is fine.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
	Success,
	Info,
	Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}
impl Notice {
	pub fn error(message: impl Into<String>) -> Notice {
		Notice { level: NoticeLevel::Error, message: message.into() }
	}
	pub fn success(message: impl Into<String>) -> Notice {
		Notice { level: NoticeLevel::Success, message: message.into() }
	}
	pub fn info(message: impl Into<String>) -> Notice {
		Notice { level: NoticeLevel::Info, message: message.into() }
	}
}

/// Cloneable publishing side of the notice channel.
#[derive(Debug, Clone)]
pub struct Notifier {
	tx: broadcast::Sender<Notice>,
}
impl Notifier {
	pub fn new() -> Notifier {
		let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
		Notifier { tx }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
		self.tx.subscribe()
	}

	pub fn publish(&self, notice: Notice) {
		// Err only means nobody is listening right now
		let _ = self.tx.send(notice);
	}
}
impl Default for Notifier {
	fn default() -> Notifier {
		Notifier::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn subscribers_receive_published_notices() {
		let notifier = Notifier::new();
		let mut rx = notifier.subscribe();
		notifier.publish(Notice::error("API Error 500: boom"));
		notifier.publish(Notice::success("Network saved"));

		assert_eq!(rx.try_recv().unwrap(), Notice::error("API Error 500: boom"));
		assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Success);
		assert!(rx.try_recv().is_err());
	}

	#[test]
	fn publishing_without_subscribers_is_silent() {
		Notifier::new().publish(Notice::info("nobody home"));
	}
}
