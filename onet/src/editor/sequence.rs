//! Last-writer-wins bookkeeping for requests whose responses can arrive out of order.

use std::collections::HashMap;

pub const NETWORK: &str = "network";
pub const SPECTRUM: &str = "si";
pub const SPAN: &str = "span";
pub const SIMULATION: &str = "simulation";
pub const LIBRARY: &str = "library";

pub fn element_key(id: &str) -> String { format!("element:{}", id) }
pub fn connection_key(id: &str) -> String { format!("connection:{}", id) }
pub fn service_key(id: &str) -> String { format!("service:{}", id) }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
	key: String,
	seq: u64,
}
impl Ticket {
	pub fn key(&self) -> &str { &self.key }
	pub fn seq(&self) -> u64 { self.seq }
}

/// Hands out one monotonically increasing sequence number per request and
/// remembers the newest one per key.
#[derive(Debug, Default)]
pub struct RequestSequencer {
	next: u64,
	latest: HashMap<String, u64>,
}

impl RequestSequencer {
	pub fn issue(&mut self, key: impl Into<String>) -> Ticket {
		self.next += 1;
		let key = key.into();
		self.latest.insert(key.clone(), self.next);
		Ticket { key, seq: self.next }
	}

	/// False once a newer ticket was issued for the same key, or after `forget_all`.
	pub fn is_latest(&self, ticket: &Ticket) -> bool {
		self.latest.get(&ticket.key) == Some(&ticket.seq)
	}

	/// Invalidates every outstanding ticket. The counter keeps going so old
	/// tickets can never match a new one.
	pub fn forget_all(&mut self) {
		self.latest.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn newer_ticket_supersedes_older() {
		let mut seq = RequestSequencer::default();
		let first = seq.issue(element_key("e1"));
		let other = seq.issue(element_key("e2"));
		let second = seq.issue(element_key("e1"));

		assert!(!seq.is_latest(&first));
		assert!(seq.is_latest(&second));
		assert!(seq.is_latest(&other), "keys are independent");
		assert!(second.seq() > first.seq());
	}

	#[test]
	fn forgetting_invalidates_everything() {
		let mut seq = RequestSequencer::default();
		let old = seq.issue(SPAN);
		seq.forget_all();
		assert!(!seq.is_latest(&old));

		let new = seq.issue(SPAN);
		assert!(seq.is_latest(&new));
		assert_ne!(old, new);
	}
}
