//! Flat list caches for the network and library overviews.
//!
//! Each list is loaded at most once; after a create/rename/delete call the caller
//! patches the cached list with `add`/`update`/`remove` instead of reloading.

use log::{debug, warn};

use crate::api::{LibraryApi, NetworkApi};
use crate::rest::RResult;
use crate::rest_types as rt;

pub trait Identified {
	fn id(&self) -> &str;
}
impl Identified for rt::NetworkListItem {
	fn id(&self) -> &str { &self.network_id }
}
impl Identified for rt::LibraryListItem {
	fn id(&self) -> &str { &self.library_id }
}

#[derive(Debug, Clone)]
pub struct ListCache<T> {
	items: Vec<T>,
	loading: bool,
	error: Option<String>,
}

pub type NetworkList = ListCache<rt::NetworkListItem>;
pub type LibraryList = ListCache<rt::LibraryListItem>;

impl<T> Default for ListCache<T> {
	fn default() -> ListCache<T> {
		ListCache { items: Vec::new(), loading: false, error: None }
	}
}

impl<T: Identified> ListCache<T> {
	pub fn new() -> ListCache<T> {
		ListCache::default()
	}

	pub fn items(&self) -> &[T] { &self.items }
	pub fn is_loading(&self) -> bool { self.loading }
	/// Message of the last failed load, cleared when a load starts.
	pub fn error(&self) -> Option<&str> { self.error.as_deref() }

	pub fn get(&self, id: &str) -> Option<&T> {
		self.items.iter().find(|it| it.id() == id)
	}

	pub fn add(&mut self, item: T) {
		self.items.push(item);
	}

	/// Replaces the entry with the same id in place. Unknown ids are ignored.
	pub fn update(&mut self, item: T) {
		match self.items.iter_mut().find(|it| it.id() == item.id()) {
			Some(slot) => *slot = item,
			None => debug!("list update for unknown id {}", item.id()),
		}
	}

	pub fn remove(&mut self, id: &str) {
		self.items.retain(|it| it.id() != id);
	}

	async fn load_with<F>(&mut self, fetch: F) -> RResult<()>
		where F: std::future::Future<Output = RResult<Vec<T>>>
	{
		if !self.items.is_empty() {
			return Ok(());
		}
		self.loading = true;
		self.error = None;

		let result = fetch.await;
		self.loading = false;
		match result {
			Ok(items) => {
				self.items = items;
				Ok(())
			},
			Err(e) => {
				warn!("list load failed: {}", e);
				self.error = Some(e.to_string());
				self.items.clear();
				Err(e)
			},
		}
	}
}

impl ListCache<rt::NetworkListItem> {
	pub async fn load<A: NetworkApi + ?Sized>(&mut self, api: &A) -> RResult<()> {
		self.load_with(api.fetch_networks()).await
	}
}

impl ListCache<rt::LibraryListItem> {
	pub async fn load<A: LibraryApi + ?Sized>(&mut self, api: &A) -> RResult<()> {
		self.load_with(api.fetch_libraries()).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lib(id: &str, name: &str) -> rt::LibraryListItem {
		rt::LibraryListItem {
			library_id: id.into(),
			library_name: name.into(),
			created_at: String::new(),
			updated_at: String::new(),
		}
	}

	#[test]
	fn local_mutations_patch_by_id() {
		let mut list = LibraryList::new();
		list.add(lib("a", "alpha"));
		list.add(lib("b", "beta"));

		list.update(lib("b", "beta v2"));
		list.update(lib("zzz", "ghost"));
		assert_eq!(list.items().len(), 2);
		assert_eq!(list.get("b").unwrap().library_name, "beta v2");

		list.remove("a");
		assert!(list.get("a").is_none());
		assert_eq!(list.items().len(), 1);
	}

	#[tokio::test]
	async fn load_is_skipped_when_populated() {
		let mut list = LibraryList::new();
		list.add(lib("a", "alpha"));

		let result = list.load_with(std::future::pending()).await;
		assert!(result.is_ok());
		assert_eq!(list.items().len(), 1);
	}

	#[tokio::test]
	async fn failed_load_records_error_and_clears() {
		let mut list = NetworkList::new();
		let result = list.load_with(async {
			Err::<Vec<rt::NetworkListItem>, _>(crate::rest::Error::Integrity("boom".into()))
		}).await;

		assert!(result.is_err());
		assert!(!list.is_loading());
		assert!(list.items().is_empty());
		assert!(list.error().unwrap().contains("boom"));
	}
}
