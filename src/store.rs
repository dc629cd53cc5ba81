// In-memory todo store with change notifications

use crate::filter::Filter;
use crate::models::{Channel, SeedTodo, Todo};
use crate::notify::{Broadcaster, Subscription};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Store handle shared between request handlers
///
/// Every operation runs to completion under the lock, so mutations never interleave.
pub type SharedStore = Arc<Mutex<TodoStore>>;

/// Authoritative in-memory todo list
///
/// Todos are kept in insertion order. Ids come from a counter that only ever
/// increments, so an id is never handed out twice within a process.
#[derive(Debug, Default)]
pub struct TodoStore {
    todos: Vec<Todo>,
    next_id: u64,
    notifier: Broadcaster,
}

impl TodoStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `seed`, in order
    pub fn with_seed(seed: &[SeedTodo]) -> Self {
        let mut store = Self::new();
        for entry in seed {
            store.insert(entry.value.clone(), entry.completed);
        }
        store
    }

    /// Wrap the store for sharing across handlers
    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// All todos in insertion order
    pub fn list(&self) -> &[Todo] {
        &self.todos
    }

    /// Todos matching `filter`, insertion order preserved
    pub fn list_filtered(&self, filter: Filter) -> Vec<Todo> {
        self.todos.iter().filter(|t| filter.matches(t)).cloned().collect()
    }

    /// Get a todo by ID
    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new, incomplete todo
    ///
    /// The value is stored as given; empty strings are accepted.
    pub fn add(&mut self, value: impl Into<String>) -> Todo {
        self.insert(value.into(), false)
    }

    fn insert(&mut self, value: String, completed: bool) -> Todo {
        let todo = Todo {
            id: self.allocate_id(),
            value,
            completed,
        };
        self.todos.push(todo.clone());

        debug!(id = %todo.id, "Todo added");
        self.notifier.publish(Channel::TodoAdded, &todo);
        todo
    }

    /// Remove a todo, returning it if it existed
    pub fn delete(&mut self, id: &str) -> Option<Todo> {
        let pos = self.todos.iter().position(|t| t.id == id)?;
        let todo = self.todos.remove(pos);

        debug!(id = %todo.id, "Todo deleted");
        self.notifier.publish(Channel::TodoDeleted, &todo);
        Some(todo)
    }

    /// Set the completed flag of a todo
    pub fn update(&mut self, id: &str, completed: bool) -> Option<Todo> {
        let todo = self.find_mut(id)?;
        todo.completed = completed;
        let todo = todo.clone();

        debug!(id = %todo.id, completed, "Todo updated");
        self.notifier.publish(Channel::TodoUpdated, &todo);
        Some(todo)
    }

    /// Replace the value of a todo
    pub fn rename(&mut self, id: &str, value: impl Into<String>) -> Option<Todo> {
        let todo = self.find_mut(id)?;
        todo.value = value.into();
        let todo = todo.clone();

        debug!(id = %todo.id, "Todo renamed");
        self.notifier.publish(Channel::TodoUpdated, &todo);
        Some(todo)
    }

    /// Remove every completed todo
    ///
    /// Returns the removed todos in their original order. One delete event is
    /// published per removed todo, in that same order.
    pub fn delete_completed(&mut self) -> Vec<Todo> {
        let (completed, remaining): (Vec<Todo>, Vec<Todo>) =
            std::mem::take(&mut self.todos).into_iter().partition(|t| t.completed);
        self.todos = remaining;

        debug!(count = completed.len(), "Completed todos deleted");
        for todo in &completed {
            self.notifier.publish(Channel::TodoDeleted, todo);
        }
        completed
    }

    /// Empty the store, returning how many todos were removed
    pub fn delete_all(&mut self) -> usize {
        let removed = std::mem::take(&mut self.todos);

        debug!(count = removed.len(), "All todos deleted");
        for todo in &removed {
            self.notifier.publish(Channel::TodoDeleted, todo);
        }
        removed.len()
    }

    /// Mark every todo completed, returning how many changed
    pub fn complete_all(&mut self) -> usize {
        let mut changed = Vec::new();
        for todo in self.todos.iter_mut().filter(|t| !t.completed) {
            todo.completed = true;
            changed.push(todo.clone());
        }

        debug!(count = changed.len(), "All todos completed");
        for todo in &changed {
            self.notifier.publish(Channel::TodoUpdated, todo);
        }
        changed.len()
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Listen for changes on `channel`, starting with the next mutation
    pub fn subscribe(&mut self, channel: Channel) -> Subscription {
        self.notifier.subscribe(channel)
    }

    pub fn listener_count(&self, channel: Channel) -> usize {
        self.notifier.listener_count(channel)
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|t| t.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_add_assigns_sequential_ids_in_order() {
        let mut store = TodoStore::new();
        let values = ["a", "b", "c", "d"];
        for value in values {
            store.add(value);
        }

        assert_eq!(ids(store.list()), vec!["0", "1", "2", "3"]);
        let listed: Vec<&str> = store.list().iter().map(|t| t.value.as_str()).collect();
        assert_eq!(listed, values);
        assert!(store.list().iter().all(|t| !t.completed));
    }

    #[test]
    fn test_add_accepts_empty_value() {
        let mut store = TodoStore::new();
        let todo = store.add("");
        assert_eq!(todo.value, "");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut store = TodoStore::new();
        store.add("a");
        store.add("b");
        store.delete_all();
        assert!(store.is_empty());

        let todo = store.add("c");
        assert_eq!(todo.id, "2");
    }

    #[test]
    fn test_update_sets_completed_and_keeps_value() {
        let mut store = TodoStore::new();
        let todo = store.add("write tests");

        let updated = store.update(&todo.id, true).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.value, "write tests");
        assert_eq!(store.get(&todo.id), Some(&updated));

        let reverted = store.update(&todo.id, false).unwrap();
        assert!(!reverted.completed);
    }

    #[test]
    fn test_update_unknown_id() {
        let mut store = TodoStore::new();
        store.add("a");
        assert!(store.update("42", true).is_none());
        assert!(!store.list()[0].completed);
    }

    #[test]
    fn test_rename() {
        let mut store = TodoStore::new();
        let todo = store.add("draft");
        store.update(&todo.id, true);
        let mut updated = store.subscribe(Channel::TodoUpdated);

        let renamed = store.rename(&todo.id, "final").unwrap();
        assert_eq!(renamed.value, "final");
        assert!(renamed.completed);
        assert_eq!(updated.try_recv(), Some(renamed));
        assert!(updated.try_recv().is_none());

        assert!(store.rename("missing", "x").is_none());
        assert!(store.update("42", true).is_none());
        assert!(updated.try_recv().is_none());
    }

    #[test]
    fn test_delete_removes_exactly_one() {
        let mut store = TodoStore::new();
        store.add("a");
        let b = store.add("b");
        store.add("c");

        assert_eq!(store.delete(&b.id), Some(b));
        assert_eq!(ids(store.list()), vec!["0", "2"]);
    }

    #[test]
    fn test_delete_unknown_id_is_noop() {
        let mut store = TodoStore::new();
        store.add("a");
        let mut deleted = store.subscribe(Channel::TodoDeleted);

        assert!(store.delete("7").is_none());
        assert_eq!(store.len(), 1);
        assert!(deleted.try_recv().is_none());
    }

    #[test]
    fn test_delete_completed_keeps_relative_order() {
        let mut store = TodoStore::new();
        for value in ["a", "b", "c", "d", "e"] {
            store.add(value);
        }
        store.update("1", true);
        store.update("3", true);

        let removed = store.delete_completed();
        assert_eq!(ids(&removed), vec!["1", "3"]);
        assert!(removed.iter().all(|t| t.completed));
        assert_eq!(ids(store.list()), vec!["0", "2", "4"]);
    }

    #[test]
    fn test_delete_completed_scenario() {
        let mut store = TodoStore::new();
        assert_eq!(store.add("a").id, "0");
        assert_eq!(store.add("b").id, "1");
        store.update("0", true);

        let removed = store.delete_completed();
        assert_eq!(
            removed,
            vec![Todo {
                id: "0".to_string(),
                value: "a".to_string(),
                completed: true,
            }]
        );
        assert_eq!(
            store.list(),
            &[Todo {
                id: "1".to_string(),
                value: "b".to_string(),
                completed: false,
            }]
        );
    }

    #[test]
    fn test_complete_all_and_filters() {
        let mut store = TodoStore::new();
        store.add("a");
        store.add("b");
        store.update("0", true);

        assert_eq!(ids(&store.list_filtered(Filter::Active)), vec!["1"]);
        assert_eq!(ids(&store.list_filtered(Filter::Completed)), vec!["0"]);

        assert_eq!(store.complete_all(), 1);
        assert!(store.list_filtered(Filter::Active).is_empty());
        assert_eq!(store.list_filtered(Filter::All).len(), 2);
    }

    #[test]
    fn test_with_seed() {
        let store = TodoStore::with_seed(&[SeedTodo::new("first", false), SeedTodo::new("second", true)]);
        assert_eq!(ids(store.list()), vec!["0", "1"]);
        assert!(!store.list()[0].completed);
        assert!(store.list()[1].completed);
    }

    #[test]
    fn test_each_mutation_publishes_its_payload() {
        let mut store = TodoStore::new();
        let mut added = store.subscribe(Channel::TodoAdded);
        let mut updated = store.subscribe(Channel::TodoUpdated);
        let mut deleted = store.subscribe(Channel::TodoDeleted);

        let a = store.add("a");
        assert_eq!(added.try_recv(), Some(a.clone()));
        assert!(added.try_recv().is_none());

        let a = store.update(&a.id, true).unwrap();
        assert_eq!(updated.try_recv(), Some(a.clone()));
        assert!(updated.try_recv().is_none());

        let b = store.add("b");
        assert_eq!(added.try_recv(), Some(b.clone()));

        let removed = store.delete(&b.id).unwrap();
        assert_eq!(deleted.try_recv(), Some(removed));
        assert!(deleted.try_recv().is_none());

        let removed = store.delete_completed();
        assert_eq!(deleted.try_recv(), Some(removed[0].clone()));
        assert!(deleted.try_recv().is_none());
    }

    #[test]
    fn test_bulk_mutations_publish_one_event_per_todo() {
        let mut store = TodoStore::with_seed(&[
            SeedTodo::new("a", true),
            SeedTodo::new("b", false),
            SeedTodo::new("c", false),
        ]);
        let mut updated = store.subscribe(Channel::TodoUpdated);
        let mut deleted = store.subscribe(Channel::TodoDeleted);

        store.complete_all();
        assert_eq!(updated.try_recv().unwrap().id, "1");
        assert_eq!(updated.try_recv().unwrap().id, "2");
        assert!(updated.try_recv().is_none());

        assert_eq!(store.delete_all(), 3);
        for id in ["0", "1", "2"] {
            assert_eq!(deleted.try_recv().unwrap().id, id);
        }
        assert!(deleted.try_recv().is_none());
    }

    #[test]
    fn test_subscriber_only_sees_later_mutations() {
        let mut store = TodoStore::new();
        store.add("before");
        let mut added = store.subscribe(Channel::TodoAdded);
        store.add("after");

        assert_eq!(added.try_recv().unwrap().value, "after");
        assert!(added.try_recv().is_none());
        assert_eq!(store.listener_count(Channel::TodoAdded), 1);
    }
}
