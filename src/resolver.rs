// Query and mutation resolvers over the shared store

use crate::filter::Filter;
use crate::models::Todo;
use crate::store::SharedStore;
use serde::{Deserialize, Serialize};

/// A named query or mutation with its arguments
///
/// Serialized with the operation name inline, e.g.
/// `{"operation": "updateTodo", "id": "0", "completed": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Operation {
    Todos {
        #[serde(default)]
        filter: Filter,
    },
    Todo {
        id: String,
    },
    AddTodo {
        value: String,
    },
    UpdateTodo {
        id: String,
        completed: bool,
    },
    RenameTodo {
        id: String,
        value: String,
    },
    DeleteTodo {
        id: String,
    },
    DeleteCompleted,
    CompleteAll,
    DeleteAll,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Todos { .. } => "todos",
            Operation::Todo { .. } => "todo",
            Operation::AddTodo { .. } => "addTodo",
            Operation::UpdateTodo { .. } => "updateTodo",
            Operation::RenameTodo { .. } => "renameTodo",
            Operation::DeleteTodo { .. } => "deleteTodo",
            Operation::DeleteCompleted => "deleteCompleted",
            Operation::CompleteAll => "completeAll",
            Operation::DeleteAll => "deleteAll",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, Operation::Todos { .. } | Operation::Todo { .. })
    }
}

/// Result of a resolved operation; a missing todo serializes as `null`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OperationResult {
    Todo(Option<Todo>),
    Todos(Vec<Todo>),
    Flag(bool),
}

/// Run `op` against the store
pub async fn resolve(store: &SharedStore, op: Operation) -> OperationResult {
    let mut store = store.lock().await;

    match op {
        Operation::Todos { filter } => OperationResult::Todos(store.list_filtered(filter)),
        Operation::Todo { id } => OperationResult::Todo(store.get(&id).cloned()),
        Operation::AddTodo { value } => OperationResult::Todo(Some(store.add(value))),
        Operation::UpdateTodo { id, completed } => OperationResult::Todo(store.update(&id, completed)),
        Operation::RenameTodo { id, value } => OperationResult::Todo(store.rename(&id, value)),
        Operation::DeleteTodo { id } => OperationResult::Todo(store.delete(&id)),
        Operation::DeleteCompleted => OperationResult::Todos(store.delete_completed()),
        Operation::CompleteAll => {
            store.complete_all();
            OperationResult::Flag(true)
        }
        Operation::DeleteAll => {
            store.delete_all();
            OperationResult::Flag(true)
        }
    }
}
