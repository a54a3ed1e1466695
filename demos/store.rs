//! Demonstration of a persisted Store backing a todo list

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wc_store::{FileStorage, Lifecycle, MemoryStorage, PersistenceOptions, Storage, Store};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TodoItem {
    id: usize,
    title: String,
    completed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
enum TodoFilter {
    All,
    Active,
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AppState {
    todos: Vec<TodoItem>,
    filter: TodoFilter,
}

impl AppState {
    fn new() -> Self {
        Self {
            todos: Vec::new(),
            filter: TodoFilter::All,
        }
    }

    fn add_todo(&mut self, title: &str) {
        let id = self.todos.len();
        self.todos.push(TodoItem {
            id,
            title: title.to_string(),
            completed: false,
        });
    }

    fn toggle_todo(&mut self, id: usize) {
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.completed = !todo.completed;
        }
    }

    fn filtered_todos(&self) -> Vec<&TodoItem> {
        match self.filter {
            TodoFilter::All => self.todos.iter().collect(),
            TodoFilter::Active => self.todos.iter().filter(|t| !t.completed).collect(),
            TodoFilter::Completed => self.todos.iter().filter(|t| t.completed).collect(),
        }
    }

    fn stats(&self) -> (usize, usize, usize) {
        let total = self.todos.len();
        let completed = self.todos.iter().filter(|t| t.completed).count();
        (total, total - completed, completed)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wc_store=debug")),
        )
        .init();

    println!("=== Store Example: Todo App ===\n");

    let path = std::env::temp_dir().join("wc-store-demo.json");
    let storage = Storage::new(
        Arc::new(FileStorage::open(&path)?),
        Arc::new(MemoryStorage::new()),
    );
    let options = PersistenceOptions::new("demo").durable("todos");

    let store = Store::with_storage(AppState::new(), storage, options)?;
    println!(
        "1. Loaded {} todos from {}",
        store.read(|state| state.todos.len()),
        path.display()
    );

    let component = Lifecycle::new();
    store.on_change(&component.signal(), |current: &AppState, previous: &AppState| {
        let (total, active, completed) = current.stats();
        println!(
            "   [Store Update] Total: {} (was {}), Active: {}, Completed: {}",
            total,
            previous.todos.len(),
            active,
            completed
        );
    });

    println!("\n2. Adding todos");
    store.update(|state| state.add_todo("Learn Rust"));
    store.update(|state| state.add_todo("Build a store"));

    println!("\n3. Completing the first todo");
    store.update(|state| state.toggle_todo(0));

    println!("\n4. Filtering to active todos");
    store.update(|state| state.filter = TodoFilter::Active);
    store.read(|state| {
        for todo in state.filtered_todos() {
            println!("   [ ] {}", todo.title);
        }
    });

    component.disconnect();
    println!("\n5. Component disconnected; further updates are silent");
    store.update(|state| state.filter = TodoFilter::All);

    println!("\nRun again to see the todos rehydrated from disk.");
    Ok(())
}
