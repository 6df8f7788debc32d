//! Todo list example demonstrating queries and mutations end to end.
//!
//! This example shows:
//! - Registering a query with automatic fetching
//! - Subscribing to state transitions
//! - A mutation that invalidates the query it touched
//! - An optimistic local write through `set_data`
//!
//! Run with: `cargo run --example todos`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use color_eyre::eyre::Result;
use freshet::prelude::*;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

/// A todo item, as a backend would return it.
#[derive(Debug, Clone)]
struct Todo {
    id: u32,
    title: String,
    completed: bool,
}

/// In-memory stand-in for a remote API, with a little latency.
struct Backend {
    todos: Mutex<Vec<Todo>>,
}

impl Backend {
    fn new() -> Self {
        Self {
            todos: Mutex::new(vec![Todo {
                id: 1,
                title: "read the docs".to_owned(),
                completed: true,
            }]),
        }
    }

    async fn list(&self) -> Result<Vec<Todo>, QueryError> {
        sleep(Duration::from_millis(30)).await;
        Ok(self.todos.lock().unwrap().clone())
    }

    async fn create(&self, title: String) -> Result<Todo, QueryError> {
        sleep(Duration::from_millis(30)).await;
        let mut todos = self.todos.lock().unwrap();
        let todo = Todo {
            id: todos.len() as u32 + 1,
            title,
            completed: false,
        };
        todos.push(todo.clone());
        Ok(todo)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let backend = Arc::new(Backend::new());
    let client = Arc::new(QueryClient::new());

    // Print every transition of the todos key.
    let subscription = client.subscribe("todos", |state: &QueryState| {
        let todos = state.data_as::<Vec<Todo>>();
        let total = todos.as_ref().map_or(0, |todos| todos.len());
        let done = todos
            .as_ref()
            .map_or(0, |todos| todos.iter().filter(|todo| todo.completed).count());
        println!(
            "[todos] {:?} fetching={} {done}/{total} done",
            state.status, state.is_fetching
        );
    });

    let list_backend = Arc::clone(&backend);
    let todos = client.register(
        "todos",
        move || {
            let backend = Arc::clone(&list_backend);
            async move { backend.list().await }
        },
        QueryOptions::new().stale_time(Duration::from_secs(5)),
    );
    sleep(Duration::from_millis(100)).await;

    // A mutation that creates a todo and refreshes the list on success.
    let create_backend = Arc::clone(&backend);
    let invalidate_client = Arc::clone(&client);
    let create_todo = Mutation::new(
        move |title: String| {
            let backend = Arc::clone(&create_backend);
            async move { backend.create(title).await }
        },
        MutationOptions::new().on_success(move |todo: Todo, _title, _ctx| {
            let client = Arc::clone(&invalidate_client);
            async move {
                println!("[create] created #{} {:?}", todo.id, todo.title);
                client.invalidate("todos").await;
            }
        }),
    );

    create_todo.mutate("water the plants".to_owned()).await?;
    create_todo.mutate("file the report".to_owned()).await?;

    // An optimistic local write, visible to subscribers immediately.
    let mut cached = todos
        .data()
        .map(|todos| (*todos).clone())
        .unwrap_or_default();
    if let Some(newest) = cached.last_mut() {
        newest.completed = true;
    }
    todos.set_data(cached);

    subscription.unsubscribe();
    Ok(())
}
