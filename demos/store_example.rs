//! Store example with several slices and a relay to an external sink

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slicestore::{
    impl_slice, Action, Dispatcher, EventPublisher, EventRelay, EventSink, ReducerRegistry,
    RelayConfig, Store, TransitionEvent,
};
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct TodoItem {
    id: usize,
    text: String,
    completed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Todos {
    items: Vec<TodoItem>,
}

// Copied through serde so no copy shares a buffer with the stored list
impl_slice!(Todos => serialized);

#[derive(Clone, Debug, PartialEq)]
struct Filter {
    show_completed: bool,
}

impl_slice!(Filter);

struct AddTodo(String);
impl Action for AddTodo {}

struct Complete(usize);
impl Action for Complete {}

/// Prints each transition as a JSON line, standing in for an inspection tool.
struct JsonLines;

#[async_trait]
impl EventSink for JsonLines {
    async fn send(
        &self,
        event: TransitionEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        println!("relay: {}", serde_json::to_string(&event.record())?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Store Example ===\n");

    let store = Store::builder()
        .slice(Todos::default())
        .slice(Filter {
            show_completed: false,
        })
        .build()?;
    println!("kinds: {:?}", store.kinds());

    let reducers = ReducerRegistry::new()
        .with_fn(|mut todos: Todos, action: &AddTodo| {
            let id = todos.items.len() + 1;
            todos.items.push(TodoItem {
                id,
                text: action.0.clone(),
                completed: false,
            });
            todos
        })
        .with_fn(|mut todos: Todos, action: &Complete| {
            if let Some(todo) = todos.items.iter_mut().find(|t| t.id == action.0) {
                todo.completed = true;
            }
            todos
        });

    let publisher = EventPublisher::new();
    let relay = EventRelay::spawn(&publisher, JsonLines, RelayConfig::default());
    let dispatcher =
        Dispatcher::new(store.clone(), Arc::new(reducers)).with_publisher(publisher);

    println!("Adding todos...");
    dispatcher.dispatch::<Todos, _>(AddTodo("Learn slices".to_string()))?;
    dispatcher.dispatch::<Todos, _>(AddTodo("Write reducers".to_string()))?;

    println!("Completing todo 1...");
    dispatcher.dispatch::<Todos, _>(Complete(1))?;

    let open = store.read_slice(|todos: &Todos| {
        todos.items.iter().filter(|t| !t.completed).count()
    })?;
    println!("\nOpen todos: {open:?}");

    let stats = relay.shutdown().await;
    println!("relayed {} events, {} failed", stats.delivered, stats.failed);

    println!("\nFinal state: {:#?}", store.get_slice::<Todos>()?);
    Ok(())
}
