use std::io::{self, Write};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use todo_core::{
    ClientStore, SearchBox, Todo, TodoClient, TodoForm, TodoRow, Transport, UpdateTodo,
};
use todo_cli::UreqTransport;

#[derive(Parser)]
#[command(name = "todo", about = "Manage the todo list from a terminal")]
struct Cli {
    /// Base URL of the todo server.
    #[arg(long, env = "TODO_SERVER", default_value = "http://127.0.0.1:3000", global = true)]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List todos, newest first.
    List {
        /// Only show titles containing this text (3 characters or more).
        #[arg(long, short)]
        search: Option<String>,
    },
    /// Add a todo.
    Add { title: String },
    /// Show a single todo.
    Show { id: Uuid },
    /// Mark a todo as completed.
    Done { id: Uuid },
    /// Mark a todo as not completed.
    Undo { id: Uuid },
    /// Change a todo's title.
    Rename { id: Uuid, title: String },
    /// Delete a todo.
    Rm { id: Uuid },
}

type Store = ClientStore<UreqTransport>;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TODO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut store = ClientStore::new(TodoClient::new(&cli.server), UreqTransport::new());

    let reload = match cli.command {
        Command::List { search } => {
            store.load(None);
            if let Some(query) = search {
                SearchBox::default().set_query(query, &mut store);
            }
            false
        }
        Command::Add { title } => {
            let mut form = TodoForm::new();
            form.set_title(title);
            if !form.can_submit() {
                bail!("title must not be blank");
            }
            form.submit(&mut store);
            true
        }
        Command::Show { id } => return show(&mut store, id),
        Command::Done { id } => {
            store.update(id, &UpdateTodo::completed(true));
            true
        }
        Command::Undo { id } => {
            store.update(id, &UpdateTodo::completed(false));
            true
        }
        Command::Rename { id, title } => {
            store.load(None);
            if let Some(error) = store.error() {
                bail!("{error}");
            }
            let todo = store
                .item(id)
                .ok_or_else(|| anyhow!("no todo with id {id}"))?;
            let mut row = TodoRow::new(todo);
            row.begin_edit();
            row.set_draft(title);
            row.save(&mut store);
            if row.is_editing() {
                bail!("title must not be blank");
            }
            true
        }
        Command::Rm { id } => {
            store.remove(id);
            true
        }
    };

    finish(&mut store, reload)
}

fn show(store: &mut Store, id: Uuid) -> anyhow::Result<()> {
    let request = store.client().build_get_todo(id);
    let response = store
        .transport_mut()
        .execute(request)
        .context("request todo")?;
    let todo = store
        .client()
        .parse_get_todo(response)
        .with_context(|| format!("fetch todo {id}"))?;
    print_todos(&[todo])
}

/// Fail with the error banner if one is set, otherwise print the list.
/// After a mutation the full list is fetched again before printing.
fn finish(store: &mut Store, reload: bool) -> anyhow::Result<()> {
    if let Some(error) = store.error() {
        bail!("{error}");
    }
    if reload {
        store.load(None);
        if let Some(error) = store.error() {
            bail!("{error}");
        }
    }
    if store.items().is_empty() {
        println!("No todos yet. Add one with `todo add <title>`.");
        return Ok(());
    }
    print_todos(store.items())
}

fn print_todos(todos: &[Todo]) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    for todo in todos {
        let mark = if todo.completed { "x" } else { " " };
        writeln!(
            out,
            "[{mark}] {}  {}  {}",
            todo.title,
            todo.id,
            todo.created_at.format("%Y-%m-%d %H:%M")
        )?;
    }
    Ok(())
}
