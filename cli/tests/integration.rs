//! Full CRUD lifecycle test against the live server.
//!
//! # Design
//! Starts the server with an in-memory database on a random port, then
//! exercises the core client and the client store over real HTTP through
//! the same ureq transport the `todo` binary uses.

use std::sync::Arc;

use todo_cli::UreqTransport;
use todo_core::{
    ApiError, ClientStore, CreateTodo, SearchBox, TodoClient, TodoForm, TodoRow, Transport,
    UpdateTodo,
};
use todo_server::SqliteStore;

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let store = Arc::new(SqliteStore::open_in_memory().unwrap());
            todo_server::run(listener, store).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let client = TodoClient::new(&start_server());
    let mut transport = UreqTransport::new();

    // list: empty
    let todos = client
        .parse_list_todos(transport.execute(client.build_list_todos(None)).unwrap())
        .unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // create
    let req = client.build_create_todo(&CreateTodo::new("Buy milk")).unwrap();
    let created = client
        .parse_create_todo(transport.execute(req).unwrap())
        .unwrap();
    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);
    let id = created.id;

    // blank title is rejected before persistence
    let req = client.build_create_todo(&CreateTodo::new("   ")).unwrap();
    let err = client
        .parse_create_todo(transport.execute(req).unwrap())
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));

    // get round-trips every field
    let fetched = client
        .parse_get_todo(transport.execute(client.build_get_todo(id)).unwrap())
        .unwrap();
    assert_eq!(fetched, created);

    // update completed only
    let req = client
        .build_update_todo(id, &UpdateTodo::completed(true))
        .unwrap();
    let updated = client
        .parse_update_todo(transport.execute(req).unwrap())
        .unwrap();
    assert_eq!(updated.title, "Buy milk");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.completed);

    // delete
    let message = client
        .parse_delete_todo(transport.execute(client.build_delete_todo(id)).unwrap())
        .unwrap();
    assert_eq!(message, "Todo deleted successfully");

    // get after delete: NotFound
    let err = client
        .parse_get_todo(transport.execute(client.build_get_todo(id)).unwrap())
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // delete again: NotFound
    let err = client
        .parse_delete_todo(transport.execute(client.build_delete_todo(id)).unwrap())
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn store_stays_in_sync_with_server() {
    let client = TodoClient::new(&start_server());
    let mut store = ClientStore::new(client, UreqTransport::new());

    store.load(None);
    assert!(store.items().is_empty());
    assert!(store.error().is_none());

    let mut form = TodoForm::new();
    for title in ["Walk dog", "Buy milk", "Buy bread"] {
        form.set_title(title);
        form.submit(&mut store);
    }
    let titles: Vec<&str> = store.items().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Buy bread", "Buy milk", "Walk dog"]);

    // the locally prepended list matches a fresh server listing
    let local = store.items().to_vec();
    store.load(None);
    assert_eq!(store.items(), local.as_slice());

    let mut row = TodoRow::new(&store.items()[1]);
    row.toggle_complete(&mut store);
    assert!(store.items()[1].completed);
    assert_eq!(store.items()[1].title, "Buy milk");

    let mut search = SearchBox::default();
    search.set_query("BUY", &mut store);
    assert_eq!(store.items().len(), 2);
    search.set_query("bu", &mut store);
    assert_eq!(store.items().len(), 2);
    search.set_query("", &mut store);
    assert_eq!(store.items().len(), 3);

    let mut row = TodoRow::new(&store.items()[2]);
    row.delete(&mut store);
    assert_eq!(store.items().len(), 2);
    assert!(store.error().is_none());

    // a row whose todo was deleted elsewhere reports the failure
    let stale = store.items()[0].clone();
    let req = store.client().build_delete_todo(stale.id);
    store.transport_mut().execute(req).unwrap();
    let mut row = TodoRow::new(&stale);
    row.begin_edit();
    row.set_draft("renamed");
    row.save(&mut store);
    assert_eq!(store.error(), Some(todo_core::store::UPDATE_FAILED));
    assert_eq!(store.items()[0], stale);
}
