//! Tests for the tree view controller against a mocked gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_canopy::model::{Direction, ROOT_ID};
use horizon_canopy::net::TreeGateway;
use horizon_canopy::widget::{TreeView, TreeViewError};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn node(id: i64, name: &str, order: i64, has_children: bool) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "manageable": true,
        "order": order,
        "hasChildren": has_children,
        "lastChildrenOrder": 0
    })
}

async fn mount_children(server: &MockServer, id: serde_json::Value, children: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/loadChildren"))
        .and(body_json(serde_json::json!({ "id": id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(children))
        .mount(server)
        .await;
}

fn view_for(server: &MockServer) -> TreeView {
    let gateway = TreeGateway::builder(server.uri())
        .build()
        .expect("Failed to build gateway");
    TreeView::new(gateway)
}

#[tokio::test]
async fn test_load_fetches_displayed_levels_eagerly() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, true), node(2, "Beta", 2, false)]),
    )
    .await;
    mount_children(
        &mock_server,
        serde_json::json!(1),
        serde_json::json!([node(11, "Alpha-1", 1, false)]),
    )
    .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");

    // Two levels by default: roots plus the children of every root that
    // reports hasChildren. Beta has none, so only Alpha's were fetched.
    assert_eq!(view.tree().roots(), &[1, 2]);
    assert_eq!(view.tree().children_of(1), &[11]);
    assert!(view.tree().get(1).expect("node 1").children_loaded());
    // Eagerly loaded nodes start expanded.
    assert!(!view.tree().get(1).expect("node 1").collapsed);
}

#[tokio::test]
async fn test_load_emits_node_inserted_per_node() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, true)]),
    )
    .await;
    mount_children(
        &mock_server,
        serde_json::json!(1),
        serde_json::json!([node(11, "Alpha-1", 1, false), node(12, "Alpha-2", 2, false)]),
    )
    .await;

    let mut view = view_for(&mock_server);
    let inserted = Arc::new(AtomicUsize::new(0));
    let inserted2 = Arc::clone(&inserted);
    view.signals().node_inserted.connect(move |_| {
        inserted2.fetch_add(1, Ordering::SeqCst);
    });

    view.load().await.expect("load failed");
    assert_eq!(inserted.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_toggle_loads_children_once_then_flips_visibility() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, true)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/loadChildren"))
        .and(body_json(serde_json::json!({ "id": 1 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([node(11, "Alpha-1", 1, false)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = TreeView::new(
        TreeGateway::builder(mock_server.uri())
            .build()
            .expect("Failed to build gateway"),
    )
    .with_displayed_levels(1);
    view.load().await.expect("load failed");
    assert!(!view.tree().get(1).expect("node 1").children_loaded());

    // First activation fetches and expands.
    view.toggle(1).await.expect("toggle failed");
    assert_eq!(view.tree().children_of(1), &[11]);
    assert!(!view.tree().get(1).expect("node 1").collapsed);

    // Subsequent activations only flip visibility, with no further requests
    // (the mock expects exactly one load of node 1).
    view.toggle(1).await.expect("toggle failed");
    assert!(view.tree().get(1).expect("node 1").collapsed);
    view.toggle(1).await.expect("toggle failed");
    assert!(!view.tree().get(1).expect("node 1").collapsed);
}

#[tokio::test]
async fn test_add_child_appends_last_and_requests_edit() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([{
            "id": 1,
            "name": "Alpha",
            "manageable": true,
            "order": 1,
            "hasChildren": true,
            "lastChildrenOrder": 4
        }]),
    )
    .await;
    mount_children(
        &mock_server,
        serde_json::json!(1),
        serde_json::json!([node(11, "Alpha-1", 4, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "add",
            "parentId": 1,
            "name": "New node",
            "order": 5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(12, "New node", 5, false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    let edit_requested = Arc::new(AtomicUsize::new(0));
    let edit_requested2 = Arc::clone(&edit_requested);
    view.signals().edit_requested.connect(move |id| {
        assert_eq!(*id, 12);
        edit_requested2.fetch_add(1, Ordering::SeqCst);
    });

    view.load().await.expect("load failed");
    let id = view.add_child(Some(1)).await.expect("add failed");

    assert_eq!(id, 12);
    assert_eq!(view.tree().children_of(1), &[11, 12]);
    assert_eq!(view.tree().get(1).expect("node 1").last_children_order, 5);
    assert_eq!(edit_requested.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_add_root_uses_synthetic_root_order() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "addRoot",
            "name": "New node",
            "order": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(2, "New node", 2, false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");
    view.add_child(None).await.expect("add failed");

    assert_eq!(view.tree().roots(), &[1, 2]);
}

#[tokio::test]
async fn test_add_under_unexpanded_parent_loads_children_first() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([{
            "id": 1,
            "name": "Alpha",
            "manageable": true,
            "order": 1,
            "hasChildren": true,
            "lastChildrenOrder": 1
        }]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/loadChildren"))
        .and(body_json(serde_json::json!({ "id": 1 })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([node(11, "Alpha-1", 1, false)])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "add",
            "parentId": 1,
            "name": "New node",
            "order": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(12, "New node", 2, false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = TreeView::new(
        TreeGateway::builder(mock_server.uri())
            .build()
            .expect("Failed to build gateway"),
    )
    .with_displayed_levels(1);
    view.load().await.expect("load failed");
    assert!(!view.tree().get(1).expect("node 1").children_loaded());

    // Adding under the unexpanded parent must pull its existing children
    // before the new node goes in, or they would vanish from the model.
    let id = view.add_child(Some(1)).await.expect("add failed");
    assert_eq!(id, 12);
    assert_eq!(view.tree().children_of(1), &[11, 12]);
    assert!(!view.tree().get(1).expect("node 1").collapsed);

    // The children are loaded now; toggling only flips visibility (the
    // mock expects exactly one load of node 1).
    view.toggle(1).await.expect("toggle failed");
    assert!(view.tree().get(1).expect("node 1").collapsed);
    assert_eq!(view.tree().children_of(1), &[11, 12]);
}

#[tokio::test]
async fn test_rename_rejects_blank_name_without_network() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    // No manage mock mounted; a request would fail the test via 404.

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");

    let err = view.rename(1, "   ").await.expect_err("expected an error");
    assert!(matches!(err, TreeViewError::EmptyName));
    assert_eq!(view.tree().get(1).expect("node 1").name, "Alpha");
}

#[tokio::test]
async fn test_rename_applies_server_canonical_name() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "edit",
            "id": 1,
            "name": "Reports"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(1, "Reports (2)", 1, false)))
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    let renamed = Arc::new(AtomicUsize::new(0));
    let renamed2 = Arc::clone(&renamed);
    view.signals().node_renamed.connect(move |_| {
        renamed2.fetch_add(1, Ordering::SeqCst);
    });

    view.load().await.expect("load failed");
    // The submitted name is trimmed; the model takes the server's answer.
    view.rename(1, "  Reports  ").await.expect("rename failed");

    assert_eq!(view.tree().get(1).expect("node 1").name, "Reports (2)");
    assert_eq!(renamed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_delete_with_children_never_calls_server() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, true)]),
    )
    .await;
    mount_children(
        &mock_server,
        serde_json::json!(1),
        serde_json::json!([node(11, "Alpha-1", 1, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");

    let err = view.delete(1).await.expect_err("expected an error");
    assert!(matches!(err, TreeViewError::HasChildren(1)));
    assert!(view.tree().contains(1));
}

#[tokio::test]
async fn test_delete_clears_selection_of_deleted_node() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/click"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>Alpha</div>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({ "action": "delete", "id": 1 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(1, "Alpha", 1, false)))
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");
    view.select(1).await.expect("select failed");
    assert_eq!(view.selected(), Some(1));

    view.delete(1).await.expect("delete failed");
    assert_eq!(view.selected(), None);
    assert!(!view.tree().contains(1));
    assert!(view.tree().roots().is_empty());
}

#[tokio::test]
async fn test_move_down_swaps_orders_via_two_calls() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false), node(2, "Beta", 2, false)]),
    )
    .await;
    // Moving Alpha down swaps its order with Beta: Alpha takes 2, Beta
    // takes 1, in two dependent calls.
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "changeOrder",
            "id": 1,
            "order": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(1, "Alpha", 2, false)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "changeOrder",
            "id": 2,
            "order": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(2, "Beta", 1, false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    let swapped = Arc::new(AtomicUsize::new(0));
    let swapped2 = Arc::clone(&swapped);
    view.signals().order_changed.connect(move |(moved, other)| {
        assert_eq!((*moved, *other), (1, 2));
        swapped2.fetch_add(1, Ordering::SeqCst);
    });

    view.load().await.expect("load failed");
    view.move_node(1, Direction::Down).await.expect("move failed");

    assert_eq!(view.tree().roots(), &[2, 1]);
    assert_eq!(view.tree().get(1).expect("node 1").order, 2);
    assert_eq!(view.tree().get(2).expect("node 2").order, 1);
    assert_eq!(swapped.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_move_aborts_unchanged_when_first_call_fails() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false), node(2, "Beta", 2, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Order change rejected"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");

    let err = view
        .move_node(1, Direction::Down)
        .await
        .expect_err("expected an error");
    assert_eq!(err.user_message("Move failed"), "Order change rejected");

    // Second call never went out and the model kept its order.
    assert_eq!(view.tree().roots(), &[1, 2]);
    assert_eq!(view.tree().get(1).expect("node 1").order, 1);
}

#[tokio::test]
async fn test_move_aborts_unchanged_when_second_call_fails() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false), node(2, "Beta", 2, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "changeOrder",
            "id": 1,
            "order": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(node(1, "Alpha", 2, false)))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .and(body_json(serde_json::json!({
            "action": "changeOrder",
            "id": 2,
            "order": 1
        })))
        .respond_with(ResponseTemplate::new(500).set_body_string("Order change rejected"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    let swapped = Arc::new(AtomicUsize::new(0));
    let swapped2 = Arc::clone(&swapped);
    view.signals().order_changed.connect(move |_| {
        swapped2.fetch_add(1, Ordering::SeqCst);
    });

    view.load().await.expect("load failed");

    let err = view
        .move_node(1, Direction::Down)
        .await
        .expect_err("expected an error");
    assert_eq!(err.user_message("Move failed"), "Order change rejected");

    // Both calls went out (each mock expects exactly one), but the model
    // keeps its order and no swap was announced.
    assert_eq!(view.tree().roots(), &[1, 2]);
    assert_eq!(view.tree().get(1).expect("node 1").order, 1);
    assert_eq!(view.tree().get(2).expect("node 2").order, 2);
    assert_eq!(swapped.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_move_at_boundary_is_rejected_without_network() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false), node(2, "Beta", 2, false)]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/manage"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");

    let err = view
        .move_node(1, Direction::Up)
        .await
        .expect_err("expected an error");
    assert!(matches!(err, TreeViewError::AtBoundary(Direction::Up)));

    let err = view
        .move_node(2, Direction::Down)
        .await
        .expect_err("expected an error");
    assert!(matches!(err, TreeViewError::AtBoundary(Direction::Down)));
}

#[tokio::test]
async fn test_select_emits_selection_then_detail() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/click"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div>Alpha detail</div>"))
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    let detail = Arc::new(std::sync::Mutex::new(None::<String>));
    let detail2 = Arc::clone(&detail);
    view.signals().detail_ready.connect(move |(id, body)| {
        assert_eq!(*id, 1);
        *detail2.lock().unwrap() = Some(body.clone());
    });

    view.load().await.expect("load failed");
    view.select(1).await.expect("select failed");

    assert_eq!(view.selected(), Some(1));
    assert_eq!(
        detail.lock().unwrap().as_deref(),
        Some("<div>Alpha detail</div>")
    );
}

#[tokio::test]
async fn test_load_clears_previous_model_and_selection() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        serde_json::Value::Null,
        serde_json::json!([node(1, "Alpha", 1, false)]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/click"))
        .respond_with(ResponseTemplate::new(200).set_body_string("detail"))
        .mount(&mock_server)
        .await;

    let mut view = view_for(&mock_server);
    view.load().await.expect("load failed");
    view.select(1).await.expect("select failed");

    let cleared = Arc::new(AtomicUsize::new(0));
    let cleared2 = Arc::clone(&cleared);
    view.signals().selection_changed.connect(move |selection| {
        if selection.is_none() {
            cleared2.fetch_add(1, Ordering::SeqCst);
        }
    });

    view.load().await.expect("reload failed");
    assert_eq!(view.selected(), None);
    assert_eq!(cleared.load(Ordering::SeqCst), 1);
    assert_eq!(view.tree().children_of(ROOT_ID), &[1]);
}
