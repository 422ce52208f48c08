use std::sync::Arc;

use tasklist::auth::{AuthClient, LocalAuthClient};
use tasklist::models::Filter;
use tasklist::services::{SessionTracker, TaskList};
use tasklist::store::{MemoryTaskStore, TaskStore};

#[tokio::test]
async fn test_full_session_flow() {
    let auth = Arc::new(LocalAuthClient::new());
    let store = Arc::new(MemoryTaskStore::new());

    let mut tracker = SessionTracker::new(auth.clone());
    let mut list = TaskList::new(store.clone());

    // Startup: session is absent until the initial check resolves.
    let initial = tracker.init().await.expect("init");
    assert!(initial.is_none());
    list.set_session(initial).await;

    // Sign up; the transition arrives through the subscription.
    auth.sign_up("a@example.com", "secret")
        .await
        .expect("sign up");
    let session = tracker.changed().await;
    assert!(session.is_some());
    list.set_session(session).await;

    assert!(list.create("pay rent", None, None).await);
    assert!(list.create("water plants", Some("the ficus too"), None).await);
    assert_eq!(list.tasks().len(), 2);
    assert_eq!(list.tasks()[0].title, "water plants");

    let rent = list.tasks()[1].clone();
    assert!(list.toggle_completed(&rent).await);

    list.set_filter(Filter::Completed);
    let done: Vec<&str> = list.visible().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(done, ["pay rent"]);

    // Logout clears the collection without touching the store...
    auth.sign_out().await.expect("sign out");
    list.set_session(tracker.changed().await).await;
    assert!(list.tasks().is_empty());

    // ...and logging back in re-fetches it.
    auth.sign_in_with_password("a@example.com", "secret")
        .await
        .expect("sign in");
    list.set_session(tracker.changed().await).await;
    assert_eq!(list.tasks().len(), 2);
}

#[tokio::test]
async fn test_form_driven_edit_flow() {
    let auth = Arc::new(LocalAuthClient::new());
    let store = Arc::new(MemoryTaskStore::new());
    let mut list = TaskList::new(store);

    let session = auth
        .sign_up("b@example.com", "secret")
        .await
        .expect("sign up");
    list.set_session(Some(session)).await;

    list.open_create();
    {
        let draft = list.draft_mut().expect("form open");
        draft.title = "draft title".to_string();
    }
    assert!(list.submit_form().await);
    assert!(list.form().is_idle());

    let id = list.tasks()[0].id;
    list.open_edit(id);
    list.draft_mut().expect("form open").title = "final title".to_string();
    assert!(list.submit_form().await);

    assert_eq!(list.tasks().len(), 1);
    assert_eq!(list.tasks()[0].title, "final title");
}

#[tokio::test]
async fn test_users_cannot_touch_each_others_rows() {
    let auth = Arc::new(LocalAuthClient::new());
    let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::new());

    let alice = auth
        .sign_up("alice@example.com", "secret")
        .await
        .expect("sign up");
    let mut alice_list = TaskList::new(store.clone());
    alice_list.set_session(Some(alice)).await;
    assert!(alice_list.create("alice's task", None, None).await);
    let task = alice_list.tasks()[0].clone();

    let bob = auth
        .sign_up("bob@example.com", "secret")
        .await
        .expect("sign up");
    let mut bob_list = TaskList::new(store.clone());
    bob_list.set_session(Some(bob)).await;
    assert!(bob_list.tasks().is_empty());

    // A mutation against a row bob does not own matches nothing and reports
    // no error; his view simply stays empty.
    assert!(bob_list.update(task.id, "hijacked", None, None).await);
    assert!(bob_list.remove(task.id).await);
    assert!(bob_list.error().is_none());

    alice_list.refresh().await;
    assert_eq!(alice_list.tasks()[0].title, "alice's task");
}
