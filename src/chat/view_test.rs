use super::*;
use crate::chat::test_helpers::{FetchStep, MockChatApi, created, ids, msg, msgs, settle, wait_until};
use crate::net::api::ApiError;
use crate::notice::NoticeKind;
use tokio::sync::Notify;

const CONV: ConversationId = ConversationId(42);
const ME: UserId = UserId(7);

fn params() -> OpenParams {
    OpenParams { user: Some(ME), conversation: Some(CONV), title: None }
}

async fn open(api: &Arc<MockChatApi>) -> ConversationView {
    ConversationView::open(api.clone(), params(), &ClientConfig::default())
        .await
        .expect("view should open")
}

// =========================================================================
// open
// =========================================================================

#[tokio::test(start_paused = true)]
async fn open_without_user_fails_without_network() {
    let api = MockChatApi::new();
    let params = OpenParams { user: None, ..params() };
    let err = ConversationView::open(api.clone(), params, &ClientConfig::default())
        .await
        .err()
        .expect("should fail");
    assert!(matches!(err, ChatError::MissingUser));
    settle().await;
    assert_eq!(api.fetch_count(), 0);
    assert_eq!(api.seen_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn open_without_conversation_fails() {
    let api = MockChatApi::new();
    let params = OpenParams { conversation: None, ..params() };
    let err = ConversationView::open(api.clone(), params, &ClientConfig::default())
        .await
        .err()
        .expect("should fail");
    assert_eq!(err.error_code(), "E_MISSING_CONVERSATION");
    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn open_then_poll_merges_and_marks_seen_twice() {
    let api = MockChatApi::new();
    api.push_reply(&[1, 2, 3]);
    api.push_reply(&[4, 5]);

    let view = open(&api).await;
    assert_eq!(view.title(), DEFAULT_TITLE);
    assert!(view.load_error().is_none());
    assert!(view.is_polling());

    wait_until(|| view.cursor() == MessageId(5)).await;
    wait_until(|| api.seen_count() == 2).await;
    assert_eq!(ids(&view.messages()), vec![1, 2, 3, 4, 5]);

    let calls = api.fetch_calls.lock().unwrap().clone();
    assert_eq!(calls[0], (CONV, None));
    assert_eq!(calls[1], (CONV, Some(MessageId(3))));
    assert!(api.seen_calls.lock().unwrap().iter().all(|call| *call == (CONV, ME)));
}

#[tokio::test(start_paused = true)]
async fn open_marks_seen_before_initial_load_completes() {
    let api = MockChatApi::new();
    let gate = Arc::new(Notify::new());
    api.push_fetch(FetchStep::Gated(Arc::clone(&gate), msgs(&[1])));

    let opening = tokio::spawn({
        let api = api.clone();
        async move { ConversationView::open(api, params(), &ClientConfig::default()).await }
    });
    wait_until(|| api.seen_count() == 1).await;
    assert_eq!(api.fetch_count(), 1);
    assert!(!opening.is_finished());

    gate.notify_one();
    let view = opening.await.unwrap().expect("view should open");
    assert_eq!(ids(&view.messages()), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn open_with_no_new_messages_marks_seen_once() {
    let api = MockChatApi::new();
    api.push_reply(&[1, 2, 3]);
    let view = open(&api).await;

    wait_until(|| api.fetch_count() == 2).await;
    settle().await;
    assert_eq!(api.seen_count(), 1);
    assert_eq!(view.cursor(), MessageId(3));
}

#[tokio::test(start_paused = true)]
async fn open_uses_supplied_title() {
    let api = MockChatApi::new();
    let params = OpenParams { title: Some("Rayuela ↔ Ficciones".into()), ..params() };
    let view = ConversationView::open(api.clone(), params, &ClientConfig::default()).await.unwrap();
    assert_eq!(view.title(), "Rayuela ↔ Ficciones");
}

#[tokio::test(start_paused = true)]
async fn failed_initial_load_recovers_through_polling() {
    let api = MockChatApi::new();
    api.push_fetch_error();
    api.push_reply(&[1, 2]);

    let view = open(&api).await;
    assert_eq!(view.load_error(), Some(LOAD_ERROR_TEXT));
    assert!(view.is_polling());

    wait_until(|| view.cursor() == MessageId(2)).await;
    assert_eq!(ids(&view.messages()), vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn seen_failure_does_not_affect_view() {
    let api = MockChatApi::new();
    api.fail_seen();
    api.push_reply(&[1]);
    api.push_reply(&[2]);

    let view = open(&api).await;
    wait_until(|| view.cursor() == MessageId(2)).await;
    wait_until(|| api.seen_count() == 2).await;
    assert!(view.is_polling());
}

// =========================================================================
// send
// =========================================================================

#[tokio::test(start_paused = true)]
async fn blank_draft_is_not_sent() {
    let api = MockChatApi::new();
    api.push_reply(&[1]);
    let mut view = open(&api).await;
    let revision = view.revision();

    view.set_draft("   \n\t");
    assert!(view.send().await.unwrap().is_none());
    assert_eq!(api.sent_count(), 0);
    assert_eq!(ids(&view.messages()), vec![1]);
    assert_eq!(view.revision(), revision);
}

#[tokio::test(start_paused = true)]
async fn send_appends_confirmed_message() {
    let api = MockChatApi::new();
    api.push_reply(&[1, 2]);
    api.push_send(Ok(created(10)));
    let mut view = open(&api).await;

    view.set_draft("  ¿Cambiamos el sábado?  ");
    let sent = view.send().await.unwrap().expect("message should be sent");

    assert_eq!(sent.id, MessageId(10));
    assert_eq!(sent.body, "¿Cambiamos el sábado?");
    assert!(view.is_my_message(&sent));
    assert_eq!(view.draft(), "");
    assert_eq!(view.cursor(), MessageId(10));
    assert_eq!(ids(&view.messages()), vec![1, 2, 10]);

    let sent_calls = api.sent.lock().unwrap().clone();
    assert_eq!(sent_calls.len(), 1);
    assert_eq!(sent_calls[0].0, CONV);
    assert_eq!(sent_calls[0].1, OutgoingMessage { sender_id: ME, body: "¿Cambiamos el sábado?".into() });
}

#[tokio::test(start_paused = true)]
async fn send_failure_restores_draft_and_raises_notice() {
    let api = MockChatApi::new();
    api.push_reply(&[1]);
    api.push_send(Err(ApiError::Status { status: 400, body: "rejected".into() }));
    let mut view = open(&api).await;

    view.set_draft("hola ");
    let err = view.send().await.unwrap_err();

    assert!(matches!(err, ChatError::SendFailure(_)));
    assert_eq!(view.draft(), "hola ");
    assert_eq!(ids(&view.messages()), vec![1]);
    let notice = view.notice().expect("error notice");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, SEND_ERROR_TEXT);
}

#[tokio::test(start_paused = true)]
async fn send_confirmation_already_polled_is_not_duplicated() {
    let api = MockChatApi::new();
    api.push_reply(&[1]);
    api.push_reply(&[2, 3]);
    api.push_send(Ok(created(3)));
    let mut view = open(&api).await;
    wait_until(|| view.cursor() == MessageId(3)).await;

    view.set_draft("three");
    view.send().await.unwrap();
    assert_eq!(ids(&view.messages()), vec![1, 2, 3]);
}

#[tokio::test(start_paused = true)]
async fn is_my_message_compares_sender() {
    let api = MockChatApi::new();
    let view = open(&api).await;
    let mut theirs = msg(1);
    theirs.sender_id = UserId(99);
    let mut mine = msg(2);
    mine.sender_id = ME;
    assert!(!view.is_my_message(&theirs));
    assert!(view.is_my_message(&mine));
}

// =========================================================================
// close
// =========================================================================

#[tokio::test(start_paused = true)]
async fn close_stops_polling() {
    let api = MockChatApi::new();
    let view = open(&api).await;
    wait_until(|| api.fetch_count() == 2).await;

    view.close();
    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn close_discards_in_flight_poll_result() {
    let api = MockChatApi::new();
    let gate = Arc::new(Notify::new());
    api.push_reply(&[1, 2, 3]);
    api.push_fetch(FetchStep::Gated(Arc::clone(&gate), msgs(&[4])));

    let view = open(&api).await;
    wait_until(|| api.fetch_count() == 2).await;
    let store = Arc::clone(&view.store);
    let seen_before = api.seen_count();

    view.close();
    gate.notify_one();
    settle().await;

    assert_eq!(ids(&store.snapshot()), vec![1, 2, 3]);
    assert_eq!(api.seen_count(), seen_before);
}

#[tokio::test(start_paused = true)]
async fn dropping_view_stops_polling() {
    let api = MockChatApi::new();
    let view = open(&api).await;
    wait_until(|| api.fetch_count() == 2).await;
    drop(view);

    tokio::time::advance(Duration::from_secs(60)).await;
    settle().await;
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn subscriber_sees_poll_merge() {
    let api = MockChatApi::new();
    api.push_reply(&[1]);
    let view = open(&api).await;
    let mut rx = view.subscribe();

    api.push_reply(&[2]);
    rx.changed().await.unwrap();
    assert_eq!(ids(&view.messages_after(MessageId(1))), vec![2]);
}
