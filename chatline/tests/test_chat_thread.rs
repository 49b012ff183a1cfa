mod common;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chatline::Error;
use chatline::chat::{
    ChatListener, ChatThread, DECRYPTION_ERROR, DEFAULT_DOCUMENT_NAME, DEFAULT_PROFILE_PIC,
    INVALID_TIME, ImagePreview, MenuState, MessageBody, MessageRenderer, Overflow, RenderOptions,
};
use chatline::models::{
    Attachment, AttachmentKind, ChatId, Message, MessageId, Session, Timestamp, UserId,
};
use chatline_crypto::MasterSecret;

use common::{MemoryStore, init_tracing, user_id};

fn renderer(secret: &MasterSecret) -> MessageRenderer {
    let options = RenderOptions {
        utc_offset_minutes: Some(0),
        ..Default::default()
    };
    MessageRenderer::new(Arc::new(secret.clone()), options)
}

fn alice() -> Session {
    Session::new(user_id("alice"), "Alice")
}

fn bob() -> Session {
    Session::new(user_id("bob"), "Bob")
}

fn raw_message(secret: &MasterSecret, sender: &Session, peer: &UserId, text: &str) -> Message {
    let chat_id = ChatId::resolve(&sender.user_id, peer);
    Message {
        id: MessageId::generate(),
        content: Some(secret.chat_key(chat_id.as_str()).seal(text).unwrap()),
        chat_id,
        sender_id: Some(sender.user_id.clone()),
        from: sender.display_name.clone(),
        attachment: None,
        // 13:05 UTC
        time: Some(Timestamp(47_100_000_000)),
        streak: None,
        profile_pic: None,
    }
}

#[derive(Default)]
struct RecordingListener {
    deleted: Mutex<Vec<MessageId>>,
    failed: Mutex<Vec<(MessageId, String)>>,
}

#[async_trait]
impl ChatListener for RecordingListener {
    async fn on_message_deleted(&self, _chat_id: ChatId, message_id: MessageId) {
        self.deleted.lock().unwrap().push(message_id);
    }

    async fn on_delete_failed(&self, _chat_id: ChatId, message_id: MessageId, reason: String) {
        self.failed.lock().unwrap().push((message_id, reason));
    }
}

#[tokio::test]
async fn test_send_and_read_from_both_sides() {
    init_tracing();
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());

    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();
    assert!(thread.messages().is_empty());
    assert_eq!(thread.chat_id().as_str(), "alice_bob");
    let sent = thread.send_text("hello bob").await.unwrap();
    assert!(sent.sent_by_me);
    assert_eq!(thread.messages().len(), 1);

    // The stored text is sealed.
    let stored = store.messages.lock().unwrap()[0].clone();
    assert_ne!(stored.content.as_deref(), Some("hello bob"));

    let other = ChatThread::open(bob(), user_id("alice"), store.clone(), renderer(&secret))
        .await
        .unwrap();
    assert_eq!(other.chat_id(), thread.chat_id());
    let received = &other.messages()[0];
    assert!(!received.sent_by_me);
    assert_eq!(received.sender, "Alice");
    assert_eq!(received.profile_pic, DEFAULT_PROFILE_PIC);
    assert_eq!(
        received.body,
        MessageBody::Text {
            text: "hello bob".to_string(),
            overflow: Overflow::Fits,
        }
    );
}

#[tokio::test]
async fn test_blank_text_is_not_sent() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();
    assert!(matches!(
        thread.send_text("   ").await,
        Err(Error::EmptyMessage)
    ));
    assert_eq!(store.message_count(), 0);
}

#[tokio::test]
async fn test_wrong_key_shows_decryption_error() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    store.insert(raw_message(&secret, &bob(), &user_id("alice"), "top secret"));

    let other_secret = MasterSecret::generate();
    let thread = ChatThread::open(
        alice(),
        user_id("bob"),
        store.clone(),
        renderer(&other_secret),
    )
    .await
    .unwrap();

    match &thread.messages()[0].body {
        MessageBody::Text { text, .. } => assert_eq!(text, DECRYPTION_ERROR),
        other => panic!("expected text, got {:?}", other),
    }
}

#[tokio::test]
async fn test_clock_and_missing_time() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let mut untimed = raw_message(&secret, &bob(), &user_id("alice"), "when?");
    untimed.time = None;
    store.insert(untimed);
    store.insert(raw_message(&secret, &bob(), &user_id("alice"), "now"));

    let thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();

    let messages = thread.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].time, "1:05 PM");
    // Records without a time are kept and go last.
    assert_eq!(messages[1].time, INVALID_TIME);
}

#[tokio::test]
async fn test_attachments_are_classified() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();

    let image = thread
        .send_attachment(Attachment {
            url: "https://files.example/cat.png".to_string(),
            kind: AttachmentKind::Image,
            name: None,
        })
        .await
        .unwrap();
    let document = thread
        .send_attachment(Attachment {
            url: "https://files.example/plan".to_string(),
            kind: AttachmentKind::Document,
            name: None,
        })
        .await
        .unwrap();
    let unknown = thread
        .send_attachment(Attachment {
            url: "https://files.example/clip.mp4".to_string(),
            kind: AttachmentKind::Other("video".to_string()),
            name: None,
        })
        .await
        .unwrap();

    assert!(matches!(
        &image.body,
        MessageBody::Image { url, preview: ImagePreview::Thumbnail, .. } if url.ends_with("cat.png")
    ));
    assert_eq!(
        document.body,
        MessageBody::Document {
            url: "https://files.example/plan".to_string(),
            name: DEFAULT_DOCUMENT_NAME.to_string(),
        }
    );
    assert_eq!(unknown.body, MessageBody::Empty);

    assert!(thread.toggle_image_preview(&image.id));
    assert!(matches!(
        thread.get(&image.id).unwrap().body,
        MessageBody::Image {
            preview: ImagePreview::Enlarged,
            ..
        }
    ));
    assert!(!thread.toggle_image_preview(&document.id));
}

#[tokio::test]
async fn test_long_text_collapses_until_expanded() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let long = "line\n".repeat(10);
    store.insert(raw_message(&secret, &bob(), &user_id("alice"), &long));
    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();
    let id = thread.messages()[0].id.clone();

    match &thread.messages()[0].body {
        MessageBody::Text { overflow, .. } => assert!(overflow.shows_see_more()),
        other => panic!("expected text, got {:?}", other),
    }
    assert!(thread.expand(&id));
    assert!(!thread.expand(&id));
    match &thread.messages()[0].body {
        MessageBody::Text { overflow, text } => {
            assert_eq!(*overflow, Overflow::Expanded);
            assert_eq!(overflow.visible(text), long);
        }
        other => panic!("expected text, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cannot_delete_someone_elses_message() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let theirs = raw_message(&secret, &bob(), &user_id("alice"), "mine, not yours");
    store.insert(theirs.clone());
    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();

    assert!(!thread.toggle_menu(&theirs.id));
    assert!(matches!(
        thread.delete_message(&theirs.id).await,
        Err(Error::NotOwner)
    ));
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(store.message_count(), 1);
}

#[tokio::test]
async fn test_message_without_id_is_not_deleted() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let mut broken = raw_message(&secret, &alice(), &user_id("bob"), "no id");
    broken.id = MessageId::new("");
    store.insert(broken);
    let mut thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();

    assert!(matches!(
        thread.delete_message(&MessageId::new("")).await,
        Err(Error::MissingMessageId)
    ));
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        thread.delete_message(&MessageId::new("missing")).await,
        Err(Error::UnknownMessage)
    ));
}

#[tokio::test]
async fn test_failed_delete_keeps_message_and_notifies() {
    init_tracing();
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    store.fail_deletes.store(true, Ordering::SeqCst);
    let listener = Arc::new(RecordingListener::default());
    let mut thread = ChatThread::with_listener(
        alice(),
        user_id("bob"),
        store.clone(),
        renderer(&secret),
        listener.clone(),
    )
    .await
    .unwrap();
    let sent = thread.send_text("keep me").await.unwrap();

    assert!(thread.toggle_menu(&sent.id));
    assert!(thread.request_delete(&sent.id));
    assert!(matches!(
        thread.confirm_delete(&sent.id).await,
        Err(Error::Backend(_))
    ));

    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.get(&sent.id).unwrap().menu, MenuState::Closed);
    let failed = listener.failed.lock().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0, sent.id);
    assert_eq!(failed[0].1, "Failed to delete the message. Please try again.");
    assert!(listener.deleted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_confirmed_delete_removes_message() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let listener = Arc::new(RecordingListener::default());
    let mut thread = ChatThread::with_listener(
        alice(),
        user_id("bob"),
        store.clone(),
        renderer(&secret),
        listener.clone(),
    )
    .await
    .unwrap();
    let first = thread.send_text("first").await.unwrap();
    let second = thread.send_text("second").await.unwrap();

    // Nothing happens until the deletion is confirmed.
    assert!(!thread.confirm_delete(&first.id).await.unwrap());
    assert!(thread.toggle_menu(&first.id));
    assert!(thread.pointer_left(&first.id));
    assert!(!thread.request_delete(&first.id));
    assert!(thread.toggle_menu(&first.id));
    assert!(thread.request_delete(&first.id));
    assert!(thread.cancel_delete(&first.id));
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 0);

    assert!(thread.toggle_menu(&first.id));
    assert!(thread.request_delete(&first.id));
    // A pending confirmation survives the pointer leaving.
    assert!(!thread.pointer_left(&first.id));
    assert!(thread.confirm_delete(&first.id).await.unwrap());

    assert_eq!(thread.messages().len(), 1);
    assert_eq!(thread.messages()[0].id, second.id);
    assert_eq!(store.message_count(), 1);
    assert_eq!(*listener.deleted.lock().unwrap(), vec![first.id]);
}

#[tokio::test]
async fn test_sender_name_decides_ownership_without_sender_id() {
    let secret = MasterSecret::generate();
    let store = Arc::new(MemoryStore::default());
    let mut legacy = raw_message(&secret, &alice(), &user_id("bob"), "old client");
    legacy.sender_id = None;
    legacy.profile_pic = Some("https://files.example/alice.png".to_string());
    store.insert(legacy);
    let thread = ChatThread::open(alice(), user_id("bob"), store.clone(), renderer(&secret))
        .await
        .unwrap();

    let message = &thread.messages()[0];
    assert!(message.sent_by_me);
    assert_eq!(message.profile_pic, "https://files.example/alice.png");
}
