//! Runs as its own test binary because it changes the process time zone.

mod common;

use std::sync::Arc;

use chatline::chat::{MessageRenderer, RenderOptions};
use chatline::contact::Summarizer;
use chatline::models::{ChatId, Message, MessageId, Session, Timestamp};
use chatline_crypto::MasterSecret;
use chrono::{FixedOffset, TimeZone as _, Utc};

use common::{MemoryStore, init_tracing, user, user_id};

fn noon_utc(year: i32, month: u32, day: u32) -> Timestamp {
    Timestamp::from_utc(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

// Single test in this binary: TZ must not change under a concurrent test.
#[tokio::test]
async fn test_system_zone_follows_daylight_saving() {
    // SAFETY: no other thread of this test binary reads the environment.
    unsafe { std::env::set_var("TZ", "America/New_York") };
    init_tracing();

    let secret = MasterSecret::generate();
    let renderer = MessageRenderer::new(Arc::new(secret.clone()), RenderOptions::default());
    let me = Session::new(user_id("me"), "Me");
    let chat_id = ChatId::resolve(&me.user_id, &user_id("bob"));
    let message = |time: Timestamp| Message {
        id: MessageId::generate(),
        chat_id: chat_id.clone(),
        sender_id: Some(user_id("bob")),
        from: "Bob".to_string(),
        content: Some(secret.chat_key(chat_id.as_str()).seal("hi").unwrap()),
        attachment: None,
        time: Some(time),
        streak: None,
        profile_pic: None,
    };

    // EST in January, EDT in July, whatever the current date is.
    let winter = message(noon_utc(2026, 1, 15));
    let summer = message(noon_utc(2026, 7, 15));
    assert_eq!(renderer.format_message(&me, &winter).time, "7:00 AM");
    assert_eq!(renderer.format_message(&me, &summer).time, "8:00 AM");

    let est = FixedOffset::west_opt(5 * 3600).unwrap();
    let edt = FixedOffset::west_opt(4 * 3600).unwrap();
    let local = renderer.local_time(winter.time).unwrap();
    assert_eq!(*local.offset(), est);
    assert_eq!(renderer.local_time(summer.time).unwrap().offset(), &edt);

    let store = Arc::new(MemoryStore::with_users(vec![user("me", "Me"), user("bob", "Bob")]));
    store.insert(winter);
    let contacts = Summarizer::new(store.clone(), renderer)
        .build_contact_list(&me, store.all_users())
        .await;
    let last = contacts[0].last_message_time.unwrap();
    assert_eq!(*last.offset(), est);
    assert_eq!(last.format("%H:%M").to_string(), "07:00");
}
