// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::accumulator::AccumulatorDeps;
use bubbles_adapters::{DeviceOp, FakeDeviceAdapter};
use bubbles_core::AuthorizationLevel;
use bubbles_storage::{ConfigStore, CONFIG_FILE_NAME};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::{sleep, Instant};

struct Setup {
    _dir: TempDir,
    fake: FakeDeviceAdapter,
    acc: Arc<Accumulator<FakeDeviceAdapter>>,
}

fn setup() -> Setup {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(ConfigStore::open(dir.path().join(CONFIG_FILE_NAME)).unwrap());
    let fake = FakeDeviceAdapter::new();
    let acc = Arc::new(Accumulator::start(AccumulatorDeps {
        device: fake.clone(),
        config,
    }));
    Setup {
        _dir: dir,
        fake,
        acc,
    }
}

fn moderator() -> Chatter {
    Chatter::new("mod_mia", AuthorizationLevel::Moderator)
}

// Chat commands

#[tokio::test(start_paused = true)]
async fn unrelated_chat_is_ignored() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));

    assert_eq!(handler.handle(&moderator(), "hello chat").await, None);
    assert_eq!(handler.handle(&moderator(), "!set volume 3").await, None);
    assert!(s.fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn viewers_are_refused() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));
    let viewer = Chatter::new("viewer_vic", AuthorizationLevel::Elevated);

    let reply = handler.handle(&viewer, "!activate bubbles").await;

    assert_eq!(
        reply.as_deref(),
        Some("I'm afraid I can't let you do that, @viewer_vic.")
    );
    sleep(Duration::from_secs(30)).await;
    assert!(s.fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn viewers_are_refused_even_for_malformed_commands() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));
    let viewer = Chatter::new("viewer_vic", AuthorizationLevel::None);

    let reply = handler.handle(&viewer, "!set bubbles maybe").await;

    assert_eq!(
        reply.as_deref(),
        Some("I'm afraid I can't let you do that, @viewer_vic.")
    );
}

#[tokio::test(start_paused = true)]
async fn activate_queues_configured_blast() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));
    let start = Instant::now();

    assert_eq!(handler.handle(&moderator(), "!activate bubbles 25").await, None);
    sleep(Duration::from_secs(60)).await;

    let calls = s.fake.calls();
    assert_eq!(s.fake.ops(), vec![DeviceOp::TurnOn, DeviceOp::TurnOff]);
    assert_eq!(calls[1].at - start, Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn activate_while_disabled_is_silent() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));
    s.acc.set_enabled(false);

    assert_eq!(handler.handle(&moderator(), "!activate bubbles").await, None);
    sleep(Duration::from_secs(30)).await;

    assert!(s.fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_command_disables_and_switches_off() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));

    assert_eq!(handler.handle(&moderator(), "!stop bubbles").await, None);

    assert!(!s.acc.enabled());
    assert_eq!(s.fake.ops(), vec![DeviceOp::TurnOff]);
}

#[tokio::test(start_paused = true)]
async fn set_toggles_enabled_flag() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));

    assert_eq!(handler.handle(&moderator(), "!set bubbles disabled").await, None);
    assert!(!s.acc.enabled());
    assert_eq!(handler.handle(&moderator(), "!enable bubbles").await, None);
    assert!(s.acc.enabled());
}

#[tokio::test(start_paused = true)]
async fn set_to_current_value_reports_already() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));

    let reply = handler.handle(&moderator(), "!set bubbles enabled").await;
    assert_eq!(
        reply.as_deref(),
        Some("@mod_mia, RistoBubbles are already Enabled.")
    );

    s.acc.set_enabled(false);
    let reply = handler.handle(&moderator(), "!disable bubbles").await;
    assert_eq!(
        reply.as_deref(),
        Some("@mod_mia, RistoBubbles are already Disabled.")
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_commands_get_usage_replies() {
    let s = setup();
    let handler = CommandHandler::new(Arc::clone(&s.acc));

    let reply = handler.handle(&moderator(), "!set bubbles sideways").await;
    assert_eq!(
        reply.as_deref(),
        Some(
            "@mod_mia, Error using !set bubbles command. \
             Expected !set bubbles enabled or !set bubbles disabled."
        )
    );

    let reply = handler.handle(&moderator(), "!activate bubbles lots").await;
    assert_eq!(
        reply.as_deref(),
        Some(
            "@mod_mia, Error using !activate bubbles command. \
             Expected !activate bubbles or !activate bubbles 10."
        )
    );
    assert!(s.fake.calls().is_empty());
}

// Donations

#[tokio::test(start_paused = true)]
async fn donation_at_threshold_triggers() {
    let s = setup();
    let listener = DonationListener::new(Arc::clone(&s.acc));

    assert!(listener.notify_donation("dana", 5.0, "bubbles please"));
    sleep(Duration::from_secs(30)).await;

    assert_eq!(s.fake.ops(), vec![DeviceOp::TurnOn, DeviceOp::TurnOff]);
}

#[tokio::test(start_paused = true)]
async fn donation_below_threshold_does_nothing() {
    let s = setup();
    let listener = DonationListener::new(Arc::clone(&s.acc));

    assert!(!listener.notify_donation("dana", 4.0, ""));
    assert!(!listener.notify_donation("dana", 4.99, ""));
    sleep(Duration::from_secs(30)).await;

    assert!(s.fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn donation_while_disabled_does_nothing() {
    let s = setup();
    s.acc.set_enabled(false);
    let listener = DonationListener::new(Arc::clone(&s.acc));

    assert!(!listener.notify_donation("dana", 100.0, ""));
    sleep(Duration::from_secs(30)).await;

    assert!(s.fake.calls().is_empty());
}
