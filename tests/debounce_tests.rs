mod common;

use common::{WINDOW, harness, is_dispatched};
use nfc_kiosk::application::terminal::CycleReport;
use nfc_kiosk::domain::outcome::{SoundCue, TransactionOutcome};
use nfc_kiosk::domain::ports::ApiReply;
use nfc_kiosk::domain::token::Token;
use nfc_kiosk::infrastructure::in_memory::Presentation;
use rand::Rng;
use std::time::Duration;

const TOKEN: [u8; 4] = [0x04, 0xA1, 0xB2, 0xC3];

#[tokio::test(start_paused = true)]
async fn test_held_card_dispatches_once_within_window() {
    let mut h = harness();
    for _ in 0..3 {
        h.reader.present(Presentation::uid(&TOKEN));
    }

    assert!(is_dispatched(&h.terminal.run_cycle().await));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(matches!(
        h.terminal.run_cycle().await,
        CycleReport::Suppressed(_)
    ));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(matches!(
        h.terminal.run_cycle().await,
        CycleReport::Suppressed(_)
    ));

    assert_eq!(h.api.submitted().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_same_token_after_window_dispatches_again() {
    let mut h = harness();
    h.reader.present(Presentation::uid(&TOKEN));
    h.reader.present(Presentation::uid(&TOKEN));

    assert!(is_dispatched(&h.terminal.run_cycle().await));
    tokio::time::advance(WINDOW).await;
    assert!(is_dispatched(&h.terminal.run_cycle().await));

    assert_eq!(h.api.submitted().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_removal_and_retap_inside_window_dispatches() {
    let mut h = harness();
    h.reader.present(Presentation::uid(&TOKEN));
    h.reader.present(Presentation::Absent);
    h.reader.present(Presentation::uid(&TOKEN));

    assert!(is_dispatched(&h.terminal.run_cycle().await));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(h.terminal.run_cycle().await, CycleReport::NoToken);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(is_dispatched(&h.terminal.run_cycle().await));

    let submitted = h.api.submitted().await;
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0], submitted[1]);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_does_not_start_cooldown() {
    let mut h = harness();
    h.api.push_reply(ApiReply::new(404, "")).await;
    h.reader.present(Presentation::uid(&TOKEN));
    h.reader.present(Presentation::uid(&TOKEN));

    let first = h.terminal.run_cycle().await;
    assert!(matches!(
        first,
        CycleReport::Dispatched {
            outcome: TransactionOutcome::UserNotFound,
            ..
        }
    ));
    assert_eq!(h.terminal.gate().last_success(), None);

    let second = h.terminal.run_cycle().await;
    assert!(matches!(
        second,
        CycleReport::Dispatched { ref outcome, .. } if outcome.is_accepted()
    ));
    assert_eq!(h.api.submitted().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_locked_and_server_errors_allow_prompt_retry() {
    let mut h = harness();
    h.api
        .push_reply(ApiReply::new(403, r#"{"error":"Account locked by admin"}"#))
        .await;
    h.api.push_reply(ApiReply::new(503, "")).await;
    for _ in 0..3 {
        h.reader.present(Presentation::uid(&TOKEN));
    }

    for _ in 0..3 {
        assert!(is_dispatched(&h.terminal.run_cycle().await));
    }

    let signals = h.feedback.signals().await;
    let outcomes: Vec<_> = signals
        .iter()
        .filter(|(cue, _)| *cue != SoundCue::Beep)
        .collect();
    assert_eq!(
        outcomes[0],
        &(SoundCue::Error, Some("Account locked by admin".to_string()))
    );
    assert_eq!(outcomes[1].0, SoundCue::Error);
    assert_eq!(outcomes[2].0, SoundCue::Success);
}

#[tokio::test(start_paused = true)]
async fn test_block_action_is_distinct_feedback() {
    let mut h = harness();
    h.api
        .push_reply(ApiReply::new(
            200,
            r#"{"message":"No more credit","action":"block","saldo":0}"#,
        ))
        .await;
    h.reader.present(Presentation::uid(&TOKEN));

    let report = h.terminal.run_cycle().await;
    assert!(matches!(
        report,
        CycleReport::Dispatched {
            outcome: TransactionOutcome::Blocked { .. },
            ..
        }
    ));
    let signals = h.feedback.signals().await;
    assert_eq!(
        signals.last().unwrap(),
        &(SoundCue::Blocked, Some("No more credit".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_ats_value_reaches_the_api() {
    let mut h = harness();
    h.reader.present(Presentation::Card {
        ats: Some(vec![0x80, 0x73, 0xC8, 0x21]),
        uid: Some(TOKEN.to_vec()),
    });

    h.terminal.run_cycle().await;

    let expected = Token::parse("80 73 C8 21").unwrap().to_base64();
    assert_eq!(h.api.submitted().await[0].token, expected);
}

#[tokio::test(start_paused = true)]
async fn test_random_tokens_each_dispatch_once_per_hold() {
    let mut rng = rand::thread_rng();
    let mut h = harness();

    for _ in 0..20 {
        let len = rng.gen_range(4..=10);
        let token: Vec<u8> = (0..len).map(|_| rng.r#gen()).collect();
        let holds = rng.gen_range(1..=4);
        for _ in 0..holds {
            h.reader.present(Presentation::uid(&token));
        }
        h.reader.present(Presentation::Absent);
    }

    let mut dispatched = 0;
    loop {
        match h.terminal.run_cycle().await {
            CycleReport::Dispatched { .. } => dispatched += 1,
            CycleReport::Suppressed(_) => {}
            CycleReport::NoToken => {
                if h.reader.connects() > 200 {
                    break;
                }
            }
            CycleReport::ReaderFault(e) => panic!("unexpected fault: {e}"),
        }
        tokio::time::advance(Duration::from_millis(200)).await;
    }

    assert_eq!(dispatched, 20);
}
