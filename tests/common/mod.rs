use nfc_kiosk::application::dispatcher::TransactionDispatcher;
use nfc_kiosk::application::terminal::{CycleReport, Terminal};
use nfc_kiosk::infrastructure::in_memory::{
    InMemoryReader, InMemoryTransactionApi, RecordingFeedback,
};
use std::time::Duration;

pub const WINDOW: Duration = Duration::from_secs(5);

pub struct Harness {
    pub reader: InMemoryReader,
    pub api: InMemoryTransactionApi,
    pub feedback: RecordingFeedback,
    pub terminal: Terminal,
}

pub fn harness() -> Harness {
    let reader = InMemoryReader::new("ACS ACR122U PICC Interface 00");
    let api = InMemoryTransactionApi::new();
    let feedback = RecordingFeedback::new();

    let dispatcher = TransactionDispatcher::new(Box::new(api.clone()), "Test kiosk");
    let terminal = Terminal::new(
        Box::new(reader.clone()),
        dispatcher,
        Box::new(feedback.clone()),
        WINDOW,
        Duration::from_millis(200),
    );

    Harness {
        reader,
        api,
        feedback,
        terminal,
    }
}

pub fn is_dispatched(report: &CycleReport) -> bool {
    matches!(report, CycleReport::Dispatched { .. })
}
