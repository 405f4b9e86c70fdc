use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Err,
}

/// Dialogs owned by the widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    NewClient,
    DeleteClient,
    EditPrompt,
    AddClient,
}

/// Everything a widget does to its page, expressed as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Toast { message: String, tone: Tone },
    Alert(String),
    TableRendered { html: String },
    EmptyState,
    ListReplaced { html: String },
    ModalOpened { modal: Modal, title: Option<String> },
    ModalClosed(Modal),
    TranscriptAppended { line: String },
    /// An optimistically echoed line that the backend never acknowledged.
    DeliveryFailed { line: String },
    SendEnabled(bool),
    Focus(String),
    Blur(String),
    StatusText(String),
    FieldValue { field: String, value: String },
}

pub trait UiSink: Send + Sync {
    fn emit(&self, event: UiEvent);
}

pub type SharedSink = Arc<dyn UiSink>;

/// Keeps every event in order. Used by tests and by callers that render after the fact.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<UiEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<UiEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn toasts(&self) -> Vec<(String, Tone)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Toast { message, tone } => Some((message, tone)),
                _ => None,
            })
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                UiEvent::Alert(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl UiSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Discards everything.
pub struct NullSink;

impl UiSink for NullSink {
    fn emit(&self, _event: UiEvent) {}
}
