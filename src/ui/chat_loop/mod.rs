//! Main chat event loop
//!
//! Terminal events are read on a background task and forwarded over a
//! channel. The loop redraws on a fixed frame tick so the loading pulse and
//! smooth scrolling keep moving while requests are in flight, and applies
//! inference outcomes in the order they arrive.

mod lifecycle;

use std::{error::Error, sync::Arc, time::Duration};

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{HttpInference, InferenceBackend};
use crate::core::config::Config;
use crate::core::inference_service::{InferenceOutcome, InferenceService};
use crate::core::panel::ChatPanel;
use crate::ui::renderer::ui;
use crate::ui::state::ChatView;
use crate::ui::theme::Theme;
use crate::utils::logging::LoggingState;

use self::lifecycle::{restore_terminal, setup_terminal};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

pub async fn run_chat(config: Config, transcript: LoggingState) -> Result<(), Box<dyn Error>> {
    let client = reqwest::Client::builder().build()?;
    let backend: Arc<dyn InferenceBackend> =
        Arc::new(HttpInference::from_config(client, &config));

    if let Err(err) = transcript.log_session_start() {
        warn!(error = %err, "Failed to write transcript header");
    }
    let panel = ChatPanel::with_transcript(config.mode(), transcript);
    let mut view = ChatView::new(panel, Theme::dark());
    let (service, mut outcomes) = InferenceService::new();

    info!(
        mode = config.mode().as_str(),
        ask_url = %config.ask_url(),
        image_data_url = %config.image_data_url(),
        "Chat session starting"
    );

    let mut terminal = setup_terminal()?;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let _reader = spawn_event_reader(event_tx);
    let mut frame_tick = tokio::time::interval(FRAME_INTERVAL);

    let result: Result<(), Box<dyn Error>> = loop {
        if let Err(err) = terminal.draw(|f| ui(f, &mut view)) {
            break Err(err.into());
        }
        if view.exit_requested {
            break Ok(());
        }

        tokio::select! {
            Some(ev) = event_rx.recv() => {
                handle_ui_event(&mut view, &service, &backend, ev);
                while let Ok(ev) = event_rx.try_recv() {
                    handle_ui_event(&mut view, &service, &backend, ev);
                }
            }
            Some((outcome, request_id)) = outcomes.recv() => {
                apply_outcome(&mut view, outcome, request_id);
                while let Ok((outcome, request_id)) = outcomes.try_recv() {
                    apply_outcome(&mut view, outcome, request_id);
                }
            }
            _ = frame_tick.tick() => {}
        }
    };

    service.shutdown();
    // The reader exits on its next poll once the channel is closed
    drop(event_rx);
    restore_terminal(&mut terminal)?;
    info!("Chat session ended");
    result
}

fn handle_ui_event(
    view: &mut ChatView,
    service: &InferenceService,
    backend: &Arc<dyn InferenceBackend>,
    ev: UiEvent,
) {
    match ev {
        UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            if let Some(payload) = view.handle_key(key) {
                debug!(request_id = payload.request_id, "Submitting");
                service.spawn_request(Arc::clone(backend), payload);
            }
        }
        UiEvent::Crossterm(Event::Mouse(mouse)) => view.handle_mouse(mouse),
        UiEvent::Crossterm(Event::Paste(text)) => view.handle_paste(&text),
        UiEvent::Crossterm(_) => {}
    }
}

fn apply_outcome(view: &mut ChatView, outcome: InferenceOutcome, request_id: u64) {
    view.panel.complete(request_id, outcome);
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || loop {
        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => continue,
            },
            Ok(false) => {
                if event_tx.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    })
}
