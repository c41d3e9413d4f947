//! Keystroke debouncing for search input.
//!
//! The engine itself never debounces — [`crate::SearchEngine::search`]
//! expects a query that has already gone quiet. This adaptor is for
//! callers wiring a raw input stream to the engine.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Forward only the last value seen once `quiet` has elapsed with no newer
/// value arriving.
///
/// When `input` closes, a held trailing value is flushed immediately and
/// the returned receiver closes.
pub fn debounce<T: Send + 'static>(
    mut input: mpsc::Receiver<T>,
    quiet: Duration,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        let mut held: Option<T> = None;
        let mut deadline = Instant::now();
        loop {
            let next = if held.is_some() {
                tokio::select! {
                    value = input.recv() => Some(value),
                    () = sleep_until(deadline) => None,
                }
            } else {
                Some(input.recv().await)
            };
            match next {
                // Quiet period elapsed — flush.
                None => {
                    if let Some(value) = held.take() {
                        if tx.send(value).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Some(value)) => {
                    held = Some(value);
                    deadline = Instant::now() + quiet;
                }
                // Input closed — flush any trailing value and stop.
                Some(None) => {
                    if let Some(value) = held.take() {
                        let _ = tx.send(value).await;
                    }
                    return;
                }
            }
        }
    });
    rx
}
