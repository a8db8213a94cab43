use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta};
use lockhist_host::memory::MemoryHost;
use serde_json::{json, Value};

const CHANGES: [(&str, &str); 6] = [
    ("Alice", "Home"),
    ("Front Door", "Lock"),
    ("Bob", "Away"),
    ("Back Door", "Unlock"),
    ("Bob", "Home"),
    ("Alarm", "Triggered"),
];

/// Memory host seeded with a short history that records a new change on every
/// tick of the interval.
pub fn start(interval: Duration) -> MemoryHost {
    let host = MemoryHost::new(seed(Local::now()));

    let recorder = host.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;

        for (tagno, (name, state)) in CHANGES.iter().cycle().enumerate() {
            ticker.tick().await;

            tracing::debug!("recording demo change {} {}", name, state);
            recorder.record(entry(tagno, name, state, Local::now()));
        }
    });

    host
}

fn seed(now: DateTime<Local>) -> Vec<Value> {
    CHANGES
        .iter()
        .take(3)
        .enumerate()
        .map(|(index, (name, state))| {
            let minutes = 15 * (index as i64 + 1);
            entry(index, name, state, now - TimeDelta::minutes(minutes))
        })
        .collect()
}

fn entry(tagno: usize, name: &str, state: &str, date: DateTime<Local>) -> Value {
    json!({
        "tagno": tagno,
        "name": name,
        "state": state,
        "date": date.format("%d/%m/%Y %H:%M:%S").to_string(),
        "timestamp": date.timestamp(),
    })
}
