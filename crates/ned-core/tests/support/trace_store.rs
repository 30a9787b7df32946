//! Builds a small SQLite trace store on disk for no-mock tests.

#![allow(dead_code)]
// Not every suite uses every fixture.

use std::path::PathBuf;

use rusqlite::{params, Connection};
use tempfile::TempDir;

const SCHEMA: &str = "
    CREATE TABLE systems (id INTEGER PRIMARY KEY, description TEXT);
    CREATE TABLE messages (
        message_id INTEGER PRIMARY KEY,
        system_id INTEGER NOT NULL,
        timestamp REAL NOT NULL
    );
    CREATE TABLE devices (
        device_id INTEGER PRIMARY KEY,
        system_id INTEGER NOT NULL,
        description TEXT,
        send_only INTEGER NOT NULL DEFAULT 0
    );
    CREATE TABLE sources (message_id INTEGER NOT NULL, device_id INTEGER NOT NULL);
    CREATE TABLE presence (message_id INTEGER NOT NULL);
";

const PHONE: i64 = 1;
const GATEWAY: i64 = 2;
const PANEL: i64 = 3;

/// A trace store in a temporary directory plus the values written to it.
pub struct TraceStore {
    _dir: TempDir,
    pub path: PathBuf,
    /// Timestamps of system 1, ascending.
    pub events: Vec<f64>,
    /// System 1 messages sent by devices matching the default globs.
    pub interactions_glob: Vec<f64>,
    /// System 1 messages with presence and a known source.
    pub interactions_all: Vec<f64>,
    /// Timestamps of system 2.
    pub small_events: Vec<f64>,
}

/// System 1: 1 200 messages with 1-6 s gaps; every 25th is sent by a phone
/// or a panel, every 10th otherwise by the gateway. System 2: four
/// messages, no description.
pub fn build() -> TraceStore {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("traces.sqlite");
    let mut conn = Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();

    let tx = conn.transaction().unwrap();
    tx.execute(
        "INSERT INTO systems (id, description) VALUES (1, 'office'), (2, NULL)",
        [],
    )
    .unwrap();
    tx.execute(
        "INSERT INTO devices (device_id, system_id, description) VALUES \
         (?1, 1, 'Alice 3S phone'), (?2, 1, 'Gateway'), (?3, 1, 'F 1.2')",
        params![PHONE, GATEWAY, PANEL],
    )
    .unwrap();

    let mut events = Vec::new();
    let mut interactions_glob = Vec::new();
    let mut interactions_all = Vec::new();
    let mut state: u64 = 0x9e37_79b9;
    let mut t = 1_000_000.0;
    for k in 0..1_200i64 {
        let id = k + 1;
        tx.execute(
            "INSERT INTO messages (message_id, system_id, timestamp) VALUES (?1, 1, ?2)",
            params![id, t],
        )
        .unwrap();
        events.push(t);

        let device = if k % 25 == 0 {
            Some(if k % 50 == 0 { PHONE } else { PANEL })
        } else if k % 10 == 0 {
            Some(GATEWAY)
        } else {
            None
        };
        if let Some(device) = device {
            tx.execute(
                "INSERT INTO sources (message_id, device_id) VALUES (?1, ?2)",
                params![id, device],
            )
            .unwrap();
            tx.execute("INSERT INTO presence (message_id) VALUES (?1)", params![id])
                .unwrap();
            interactions_all.push(t);
            if device != GATEWAY {
                interactions_glob.push(t);
            }
        }

        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        t += 1.0 + ((state >> 33) % 6) as f64;
    }

    let small_events = vec![10.0, 20.0, 30.0, 40.0];
    for (k, ts) in small_events.iter().enumerate() {
        tx.execute(
            "INSERT INTO messages (message_id, system_id, timestamp) VALUES (?1, 2, ?2)",
            params![10_000 + k as i64, ts],
        )
        .unwrap();
    }
    tx.commit().unwrap();
    drop(conn);

    TraceStore {
        _dir: dir,
        path,
        events,
        interactions_glob,
        interactions_all,
        small_events,
    }
}
