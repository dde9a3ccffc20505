#![allow(dead_code)]

use std::{
    collections::VecDeque,
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use pitherm_lib::{
    db::Database,
    sensor::{FrameSource, RawFrame, SensorError},
};

#[derive(Debug, Clone)]
pub enum Scripted {
    Frame(String),
    Unreadable,
}

/// Hands out frames in order, then repeats `fallback` forever.
pub struct ScriptedSource {
    frames: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    reads: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(frames: Vec<Scripted>, fallback: Scripted) -> Arc<Self> {
        Arc::new(Self {
            frames: Mutex::new(frames.into()),
            fallback,
            reads: AtomicUsize::new(0),
        })
    }

    pub fn constant(millidegrees: i64) -> Arc<Self> {
        Self::new(Vec::new(), good(millidegrees))
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&self) -> Result<RawFrame, SensorError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let next = self
            .frames
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            Scripted::Frame(text) => Ok(RawFrame::parse(text)),
            Scripted::Unreadable => Err(SensorError::Io {
                path: PathBuf::from("/fake/w1_slave"),
                source: io::Error::new(io::ErrorKind::NotFound, "device vanished"),
            }),
        }
    }

    fn describe(&self) -> String {
        "scripted sensor".to_string()
    }
}

pub fn good(millidegrees: i64) -> Scripted {
    Scripted::Frame(format!(
        "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t={millidegrees}\n"
    ))
}

pub fn crc_failure(millidegrees: i64) -> Scripted {
    Scripted::Frame(format!(
        "72 01 4b 46 7f ff 0e 10 57 : crc=00 NO\n72 01 4b 46 7f ff 0e 10 57 t={millidegrees}\n"
    ))
}

pub fn open_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().join("piTemps.db")).unwrap();
    (dir, db)
}
