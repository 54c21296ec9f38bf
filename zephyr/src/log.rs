use std::io::{self, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

const LOG_CAPACITY: usize = 20;

struct SyncRecord {
    timestamp: Instant,
    level: Level,
    content: String,
}

/// Receiving end of the logger, drained from a non critical thread
pub struct LogSink {
    receiver: Receiver<SyncRecord>,
    start: Instant,
}

/// Forwards records to the sink without blocking the logging thread.
/// Records are dropped while the sink is full.
pub struct Logger {
    sender: SyncSender<SyncRecord>,
    level: LevelFilter,
}

impl Logger {
    pub fn new(level: LevelFilter) -> (Self, LogSink) {
        let (sender, receiver) = sync_channel(LOG_CAPACITY);
        let sink = LogSink {
            receiver,
            start: Instant::now(),
        };
        (
            Self {
                sender,
                level,
            },
            sink,
        )
    }

    /// Install the logger globally
    pub fn init(level: LevelFilter) -> LogSink {
        let (logger, sink) = Self::new(level);
        let _ = log::set_logger(Box::leak(Box::new(logger))).map(|()| log::set_max_level(level));
        sink
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = self.sender.try_send(SyncRecord {
                timestamp: Instant::now(),
                content: std::fmt::format(*record.args()),
                level: record.level(),
            });
        }
    }

    fn flush(&self) {}
}

impl LogSink {
    pub fn handle_logs(&mut self) {
        let stdout = io::stdout();
        let _ = self.write_logs(&mut stdout.lock());
    }

    /// Write every pending record, returns how many were written
    pub fn write_logs<W: Write>(&mut self, out: &mut W) -> io::Result<usize> {
        let mut count = 0;
        for record in self.receiver.try_iter() {
            writeln!(
                out,
                "[{:<9.5}] {:<5}: {}",
                record.timestamp.duration_since(self.start).as_secs_f32(),
                record.level,
                record.content
            )?;
            count += 1;
        }
        Ok(count)
    }
}
