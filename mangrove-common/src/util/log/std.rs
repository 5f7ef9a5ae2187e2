// Copyright (C) 2024-2026 Mangrove Labs
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use std::io::Write;
use std::{env, io, thread};

use chrono::prelude::*;
use lazy_static::lazy_static;
use slog::{Drain, Level, Logger, OwnedKVList, Record, KV};
use slog_term::{Decorator, RecordDecorator, Serializer};

lazy_static! {
    pub static ref LOGGER: Logger = make_logger();
    static ref LOGLEVEL: Level = inner_get_loglevel();
}

struct TermFormat<D: Decorator> {
    decorator: D,
    debug: bool,
}

fn print_msg_header(rd: &mut dyn RecordDecorator, record: &Record, debug: bool) -> io::Result<bool> {
    rd.start_level()?;
    write!(rd, "{}", record.level().as_short_str())?;

    rd.start_whitespace()?;
    write!(rd, " ")?;

    rd.start_timestamp()?;
    let now: DateTime<Local> = Local::now();
    write!(rd, "[{}]", now.format("%Y-%m-%d %H:%M:%S%.6f"))?;

    // source location and thread are debug-only detail
    if debug {
        write!(rd, " [{}:{}]", record.file(), record.line())?;
        write!(
            rd,
            " [{}]",
            thread::current().name().unwrap_or("unnamed-thread")
        )?;
    }

    rd.start_whitespace()?;
    write!(rd, " ")?;

    rd.start_msg()?;
    write!(rd, "{}", record.msg())?;
    Ok(true)
}

impl<D: Decorator> TermFormat<D> {
    fn format_full(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        self.decorator.with_record(record, values, |decorator| {
            let comma_needed = print_msg_header(decorator, record, self.debug)?;
            {
                let mut serializer = Serializer::new(decorator, comma_needed, false);
                record.kv().serialize(record, &mut serializer)?;
                values.serialize(record, &mut serializer)?;
                serializer.finish()?;
            }

            decorator.start_whitespace()?;
            writeln!(decorator)?;
            decorator.flush()?;
            Ok(())
        })
    }
}

impl<D: Decorator> Drain for TermFormat<D> {
    type Ok = ();
    type Err = io::Error;

    fn log(&self, record: &Record, values: &OwnedKVList) -> io::Result<()> {
        self.format_full(record, values)
    }
}

#[cfg(feature = "slog_json")]
fn make_json_logger() -> Logger {
    use std::sync::Mutex;

    use slog::FnValue;

    let def_keys = o!("file" => FnValue(move |info| {
                          info.file()
                      }),
                      "line" => FnValue(move |info| {
                          info.line()
                      }),
                      "thread" => FnValue(move |_| {
                          match thread::current().name() {
                              None => "unnamed-thread".to_string(),
                              Some(name) => name.to_string(),
                          }
                      }),
    );

    let drain = Mutex::new(slog_json::Json::default(std::io::stderr()));
    let filtered_drain = slog::LevelFilter::new(drain, get_loglevel()).ignore_res();
    Logger::root(filtered_drain, def_keys)
}

#[cfg(not(feature = "slog_json"))]
fn make_json_logger() -> Logger {
    panic!("Tried to construct JSON logger, but the slog_json feature is not enabled.")
}

fn make_logger() -> Logger {
    if env::var("MANGROVE_LOG_JSON") == Ok("1".into()) {
        make_json_logger()
    } else {
        let debug = env::var("MANGROVE_LOG_DEBUG") == Ok("1".into());
        let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
        let drain = TermFormat { decorator, debug };
        let filtered_drain = slog::LevelFilter::new(drain, get_loglevel()).ignore_res();
        Logger::root(filtered_drain, o!())
    }
}

fn inner_get_loglevel() -> Level {
    if env::var("MANGROVE_LOG_TRACE") == Ok("1".into()) {
        Level::Trace
    } else if env::var("MANGROVE_LOG_DEBUG") == Ok("1".into()) {
        Level::Debug
    } else {
        Level::Info
    }
}

pub fn get_loglevel() -> Level {
    *LOGLEVEL
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => ({
        let cur_level = $crate::util::log::get_loglevel();
        if slog::Level::Trace.is_at_least(cur_level) {
            slog_trace!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => ({
        let cur_level = $crate::util::log::get_loglevel();
        if slog::Level::Debug.is_at_least(cur_level) {
            slog_debug!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => ({
        let cur_level = $crate::util::log::get_loglevel();
        if slog::Level::Info.is_at_least(cur_level) {
            slog_info!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ({
        let cur_level = $crate::util::log::get_loglevel();
        if slog::Level::Warning.is_at_least(cur_level) {
            slog_warn!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ({
        let cur_level = $crate::util::log::get_loglevel();
        if slog::Level::Error.is_at_least(cur_level) {
            slog_error!($crate::util::log::LOGGER, $($arg)*)
        }
    })
}
