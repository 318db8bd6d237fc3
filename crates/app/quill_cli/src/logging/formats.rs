use std::io::Write;

use flexi_logger::DeferredNow;
use log::{Level, Record};

/// Plain messages for `info`, level-prefixed lines for everything else.
pub fn cli_format(w: &mut dyn Write, _now: &mut DeferredNow, record: &Record) -> std::io::Result<()> {
    match record.level() {
        Level::Info => write!(w, "{}", record.args()),
        level => write!(w, "{level}: {}", record.args()),
    }
}
