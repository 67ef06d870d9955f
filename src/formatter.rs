//! Log line formatter stamping every event with wall-clock time and the simulation frame.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields};
use tracing_subscriber::registry::LookupSpan;

static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Frames are shown as four hex digits and wrap around.
const FRAME_DISPLAY_MASK: u64 = 0xFFFF;

const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second].[subsecond digits:4]");

/// `12:00:01.2345 0x01A4  INFO span{..}: target: message fields`
pub struct FrameFormatter;

impl<S, N> FormatEvent<S, N> for FrameFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        let timestamp = OffsetDateTime::now_utc()
            .format(&TIMESTAMP_FORMAT)
            .map_err(|_| fmt::Error)?;
        dimmed(&mut writer, ansi, format_args!("{timestamp} 0x{:04X}", frame() & FRAME_DISPLAY_MASK))?;
        writer.write_char(' ')?;

        level_label(&mut writer, ansi, meta.level())?;
        writer.write_char(' ')?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.metadata().name())?;
                if let Some(fields) = span.extensions().get::<FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{fields}}}")?;
                    }
                }
                writer.write_str(": ")?;
            }
        }

        dimmed(&mut writer, ansi, format_args!("{}:", meta.target()))?;
        writer.write_char(' ')?;
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_label(writer: &mut Writer<'_>, ansi: bool, level: &Level) -> fmt::Result {
    let (color, label) = match *level {
        Level::TRACE => ("35", "TRACE"),
        Level::DEBUG => ("34", "DEBUG"),
        Level::INFO => ("32", " INFO"),
        Level::WARN => ("33", " WARN"),
        Level::ERROR => ("31", "ERROR"),
    };
    if ansi {
        write!(writer, "\x1b[{color}m{label}\x1b[0m")
    } else {
        writer.write_str(label)
    }
}

fn dimmed(writer: &mut Writer<'_>, ansi: bool, text: fmt::Arguments<'_>) -> fmt::Result {
    if ansi {
        write!(writer, "\x1b[2m{text}\x1b[0m")
    } else {
        writer.write_fmt(text)
    }
}

/// Advances the frame counter; called once per simulated frame.
pub fn advance_frame() {
    FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
}

pub fn frame() -> u64 {
    FRAME_COUNTER.load(Ordering::Relaxed)
}
