//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the process-wide subscriber writing to stdout
//! - Render every event with the current request context appended
//! - Map the service severities (debug, info, error, exception) onto
//!   tracing levels
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Text format for development, JSON format for machine parsing
//! - Context is read when an event is formatted, not when keys are bound
//! - One `write_all` per record so concurrent requests never interleave
//!   inside a line

use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt::{self, Write as _};

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::observability::context::{self, Fields};

/// Event field carrying the rendered error of an exception record.
pub const EXCEPTION_FIELD: &str = "exception";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Error,
    /// Error level plus a rendered error trace.
    Exception,
}

impl Severity {
    /// The tracing level records of this severity are emitted at.
    pub fn level(self) -> Level {
        match self {
            Severity::Debug => Level::DEBUG,
            Severity::Info => Level::INFO,
            Severity::Error | Severity::Exception => Level::ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Error => "error",
            Severity::Exception => "exception",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Emit `message` at a severity chosen at runtime.
pub fn emit(severity: Severity, message: fmt::Arguments<'_>) {
    match severity {
        Severity::Debug => tracing::debug!("{message}"),
        Severity::Info => tracing::info!("{message}"),
        Severity::Error => tracing::error!("{message}"),
        Severity::Exception => {
            let rendered = with_backtrace(message.to_string());
            tracing::error!(exception = %rendered, "{message}")
        }
    }
}

/// Log `error` at exception severity together with its rendered trace.
pub fn exception<E>(error: &E)
where
    E: StdError + 'static,
{
    let rendered = render_exception(error);
    tracing::error!(exception = %rendered, "{error}");
}

/// Type name, message, source chain and (when enabled) a backtrace.
///
/// The backtrace is captured at the logging site and only present when
/// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enable capturing.
pub fn render_exception<E>(error: &E) -> String
where
    E: StdError + 'static,
{
    let mut out = format!("{}: {}", std::any::type_name::<E>(), error);
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = write!(out, "\nCaused by: {cause}");
        source = cause.source();
    }
    with_backtrace(out)
}

/// Log a panic caught at the handler boundary at exception severity.
///
/// The backtrace, when enabled, is the one of the recovering frame; the
/// default panic hook still reports the panicking location.
pub fn caught_panic(payload: &(dyn Any + Send)) {
    let message = panic_message(payload);
    let rendered = with_backtrace(format!("panic: {message}"));
    tracing::error!(exception = %rendered, "{message}");
}

/// Text of a panic payload raised by `panic!` with a literal or format string.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

fn with_backtrace(mut out: String) -> String {
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = write!(out, "\nStack backtrace:\n{backtrace}");
    }
    out
}

/// Build the subscriber used by the service, writing through `make_writer`.
pub fn subscriber<W>(config: &LoggingConfig, make_writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(EnvFilter::new(config.filter_directive()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(make_writer)
                .event_format(ContextualFormat::new(config.format)),
        )
}

/// Install the stdout subscriber as the global default.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    subscriber(config, std::io::stdout).try_init()
}

/// Event formatter that appends the bound request context to each record.
#[derive(Debug, Clone)]
pub struct ContextualFormat {
    format: LogFormat,
    timer: SystemTime,
}

impl ContextualFormat {
    pub fn new(format: LogFormat) -> Self {
        Self {
            format,
            timer: SystemTime,
        }
    }

    fn write_text(&self, writer: &mut Writer<'_>, record: &Record) -> fmt::Result {
        self.timer.format_time(writer)?;
        write!(writer, " [{:<9}] {}", record.severity, record.message)?;

        let mut trace = None;
        for (key, value) in &record.fields {
            match value {
                Value::String(rendered) if key == EXCEPTION_FIELD => trace = Some(rendered),
                _ => write_pair(writer, key, value)?,
            }
        }
        for (key, value) in &record.context {
            write_pair(writer, key, value)?;
        }
        writeln!(writer)?;

        if let Some(trace) = trace {
            for line in trace.lines() {
                writeln!(writer, "    {line}")?;
            }
        }
        Ok(())
    }

    fn write_json(&self, writer: &mut Writer<'_>, record: &Record) -> fmt::Result {
        let mut timestamp = String::new();
        self.timer.format_time(&mut Writer::new(&mut timestamp))?;

        let mut object = Map::new();
        object.insert("timestamp".into(), Value::String(timestamp));
        object.insert("level".into(), Value::from(record.severity));
        object.insert("message".into(), Value::String(record.message.clone()));
        for (key, value) in record.context.iter().chain(&record.fields) {
            object.insert(key.clone(), value.clone());
        }

        let line = serde_json::to_string(&Value::Object(object)).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

impl<S, N> FormatEvent<S, N> for ContextualFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let is_exception = collector.fields.contains_key(EXCEPTION_FIELD);
        let record = Record {
            severity: severity_label(event.metadata().level(), is_exception),
            message: collector.message,
            fields: collector.fields,
            context: context::snapshot(),
        };

        match self.format {
            LogFormat::Text => self.write_text(&mut writer, &record),
            LogFormat::Json => self.write_json(&mut writer, &record),
        }
    }
}

/// A single event ready to be rendered.
struct Record {
    severity: &'static str,
    message: String,
    fields: Fields,
    context: Fields,
}

fn severity_label(level: &Level, is_exception: bool) -> &'static str {
    if *level == Level::ERROR {
        if is_exception {
            Severity::Exception.as_str()
        } else {
            Severity::Error.as_str()
        }
    } else if *level == Level::WARN {
        "warning"
    } else if *level == Level::INFO {
        Severity::Info.as_str()
    } else if *level == Level::DEBUG {
        Severity::Debug.as_str()
    } else {
        "trace"
    }
}

fn write_pair(writer: &mut Writer<'_>, key: &str, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) if is_bare(s) => write!(writer, " {key}={s}"),
        Value::String(s) => write!(writer, " {key}={s:?}"),
        other => write!(writer, " {key}={other}"),
    }
}

fn is_bare(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(|c| c.is_whitespace() || c == '"' || c == '=')
}

/// Collects the message and the structured fields of an event.
#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Fields,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name.starts_with("log.") {
            return;
        }
        self.fields.insert(name.to_owned(), value);
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn StdError + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.insert(field, Value::from(format!("{value:?}")));
        }
    }
}
