//! Per-invocation log capture.
//!
//! A capture buffer is bound to one span. Every event emitted inside that
//! span (on any thread, in any task instrumented with it) is formatted and
//! appended to the buffer; events outside it are never seen. Two concurrent
//! calls therefore never share lines, even though both attach to the same
//! process-wide subscriber.

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt::{self, Write as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::Id;
use tracing::{Event, Span, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

type Buffer = Arc<Mutex<String>>;

#[derive(Default)]
struct CaptureRegistry {
    buffers: RwLock<HashMap<Id, Buffer>>,
    active: AtomicUsize,
}

impl CaptureRegistry {
    fn attach(&self, id: Id, buffer: Buffer) {
        if self.buffers.write().insert(id, buffer).is_none() {
            self.active.fetch_add(1, Ordering::Release);
        }
    }

    fn detach(&self, id: &Id) {
        if self.buffers.write().remove(id).is_some() {
            self.active.fetch_sub(1, Ordering::Release);
        }
    }

    // Span ids are recycled once a span closes, so only remove the entry if
    // it still holds this guard's buffer.
    fn detach_buffer(&self, id: &Id, buffer: &Buffer) {
        let mut buffers = self.buffers.write();
        if buffers.get(id).is_some_and(|b| Arc::ptr_eq(b, buffer)) {
            buffers.remove(id);
            self.active.fetch_sub(1, Ordering::Release);
        }
    }

    fn is_idle(&self) -> bool {
        self.active.load(Ordering::Acquire) == 0
    }
}

/// Handle for capturing the log output of individual calls.
///
/// Cloning is cheap; clones share the same set of buffers. Install the
/// matching [`CaptureLayer`] (from [`layer`](Self::layer)) on the subscriber,
/// then open one [`CaptureGuard`] per call with [`begin`](Self::begin).
#[derive(Clone, Default)]
pub struct LogCapture {
    registry: Arc<CaptureRegistry>,
}

impl LogCapture {
    /// Create a handle with no active captures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber layer feeding this handle's buffers.
    pub fn layer(&self) -> CaptureLayer {
        CaptureLayer {
            registry: self.registry.clone(),
        }
    }

    /// Start capturing everything logged inside `span`.
    ///
    /// A disabled span (no subscriber, or filtered out) yields a guard that
    /// captures nothing.
    pub fn begin(&self, span: &Span) -> CaptureGuard {
        let buffer = Buffer::default();
        let id = span.id();

        if let Some(id) = &id {
            self.registry.attach(id.clone(), buffer.clone());
        }

        CaptureGuard {
            registry: self.registry.clone(),
            id,
            buffer,
        }
    }

    /// Number of captures currently attached.
    pub fn active_captures(&self) -> usize {
        self.registry.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for LogCapture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCapture")
            .field("active", &self.active_captures())
            .finish()
    }
}

/// An attached capture buffer.
///
/// The buffer is detached by [`finish`](Self::finish) or, on any other exit
/// path, when the guard is dropped. Detaching never fails.
#[must_use = "dropping the guard immediately stops the capture"]
pub struct CaptureGuard {
    registry: Arc<CaptureRegistry>,
    id: Option<Id>,
    buffer: Buffer,
}

impl CaptureGuard {
    /// Whether the guard is bound to an enabled span.
    pub fn is_attached(&self) -> bool {
        self.id.is_some()
    }

    /// Detach the buffer and return the captured text.
    pub fn finish(mut self) -> String {
        self.detach();
        std::mem::take(&mut *self.buffer.lock())
    }

    fn detach(&mut self) {
        if let Some(id) = self.id.take() {
            self.registry.detach_buffer(&id, &self.buffer);
        }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("span", &self.id)
            .finish()
    }
}

/// Subscriber layer that routes events into attached capture buffers.
pub struct CaptureLayer {
    registry: Arc<CaptureRegistry>,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if self.registry.is_idle() {
            return;
        }

        let Some(scope) = ctx.event_scope(event) else {
            return;
        };

        // Field Debug impls may log; never format under the registry lock.
        let targets: Vec<Buffer> = {
            let buffers = self.registry.buffers.read();
            scope
                .filter_map(|span| buffers.get(&span.id()).cloned())
                .collect()
        };
        if targets.is_empty() {
            return;
        }

        let line = format_line(event);
        for buffer in targets {
            buffer.lock().push_str(&line);
        }
    }

    fn on_close(&self, id: Id, _ctx: Context<'_, S>) {
        if !self.registry.is_idle() {
            self.registry.detach(&id);
        }
    }
}

/// Format as `<UTC timestamp> - <LEVEL> - <message> [field=value ...]`.
fn format_line(event: &Event<'_>) -> String {
    let mut visitor = LineVisitor::default();
    event.record(&mut visitor);

    format!(
        "{} - {} - {}{}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S,%3f"),
        event.metadata().level(),
        visitor.message,
        visitor.fields,
    )
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}
