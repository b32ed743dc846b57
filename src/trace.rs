//! Stage spans and counters for the decode/NMS pipeline.
//!
//! Stages (`process`, `decode`, `nms`, `fast_postprocess`) open info spans and
//! report their totals as info events. Per-assignment counts go out at debug
//! level so `yolopost=info` stays one line per stage. Without the `tracing`
//! feature every macro expands to a no-op and field values are still
//! evaluated, so call sites need no `cfg`.

#[cfg(feature = "tracing")]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        tracing::info_span!($name $(, $($field)*)?)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_span {
    ($name:expr $(, $($field:tt)*)?) => {
        $crate::trace::StageGuard
    };
}

/// Stage totals, at info level.
#[cfg(feature = "tracing")]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::info!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

/// Per-assignment counters, at debug level.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        tracing::debug!(name: $name, $($key = $value),+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        let _ = ($($value,)+);
    };
}

pub(crate) use trace_debug;
pub(crate) use trace_event;
pub(crate) use trace_span;

/// Stand-in for an entered span when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub struct StageGuard;

#[cfg(not(feature = "tracing"))]
impl StageGuard {
    #[inline]
    pub fn entered(self) -> Self {
        self
    }
}
