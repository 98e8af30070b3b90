#[cfg(feature = "tracing")]
pub(crate) const TARGET: &str = "tycho_vote_pipe";

#[cfg(feature = "tracing")]
macro_rules! pipe_log_delivery {
    ($depth:expr, $msg:expr, $hash:expr, $outcome:expr) => {
        tracing::debug!(
            target: $crate::log::TARGET,
            depth = $depth,
            msg_hash = %$hash,
            src = %$msg.src,
            dst = %$msg.dst,
            value = ?$msg.value,
            outcome = %$outcome,
            "delivered"
        )
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! pipe_log_delivery {
    ($($tt:tt)*) => {{}};
}

#[cfg(feature = "tracing")]
macro_rules! pipe_log_rejected {
    ($depth:expr, $msg:expr, $hash:expr, $exit_code:expr) => {
        tracing::warn!(
            target: $crate::log::TARGET,
            depth = $depth,
            msg_hash = %$hash,
            src = %$msg.src,
            dst = %$msg.dst,
            exit_code = $exit_code,
            "rejected"
        )
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! pipe_log_rejected {
    ($($tt:tt)*) => {{}};
}

#[cfg(feature = "tracing")]
macro_rules! pipe_log_trace {
    ($($tt:tt)*) => {
        tracing::trace!(
            target: $crate::log::TARGET,
            $($tt)*
        )
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! pipe_log_trace {
    ($($tt:tt)*) => {{}};
}
