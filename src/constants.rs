//! Application-wide constants for peerlink.
//!
//! Centralizes protocol bounds, timeouts, and polling intervals so they
//! are documented in one place instead of scattered as magic numbers.

use std::time::Duration;

// ============================================================================
// Wire protocol
// ============================================================================

/// Size of the frame length header in bytes (`u32`, big-endian).
pub const FRAME_HEADER_SIZE: usize = 4;

/// Exclusive upper bound on a frame's declared payload length.
///
/// A frame declaring a length of zero or `>= MAX_FRAME_LEN` is a protocol
/// violation and terminates the connection. The bound is checked before any
/// payload bytes are buffered, so a hostile header never causes a large
/// allocation.
pub const MAX_FRAME_LEN: u32 = 1_000_000;

/// Read buffer size for per-peer receive loops (64 KB).
pub const READ_BUF_SIZE: usize = 64 * 1024;

// ============================================================================
// Timeouts
// ============================================================================

/// Default timeout for an outbound dial.
///
/// A dial that neither completes nor fails within this window is reported
/// as `DialFailed` rather than hanging the caller.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded wait for background tasks during shutdown.
///
/// `stop_all()` waits at most this long for each receive loop to observe
/// cancellation; a loop that exceeds the bound is aborted so the process
/// can exit.
pub const SHUTDOWN_WAIT: Duration = Duration::from_secs(3);

/// Delay before retrying after a transient accept error.
///
/// Prevents a tight error loop when `accept()` fails repeatedly
/// (e.g. file-descriptor exhaustion).
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);
