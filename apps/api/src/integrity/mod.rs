// Live interview integrity scoring.
// Samples arrive roughly once per second from the capture pipeline; the
// tracker keeps per-interview state until the session is finalized.

pub mod handlers;
pub mod scoring;
pub mod tracker;
