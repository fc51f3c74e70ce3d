//! Structured logging conventions for scrivo.
//!
//! Events carry `subsystem` ("api", "db", "auth"), `component` and `op`
//! fields. The per-request span opened by the API declares the entity fields
//! below as empty and handlers fill them in once known.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, refused or throttled request |
//! | INFO  | Lifecycle events (startup, shutdown), completed writes |
//! | DEBUG | Decision points, access checks, config choices |
//! | TRACE | Per-item iteration |

/// Note id being operated on.
pub const NOTE_ID: &str = "note_id";

/// Acting user id, recorded once the bearer token resolves.
pub const USER_ID: &str = "user_id";

