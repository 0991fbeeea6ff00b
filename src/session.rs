//! Per-user guided dialogues for multi-step commands.

mod engine;
mod state;
mod store;
mod transition;

pub use engine::SessionEngine;
pub use state::{IssueNew, ReleaseDraft, ReleaseNew, Session, Step};
pub use store::{InMemorySessionStore, SessionStore};
pub use transition::{
    ACCEPT, EXIT_ACK, Effect, SUMMARY_PENDING, SUMMARY_READY, Transition, prompt,
    resume_with_summary, transition,
};
