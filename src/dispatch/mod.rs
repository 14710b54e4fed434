//! Budgeted, cached, failover-aware search dispatch
//!
//! A [`SearchDispatcher`] owns the result cache, the provider usage ledger
//! and the current query session. Each call to [`SearchDispatcher::run`]
//! yields exactly one [`SearchOutcome`].

mod dispatcher;
mod models;
mod selector;

pub use dispatcher::SearchDispatcher;
pub use models::{
    DispatchOptions, SearchOutcome, SessionSnapshot, DEFAULT_MAX_CALLS_PER_QUERY,
    DEFAULT_MAX_PROVIDER_ATTEMPTS, MIN_RESULT_LENGTH,
};
pub use selector::{LastUse, ProviderSelector, ProviderUsage, UsageLedger};
