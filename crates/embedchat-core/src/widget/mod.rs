//! Widget state machine.
//!
//! Visibility (closed/open) and activity (idle/sending) are tracked
//! separately; an error from the last exchange is an annotation on idle,
//! not a blocking state.

mod machine;
mod shared;
mod state;

pub use machine::{ChatWidget, ExchangeId, PendingExchange, SessionMode, SubmitOutcome};
pub use shared::{SharedWidget, WidgetSnapshot};
pub use state::{Activity, Affordances, Visibility, WidgetPhase};
