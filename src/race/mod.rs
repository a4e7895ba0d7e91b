// Sat Oct 17 2026 - Alex

pub mod agent;
pub mod classify;
pub mod clock;
pub mod error;
pub mod monitor;
pub mod outcome;
pub mod page;
pub mod submit;
pub mod tokens;

pub use agent::{RaceAgent, Strategy};
pub use classify::{Classification, ResponseClassifier};
pub use clock::{sleep_for, sleep_until, CancelToken, Clock, SystemClock};
pub use error::RaceError;
pub use monitor::{AvailabilityMonitor, IntervalPolicy, MonitorState, PollStatus};
pub use outcome::{RaceOutcome, RaceStatus};
pub use submit::{
    build_payload, FormSubmitter, HttpSubmitter, RetryPolicy, SubmissionEngine, SubmissionResponse,
    SubmitDecision, SubmitError,
};
pub use tokens::{FormTokens, TokenCache};
