pub mod backend;
pub mod error;
pub mod plan;
pub mod session;
pub mod state;
pub mod stimulus;
pub mod trial;

pub use backend::{AudioDecoder, Player, Presenter, Recorder, StartSignal};
pub use error::SessionError;
pub use plan::{PlannedTrial, TrialPlan};
pub use session::{SessionConfig, embedded_numeric};
pub use state::SessionState;
pub use stimulus::{Clip, StimulusItem, Voice, normalize_word};
pub use trial::{Capture, NamedCapture, SessionResult, TrialRecord};
