mod controller;
mod state;
mod timer;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use controller::SessionController;
pub use state::{SessionOutcome, SessionPhase, Step};
pub use timer::{Countdown, TimerHandle, TimerPurpose};
pub use view::{SessionProgress, SessionView};
pub use workflow::{LessonLoopResult, LessonLoopService, SessionInput};
