//! Headless core of the ask-user panel: answer state, question flow,
//! keyboard navigation, submission gating and response formatting.

pub mod error;
pub mod flow;
pub mod keyboard;
pub mod question;
pub mod response;
pub mod selection;
pub mod session;
pub mod submit;

pub use error::{ConfigError, DeliveryError, SubmitError};
pub use flow::{ActiveTab, FlowController, SelectOutcome, TabDirection};
pub use keyboard::{FocusLayout, FocusTarget, Key, KeyboardNavigator, NavigationAction};
pub use question::{FlowVariant, Question, QuestionBatch, QuestionOption};
pub use response::format_response;
pub use selection::{AnswerStore, SelectionState};
pub use session::{Effect, ResponseSink, Session, SessionSnapshot, ViewMode};
