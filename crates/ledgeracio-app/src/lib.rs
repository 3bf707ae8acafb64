pub mod app;
pub mod approval;
pub mod authority;
pub mod chunks;
pub mod config;
pub mod gate;
pub mod sign;
pub mod upload;

pub use app::{LedgeracioApp, Reply};
pub use approval::{ApprovalStateMachine, Decision, ReviewStep, Screen, UiEvent};
pub use config::AppConfig;
pub use gate::check_nomination_allowed;
