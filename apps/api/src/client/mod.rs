//! Client side of the tailoring session: the state machine the `tailor` binary
//! drives and the HTTP client it talks to the API with.

pub mod api;
pub mod state;

pub use api::{ApiClient, ClientError};
pub use state::{reduce, Action, SessionState, UploadedDocument};
