//! Formdeck remote: reqwest-backed implementations of the collaborator
//! seams defined in `formdeck-core`.

pub mod config;
pub mod forms;
pub mod inference;
pub mod uploads;

pub use config::RemoteConfig;
pub use forms::HttpFormRepository;
pub use inference::HttpInferenceClient;
pub use uploads::HttpUploadBroker;
