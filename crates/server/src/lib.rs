//! # cerfa-server
//!
//! HTTP boundary of the CERFA 13757 fill service
//!

mod api;
pub mod config;
pub mod error;

pub use api::{
    app, detect_fields, fill_cerfa, health_check, root, test_mapping, AppState,
    DetectFieldsResponse, FieldInfo, MappingResponse, DEFAULT_MAX_UPLOAD_BYTES, FILLED_FILENAME,
};
pub use config::{Config, ConfigError};
pub use error::{AppError, ErrorResponse};
