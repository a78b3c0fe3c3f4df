use crate::schema::FamilyTag;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Insufficient training data for entity {entity}: {found} point(s), at least 2 required")]
    InsufficientTrainingData { entity: String, found: usize },

    #[error("No predictable data: no entity in the input produced any record")]
    NoPredictableData,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Entity {entity} has more than one {family:?} value for year {year}")]
    DuplicateField {
        entity: String,
        year: i32,
        family: FamilyTag,
    },

    #[error("Record is missing its identity: {0}")]
    MissingIdentity(String),

    #[error("Prediction run cancelled after {processed} entities")]
    Cancelled { processed: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
