use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SizerError {
    #[error("ESTIMATED sizing requires estimated_records_per_item")]
    MissingEstimate,
    #[error("DYNAMIC sizing requires a record counter")]
    MissingRecordCounter,
    #[error("record counter failed: {0}")]
    RecordCounter(String),
}
