use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("please enter a valid number of days")]
    InvalidThreshold,
}
