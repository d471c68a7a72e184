use thiserror::Error;

use urb_dynamics::DynamicsError;
use urb_nav::NavError;
use urb_params::ParamsError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("navigation error: {0}")]
    Nav(#[from] NavError),

    #[error("parameter database error: {0}")]
    Params(#[from] ParamsError),

    #[error("vehicle dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),
}

pub type SimResult<T> = Result<T, SimError>;
