use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("record {name:?}: invalid {field} value {value}")]
    BadValue {
        name:  String,
        field: &'static str,
        value: f32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ParamsResult<T> = Result<T, ParamsError>;
