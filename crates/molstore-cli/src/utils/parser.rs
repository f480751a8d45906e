use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid vector '{0}'. Expected three comma separated numbers (e.g., '1.0,0,-2.5').")]
    InvalidVector(String),

    #[error("Invalid setting '{0}'. Expected KEY=VALUE.")]
    InvalidKeyValue(String),

    #[error("Component '{component}' cannot be empty in '{value}'.")]
    EmptyComponent {
        component: &'static str,
        value: String,
    },
}

/// Parses a vector written as `x,y,z`.
pub fn parse_vector(s: &str) -> Result<Vector3<f64>, ParseError> {
    let invalid = || ParseError::InvalidVector(s.to_string());
    let components: Vec<f64> = s
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<_, _>>()?;
    match components.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(invalid()),
    }
}

/// Splits a `key=value` setting at the first `=`.
pub fn parse_key_value(s: &str) -> Result<(&str, &str), ParseError> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidKeyValue(s.to_string()))?;
    let (key, value) = (key.trim(), value.trim());
    if key.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "key",
            value: s.to_string(),
        });
    }
    if value.is_empty() {
        return Err(ParseError::EmptyComponent {
            component: "value",
            value: s.to_string(),
        });
    }
    Ok((key, value))
}
