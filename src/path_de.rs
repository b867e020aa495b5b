use serde::de::DeserializeOwned;

use crate::error::GenError;

/// Deserialize with JSON-path context in error messages. The whole input must
/// be consumed; trailing text is an error.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, GenError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let value = match serde_path_to_error::deserialize::<_, T>(&mut *de) {
        Ok(v) => v,
        Err(err) => {
            let path = err.path().to_string();
            let inner = err.into_inner();
            return Err(GenError::Parse(if path == "." {
                inner.to_string()
            } else {
                format!("at JSON path {path} → {inner}")
            }));
        }
    };
    de.end().map_err(|err| GenError::Parse(err.to_string()))?;
    Ok(value)
}
