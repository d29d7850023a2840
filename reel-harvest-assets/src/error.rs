/// Errors that can occur while generating launcher assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid asset name: {0:?}")]
    InvalidName(String),
}

/// Reject names that would escape the output directory or produce an
/// invalid Android resource name.
pub(crate) fn check_name(name: &str) -> Result<(), AssetError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(AssetError::InvalidName(name.to_string()))
    }
}
