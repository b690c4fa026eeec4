use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_conversion_rejects_negatives() {
        assert!(matches!(
            u32_from_i64("points", -1),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(u32_from_i64("points", 30).unwrap(), 30);
    }
}
