// Canonical binary encoding. Everything hashed by the chain goes through here so
// the same logical value always produces the same bytes.
use crate::error::{BlockchainError, Result};

/// Encode with bincode's standard configuration (varint lengths, fixed field order)
pub fn serialize<T: bincode::Encode>(data: &T) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    bincode::encode_to_vec(data, config)
        .map_err(|e| BlockchainError::Serialization(format!("Serialization failed: {e}")))
}

/// Decode a value produced by [`serialize`]; trailing bytes are rejected
pub fn deserialize<T>(bytes: &[u8]) -> Result<T>
where
    T: bincode::Decode<()>,
{
    let config = bincode::config::standard();
    let (data, read) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| BlockchainError::Serialization(format!("Deserialization failed: {e}")))?;
    if read != bytes.len() {
        return Err(BlockchainError::Serialization(format!(
            "Trailing bytes after value: consumed {read} of {}",
            bytes.len()
        )));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, bincode::Encode, bincode::Decode)]
    struct Record {
        owner: Option<String>,
        amount: u64,
        tags: Vec<String>,
    }

    #[test]
    fn test_encoding_is_stable() {
        let record = Record {
            owner: Some("recipient".to_string()),
            amount: 100,
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let first = serialize(&record).unwrap();
        let second = serialize(&record.clone()).unwrap();
        assert_eq!(first, second);

        let decoded: Record = deserialize(&first).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_deserialize_rejects_trailing_bytes() {
        let mut bytes = serialize(&7u64).unwrap();
        bytes.push(0);
        let result: Result<u64> = deserialize(&bytes);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_invalid_data() {
        let invalid_bytes = vec![0xFF, 0xFF, 0xFF, 0xFF];
        let result: Result<Record> = deserialize(&invalid_bytes);
        assert!(result.is_err());
    }
}
