use bson::oid::ObjectId;

use super::error::ApiError;

/// Parse a path id into an ObjectId, rejecting malformed input with a 400.
pub fn parse_object_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid id: {id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_object_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id(&oid.to_hex()).unwrap(), oid);
    }

    #[test]
    fn rejects_malformed_id() {
        assert!(parse_object_id("not-an-id").is_err());
        assert!(parse_object_id("").is_err());
    }
}
