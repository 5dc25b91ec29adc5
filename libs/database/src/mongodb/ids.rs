//! UUID encoding for stored documents and filters.
//!
//! `uuid::Uuid` serializes as a string through `to_bson` but as generic
//! binary through the driver's raw serializer, so a plain `Uuid` field and a
//! `to_bson(&id)` filter never match. Tag stored fields with
//! [`uuid_as_binary`] and build filter values with [`uuid_bson`]; both
//! produce BSON binary subtype 4. Human-readable formats (JSON) keep the
//! hyphenated string.

use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson};
use uuid::Uuid;

/// Filter value for `id`, encoded like a [`uuid_as_binary`] field.
pub fn uuid_bson(id: Uuid) -> Bson {
    Bson::Binary(Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.as_bytes().to_vec(),
    })
}

/// `#[serde(with = "database::mongodb::uuid_as_binary")]`
///
/// Reads subtype 4 binary and, for documents written before the field was
/// tagged, UUID strings.
pub mod uuid_as_binary {
    use mongodb::bson::spec::BinarySubtype;
    use mongodb::bson::{Binary, Bson};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use uuid::Uuid;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            id.serialize(serializer)
        } else {
            super::uuid_bson(*id).serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        match Bson::deserialize(deserializer)? {
            Bson::Binary(Binary {
                subtype: BinarySubtype::Uuid,
                bytes,
            }) => Uuid::from_slice(&bytes).map_err(D::Error::custom),
            Bson::String(s) => Uuid::parse_str(&s).map_err(D::Error::custom),
            other => Err(D::Error::custom(format!(
                "expected a UUID, found {:?}",
                other.element_type()
            ))),
        }
    }
}
