use mongodb::error::{Error, ErrorKind, WriteFailure};

/// Server code for a unique index violation
pub const DUPLICATE_KEY: i32 = 11000;

/// Unique index violation, from a write (`insert_one`) or a command
/// (`find_one_and_update` with upsert).
pub fn is_duplicate_key(err: &Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, from_document};
    use mongodb::error::{CommandError, WriteError};

    fn command_error(code: i32) -> Error {
        let e: CommandError = from_document(doc! {
            "code": code,
            "codeName": "Error",
            "errmsg": "command failed",
        })
        .unwrap();
        Error::from(ErrorKind::Command(e))
    }

    fn write_error(code: i32) -> Error {
        let e: WriteError = from_document(doc! {
            "code": code,
            "errmsg": "write failed",
        })
        .unwrap();
        Error::from(ErrorKind::Write(WriteFailure::WriteError(e)))
    }

    #[test]
    fn test_duplicate_key_from_command_and_write() {
        assert!(is_duplicate_key(&command_error(DUPLICATE_KEY)));
        assert!(is_duplicate_key(&write_error(DUPLICATE_KEY)));
    }

    #[test]
    fn test_other_codes_are_not_duplicate_key() {
        assert!(!is_duplicate_key(&command_error(112)));
        assert!(!is_duplicate_key(&write_error(121)));
    }
}
