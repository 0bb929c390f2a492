//! Notification type tag.
//!
//! Stored as plain text. Decoding goes through [`FromStr`] so an unknown
//! tag in the database surfaces as a decode error instead of leaking an
//! untyped string into the domain.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

/// What kind of event produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Another user shared a file with the recipient.
    FileShared,
    /// The recipient moved one of their files to the trash.
    FileDeleted,
    /// The recipient deleted one of their folders.
    FolderDeleted,
}

impl NotificationType {
    /// Return the stored tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileShared => "file_shared",
            Self::FileDeleted => "file_deleted",
            Self::FolderDeleted => "folder_deleted",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file_shared" => Ok(Self::FileShared),
            "file_deleted" => Ok(Self::FileDeleted),
            "folder_deleted" => Ok(Self::FolderDeleted),
            other => Err(format!("Unknown notification type: {other}")),
        }
    }
}

impl Type<Postgres> for NotificationType {
    fn type_info() -> PgTypeInfo {
        <&str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <&str as Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for NotificationType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for NotificationType {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse::<NotificationType>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        for kind in [
            NotificationType::FileShared,
            NotificationType::FileDeleted,
            NotificationType::FolderDeleted,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationType>(), Ok(kind));
        }
        assert!("file_renamed".parse::<NotificationType>().is_err());
    }

    #[test]
    fn test_serde_tag_matches_column() {
        let json = serde_json::to_string(&NotificationType::FolderDeleted).unwrap();
        assert_eq!(json, "\"folder_deleted\"");
    }
}
