//! Sorting types for file listings.

use serde::{Deserialize, Serialize};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        Self::Asc
    }
}

impl SortDirection {
    /// Apply this direction to an ascending comparison.
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// The two supported display orders for file listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSort {
    /// Filename ascending, case-insensitive.
    Name,
    /// Upload date, newest first.
    #[default]
    UploadDate,
}

impl FileSort {
    /// The direction this order applies to its primary key.
    pub fn direction(&self) -> SortDirection {
        match self {
            Self::Name => SortDirection::Asc,
            Self::UploadDate => SortDirection::Desc,
        }
    }
}

impl std::str::FromStr for FileSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "date" | "upload_date" => Ok(Self::UploadDate),
            other => Err(format!("unknown sort order '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_parse_sort() {
        assert_eq!("name".parse::<FileSort>().unwrap(), FileSort::Name);
        assert_eq!("date".parse::<FileSort>().unwrap(), FileSort::UploadDate);
        assert!("size".parse::<FileSort>().is_err());
    }

    #[test]
    fn test_direction_apply() {
        assert_eq!(FileSort::Name.direction().apply(Ordering::Less), Ordering::Less);
        assert_eq!(
            FileSort::UploadDate.direction().apply(Ordering::Less),
            Ordering::Greater
        );
    }
}
