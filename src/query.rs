use std::fmt;
use std::str::FromStr;

use crate::{RequestOptions, ValidationError};

/// Page selection for list endpoints (`?page=&limit=`).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub const MAX_LIMIT: u32 = 100;

    /// Validates `page >= 1` and `1 <= limit <= 100`.
    pub fn new(page: u32, limit: u32) -> Result<Self, ValidationError> {
        if page == 0 {
            return Err(ValidationError::new("page", "must be a positive integer"));
        }
        if limit == 0 {
            return Err(ValidationError::new("limit", "must be a positive integer"));
        }
        if limit > Self::MAX_LIMIT {
            return Err(ValidationError::new(
                "limit",
                format!("must be at most {}", Self::MAX_LIMIT),
            ));
        }
        Ok(Self { page, limit })
    }

    pub fn apply(&self, options: RequestOptions) -> RequestOptions {
        options.query("page", self.page).query("limit", self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ValidationError::new(
                "sortOrder",
                format!("expected 'asc' or 'desc', got '{other}'"),
            )),
        }
    }
}

/// Ordering for list endpoints (`?sortBy=&sortOrder=`).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Sort {
    pub sort_by: Option<String>,
    pub order: SortOrder,
}

impl Sort {
    pub fn by(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            sort_by: Some(field.into()),
            order,
        }
    }

    pub fn apply(&self, options: RequestOptions) -> RequestOptions {
        let options = match &self.sort_by {
            Some(field) => options.query("sortBy", field),
            None => options,
        };
        options.query("sortOrder", self.order)
    }
}
