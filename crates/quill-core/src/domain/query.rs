//! Post listing query: ordering and tag filter.

use std::str::FromStr;

use uuid::Uuid;

use crate::error::DomainError;

/// Column a post listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Comments,
    Created,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Ordering of a post listing, parsed from `<field>-<direction>` where field
/// is one of `title`, `comments`, `date`, `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for PostSort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::Created,
            direction: SortDirection::Desc,
        }
    }
}

impl FromStr for PostSort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DomainError::validation(
                "sort",
                format!("\"{s}\" is not one of {{title,comments,date,update}}-{{asc,desc}}"),
            )
        };

        let (field, direction) = s.rsplit_once('-').ok_or_else(invalid)?;
        let field = match field {
            "title" => SortField::Title,
            "comments" => SortField::Comments,
            "date" => SortField::Created,
            "update" => SortField::Updated,
            _ => return Err(invalid()),
        };
        let direction = match direction {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };

        Ok(Self { field, direction })
    }
}

/// Filters and ordering for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    /// Only posts carrying at least one of these tags. Empty means no filter.
    pub tag_ids: Vec<Uuid>,
    pub sort: PostSort,
}

impl PostQuery {
    /// Build a query from the raw `sort` and comma-separated `tags` parameters.
    pub fn parse(sort: Option<&str>, tags: Option<&str>) -> Result<Self, DomainError> {
        let sort = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse()?,
            None => PostSort::default(),
        };

        let mut tag_ids = Vec::new();
        for raw in tags.unwrap_or_default().split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let id = Uuid::parse_str(raw).map_err(|_| {
                DomainError::validation("tags", format!("\"{raw}\" is not a valid tag id"))
            })?;
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        Ok(Self { tag_ids, sort })
    }
}
