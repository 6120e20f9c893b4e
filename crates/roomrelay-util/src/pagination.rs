use serde::{Deserialize, Serialize};

/// `limit`/`offset` paging used by `GET /rooms/{id}/messages` and the
/// analytics export routes.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: Some(50),
            offset: Some(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, limit: i64, offset: i64) -> Self {
        let has_more = items.len() as i64 == limit;
        Self {
            items,
            limit,
            offset,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_and_offset() {
        let p = PaginationParams {
            limit: None,
            offset: None,
        };
        assert_eq!(p.limit(), 50);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        let p = PaginationParams {
            limit: Some(10_000),
            offset: Some(-5),
        };
        assert_eq!(p.limit(), 200);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_floor_is_one() {
        let p = PaginationParams {
            limit: Some(0),
            offset: Some(0),
        };
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn page_has_more_when_full() {
        let page = Page::new(vec![1, 2, 3], 3, 0);
        assert!(page.has_more);
        let page2 = Page::new(vec![1, 2], 3, 0);
        assert!(!page2.has_more);
    }
}
