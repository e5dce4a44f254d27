use serde::{Deserialize, Serialize};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Upper bound for any requested page size.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Per-resource page size limits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCfg {
    pub default_size: u64,
    pub max_size: u64,
}

impl Default for PageCfg {
    fn default() -> Self {
        Self {
            default_size: DEFAULT_PAGE_SIZE,
            max_size: MAX_PAGE_SIZE,
        }
    }
}

impl PageCfg {
    /// Repair an inconsistent configuration: `max_size >= 1` and
    /// `1 <= default_size <= max_size`.
    pub fn normalized(self) -> Self {
        let max_size = self.max_size.max(1);
        Self {
            default_size: self.default_size.clamp(1, max_size),
            max_size,
        }
    }
}

/// Validated page request: `page >= 1`, `1 <= size <= max_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    /// Build a request, clamping out-of-range values.
    pub fn new(page: i64, size: i64, cfg: PageCfg) -> Self {
        let cfg = cfg.normalized();
        let page = u64::try_from(page).unwrap_or(0).max(1);
        let size = u64::try_from(size).unwrap_or(0).clamp(1, cfg.max_size);
        Self { page, size }
    }

    #[inline]
    pub fn page(&self) -> u64 {
        self.page
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Rows to fetch; same as `size`.
    #[inline]
    pub fn take(&self) -> u64 {
        self.size
    }

    /// Rows to skip: `(page - 1) * size`.
    #[inline]
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parse an integer query value. Digit strings that overflow `i64` saturate
/// toward their sign; anything else non-numeric yields `None`.
fn parse_lenient_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return Some(if negative { i64::MIN } else { i64::MAX });
    }
    None
}

/// Resolve raw `page`/`size` query values into a [`PageRequest`].
///
/// Never fails: missing or non-numeric values fall back to `page = 1` and
/// `size = cfg.default_size`, out-of-range values are clamped.
pub fn resolve_pagination(raw_page: Option<&str>, raw_size: Option<&str>, cfg: PageCfg) -> PageRequest {
    let cfg = cfg.normalized();
    let page = parse_lenient_int(raw_page).unwrap_or(1);
    let size = parse_lenient_int(raw_size).unwrap_or(cfg.default_size as i64);
    PageRequest::new(page, size, cfg)
}

/// Navigation summary returned next to every list page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub take: u64,
    pub item_count: u64,
    pub page_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PaginationMeta {
    pub fn new(page: u64, take: u64, item_count: u64) -> Self {
        let page_count = if take == 0 {
            0
        } else {
            item_count.div_ceil(take)
        };
        Self {
            page,
            take,
            item_count,
            page_count,
            has_previous_page: page > 1,
            has_next_page: page < page_count,
        }
    }

    pub fn for_request(req: &PageRequest, item_count: u64) -> Self {
        Self::new(req.page(), req.take(), item_count)
    }
}

/// Uniform list envelope: `{ data, meta }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, meta: PaginationMeta) -> Self {
        Self { data, meta }
    }

    /// Map records while preserving `meta` (record -> DTO projection).
    pub fn map_data<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_int_parsing() {
        assert_eq!(parse_lenient_int(None), None);
        assert_eq!(parse_lenient_int(Some("")), None);
        assert_eq!(parse_lenient_int(Some("  7 ")), Some(7));
        assert_eq!(parse_lenient_int(Some("-5")), Some(-5));
        assert_eq!(parse_lenient_int(Some("abc")), None);
        assert_eq!(parse_lenient_int(Some("1.5")), None);
        assert_eq!(
            parse_lenient_int(Some("99999999999999999999999")),
            Some(i64::MAX)
        );
        assert_eq!(
            parse_lenient_int(Some("-99999999999999999999999")),
            Some(i64::MIN)
        );
    }

    #[test]
    fn skip_saturates_on_huge_pages() {
        let req = resolve_pagination(Some("99999999999999999999"), Some("100"), PageCfg::default());
        assert_eq!(req.page(), i64::MAX as u64);
        assert_eq!(req.skip(), u64::MAX);
    }

    #[test]
    fn normalized_cfg_repairs_bounds() {
        let cfg = PageCfg {
            default_size: 500,
            max_size: 0,
        }
        .normalized();
        assert_eq!(cfg.max_size, 1);
        assert_eq!(cfg.default_size, 1);
    }

    #[test]
    fn map_data_keeps_meta() {
        let page = PaginatedResult::new(vec![1, 2, 3], PaginationMeta::new(1, 3, 3));
        let mapped = page.map_data(|n| n.to_string());
        assert_eq!(mapped.data, vec!["1", "2", "3"]);
        assert_eq!(mapped.meta.item_count, 3);
    }
}
