//! Filtered, sorted, paginated retrieval of sales.
//!
//! A [`SaleQuery`] can only be built in a valid state: page bounds, sort keys
//! and date ranges are checked when it is constructed, so a repository never
//! starts executing a query that is going to be rejected. Repositories that
//! keep sales in memory can use [`SaleQuery::apply`]; others translate the
//! same accessors into their own query language.

use core::cmp::Ordering;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salesdesk_core::{AggregateRoot, BranchId, CustomerId, DomainError, DomainResult};

use crate::sale::{Sale, SaleStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaleOrderBy {
    #[default]
    SaleDate,
    TotalAmount,
    SaleNumber,
    CustomerName,
}

impl FromStr for SaleOrderBy {
    type Err = DomainError;

    /// Case-insensitive; `SaleDate`, `saledate` and `sale_date` are all accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.trim().chars().filter(|c| *c != '_').collect();
        match key.to_ascii_lowercase().as_str() {
            "saledate" => Ok(SaleOrderBy::SaleDate),
            "totalamount" => Ok(SaleOrderBy::TotalAmount),
            "salenumber" => Ok(SaleOrderBy::SaleNumber),
            "customername" => Ok(SaleOrderBy::CustomerName),
            _ => Err(DomainError::validation(format!(
                "order_by must be one of SaleDate, TotalAmount, SaleNumber, CustomerName; got '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            _ => Err(DomainError::validation(format!(
                "order_direction must be 'asc' or 'desc'; got '{s}'"
            ))),
        }
    }
}

/// Inclusive range of sale dates; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DateRange {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> DomainResult<Self> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(DomainError::validation(format!(
                    "date range start {from} is after its end {to}"
                )));
            }
        }
        Ok(Self { from, to })
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from.is_none_or(|from| at >= from) && self.to.is_none_or(|to| at <= to)
    }
}

/// Validated filter + sort + page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleQuery {
    page: u32,
    page_size: u32,
    customer_id: Option<CustomerId>,
    branch_id: Option<BranchId>,
    status: Option<SaleStatus>,
    date_range: DateRange,
    sale_number: Option<String>,
    customer_name: Option<String>,
    order_by: SaleOrderBy,
    direction: SortDirection,
}

impl Default for SaleQuery {
    /// First page, default size, newest sales first.
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            customer_id: None,
            branch_id: None,
            status: None,
            date_range: DateRange::default(),
            sale_number: None,
            customer_name: None,
            order_by: SaleOrderBy::default(),
            direction: SortDirection::default(),
        }
    }
}

impl SaleQuery {
    /// `page >= 1`, `1 <= page_size <= MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> DomainResult<Self> {
        if page < 1 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(DomainError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok(Self {
            page,
            page_size,
            ..Self::default()
        })
    }

    pub fn with_customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_branch(mut self, branch_id: BranchId) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_status(mut self, status: SaleStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    /// Substring match on the sale number; blank fragments are ignored.
    pub fn with_sale_number(mut self, fragment: impl Into<String>) -> Self {
        self.sale_number = non_blank(fragment.into());
        self
    }

    /// Substring match on the customer name; blank fragments are ignored.
    pub fn with_customer_name(mut self, fragment: impl Into<String>) -> Self {
        self.customer_name = non_blank(fragment.into());
        self
    }

    pub fn ordered_by(mut self, order_by: SaleOrderBy, direction: SortDirection) -> Self {
        self.order_by = order_by;
        self.direction = direction;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn status(&self) -> Option<SaleStatus> {
        self.status
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn sale_number(&self) -> Option<&str> {
        self.sale_number.as_deref()
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn order_by(&self) -> SaleOrderBy {
        self.order_by
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Number of matching sales that precede the requested page.
    pub fn offset(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.page_size as usize)
    }

    pub fn matches(&self, sale: &Sale) -> bool {
        self.customer_id.is_none_or(|id| sale.customer().id() == id)
            && self.branch_id.is_none_or(|id| sale.branch().id() == id)
            && self.status.is_none_or(|status| sale.status() == status)
            && self.date_range.contains(sale.sale_date())
            && self
                .sale_number
                .as_deref()
                .is_none_or(|fragment| contains_ignore_case(sale.sale_number(), fragment))
            && self
                .customer_name
                .as_deref()
                .is_none_or(|fragment| contains_ignore_case(sale.customer().name(), fragment))
    }

    /// Requested order, ties broken by sale id so pages never overlap.
    pub fn compare(&self, a: &Sale, b: &Sale) -> Ordering {
        let primary = match self.order_by {
            SaleOrderBy::SaleDate => a.sale_date().cmp(&b.sale_date()),
            SaleOrderBy::TotalAmount => a.total_amount().amount().cmp(&b.total_amount().amount()),
            SaleOrderBy::SaleNumber => a
                .sale_number()
                .to_lowercase()
                .cmp(&b.sale_number().to_lowercase()),
            SaleOrderBy::CustomerName => a
                .customer()
                .name()
                .to_lowercase()
                .cmp(&b.customer().name().to_lowercase()),
        };
        let primary = match self.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(b.id()))
    }

    /// Filter, sort and slice an in-memory collection.
    pub fn apply(&self, sales: impl IntoIterator<Item = Sale>) -> PagedResult<Sale> {
        let mut matching: Vec<Sale> = sales.into_iter().filter(|s| self.matches(s)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total_count = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect();
        PagedResult::new(items, self.page, self.page_size, total_count)
    }
}

/// Query parameters as received from a caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SaleQueryParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub customer_id: Option<CustomerId>,
    pub branch_id: Option<BranchId>,
    pub status: Option<String>,
    pub sale_date_from: Option<DateTime<Utc>>,
    pub sale_date_to: Option<DateTime<Utc>>,
    pub sale_number: Option<String>,
    pub customer_name: Option<String>,
    pub order_by: Option<String>,
    pub order_direction: Option<String>,
}

impl SaleQueryParams {
    /// Validate into a [`SaleQuery`], using `default_page_size` when none was given.
    pub fn into_query(self, default_page_size: u32) -> DomainResult<SaleQuery> {
        let mut query = SaleQuery::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(default_page_size),
        )?;

        let order_by = self
            .order_by
            .as_deref()
            .map(SaleOrderBy::from_str)
            .transpose()?
            .unwrap_or_default();
        let direction = self
            .order_direction
            .as_deref()
            .map(SortDirection::from_str)
            .transpose()?
            .unwrap_or_default();
        query = query
            .ordered_by(order_by, direction)
            .with_date_range(DateRange::new(self.sale_date_from, self.sale_date_to)?);

        if let Some(status) = self.status.as_deref() {
            query = query.with_status(status.parse()?);
        }
        if let Some(id) = self.customer_id {
            query = query.with_customer(id);
        }
        if let Some(id) = self.branch_id {
            query = query.with_branch(id);
        }
        if let Some(fragment) = self.sale_number {
            query = query.with_sale_number(fragment);
        }
        if let Some(fragment) = self.customer_name {
            query = query.with_customer_name(fragment);
        }
        Ok(query)
    }
}

impl TryFrom<SaleQueryParams> for SaleQuery {
    type Error = DomainError;

    fn try_from(params: SaleQueryParams) -> Result<Self, Self::Error> {
        params.into_query(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagedResult<T> {
    items: Vec<T>,
    current_page: u32,
    page_size: u32,
    total_count: u64,
    total_pages: u64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, current_page: u32, page_size: u32, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total_count.div_ceil(u64::from(page_size))
        };
        Self {
            items,
            current_page,
            page_size,
            total_count,
            total_pages,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.current_page) < self.total_pages
    }

    /// Transform every item, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
