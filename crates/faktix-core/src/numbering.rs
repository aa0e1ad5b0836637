//! # Invoice Numbering
//!
//! Derives the next year-scoped invoice number (`YYYY-NNNN`) from the
//! invoices that already exist.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  existing: 2024-0131, 2025-0001, 2025-0003, 2025-abc, faktura-7         │
//! │  year:     2025 (from the injected Clock)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  keep ^2025-(\d+)$  ──►  1, 3        (2025-abc, faktura-7 ignored)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  max + 1 = 4  ──►  "2025-0004"       (gaps are not backfilled)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no persisted counter: the maximum is re-derived on every call.
//! Deleting the highest-numbered invoice therefore frees its number again.
//! Two writers computing from the same stale snapshot get the same number;
//! the persistence layer guards that with a uniqueness constraint.

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use crate::types::InvoiceRecord;
use crate::INVOICE_SUFFIX_WIDTH;

// =============================================================================
// Clock
// =============================================================================

/// Source of "today" for numbering and due dates.
///
/// Injected so tests and callers control the calendar year instead of
/// reading the wall clock inside the allocator.
pub trait Clock {
    fn today(&self) -> NaiveDate;

    fn current_year(&self) -> i32 {
        self.today().year()
    }
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock frozen on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    today: NaiveDate,
}

impl FixedClock {
    pub const fn new(today: NaiveDate) -> Self {
        FixedClock { today }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn current_year(&self) -> i32 {
        (**self).current_year()
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Numeric suffix of `number` if it is exactly `{year}-{digits}`.
fn suffix_for_year(number: &str, year: i32) -> Option<u64> {
    let suffix = number.strip_prefix(&format!("{year}-"))?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // more digits than u64 holds: not part of the sequence
    suffix.parse().ok()
}

/// Splits a `YYYY-N+` invoice number into year and suffix.
///
/// ## Example
/// ```rust
/// use faktix_core::numbering::parse_invoice_number;
///
/// assert_eq!(parse_invoice_number("2025-0042"), Some((2025, 42)));
/// assert_eq!(parse_invoice_number("2025-10000"), Some((2025, 10000)));
/// assert_eq!(parse_invoice_number("FV-2025-1"), None);
/// ```
pub fn parse_invoice_number(number: &str) -> Option<(i32, u64)> {
    let (year, _) = number.split_once('-')?;
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    suffix_for_year(number, year).map(|suffix| (year, suffix))
}

/// Formats `{year}-{suffix}` with the suffix padded to at least four digits.
pub fn format_invoice_number(year: i32, suffix: u128) -> String {
    format!("{year}-{suffix:0width$}", width = INVOICE_SUFFIX_WIDTH)
}

// =============================================================================
// Allocation
// =============================================================================

/// Next invoice number for `year`, given the existing invoice numbers.
///
/// Numbers that do not match `{year}-{digits}` are ignored. The result is
/// never one of the inputs. Suffixes past 9999 simply grow (`2025-10000`).
///
/// ## Example
/// ```rust
/// use faktix_core::numbering::next_invoice_number_from;
///
/// assert_eq!(next_invoice_number_from(Vec::<String>::new(), 2025), "2025-0001");
/// assert_eq!(next_invoice_number_from(["2025-0001", "2025-0003"], 2025), "2025-0004");
/// ```
pub fn next_invoice_number_from<I, S>(numbers: I, year: i32) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let max_suffix = numbers
        .into_iter()
        .filter_map(|number| suffix_for_year(number.as_ref(), year))
        .max()
        .unwrap_or(0);

    // u128 so that u64::MAX + 1 still yields a fresh number
    let next = format_invoice_number(year, max_suffix as u128 + 1);
    debug!(year, max_suffix, next = %next, "Allocated invoice number");
    next
}

/// Next invoice number for `year`, given the full invoice set.
pub fn next_invoice_number(records: &[InvoiceRecord], year: i32) -> String {
    next_invoice_number_from(records.iter().map(|r| r.invoice_number.as_str()), year)
}

/// Allocator bound to a clock.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use faktix_core::numbering::{FixedClock, InvoiceNumberAllocator};
///
/// let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
/// let allocator = InvoiceNumberAllocator::new(clock);
/// assert_eq!(allocator.next(&[]), "2025-0001");
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceNumberAllocator<C: Clock> {
    clock: C,
}

impl<C: Clock> InvoiceNumberAllocator<C> {
    pub fn new(clock: C) -> Self {
        InvoiceNumberAllocator { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Next number for the clock's current year.
    pub fn next(&self, records: &[InvoiceRecord]) -> String {
        next_invoice_number(records, self.clock.current_year())
    }
}

impl Default for InvoiceNumberAllocator<SystemClock> {
    fn default() -> Self {
        InvoiceNumberAllocator::new(SystemClock)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
