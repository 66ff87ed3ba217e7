// BgpSim: BGP Network Simulator written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for reading statistics views.
//!
//! The appliance publishes statistics as named views (`Protocols Summary`, `Flow Statistics`,
//! ...) with column captions and row pages. [`StatView`] finds a view by caption, waits until
//! it has data, and reads all pages into a [`StatRows`] table. [`StatView::check_condition`]
//! polls a column until a comparison holds on every row, which is how demos verify that all
//! protocol sessions are up before starting traffic.

use std::time::Duration;

use itertools::Itertools;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    rest::{href_of, RestError},
    session::UhdSession,
};

/// How long to wait for a view to appear and become ready.
const VIEW_READY_RETRIES: usize = 30;
/// How long to poll a condition before giving up, in seconds.
const CONDITION_TIMEOUT: u64 = 90;

/// Comparison operator for condition checks and row filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// Numeric equality (falls back to string equality for non-numeric cells).
    Equal,
    /// Numeric greater-than.
    GreaterThan,
    /// Numeric less-than.
    LessThan,
    /// The cell matches a regular expression.
    Regex,
}

/// A client-side row filter: keep only rows whose `column` satisfies the comparison.
#[derive(Debug, Clone)]
pub struct RowFilter {
    pub column: String,
    pub comparator: Comparator,
    pub value: String,
}

/// A named statistics view.
#[derive(Debug, Clone)]
pub struct StatView {
    session: UhdSession,
    href: String,
    caption: String,
    filters: Vec<RowFilter>,
}

impl StatView {
    /// Find a statistics view by caption and wait until it has data. Views are created lazily
    /// by the appliance (e.g. `Flow Statistics` only exists once traffic ran), so this retries
    /// once per second for a bounded number of attempts.
    pub async fn open(session: &UhdSession, caption: impl Into<String>) -> Result<Self, StatsError> {
        let caption = caption.into();

        for _ in 0..VIEW_READY_RETRIES {
            let views: Vec<Value> = session.rest().get(session.href("statistics/view")).await?;
            let view = views
                .iter()
                .find(|v| v.get("caption").and_then(Value::as_str) == Some(caption.as_str()));
            if let Some(view) = view {
                let href =
                    href_of(view).ok_or(RestError::UnexpectedPayload("view without href"))?;
                let this = Self {
                    session: session.clone(),
                    href,
                    caption,
                    filters: Vec::new(),
                };
                this.wait_ready().await?;
                return Ok(this);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        log::error!(
            "[{}] Statistics view {} did not appear",
            session.rest().name(),
            caption
        );
        Err(StatsError::ViewNotFound(caption))
    }

    /// The view caption.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Keep only rows whose `column` satisfies the comparison. Filters are applied client-side
    /// when reading [`StatView::rows`].
    pub fn add_row_filter(
        &mut self,
        column: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> &mut Self {
        self.filters.push(RowFilter {
            column: column.into(),
            comparator,
            value: value.into(),
        });
        self
    }

    /// Wait until the view's page reports that data is ready.
    async fn wait_ready(&self) -> Result<(), StatsError> {
        for _ in 0..VIEW_READY_RETRIES {
            let page: Value = self.session.rest().get(format!("{}/page", self.href)).await?;
            if page.get("isReady").and_then(Value::as_bool).unwrap_or(false) {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        Err(StatsError::NotReady(self.caption.clone()))
    }

    /// Read all pages of the view into a table, applying the configured row filters.
    pub async fn rows(&self) -> Result<StatRows, StatsError> {
        let rest = self.session.rest();
        let page_href = format!("{}/page", self.href);
        let page: Value = rest.get(&page_href).await?;

        let columns: Vec<String> = page
            .get("columnCaptions")
            .and_then(Value::as_array)
            .map(|xs| {
                xs.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let total_pages = page.get("totalPages").and_then(Value::as_u64).unwrap_or(1);
        let mut rows = parse_page_rows(&page);

        for page_number in 2..=total_pages {
            rest.patch(&page_href, &json!({ "currentPage": page_number }))
                .await?;
            let page: Value = rest.get(&page_href).await?;
            rows.extend(parse_page_rows(&page));
        }

        let mut table = StatRows { columns, rows };
        for filter in &self.filters {
            table = table.filtered(filter)?;
        }
        Ok(table)
    }

    /// Poll the view until the comparison holds for `column` on every row, once per second,
    /// bounded by a timeout. This is the workhorse behind "verify all protocols are up".
    pub async fn check_condition(
        &self,
        column: impl AsRef<str>,
        comparator: Comparator,
        value: impl ToString,
    ) -> Result<(), StatsError> {
        let column = column.as_ref();
        let value = value.to_string();
        let mut last_seen = String::new();

        for _ in 0..CONDITION_TIMEOUT {
            let rows = self.rows().await?;
            let cells = rows.column(column)?;
            if !cells.is_empty() && cells.iter().all(|c| compare(c, comparator, &value)) {
                log::debug!(
                    "[{}] {}: {} {:?} {} holds",
                    self.session.rest().name(),
                    self.caption,
                    column,
                    comparator,
                    value
                );
                return Ok(());
            }
            last_seen = cells.last().cloned().unwrap_or_default();
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        log::error!(
            "[{}] {}: condition {} {:?} {} did not hold (last value: {})",
            self.session.rest().name(),
            self.caption,
            column,
            comparator,
            value,
            last_seen
        );
        Err(StatsError::ConditionTimeout {
            view: self.caption.clone(),
            column: column.to_string(),
            expected: value,
            last_seen,
        })
    }
}

/// Extract the row values of one page.
fn parse_page_rows(page: &Value) -> Vec<Vec<String>> {
    // each entry of `pageValues` is a list of rows (one per sub-row); flatten them.
    page.get("pageValues")
        .and_then(Value::as_array)
        .map(|groups| {
            groups
                .iter()
                .filter_map(Value::as_array)
                .flatten()
                .filter_map(Value::as_array)
                .map(|row| {
                    row.iter()
                        .map(|c| c.as_str().map(str::to_string).unwrap_or_else(|| c.to_string()))
                        .collect()
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Evaluate one comparison on a cell.
fn compare(cell: &str, comparator: Comparator, value: &str) -> bool {
    match comparator {
        Comparator::Equal => match (cell.parse::<f64>(), value.parse::<f64>()) {
            (Ok(a), Ok(b)) => a == b,
            _ => cell == value,
        },
        Comparator::GreaterThan => matches!(
            (cell.parse::<f64>(), value.parse::<f64>()),
            (Ok(a), Ok(b)) if a > b
        ),
        Comparator::LessThan => matches!(
            (cell.parse::<f64>(), value.parse::<f64>()),
            (Ok(a), Ok(b)) if a < b
        ),
        Comparator::Regex => Regex::new(value)
            .map(|re| re.is_match(cell))
            .unwrap_or(false),
    }
}

/// A fully read statistics table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatRows {
    /// The column captions.
    pub columns: Vec<String>,
    /// All rows, in view order.
    pub rows: Vec<Vec<String>>,
}

impl StatRows {
    /// Get all values of a column.
    pub fn column(&self, caption: &str) -> Result<Vec<String>, StatsError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == caption)
            .ok_or_else(|| StatsError::NoSuchColumn(caption.to_string()))?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).cloned().unwrap_or_default())
            .collect())
    }

    /// Get the value of a column in the only row of the table.
    pub fn single(&self, caption: &str) -> Result<String, StatsError> {
        let mut values = self.column(caption)?;
        match values.len() {
            1 => Ok(values.remove(0)),
            n => Err(StatsError::NotSingleRow(caption.to_string(), n)),
        }
    }

    /// Return a copy of the table with only the rows that satisfy the filter.
    pub fn filtered(self, filter: &RowFilter) -> Result<Self, StatsError> {
        let idx = self
            .columns
            .iter()
            .position(|c| *c == filter.column)
            .ok_or_else(|| StatsError::NoSuchColumn(filter.column.clone()))?;
        let rows = self
            .rows
            .into_iter()
            .filter(|row| {
                row.get(idx)
                    .map(|cell| compare(cell, filter.comparator, &filter.value))
                    .unwrap_or(false)
            })
            .collect();
        Ok(Self {
            columns: self.columns,
            rows,
        })
    }

    /// Render the table in a psql-like format for logging.
    pub fn fmt_table(&self) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                std::iter::once(c.len())
                    .chain(self.rows.iter().map(|r| r.get(i).map_or(0, String::len)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let sep = |edge: char| -> String {
            format!(
                "{edge}{}{edge}",
                widths.iter().map(|w| "-".repeat(w + 2)).join("+")
            )
        };
        let fmt_row = |cells: &[String]| -> String {
            format!(
                "|{}|",
                cells
                    .iter()
                    .zip(&widths)
                    .map(|(c, &w)| format!(" {c:<w$} "))
                    .join("|")
            )
        };

        let mut out = String::new();
        out.push_str(&sep('+'));
        out.push('\n');
        out.push_str(&fmt_row(&self.columns));
        out.push('\n');
        out.push_str(&sep('|'));
        out.push('\n');
        for row in &self.rows {
            out.push_str(&fmt_row(row));
            out.push('\n');
        }
        out.push_str(&sep('+'));
        out
    }
}

/// Error kind returned when reading statistics.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// The view did not appear within the retry budget.
    #[error("Statistics view {0} does not exist")]
    ViewNotFound(String),
    /// The view exists but never reported ready data.
    #[error("Statistics view {0} did not become ready")]
    NotReady(String),
    /// The requested column does not exist in the view.
    #[error("No column {0} in the statistics view")]
    NoSuchColumn(String),
    /// `single` was called on a table with more or less than one row.
    #[error("Expected a single row for column {0}, but the view has {1} rows")]
    NotSingleRow(String, usize),
    /// A condition check did not hold within the timeout.
    #[error(
        "Condition on {view} not met: {column} {expected} (last value: {last_seen})"
    )]
    ConditionTimeout {
        view: String,
        column: String,
        expected: String,
        last_seen: String,
    },
}
