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

use pretty_assertions::assert_eq;

use crate::stats::{Comparator, RowFilter, StatRows, StatsError};

fn rows(columns: &[&str], rows: &[&[&str]]) -> StatRows {
    StatRows {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

fn flow_stats() -> StatRows {
    rows(
        &["Port Name", "Tx Frames", "Rx Frames"],
        &[
            &["Port 1", "10000", "10000"],
            &["Port 2", "5000", "4999"],
        ],
    )
}

#[test]
fn column_access() {
    let stats = flow_stats();
    assert_eq!(stats.column("Tx Frames").unwrap(), vec!["10000", "5000"]);
    match stats.column("Frames") {
        Err(StatsError::NoSuchColumn(c)) => assert_eq!(c, "Frames"),
        x => panic!("expected NoSuchColumn, got {x:?}"),
    }
}

#[test]
fn single_row_access() {
    let stats = rows(&["Tx Frames", "Rx Frames"], &[&["10000", "10000"]]);
    assert_eq!(stats.single("Tx Frames").unwrap(), "10000");

    // two rows are ambiguous
    match flow_stats().single("Tx Frames") {
        Err(StatsError::NotSingleRow(_, 2)) => {}
        x => panic!("expected NotSingleRow, got {x:?}"),
    }
}

#[test]
fn regex_row_filter() {
    let filtered = flow_stats()
        .filtered(&RowFilter {
            column: "Port Name".to_string(),
            comparator: Comparator::Regex,
            value: "^Port 1$".to_string(),
        })
        .unwrap();
    assert_eq!(filtered.rows, vec![vec!["Port 1", "10000", "10000"]]);
}

#[test]
fn numeric_row_filters() {
    let filtered = flow_stats()
        .filtered(&RowFilter {
            column: "Tx Frames".to_string(),
            comparator: Comparator::GreaterThan,
            value: "6000".to_string(),
        })
        .unwrap();
    assert_eq!(filtered.rows.len(), 1);

    let filtered = flow_stats()
        .filtered(&RowFilter {
            column: "Rx Frames".to_string(),
            comparator: Comparator::LessThan,
            value: "5000".to_string(),
        })
        .unwrap();
    assert_eq!(filtered.rows, vec![vec!["Port 2", "5000", "4999"]]);

    // Equal compares numerically, so "10000" == "10000.0"
    let filtered = flow_stats()
        .filtered(&RowFilter {
            column: "Tx Frames".to_string(),
            comparator: Comparator::Equal,
            value: "10000.0".to_string(),
        })
        .unwrap();
    assert_eq!(filtered.rows.len(), 1);
}

#[test]
fn psql_table_format() {
    let stats = rows(&["Port", "Tx"], &[&["Port 1", "100"], &["Port 2", "90"]]);
    assert_eq!(
        stats.fmt_table(),
        "\
+--------+-----+
| Port   | Tx  |
|--------+-----|
| Port 1 | 100 |
| Port 2 | 90  |
+--------+-----+"
    );
}
