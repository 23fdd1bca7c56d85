// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Columnar rendering of report rows

use comfy_table::{ContentArrangement, Table};

use crate::report::Row;

const HEADER: [&str; 4] = ["Proto", "Source Address", "Destination Address", "State"];
const NAT_HEADER: &str = "NAT Address";

/// Render rows as borderless, left-aligned columns separated by at least 4 spaces. Rows are
/// emitted in the given order. Trailing whitespace is stripped from every line.
#[must_use]
pub fn render(rows: &[Row], header: bool, nat_box: bool) -> String {
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::NOTHING);
    table.set_content_arrangement(ContentArrangement::Disabled);

    if header {
        let mut cells: Vec<&str> = HEADER.to_vec();
        if nat_box {
            cells.push(NAT_HEADER);
        }
        table.set_header(cells);
    }

    for row in rows {
        let mut cells = vec![
            row.protocol.as_str(),
            row.source.as_str(),
            row.destination.as_str(),
            row.state.as_str(),
        ];
        if nat_box {
            cells.push(row.nat.as_deref().unwrap_or("-"));
        }
        table.add_row(cells);
    }

    for column in table.column_iter_mut() {
        column.set_padding((0, 4));
    }

    let mut out = String::new();
    for line in table.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
