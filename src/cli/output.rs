use awsiplookup::LookupResult;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::*;

/*-------------------------------------------------------------------------------------------------
  Output Functions
-------------------------------------------------------------------------------------------------*/

/*--------------------------------------------------------------------------------------
  Match Table
--------------------------------------------------------------------------------------*/

pub fn match_table(lookup_results: &[LookupResult]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("IP Address")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("IP Prefix")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("Region")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("Network Border Group")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
        Cell::new("Service")
            .add_attribute(Attribute::Bold)
            .fg(Color::Green),
    ]);

    for lookup_result in lookup_results {
        if !lookup_result.is_match() {
            table.add_row(vec![
                Cell::new(&lookup_result.requested_address).add_attribute(Attribute::Bold),
                Cell::new("not found").fg(Color::Yellow),
            ]);
            continue;
        }

        for aws_match in &lookup_result.matches {
            table.add_row(vec![
                Cell::new(&lookup_result.requested_address).add_attribute(Attribute::Bold),
                Cell::new(&aws_match.prefix),
                Cell::new(&aws_match.region),
                Cell::new(&aws_match.network_border_group),
                Cell::new(&aws_match.service),
            ]);
        }
    }

    // Right-align the IP Address and IP Prefix columns
    for index in 0..2 {
        if let Some(column) = table.column_mut(index) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    println!("{table}");

    // Print lookup summary
    let address_count = lookup_results.len();
    let found_count = lookup_results
        .iter()
        .filter(|lookup_result| lookup_result.is_match())
        .count();

    let mut summary_table = Table::new();
    summary_table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);

    summary_table.add_row(vec![Cell::new(address_count), Cell::new("IP Addresses")]);
    summary_table.add_row(vec![
        Cell::new(found_count),
        Cell::new("Found in the AWS IP Ranges"),
    ]);
    if let Some(lookup_result) = lookup_results.first() {
        summary_table.add_row(vec![
            Cell::new(lookup_result.provenance),
            Cell::new("AWS IP Ranges Source"),
        ]);
    }

    if let Some(summary_numbers_column) = summary_table.column_mut(0) {
        summary_numbers_column.set_cell_alignment(CellAlignment::Right);
    }

    println!("{summary_table}");
}

/*--------------------------------------------------------------------------------------
  JSON
--------------------------------------------------------------------------------------*/

pub fn json(lookup_results: &[LookupResult]) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(lookup_results)?);
    Ok(())
}
