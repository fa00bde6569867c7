//! Plain-text summaries printed by the subcommands and the explorer.

use area_map_analysis::LoadedData;
use area_map_area_models::{
    AreaRecord, AreaTable, FilterCriteria, FilterSettings, IncomeThreshold, PriceThreshold,
};
use area_map_presentation::format::{percent, pounds};

/// How many matching areas to list.
pub const MATCH_LIST_LIMIT: usize = 15;

pub fn print_load(data: &LoadedData) {
    let stats = &data.stats;
    println!();
    println!("Areas loaded:        {}", data.table.len());
    if data.dropped > 0 {
        println!("Dropped incomplete:  {}", data.dropped);
    }
    for warning in &data.warnings {
        println!("Warning:             {warning}");
    }
    println!("Mean income:         {}", pounds(stats.mean_income));
    println!(
        "P{:.0} house price:    {}",
        stats.percentile_rank * 100.0,
        pounds(stats.house_price_percentile)
    );
    println!("Max income:          {}", pounds(stats.max_income));
    println!("Max house price:     {}", pounds(stats.max_house_price));
}

pub fn print_criteria(criteria: &FilterCriteria, settings: &FilterSettings) {
    let income_mode = match settings.income {
        IncomeThreshold::AboveMean => " (mean)",
        IncomeThreshold::Custom(_) => "",
    };
    let price_mode = match settings.price {
        PriceThreshold::BelowPercentile => " (percentile)",
        PriceThreshold::Custom(_) => "",
    };
    println!();
    println!(
        "Filter: share >= {}, income >= {}{income_mode}, price <= {}{price_mode}",
        percent(criteria.min_group_share),
        pounds(criteria.min_income),
        pounds(criteria.max_house_price),
    );
}

/// Prints the match count and the matching areas with the highest share.
pub fn print_matches(table: &AreaTable, mask: &[bool], limit: usize) {
    let mut matches: Vec<&AreaRecord> = table
        .iter()
        .zip(mask)
        .filter_map(|(record, selected)| selected.then_some(record))
        .collect();
    println!("Matching areas:      {} of {}", matches.len(), table.len());

    matches.sort_by(|a, b| b.group_share.total_cmp(&a.group_share));
    for record in matches.iter().take(limit) {
        println!(
            "  {:<10} {:<32} {:>7} {:>10} {:>11}",
            record.area_code,
            display_name(record),
            percent(record.group_share),
            pounds(record.income),
            pounds(record.house_price),
        );
    }
    if matches.len() > limit {
        println!("  ... and {} more", matches.len() - limit);
    }
}

fn display_name(record: &AreaRecord) -> &str {
    if record.full_name.is_empty() {
        &record.area_name
    } else {
        &record.full_name
    }
}
