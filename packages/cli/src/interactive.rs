//! Interactive filter explorer.
//!
//! Loads the data once through the [`Session`], then lets the user adjust
//! the share slider, the income and price modes, and the layer toggles.
//! The mask is recomputed and the match count reprinted after every change.

use std::path::PathBuf;

use area_map_analysis::Session;
use area_map_area_models::{FilterSettings, IncomeThreshold, PriceThreshold, TableStats};
use area_map_presentation::format::pounds;
use area_map_presentation::{LayerVisibility, Presentation, present, write_export};
use dialoguer::{Input, MultiSelect, Select};

use crate::report;

/// Actions available in the explorer menu.
enum Action {
    SetShare,
    SetIncome,
    SetPrice,
    ToggleLayers,
    ListMatches,
    Export,
    Reload,
    Quit,
}

impl Action {
    const ALL: &[Self] = &[
        Self::SetShare,
        Self::SetIncome,
        Self::SetPrice,
        Self::ToggleLayers,
        Self::ListMatches,
        Self::Export,
        Self::Reload,
        Self::Quit,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::SetShare => "Set minimum % Black",
            Self::SetIncome => "Set income threshold",
            Self::SetPrice => "Set house price threshold",
            Self::ToggleLayers => "Toggle map layers",
            Self::ListMatches => "List matching areas",
            Self::Export => "Export GeoJSON and layers",
            Self::Reload => "Reload input files",
            Self::Quit => "Quit",
        }
    }
}

const LAYER_LABELS: &[&str] = &[
    "% Black",
    "Mean Income (£)",
    "Median House Price (£)",
    "Live Filtered Areas",
];

/// Runs the explorer until the user quits.
///
/// # Errors
///
/// Returns an error if loading fails or a prompt cannot be shown.
pub fn run(session: &mut Session) -> Result<(), Box<dyn std::error::Error>> {
    println!("London Area Map");

    let map = session.config().map.clone();
    let mut settings = session.default_settings();
    let mut visibility = LayerVisibility::default();

    report::print_load(session.load()?);

    loop {
        let presentation = evaluate(session, &settings, &visibility)?;
        print_status(&presentation, &settings);

        let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
        let idx = Select::new()
            .with_prompt("What would you like to do?")
            .items(&labels)
            .default(0)
            .interact()?;

        match Action::ALL[idx] {
            Action::SetShare => settings.min_group_share = prompt_share(settings.min_group_share)?,
            Action::SetIncome => {
                let stats = session.load()?.stats;
                settings.income = prompt_income(settings.income, &stats)?;
            }
            Action::SetPrice => {
                let stats = session.load()?.stats;
                settings.price = prompt_price(settings.price, &stats)?;
            }
            Action::ToggleLayers => visibility = prompt_layers(&visibility)?,
            Action::ListMatches => {
                let data = session.load()?;
                report::print_matches(&data.table, &presentation.mask, usize::MAX);
            }
            Action::Export => {
                let dir: String = Input::new()
                    .with_prompt("Output directory")
                    .default("out".to_string())
                    .interact_text()?;
                let data = session.load()?;
                let (geojson, layers) =
                    write_export(&PathBuf::from(dir), &data.table, &presentation, &map)?;
                println!("Wrote {} and {}", geojson.display(), layers.display());
            }
            Action::Reload => {
                session.invalidate();
                report::print_load(session.load()?);
            }
            Action::Quit => break,
        }
    }

    Ok(())
}

fn evaluate(
    session: &mut Session,
    settings: &FilterSettings,
    visibility: &LayerVisibility,
) -> Result<Presentation, Box<dyn std::error::Error>> {
    let data = session.load()?;
    let criteria = settings.resolve(&data.stats);
    Ok(present(&data.table, &data.stats, &criteria, visibility))
}

fn print_status(presentation: &Presentation, settings: &FilterSettings) {
    report::print_criteria(&presentation.criteria, settings);
    println!(
        "Matching areas: {} of {}",
        presentation.match_count,
        presentation.mask.len()
    );
    let visible: Vec<&str> = presentation
        .layers
        .iter()
        .filter(|layer| layer.default_visible)
        .map(|layer| layer.label.as_str())
        .collect();
    println!("Visible layers: {}", visible.join(", "));
    println!();
}

fn prompt_share(current: f64) -> Result<f64, Box<dyn std::error::Error>> {
    let pct: f64 = Input::new()
        .with_prompt("Minimum % Black (0-100)")
        .default(current * 100.0)
        .validate_with(|value: &f64| -> Result<(), String> {
            if (0.0..=100.0).contains(value) {
                Ok(())
            } else {
                Err("Enter a value between 0 and 100".to_string())
            }
        })
        .interact_text()?;
    Ok(pct / 100.0)
}

fn prompt_amount(prompt: &str, default: f64, max: f64) -> Result<f64, Box<dyn std::error::Error>> {
    let value: f64 = Input::new()
        .with_prompt(format!("{prompt} (0 - {})", pounds(max)))
        .default(default.round())
        .validate_with(move |value: &f64| -> Result<(), String> {
            if (0.0..=max).contains(value) {
                Ok(())
            } else {
                Err(format!("Enter a value between 0 and {max:.0}"))
            }
        })
        .interact_text()?;
    Ok(value)
}

fn prompt_income(
    current: IncomeThreshold,
    stats: &TableStats,
) -> Result<IncomeThreshold, Box<dyn std::error::Error>> {
    let labels = [
        format!("Above mean ({})", pounds(stats.mean_income)),
        "Custom value".to_string(),
    ];
    let default = usize::from(matches!(current, IncomeThreshold::Custom(_)));
    let idx = Select::new()
        .with_prompt("Income threshold")
        .items(&labels)
        .default(default)
        .interact()?;
    if idx == 0 {
        return Ok(IncomeThreshold::AboveMean);
    }
    let start = match current {
        IncomeThreshold::Custom(value) => value,
        IncomeThreshold::AboveMean => stats.mean_income,
    };
    Ok(IncomeThreshold::Custom(prompt_amount(
        "Minimum income (£)",
        start,
        stats.max_income,
    )?))
}

fn prompt_price(
    current: PriceThreshold,
    stats: &TableStats,
) -> Result<PriceThreshold, Box<dyn std::error::Error>> {
    let labels = [
        format!(
            "Below P{:.0} ({})",
            stats.percentile_rank * 100.0,
            pounds(stats.house_price_percentile)
        ),
        "Custom value".to_string(),
    ];
    let default = usize::from(matches!(current, PriceThreshold::Custom(_)));
    let idx = Select::new()
        .with_prompt("House price threshold")
        .items(&labels)
        .default(default)
        .interact()?;
    if idx == 0 {
        return Ok(PriceThreshold::BelowPercentile);
    }
    let start = match current {
        PriceThreshold::Custom(value) => value,
        PriceThreshold::BelowPercentile => stats.house_price_percentile,
    };
    Ok(PriceThreshold::Custom(prompt_amount(
        "Maximum house price (£)",
        start,
        stats.max_house_price,
    )?))
}

fn prompt_layers(current: &LayerVisibility) -> Result<LayerVisibility, Box<dyn std::error::Error>> {
    let defaults = [
        current.group_share,
        current.income,
        current.house_price,
        current.filtered,
    ];
    let selected = MultiSelect::new()
        .with_prompt("Visible layers (space=toggle, enter=confirm)")
        .items(LAYER_LABELS)
        .defaults(&defaults)
        .interact()?;
    Ok(LayerVisibility {
        group_share: selected.contains(&0),
        income: selected.contains(&1),
        house_price: selected.contains(&2),
        filtered: selected.contains(&3),
    })
}
