use std::collections::HashMap;

use anyhow::Result;
use uuid::Uuid;

use nous_review::{now_millis, order_entries, OrderingMode, QueueEntry};

use crate::app::{format_due, App};
use crate::OutputFormat;

pub async fn run_due(app: &App, mode: Option<OrderingMode>, format: &OutputFormat) -> Result<()> {
    let scheduler = app.scheduler().await;
    let mut items = app.list_items().await?;
    let titles = App::titles(&items);

    let mut spec = app.ordering().await;
    if let Some(mode) = mode {
        spec.mode = mode;
    }

    let due = scheduler.collect_due(&mut items, now_millis());
    let due = order_entries(due, &spec);

    print_entries(&due, &titles, format, "Nothing due. Nice work.")
}

pub async fn run_upcoming(app: &App, limit: usize, format: &OutputFormat) -> Result<()> {
    let scheduler = app.scheduler().await;
    let mut items = app.list_items().await?;
    let titles = App::titles(&items);

    let upcoming = scheduler.collect_upcoming(&mut items, now_millis(), limit);

    print_entries(&upcoming, &titles, format, "Nothing scheduled.")
}

pub async fn run_stats(app: &App, format: &OutputFormat) -> Result<()> {
    let scheduler = app.scheduler().await;
    let mut items = app.list_items().await?;

    let stats = scheduler.stats(&mut items, now_millis());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Plain => {
            println!("Sections   {}", stats.total_sections);
            println!("  new      {}", stats.new_sections);
            println!("  learning {}", stats.learning_sections);
            println!("  review   {}", stats.review_sections);
            println!("Due now    {}", stats.due_sections);
            println!("Suspended  {}", stats.suspended_sections);
            println!("Retired    {}", stats.retired_sections);
            println!("Lapses     {}", stats.total_lapses);
        }
    }

    Ok(())
}

fn print_entries(
    entries: &[QueueEntry],
    titles: &HashMap<Uuid, String>,
    format: &OutputFormat,
    empty_message: &str,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = entries.iter().map(|e| {
                serde_json::json!({
                    "itemId": e.item_id.to_string(),
                    "title": titles.get(&e.item_id),
                    "section": e.section_key,
                    "due": e.due_at,
                    "phase": e.phase,
                    "category": e.category,
                    "state": e.state,
                })
            }).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if entries.is_empty() {
                println!("{}", empty_message);
                return Ok(());
            }

            let unknown = "?".to_string();
            let title_w = entries.iter()
                .map(|e| titles.get(&e.item_id).unwrap_or(&unknown).len())
                .max().unwrap_or(5).min(40).max(5);
            let section_w = entries.iter().map(|e| e.section_key.len()).max().unwrap_or(7).min(24).max(7);

            println!("{:<title_w$} {:<section_w$} {:<9} {:<10} {}",
                "Item", "Section", "Category", "Phase", "Due",
                title_w = title_w, section_w = section_w);
            println!("{} {} {} {} {}",
                "\u{2500}".repeat(title_w),
                "\u{2500}".repeat(section_w),
                "\u{2500}".repeat(9),
                "\u{2500}".repeat(10),
                "\u{2500}".repeat(16));

            for entry in entries {
                let title = titles.get(&entry.item_id).unwrap_or(&unknown);
                let title = if title.chars().count() > title_w {
                    format!("{}...", title.chars().take(title_w - 3).collect::<String>())
                } else {
                    title.clone()
                };

                println!("{:<title_w$} {:<section_w$} {:<9} {:<10} {}",
                    title, entry.section_key, entry.category.as_str(), entry.phase.as_str(),
                    format_due(entry.due_at),
                    title_w = title_w, section_w = section_w);
            }

            println!("\n{} sections", entries.len());
        }
    }

    Ok(())
}
