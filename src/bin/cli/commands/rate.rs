use anyhow::{Context, Result};

use nous_review::{now_millis, ContentResolver, Item, ItemSectionResolver, Rating, Scheduler, SectionState};

use crate::app::{format_due, App};
use crate::OutputFormat;

pub async fn run_rate(
    app: &App,
    item_query: &str,
    section: &str,
    rating: Rating,
    format: &OutputFormat,
) -> Result<()> {
    let scheduler = app.scheduler().await;
    let mut item = app.find_item(item_query).await?;
    ensure_section(&scheduler, &item, section)?;

    let state = scheduler
        .apply_rating(&mut item, section, rating, now_millis())
        .context("Section key must not be empty")?;
    app.save_item(&item).await?;
    log::info!("Rated {}/{} as {}", item.id, section, rating);

    print_state(&item.title, section, &state, format)
}

pub async fn run_preview(app: &App, item_query: &str, section: &str, format: &OutputFormat) -> Result<()> {
    let scheduler = app.scheduler().await;
    let item = app.find_item(item_query).await?;
    ensure_section(&scheduler, &item, section)?;

    let preview = scheduler
        .preview(&item, section, now_millis())
        .context("Section key must not be empty")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&preview)?),
        OutputFormat::Plain => {
            println!("{} / {}", item.title, section);
            for rating in Rating::ANSWERS {
                if let Some(state) = preview.get(rating) {
                    println!("  {:<6} -> {:<10} due {}", rating.as_str(), state.phase.as_str(),
                        format_due(state.due_at));
                }
            }
        }
    }

    Ok(())
}

pub async fn run_suspend(
    app: &App,
    item_query: &str,
    section: &str,
    suspend: bool,
    format: &OutputFormat,
) -> Result<()> {
    let scheduler = app.scheduler().await;
    let mut item = app.find_item(item_query).await?;
    ensure_section(&scheduler, &item, section)?;

    let now = now_millis();
    let state = if suspend {
        scheduler.suspend(&mut item, section, now)
    } else {
        scheduler.resume(&mut item, section, now)
    };
    let state = state.context("Section key must not be empty")?;
    app.save_item(&item).await?;

    print_state(&item.title, section, &state, format)
}

/// Reject section keys that are not reviewable on the item
fn ensure_section(scheduler: &Scheduler<ItemSectionResolver>, item: &Item, section: &str) -> Result<()> {
    if scheduler.has_section(item, section) {
        return Ok(());
    }
    let available = scheduler
        .resolver()
        .sections(item)
        .iter()
        .map(|s| format!("  - {} ({})", s.key, s.label))
        .collect::<Vec<_>>()
        .join("\n");
    anyhow::bail!("No reviewable section '{}' on '{}'. Available sections:\n{}", section, item.title, available)
}

fn print_state(title: &str, section: &str, state: &SectionState, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(state)?),
        OutputFormat::Plain => {
            println!("{} / {}", title, section);
            if state.retired {
                println!("  retired");
                return Ok(());
            }
            println!("  phase     {}", state.phase);
            println!("  due       {}", format_due(state.due_at));
            println!("  interval  {}m", state.interval);
            println!("  ease      {:.2}", state.ease);
            println!("  streak    {}", state.streak);
            println!("  lapses    {}", state.lapses);
        }
    }
    Ok(())
}
