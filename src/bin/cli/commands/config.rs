use anyhow::Result;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let config = app.config.get().await;
    let ordering = app.ordering().await;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "review": config,
                "reviewOrdering": ordering,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let steps = |s: &[u64]| s.iter().map(|m| format!("{}m", m)).collect::<Vec<_>>().join(" ");
            println!("Learning steps      {}", steps(&config.learning_steps));
            println!("Relearning steps    {}", steps(&config.relearning_steps));
            println!("Graduating (good)   {}m", config.graduating_interval_good);
            println!("Graduating (easy)   {}m", config.graduating_interval_easy);
            println!("Starting ease       {:.2}", config.starting_ease);
            println!("Minimum ease        {:.2}", config.minimum_ease);
            println!("Ease bonus/penalty  +{:.2} / -{:.2} (hard -{:.2})",
                config.ease_bonus, config.ease_penalty, config.hard_ease_penalty);
            println!("Hard multiplier     {:.2}", config.hard_interval_multiplier);
            println!("Easy bonus          {:.2}", config.easy_interval_bonus);
            println!("Interval modifier   {:.2}", config.interval_modifier);
            println!("Lapse multiplier    {:.2}", config.lapse_interval_multiplier);
            println!("Queue order         {:?} {}", ordering.mode,
                ordering.priorities.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(" > "));
        }
    }

    Ok(())
}
