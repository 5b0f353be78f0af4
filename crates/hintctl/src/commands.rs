//! Command implementations for hintctl.

use crate::client::HintdClient;
use hint_shared::{HintError, StatusResponse};
use owo_colors::OwoColorize;

pub async fn ask(client: &HintdClient, words: &[String]) -> Result<(), HintError> {
    let query = words.join(" ");
    let answer = client.ask(&query).await?;
    println!("{}", answer.response);
    Ok(())
}

pub async fn capture(client: &HintdClient) -> Result<(), HintError> {
    let result = client.capture().await?;
    println!("{} {}", "✓".green(), result.message);
    Ok(())
}

pub async fn status(client: &HintdClient) -> Result<(), HintError> {
    let status = client.status().await?;
    print_status(&status);
    Ok(())
}

pub async fn health(client: &HintdClient) -> Result<(), HintError> {
    let health = client.health().await?;
    println!("{} hintd is {}", "●".green(), health.status.bold());
    println!("  Model answers: {}", on_off(health.llm_enabled));
    Ok(())
}

fn print_status(status: &StatusResponse) {
    println!("{}", "hintd status".bold());
    println!("  Capturing:    {}", on_off(status.capturing));
    println!("  Screenshots:  {}", status.screenshot_count);
    println!("  Model:        {}", on_off(status.llm_enabled));
    match &status.current_game {
        Some(game) => println!("  Current game: {}", game.cyan()),
        None => println!("  Current game: {}", "unknown".dimmed()),
    }
}

fn on_off(enabled: bool) -> String {
    if enabled {
        "on".green().to_string()
    } else {
        "off".yellow().to_string()
    }
}
