//! System prompt template for the agent.

use chrono::{DateTime, Local};

use crate::reservations::{ReservationBook, DATE_FORMAT, TIME_FORMAT};
use crate::tools::ToolRegistry;

/// Build the system prompt from the restaurant metadata and the current time.
pub fn build_system_prompt(
    restaurant_name: &str,
    now: DateTime<Local>,
    tools: &ToolRegistry,
    book: &ReservationBook,
) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- {}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let dates = match (book.dates().first(), book.dates().last()) {
        (Some(first), Some(last)) => format!(
            "{} to {}",
            first.format(DATE_FORMAT),
            last.format(DATE_FORMAT)
        ),
        _ => "none".to_string(),
    };

    let times = book
        .time_slots()
        .iter()
        .map(|t| t.format(TIME_FORMAT).to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are a helpful restaurant assistant responsible for reservations.
1. Choose your action using the tools that are available to you
2. If there is no tool that fits the user request, ask for more context about what the user wants
3. Elaborate a response to the user

Available tools:
{tool_descriptions}

Name of the restaurant: {restaurant_name}
Current Date: {now}
Reservations are open from {dates}, at {times}."#,
        tool_descriptions = tool_descriptions,
        restaurant_name = restaurant_name,
        now = now.format("%Y-%m-%d %H:%M:%S"),
        dates = dates,
        times = times,
    )
}
