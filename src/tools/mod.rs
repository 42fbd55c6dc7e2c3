//! Tool system for the agent.
//!
//! Tools are a closed set of variants; each pairs an argument schema with a
//! handler over the shared reservation book.

mod reservation;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::llm::{FunctionSchema, ToolSchema};
use crate::reservations::{ReservationBook, ReservationError};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error(transparent)]
    Reservation(#[from] ReservationError),
}

impl ToolError {
    /// Whether the call never reached a handler.
    pub fn is_dispatch_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments { .. })
    }
}

/// The tools the assistant can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    ListSlots,
    Book,
    Cancel,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::ListSlots, ToolKind::Book, ToolKind::Cancel];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListSlots => "list_slots",
            Self::Book => "book",
            Self::Cancel => "cancel",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ListSlots => {
                "Return every time slot of a date. Empty slots are null, booked slots \
                 show the guest name and party size."
            }
            Self::Book => "Book a table at a date and time slot for a named guest and party size.",
            Self::Cancel => "Cancel the reservation at a date and time slot. Returns true.",
        }
    }

    pub fn parameters_schema(&self) -> Value {
        reservation::parameters_schema(*self)
    }

    /// Look up a tool by the name the model used.
    ///
    /// Accepts the legacy names `list_empty_slots`, `book_table` and `cancel_reservation`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "list_slots" | "list_empty_slots" => Some(Self::ListSlots),
            "book" | "book_table" => Some(Self::Book),
            "cancel" | "cancel_reservation" => Some(Self::Cancel),
            _ => None,
        }
    }

    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            kind: "function".to_string(),
            function: FunctionSchema {
                name: self.name().to_string(),
                description: self.description().to_string(),
                parameters: self.parameters_schema(),
            },
        }
    }
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Registry of the tools available to one agent.
#[derive(Clone)]
pub struct ToolRegistry {
    book: Arc<ReservationBook>,
}

impl ToolRegistry {
    pub fn new(book: Arc<ReservationBook>) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &Arc<ReservationBook> {
        &self.book
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        ToolKind::ALL
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect()
    }

    pub fn get_tool_schemas(&self) -> Vec<ToolSchema> {
        ToolKind::ALL.iter().map(ToolKind::schema).collect()
    }

    /// Run a tool by name and return its JSON-encoded result.
    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let kind =
            ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let result = match kind {
            ToolKind::ListSlots => reservation::list_slots(&self.book, args).await?,
            ToolKind::Book => reservation::book(&self.book, args).await?,
            ToolKind::Cancel => reservation::cancel(&self.book, args).await?,
        };
        Ok(result.to_string())
    }
}
