//! Meta commands shared by the `:` prompt of the TUI and the `#` lines of
//! headless mode.

use tta_core::NodeType;

/// A parsed meta command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Fork(Option<String>),
    Restore(String),
    New,
    Delete(String),
    Edit { id: String, json: String },
    /// Overwrite a project file.
    Save { id: String, content: String },
    /// `None` clears the type filter.
    Type(Option<NodeType>),
    Search(String),
    Entities { kind: Option<NodeType>, search: String },
    Status,
    Log,
    Graph,
    Files,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse the text after the `:` or `#` sigil.
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "fork" => Ok(Self::Fork((!rest.is_empty()).then(|| rest.to_string()))),
            "restore" | "checkout" => required(rest, "restore <hash>").map(Self::Restore),
            "new" => Ok(Self::New),
            "delete" | "rm" => required(rest, "delete <id>").map(Self::Delete),
            "edit" => {
                let (id, json) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Usage: edit <id> <json>".to_string())?;
                Ok(Self::Edit {
                    id: id.to_string(),
                    json: json.trim().to_string(),
                })
            }
            "save" => {
                let (id, content) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| "Usage: save <file-id> <content>".to_string())?;
                Ok(Self::Save {
                    id: id.to_string(),
                    content: content.trim().replace("\\n", "\n"),
                })
            }
            "type" => parse_kind(rest).map(Self::Type),
            "search" => Ok(Self::Search(rest.to_string())),
            "entities" => {
                let (first, tail) = match rest.split_once(char::is_whitespace) {
                    Some((first, tail)) => (first, tail.trim()),
                    None => (rest, ""),
                };
                // The first word is a type filter only if it names one
                match parse_kind(first) {
                    Ok(kind) => Ok(Self::Entities {
                        kind,
                        search: tail.to_string(),
                    }),
                    Err(_) => Ok(Self::Entities {
                        kind: None,
                        search: rest.to_string(),
                    }),
                }
            }
            "status" => Ok(Self::Status),
            "log" => Ok(Self::Log),
            "graph" => Ok(Self::Graph),
            "files" => Ok(Self::Files),
            "help" => Ok(Self::Help),
            "q" | "quit" | "exit" => Ok(Self::Quit),
            "" => Err("Empty command".to_string()),
            other => Err(format!("Unknown command: {other}")),
        }
    }
}

fn required(rest: &str, usage: &str) -> Result<String, String> {
    if rest.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(rest.to_string())
    }
}

fn parse_kind(text: &str) -> Result<Option<NodeType>, String> {
    if text.is_empty() || text.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    text.parse::<NodeType>().map(Some)
}
