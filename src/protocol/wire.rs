//! Request payloads and decoded response types.
//!
//! The generic request envelope is buffer-scoped: a `file_data` map from
//! absolute path to buffer contents plus the cursor position, with an
//! `event_name` for notifications and `command_arguments` for completer
//! subcommands. Responses are decoded into owned, immutable values.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the buffer-parse notification event.
pub const FILE_READY_TO_PARSE: &str = "FileReadyToParse";

/// Snapshot of one editor buffer, as handed over by the editor integration.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContext {
    /// Absolute path of the buffer's file.
    pub filepath: PathBuf,
    /// Full buffer contents.
    pub contents: String,
    /// Server filetype tags for this buffer.
    pub filetypes: Vec<String>,
    /// 1-based cursor line.
    pub line_num: u32,
    /// 1-based cursor column (byte offset plus one).
    pub column_num: u32,
}

/// Per-file entry of the `file_data` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileData {
    /// Full buffer contents.
    pub contents: String,
    /// Server filetype tags.
    pub filetypes: Vec<String>,
}

/// Generic buffer-scoped request envelope.
#[derive(Debug, Serialize)]
pub struct BufferRequest {
    file_data: BTreeMap<String, FileData>,
    filepath: String,
    line_num: u32,
    column_num: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    command_arguments: Option<Vec<String>>,
}

impl BufferRequest {
    /// Builds the base envelope for a document context.
    pub fn from_context(ctx: &DocumentContext) -> Self {
        let filepath = ctx.filepath.display().to_string();
        let mut file_data = BTreeMap::new();
        file_data.insert(
            filepath.clone(),
            FileData {
                contents: ctx.contents.clone(),
                filetypes: ctx.filetypes.clone(),
            },
        );
        Self {
            file_data,
            filepath,
            line_num: ctx.line_num,
            column_num: ctx.column_num,
            event_name: None,
            command_arguments: None,
        }
    }

    /// Tags the envelope as an event notification.
    #[must_use]
    pub fn with_event(mut self, event: &str) -> Self {
        self.event_name = Some(event.to_string());
        self
    }

    /// Tags the envelope as a completer subcommand.
    #[must_use]
    pub fn with_command(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.command_arguments = Some(args.into_iter().map(Into::into).collect());
        self
    }
}

/// Severity of a parse result, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// A hard error.
    #[serde(rename = "ERROR")]
    Error,
    /// A warning.
    #[serde(rename = "WARNING")]
    Warning,
    /// Any severity this client has no visual category for.
    #[serde(other)]
    Other,
}

impl DiagnosticKind {
    /// Whether this is a hard error.
    pub fn is_error(self) -> bool {
        self == DiagnosticKind::Error
    }
}

/// A position in a file, 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileLocation {
    /// Absolute path of the file.
    pub filepath: PathBuf,
    /// 1-based line number.
    pub line_num: u32,
    /// 1-based column number.
    pub column_num: u32,
}

/// The span a parse result covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationExtent {
    /// Start of the span.
    pub start: FileLocation,
    /// End of the span, inclusive.
    pub end: FileLocation,
}

/// One entry of the server's parse-result list.
///
/// Produced by the server, never mutated by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResultItem {
    /// Severity kind.
    pub kind: DiagnosticKind,
    /// Human-readable message.
    pub text: String,
    /// Primary location.
    pub location: FileLocation,
    /// Optional span, when the server reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_extent: Option<LocationExtent>,
}

/// Completion candidates for one request.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionList {
    /// Candidates, in server ranking order.
    pub completions: Vec<CompletionItem>,
    /// 1-based column where the completed text starts.
    pub completion_start_column: u32,
}

/// One completion candidate.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompletionItem {
    /// Text to insert on acceptance.
    pub insertion_text: String,
    /// Label shown in the completion menu, when it differs.
    #[serde(default)]
    pub menu_text: Option<String>,
    /// Short type/origin note for the menu.
    #[serde(default)]
    pub extra_menu_info: Option<String>,
    /// Longer documentation for on-demand display.
    #[serde(default)]
    pub detailed_info: Option<String>,
    /// Candidate kind tag (function, variable, ...).
    #[serde(default)]
    pub kind: Option<String>,
}

/// Navigation responses arrive as a single location or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum GoToResponse {
    /// Exactly one target.
    Single(FileLocation),
    /// Zero or more targets.
    Many(Vec<FileLocation>),
}

impl GoToResponse {
    /// The primary navigation target, if any.
    pub fn into_first(self) -> Option<FileLocation> {
        match self {
            GoToResponse::Single(location) => Some(location),
            GoToResponse::Many(locations) => locations.into_iter().next(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> DocumentContext {
        DocumentContext {
            filepath: PathBuf::from("/home/user/project/main.rs"),
            contents: "fn main() {}\n".to_string(),
            filetypes: vec!["rust".to_string()],
            line_num: 1,
            column_num: 4,
        }
    }

    #[test]
    fn test_event_payload_shape() {
        let request = BufferRequest::from_context(&context()).with_event(FILE_READY_TO_PARSE);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["filepath"], "/home/user/project/main.rs");
        assert_eq!(value["line_num"], 1);
        assert_eq!(value["column_num"], 4);
        assert_eq!(value["event_name"], "FileReadyToParse");
        assert_eq!(
            value["file_data"]["/home/user/project/main.rs"]["contents"],
            "fn main() {}\n"
        );
        assert_eq!(
            value["file_data"]["/home/user/project/main.rs"]["filetypes"][0],
            "rust"
        );
        assert!(value.get("command_arguments").is_none());
    }

    #[test]
    fn test_plain_payload_omits_event_name() {
        let request = BufferRequest::from_context(&context());
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("event_name").is_none());
    }

    #[test]
    fn test_command_payload_shape() {
        let request = BufferRequest::from_context(&context()).with_command(["GoTo"]);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["command_arguments"][0], "GoTo");
    }

    #[test]
    fn test_parse_result_decoding() {
        let json = r#"[
            {
                "kind": "ERROR",
                "text": "expected `;`",
                "location": {"filepath": "/p/main.rs", "line_num": 3, "column_num": 9},
                "location_extent": {
                    "start": {"filepath": "/p/main.rs", "line_num": 3, "column_num": 9},
                    "end": {"filepath": "/p/main.rs", "line_num": 3, "column_num": 10}
                }
            },
            {
                "kind": "WARNING",
                "text": "unused variable",
                "location": {"filepath": "/p/main.rs", "line_num": 7, "column_num": 5}
            }
        ]"#;

        let items: Vec<ParseResultItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].kind.is_error());
        assert_eq!(items[0].location.line_num, 3);
        assert!(items[0].location_extent.is_some());
        assert_eq!(items[1].kind, DiagnosticKind::Warning);
        assert!(items[1].location_extent.is_none());
    }

    #[test]
    fn test_unknown_severity_decodes_as_other() {
        let json = r#"{
            "kind": "INFORMATION",
            "text": "style note",
            "location": {"filepath": "/p/main.rs", "line_num": 1, "column_num": 1}
        }"#;
        let item: ParseResultItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, DiagnosticKind::Other);
    }

    #[test]
    fn test_goto_single_and_list() {
        let single: GoToResponse =
            serde_json::from_str(r#"{"filepath": "/p/lib.rs", "line_num": 10, "column_num": 4}"#)
                .unwrap();
        assert_eq!(
            single.into_first().unwrap().filepath,
            PathBuf::from("/p/lib.rs")
        );

        let many: GoToResponse = serde_json::from_str(
            r#"[{"filepath": "/p/a.rs", "line_num": 1, "column_num": 1},
                {"filepath": "/p/b.rs", "line_num": 2, "column_num": 2}]"#,
        )
        .unwrap();
        assert_eq!(
            many.into_first().unwrap().filepath,
            PathBuf::from("/p/a.rs")
        );

        let empty: GoToResponse = serde_json::from_str("[]").unwrap();
        assert!(empty.into_first().is_none());
    }

    #[test]
    fn test_completion_list_decoding() {
        let json = r#"{
            "completions": [
                {"insertion_text": "println", "kind": "MACRO", "extra_menu_info": "macro"},
                {"insertion_text": "print"}
            ],
            "completion_start_column": 5,
            "errors": []
        }"#;

        let list: CompletionList = serde_json::from_str(json).unwrap();
        assert_eq!(list.completions.len(), 2);
        assert_eq!(list.completions[0].insertion_text, "println");
        assert_eq!(list.completions[0].kind.as_deref(), Some("MACRO"));
        assert!(list.completions[1].menu_text.is_none());
        assert_eq!(list.completion_start_column, 5);
    }
}
