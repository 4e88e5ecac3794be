use obscope_types::{ToolCallPayload, ToolKind, ToolOrigin};
use serde_json::Value;

use crate::codex::tools::{ApplyPatchArgs, ReadMcpResourceArgs, ShellArgs};

/// Normalize Codex-specific tool calls
///
/// Codex's `apply_patch`/`shell` argument shapes differ enough from the
/// common schema (array commands, raw patch text) that they need
/// provider-specific parsing before converting to the domain model.
pub(crate) fn normalize_codex_tool_call(
    tool_name: String,
    arguments: Value,
    provider_call_id: Option<String>,
) -> ToolCallPayload {
    match tool_name.as_str() {
        "apply_patch" => {
            if let Ok(patch_args) = serde_json::from_value::<ApplyPatchArgs>(arguments.clone()) {
                let file_path = patch_args
                    .parse()
                    .map(|p| p.file_path)
                    .unwrap_or_default();
                return ToolCallPayload::FileEdit {
                    name: tool_name,
                    arguments: obscope_types::FileEditArgs {
                        file_path,
                        old_string: String::new(),
                        new_string: String::new(),
                        replace_all: false,
                    },
                    provider_call_id,
                };
            }
        }
        "shell" | "shell_command" => {
            if let Ok(shell_args) = serde_json::from_value::<ShellArgs>(arguments.clone()) {
                return ToolCallPayload::Execute {
                    name: tool_name,
                    arguments: shell_args.to_execute_args(),
                    provider_call_id,
                };
            }
        }
        "read_mcp_resource" => {
            if let Ok(mcp_args) = serde_json::from_value::<ReadMcpResourceArgs>(arguments.clone())
            {
                return ToolCallPayload::FileRead {
                    name: tool_name,
                    arguments: mcp_args.to_file_read_args(),
                    provider_call_id,
                };
            }
        }
        "update_plan" => {
            // No unified Plan variant exists in the domain model; keep the
            // explanation/steps payload intact as Generic.
            return ToolCallPayload::Generic {
                name: tool_name,
                arguments,
                provider_call_id,
            };
        }
        _ => {}
    }

    ToolCallPayload::Generic {
        name: tool_name,
        arguments,
        provider_call_id,
    }
}

/// Codex tool mapper implementation
pub struct CodexToolMapper;

impl crate::traits::ToolMapper for CodexToolMapper {
    fn classify(&self, tool_name: &str) -> (ToolOrigin, ToolKind) {
        super::tool_mapping::classify_tool(tool_name)
            .map(|kind| (ToolOrigin::System, kind))
            .unwrap_or_else(|| crate::tool_analyzer::classify_common(tool_name))
    }

    fn normalize_call(&self, name: &str, args: Value, call_id: Option<String>) -> ToolCallPayload {
        normalize_codex_tool_call(name.to_string(), args, call_id)
    }

    fn summarize(&self, kind: ToolKind, args: &Value) -> String {
        crate::tool_analyzer::extract_common_summary(kind, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_shell() {
        let payload = normalize_codex_tool_call(
            "shell".to_string(),
            serde_json::json!({"command": ["bash", "-lc", "ls"]}),
            Some("call_1".to_string()),
        );

        match payload {
            ToolCallPayload::Execute {
                name,
                arguments,
                provider_call_id,
            } => {
                assert_eq!(name, "shell");
                assert_eq!(arguments.command, Some("bash -lc ls".to_string()));
                assert_eq!(provider_call_id, Some("call_1".to_string()));
            }
            _ => panic!("Expected Execute variant"),
        }
    }

    #[test]
    fn test_normalize_apply_patch() {
        let raw = "*** Begin Patch\n*** Update File: src/lib.rs\n@@\n-old\n+new\n*** End Patch";
        let payload = normalize_codex_tool_call(
            "apply_patch".to_string(),
            serde_json::json!({"raw": raw}),
            Some("call_2".to_string()),
        );

        match payload {
            ToolCallPayload::FileEdit {
                name,
                arguments,
                provider_call_id,
            } => {
                assert_eq!(name, "apply_patch");
                assert_eq!(arguments.file_path, "src/lib.rs".to_string());
                assert_eq!(provider_call_id, Some("call_2".to_string()));
            }
            _ => panic!("Expected FileEdit variant"),
        }
    }

    #[test]
    fn test_normalize_read_mcp_resource() {
        let payload = normalize_codex_tool_call(
            "read_mcp_resource".to_string(),
            serde_json::json!({"server": "local", "uri": "/tmp/a.txt"}),
            None,
        );

        match payload {
            ToolCallPayload::FileRead {
                name, arguments, ..
            } => {
                assert_eq!(name, "read_mcp_resource");
                assert_eq!(arguments.file_path, Some("/tmp/a.txt".to_string()));
            }
            _ => panic!("Expected FileRead variant"),
        }
    }

    #[test]
    fn test_normalize_unknown_falls_back_to_generic() {
        let payload = normalize_codex_tool_call(
            "mystery_tool".to_string(),
            serde_json::json!({"x": 1}),
            None,
        );

        assert!(matches!(payload, ToolCallPayload::Generic { .. }));
    }
}
