use feedbackloop_model::ToolSchema;
use serde_json::json;

/// Name of the function the model is asked to call with cleaned feedback
pub const FEEDBACK_FUNCTION_NAME: &str = "collect_feedback";

/// Function declaration for structured feedback extraction
pub fn feedback_tool_schema() -> ToolSchema {
    ToolSchema::new(
        FEEDBACK_FUNCTION_NAME,
        "Collect user feedback and rating about the chat experience",
        json!({
            "type": "object",
            "properties": {
                "review": {
                    "type": "string",
                    "description": "User's review of the chat experience"
                },
                "rating": {
                    "type": "integer",
                    "description": "User's rating of the chat experience on a scale of 1 to 5"
                }
            },
            "required": ["review", "rating"]
        }),
    )
}
