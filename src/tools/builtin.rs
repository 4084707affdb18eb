//! Default tools: diary writing and plan drafting.
//!
//! Both tools turn their typed arguments into an instruction prompt and run a
//! single non-streaming completion against the upstream model; the returned
//! Markdown is the tool result.
//!
//! # Usage
//!
//! ```rust
//! use quill::tools::builtin::all_tools;
//!
//! let tools = all_tools();
//! assert_eq!(tools.len(), 2);
//! ```

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::QuillError;
use crate::tools::arguments::ToolArguments;
use crate::tools::tool::{AgentTool, Tool, ToolContext};
use crate::tools::types::AgentToolParameters;

pub const GENERATE_DIARY: &str = "generate_diary";
pub const CREATE_PLAN: &str = "create_plan";

/// Create the `generate_diary` tool.
pub fn generate_diary_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        GENERATE_DIARY,
        "Diary",
        "Turn what the user shared into a structured diary entry. Call this when the \
         user describes their day, an activity, or how they feel.",
        AgentToolParameters::object()
            .string(
                "content",
                "What the user shared, including experiences and feelings",
                true,
            )
            .string("mood", "The user's mood, e.g. happy, calm, sad", false)
            .string("date", "Date of the entry, formatted YYYY-MM-DD", false)
            .build(),
        |args: ToolArguments, ctx: ToolContext| async move {
            let prompt = diary_prompt(&args, ctx.now.date_naive())?;
            ctx.complete(prompt).await
        },
    ))
}

/// Create the `create_plan` tool.
pub fn create_plan_tool() -> Arc<dyn Tool> {
    Arc::new(AgentTool::new(
        CREATE_PLAN,
        "Plan",
        "Draft a detailed action plan for the user's goal. Call this when the user \
         asks for a plan of any kind.",
        AgentToolParameters::object()
            .string("goal", "The goal the user wants to reach", true)
            .string("timeframe", "Time span of the plan, e.g. one week, one month", false)
            .build(),
        |args: ToolArguments, ctx: ToolContext| async move {
            let prompt = plan_prompt(&args)?;
            ctx.complete(prompt).await
        },
    ))
}

/// All default tools, in catalog order.
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    vec![generate_diary_tool(), create_plan_tool()]
}

/// Build the diary-writing instruction. `date` falls back to `today`.
pub fn diary_prompt(args: &ToolArguments, today: NaiveDate) -> Result<String, QuillError> {
    let content = args.get_str("content")?;
    let date = args
        .get_str_opt("date")
        .map(str::to_string)
        .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

    let mut prompt = String::from(
        "Write a polished diary entry in Markdown based on the notes below.\n\n",
    );
    prompt.push_str(&format!("What the user shared: {content}\n"));
    if let Some(mood) = args.get_str_opt("mood") {
        prompt.push_str(&format!("Mood: {mood}\n"));
    }
    prompt.push_str(&format!("Date: {date}\n"));
    prompt.push_str(
        "\nRequirements:\n\
         1. Use a title followed by body paragraphs\n\
         2. Add a few fitting emoji\n\
         3. Keep the writing vivid and well crafted\n\
         4. Finish with a \"Today's mood\" tag",
    );
    Ok(prompt)
}

/// Build the plan-drafting instruction.
pub fn plan_prompt(args: &ToolArguments) -> Result<String, QuillError> {
    let goal = args.get_str("goal")?;

    let mut prompt = String::from(
        "Create a detailed action plan in Markdown for the goal below.\n\n",
    );
    prompt.push_str(&format!("Goal: {goal}\n"));
    if let Some(timeframe) = args.get_str_opt("timeframe") {
        prompt.push_str(&format!("Timeframe: {timeframe}\n"));
    }
    prompt.push_str(
        "\nRequirements:\n\
         1. Split the plan into clear phases\n\
         2. Give concrete steps for every phase\n\
         3. Include measurable milestones\n\
         4. Offer practical tips and things to watch out for\n\
         5. Organize the content with headings and lists",
    );
    Ok(prompt)
}
