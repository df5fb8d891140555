//! Plain-language timeline of a workflow definition
//!
//! Walks the engine's step graph from its starting steps and describes each
//! step in words a non-technical owner understands.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::types::{TimelineBranch, TimelineStep};

#[derive(Debug, Clone, Deserialize)]
struct StepNode {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(rename = "type", default)]
    node_type: String,
    #[serde(default)]
    parameters: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConnectionTarget {
    node: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StepOutputs {
    #[serde(default)]
    main: Vec<Vec<ConnectionTarget>>,
}

fn param<'a>(node: &'a StepNode, key: &str) -> &'a str {
    node.parameters.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Describe one step by its type (the last dotted segment of the engine type).
fn describe_step(node: &StepNode) -> String {
    let kind = node.node_type.rsplit('.').next().unwrap_or("");
    let op = param(node, "operation");
    let name_lower = node.name.to_lowercase();

    let text = match kind {
        "shopifyTrigger" => {
            "Watches your Shopify store and starts the automation when something new happens (like a new customer or order)"
        }
        "scheduleTrigger" => "Runs this automation automatically on a set schedule",
        "webhook" | "webhookTrigger" => "Starts when it receives a signal from another connected system",
        "formTrigger" => "Starts when someone submits a form",
        "emailTrigger" | "gmailTrigger" => "Starts when a new email arrives",

        "googleSheets" => match op {
            "append" | "appendOrUpdate" => "Saves the information as a new row in your Google Sheet",
            "read" | "getAll" | "get" => "Reads existing data from your Google Sheet",
            "update" => "Updates an existing entry in your Google Sheet",
            "lookup" => "Searches your Google Sheet for matching data",
            "delete" => "Removes a row from your Google Sheet",
            _ => "Works with data in your Google Sheet",
        },

        "gmail" => match op {
            "" | "send" | "sendEmail" => "Sends an email via Gmail",
            "get" | "getAll" => "Reads emails from Gmail",
            _ => "Works with Gmail",
        },

        "if" => {
            "Checks a condition and splits into two different paths — one if the answer is yes, one if no"
        }
        "switch" => "Routes the automation down different paths depending on a value",
        "filter" => "Filters out items that don't meet the criteria, only keeping the ones that do",
        "merge" => "Combines data coming from two different paths before continuing",

        "httpRequest" => {
            let url = param(node, "url");
            if url.contains("vapi") || name_lower.contains("call") || name_lower.contains("phone") {
                "Triggers an automated phone call through the AI calling system"
            } else if url.contains("shopify") {
                "Sends a request to Shopify"
            } else {
                "Sends a request to an external service"
            }
        }

        "openAi" | "lmOpenAi" | "openAiChat" => "Uses OpenAI to generate or analyze text",
        "anthropic" | "lmChatAnthropic" => "Uses Claude AI to write or analyze text",
        "agent" | "lmAgent" => "An AI agent that thinks through a task and takes actions to complete it",

        "code" => "Runs a custom calculation or data transformation in the background",
        "set" | "editFields" => "Organizes and prepares the data before sending it to the next step",
        "splitInBatches" => "Processes the data in smaller groups so nothing gets overloaded",
        "removeDuplicates" => "Removes any duplicate entries from the data",

        "slack" => "Sends a message to a Slack channel or person",
        "twilio" => "Sends an SMS text message",
        "sendEmail" | "emailSend" => "Sends an email notification",

        "shopify" => match op {
            "create" => "Creates a new item in Shopify (like a blog post or product)",
            "update" => "Updates an existing item in Shopify",
            "get" | "getAll" => "Retrieves data from Shopify",
            _ => "Works with your Shopify store",
        },

        "wait" => {
            "Pauses the automation and waits for a response or a set amount of time before continuing"
        }
        "respondToWebhook" => "Sends the final response and completes this run of the automation",
        "noOp" | "noop" => "A placeholder step — does nothing but keep the flow moving",

        _ if !node.name.is_empty() => return node.name.clone(),
        _ => kind,
    };
    text.to_string()
}

struct Walker<'a> {
    by_name: HashMap<&'a str, &'a StepNode>,
    connections: &'a HashMap<String, StepOutputs>,
    visited: HashSet<String>,
}

impl<'a> Walker<'a> {
    fn walk(&mut self, name: &str) -> Vec<TimelineStep> {
        let Some(node) = self.by_name.get(name).copied() else {
            return Vec::new();
        };
        if !self.visited.insert(name.to_string()) {
            return Vec::new();
        }

        let connections: &'a HashMap<String, StepOutputs> = self.connections;
        let outputs: &'a [Vec<ConnectionTarget>] = connections
            .get(name)
            .map(|o| o.main.as_slice())
            .unwrap_or(&[]);

        let mut step = TimelineStep {
            id: node.id.clone(),
            name: node.name.clone(),
            description: describe_step(node),
            is_branch_point: outputs.len() > 1,
            branches: None,
        };

        match outputs {
            [] => vec![step],
            [single] => {
                let mut steps = vec![step];
                for target in single {
                    steps.extend(self.walk(&target.node));
                }
                steps
            }
            branches => {
                let is_if = node.node_type.contains(".if");
                step.branches = Some(
                    branches
                        .iter()
                        .enumerate()
                        .map(|(i, branch)| TimelineBranch {
                            label: match (is_if, i) {
                                (true, 0) => "✅ If YES".to_string(),
                                (true, _) => "❌ If NO".to_string(),
                                _ => format!("Path {}", i + 1),
                            },
                            steps: branch.iter().flat_map(|t| self.walk(&t.node)).collect(),
                        })
                        .collect(),
                );
                vec![step]
            }
        }
    }
}

/// Build the timeline for a full workflow definition (`{nodes, connections}`).
pub fn build_timeline(workflow: &Value) -> Vec<TimelineStep> {
    let nodes: Vec<StepNode> = workflow
        .get("nodes")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|n| serde_json::from_value::<StepNode>(n.clone()).ok())
                .filter(|n| !n.node_type.contains("stickyNote"))
                .collect()
        })
        .unwrap_or_default();

    if nodes.is_empty() {
        return Vec::new();
    }

    let connections: HashMap<String, StepOutputs> = workflow
        .get("connections")
        .cloned()
        .and_then(|c| serde_json::from_value(c).ok())
        .unwrap_or_default();

    let has_incoming: HashSet<&str> = connections
        .values()
        .flat_map(|o| o.main.iter().flatten())
        .map(|t| t.node.as_str())
        .collect();

    let starts: Vec<&StepNode> = nodes
        .iter()
        .filter(|n| !has_incoming.contains(n.name.as_str()))
        .collect();
    let seeds: Vec<String> = if starts.is_empty() {
        vec![nodes[0].name.clone()]
    } else {
        starts.iter().map(|n| n.name.clone()).collect()
    };

    let mut walker = Walker {
        by_name: nodes.iter().map(|n| (n.name.as_str(), n)).collect(),
        connections: &connections,
        visited: HashSet::new(),
    };

    let timeline: Vec<TimelineStep> = seeds.iter().flat_map(|name| walker.walk(name)).collect();
    timeline
}
