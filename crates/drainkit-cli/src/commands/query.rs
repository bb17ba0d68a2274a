use std::collections::BTreeSet;

use anyhow::Context as _;
use serde_json::json;

use drainkit_admission::is_busy;
use drainkit_core::{ClusterView, NO_NODE_RESTRICTION, OutputFormat};

use super::Context;

pub fn permitted(ctx: &Context, node: Option<&str>) -> anyhow::Result<String> {
    let ev = ctx.evaluator();
    let node = node.unwrap_or(NO_NODE_RESTRICTION);
    let ids = ev.permitted_ids_for_node(node);
    let projects = ev.permitted_project_names_for_node(node);

    match ctx.format {
        OutputFormat::Json => Ok(format!(
            "{}\n",
            serde_json::to_string_pretty(&json!({
                "node": node_label(node),
                "ids": ids,
                "projects": projects,
            }))?
        )),
        OutputFormat::Text => {
            let mut out = format!("Permitted on {}:\n", node_label(node).unwrap_or("cluster"));
            out.push_str(&format!("  ids:      {}\n", join(&ids)));
            out.push_str(&format!("  projects: {}\n", join(&projects)));
            Ok(out)
        }
    }
}

pub fn running(ctx: &Context, node: Option<&str>) -> anyhow::Result<String> {
    let ev = ctx.evaluator();
    let projects = match node {
        Some(name) => ev.running_project_names_on(name),
        None => ev.running_project_names(),
    };

    match ctx.format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&projects)?)),
        OutputFormat::Text => Ok(projects.iter().map(|p| format!("{p}\n")).collect()),
    }
}

pub fn exclusive(ctx: &Context, node_name: &str) -> anyhow::Result<String> {
    let ev = ctx.evaluator();
    let node = ctx
        .snapshot
        .resolve_node(node_name)
        .with_context(|| format!("unknown node {node_name:?}"))?;
    let has_exclusive = ev.has_exclusive_queued_job(node);
    let busy = node.to_computer().is_some_and(is_busy);

    match ctx.format {
        OutputFormat::Json => Ok(format!(
            "{}\n",
            serde_json::to_string_pretty(&json!({
                "node": node.display_name(),
                "has_exclusive_job": has_exclusive,
                "busy": busy,
            }))?
        )),
        OutputFormat::Text => Ok(format!(
            "{}: exclusive job queued: {}, busy: {}\n",
            node.display_name(),
            has_exclusive,
            busy
        )),
    }
}

/// `None` for the unrestricted query.
fn node_label(node: &str) -> Option<&str> {
    (node != NO_NODE_RESTRICTION).then_some(node)
}

fn join<T: ToString>(items: &BTreeSet<T>) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}
