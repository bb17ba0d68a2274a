use anyhow::Context as _;

use drainkit_admission::{format_cluster_report, format_node_report};
use drainkit_core::OutputFormat;

use super::Context;

pub fn report(ctx: &Context, node: Option<&str>) -> anyhow::Result<String> {
    let ev = ctx.evaluator();

    match node {
        Some(name) => {
            let report = ev
                .node_report(name)
                .with_context(|| format!("unknown node {name:?}"))?;
            match ctx.format {
                OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&report)?)),
                OutputFormat::Text => Ok(format_node_report(&report)),
            }
        }
        None => {
            let report = ev.cluster_report();
            match ctx.format {
                OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&report)?)),
                OutputFormat::Text => Ok(format_cluster_report(&report)),
            }
        }
    }
}
