use std::fs;
use std::path::Path;

use serde_json::json;

use crate::core::node::NodeId;
use crate::core::scenario::ScenarioRun;
use crate::error::{RagError, Result};

pub const DEFAULT_REPORT_TEMPLATE: &str = "Scenario: {{ name }} (policy: {{ policy }})
{% for message in messages %}- {{ message }}
{% endfor %}Nodes: {{ nodes | join(sep=\", \") }}
Allocations: {{ allocations | join(sep=\", \") }}
Requests: {{ requests | join(sep=\", \") }}
{% if deadlock %}Deadlock: {{ cycle }}{% else %}Deadlock: none{% endif %}
";

pub fn render_template(template: &str, context: &serde_json::Value) -> Result<String> {
    let context = tera::Context::from_serialize(context)
        .map_err(|err| RagError::Other(anyhow::Error::new(err)))?;
    tera::Tera::one_off(template, &context, false)
        .map_err(|err| RagError::Other(anyhow::Error::new(err)))
}

fn format_pairs(pairs: &[(NodeId, NodeId)]) -> Vec<String> {
    pairs
        .iter()
        .map(|(from, to)| format!("{} → {}", from, to))
        .collect()
}

pub fn report_context(run: &ScenarioRun) -> serde_json::Value {
    json!({
        "name": run.name,
        "policy": run.policy,
        "messages": run.messages,
        "nodes": run.snapshot.nodes.iter().map(|node| node.id.to_string()).collect::<Vec<_>>(),
        "edges": run.snapshot.edges,
        "allocations": format_pairs(&run.snapshot.allocations),
        "requests": format_pairs(&run.snapshot.requests),
        "deadlock": run.detection.is_deadlocked(),
        "cycle": run.detection.cycle().map(|cycle| cycle.path()),
    })
}

/// Renders `run` with the template at `template_path`, or the built-in one.
pub fn render_report(run: &ScenarioRun, template_path: Option<&Path>) -> Result<String> {
    let template = match template_path {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_REPORT_TEMPLATE.to_string(),
    };
    render_template(&template, &report_context(run))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::core::scenario::{Scenario, Step};
    use crate::graph::connect::PolicyKind;
    use crate::util::template::render_report;

    #[test]
    fn renders_default_report_for_demo() {
        let run = Scenario::demo()
            .run(PolicyKind::Storytelling)
            .expect("run demo");
        let report = render_report(&run, None).expect("render report");
        assert_eq!(
            report.trim_end(),
            "Scenario: demo (policy: storytelling)
- Added process: P1
- Added resource: R1
- Allocated R1 → P1
- Added process: P2
- Allocated R1 → P2
- Requested P1 → R1
Nodes: P1, R1, P2
Allocations: R1 → P1, R1 → P2
Requests: P1 → R1
Deadlock: P1 → R1 → P1"
        );
    }

    #[test]
    fn renders_custom_template_file() {
        let path = unique_temp_path("report");
        fs::write(
            &path,
            "{{ name }}: {% if deadlock %}deadlocked{% else %}clear{% endif %} ({{ nodes | length }} nodes)",
        )
        .expect("write template file");
        let scenario = Scenario {
            name: Some("quiet".to_string()),
            steps: vec![Step::AddProcess],
            ..Scenario::default()
        };
        let run = scenario.run(PolicyKind::Storytelling).expect("run");
        let output = render_report(&run, Some(&path)).expect("render template file");
        assert_eq!(output, "quiet: clear (1 nodes)");
        let _ = fs::remove_file(&path);
    }

    fn unique_temp_path(prefix: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_nanos();
        let pid = std::process::id();
        std::env::temp_dir().join(format!("ragsim-{prefix}-{pid}-{nanos}.tera"))
    }
}
