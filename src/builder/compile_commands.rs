//! `compile_commands.json` emission for IDE integration.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::builder::toolchain::CompilePlan;
use crate::config::BuildConfiguration;

/// One compile_commands.json entry.
#[derive(Debug, Serialize)]
struct CompileCommand {
    directory: String,
    file: String,
    arguments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
}

/// Write compile_commands.json for every source in the plan.
///
/// Batched jobs (the Windows compile pass) emit one entry per source,
/// all pointing at the same response-file invocation.
pub fn emit_compile_commands(
    cfg: &BuildConfiguration,
    plan: &CompilePlan,
    path: &Path,
) -> Result<()> {
    let directory = cfg.working_dir.display().to_string();

    let mut commands = Vec::new();
    for job in plan.parallel.iter().chain(plan.sequential.iter()) {
        let mut arguments = Vec::with_capacity(job.invocation.args.len() + 1);
        arguments.push(job.invocation.program.display().to_string());
        arguments.extend(job.invocation.args.iter().cloned());

        for (i, source) in job.sources.iter().enumerate() {
            commands.push(CompileCommand {
                directory: directory.clone(),
                file: source.display().to_string(),
                arguments: arguments.clone(),
                output: job.objects.get(i).map(|o| o.display().to_string()),
            });
        }
    }

    let json = serde_json::to_string_pretty(&commands)?;
    std::fs::write(path, json)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::{GnuToolchain, Toolchain};
    use crate::util::platform::HostOs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_emit_one_entry_per_source() {
        let tmp = TempDir::new().unwrap();
        let cfg = BuildConfiguration::new("/work", "demo");
        let tc = GnuToolchain::new("gcc", "ar", HostOs::Linux);

        let sources = vec![PathBuf::from("a.c"), PathBuf::from("b.c")];
        let plan = tc.plan_compile(&cfg, &sources, tmp.path()).unwrap();

        let out = tmp.path().join("compile_commands.json");
        emit_compile_commands(&cfg, &plan, &out).unwrap();

        let json = std::fs::read_to_string(&out).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = parsed.as_array().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["directory"], "/work");
        assert_eq!(entries[0]["file"], "a.c");
        assert!(entries[0]["arguments"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "-c"));
        assert!(entries[0]["output"].as_str().unwrap().ends_with("a.o"));
    }
}
