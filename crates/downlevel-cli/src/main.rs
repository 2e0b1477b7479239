use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, Command};
use downlevel_core::engine::ProcessedUnit;
use downlevel_core::{init_tracing, rules, DownlevelConfig, FileRunner};
use tracing::{debug, info};

fn main() -> Result<()> {
    let matches = Command::new("downlevel")
        .version(downlevel_core::VERSION)
        .about("Downgrade parsed PHP source units to older syntax")
        .arg(
            Arg::new("files")
                .value_name("UNIT")
                .help("Parsed source units (JSON documents with path, ast and optional source/tokens)")
                .num_args(1..)
                .required_unless_present("list-rules"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("JSON configuration file"),
        )
        .arg(
            Arg::new("rule")
                .long("rule")
                .value_name("NAME")
                .help("Run only this rule; may be repeated")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .help("Emit source text instead of the rewritten JSON unit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("DIR")
                .help("Write one output file per unit into DIR instead of stdout"),
        )
        .arg(
            Arg::new("list-rules")
                .long("list-rules")
                .help("List available rules and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    if debug {
        init_debug_tracing();
    } else {
        init_tracing();
    }

    if matches.get_flag("list-rules") {
        list_rules();
        return Ok(());
    }

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => DownlevelConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {path}"))?,
        None => DownlevelConfig::default(),
    };
    if let Some(names) = matches.get_many::<String>("rule") {
        config.rules = Some(names.cloned().collect());
    }
    config.validate()?;

    let files: Vec<String> = matches
        .get_many::<String>("files")
        .map(|files| files.cloned().collect())
        .unwrap_or_default();
    let print = matches.get_flag("print");
    let output_dir = matches.get_one::<String>("output").map(PathBuf::from);

    let mut runner = FileRunner::from_config(&config)?;
    let summary = runner.process_files(&files, |unit| {
        let path = unit.path.clone();
        let content = render(unit, print)?;
        match &output_dir {
            Some(dir) => {
                let target = output_path(dir, path.as_str(), print);
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&target, content)
                    .with_context(|| format!("Failed to write {}", target.display()))?;
                debug!(unit = %path, target = %target.display(), "wrote output");
            }
            None => println!("{content}"),
        }
        Ok(())
    });

    let mut stats: Vec<_> = runner.dispatcher().stats().values().collect();
    stats.sort_by(|a, b| a.rule_name.cmp(&b.rule_name));
    for rule in stats {
        debug!(
            rule = %rule.rule_name,
            applications = rule.applications,
            rewrites = rule.rewrites(),
            rewrite_rate = rule.rewrite_rate(),
            "rule statistics"
        );
    }
    info!(
        processed = summary.files_processed,
        rewritten = summary.files_rewritten,
        failed = summary.errors.len(),
        "done"
    );

    if !summary.success() {
        for error in &summary.errors {
            eprintln!("{error}");
        }
        bail!("{} unit(s) failed", summary.errors.len());
    }
    Ok(())
}

fn init_debug_tracing() {
    let filter = tracing_subscriber::EnvFilter::new("downlevel_core=debug,downlevel=debug");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn list_rules() {
    for rule in rules::default_rules() {
        println!("{:<28} {}", rule.name(), rule.description());
        if let Some(sample) = rule.code_sample() {
            println!("    before: {}", sample.before.replace('\n', "\n            "));
            println!("    after:  {}", sample.after.replace('\n', "\n            "));
        }
    }
}

fn render(unit: ProcessedUnit, print: bool) -> Result<String> {
    if print {
        Ok(unit.render())
    } else {
        Ok(serde_json::to_string_pretty(&unit.into_unit())?)
    }
}

/// Location under `dir` mirroring the unit path, never escaping `dir`
fn output_path(dir: &Path, unit_path: &str, print: bool) -> PathBuf {
    let relative: PathBuf = Path::new(unit_path)
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
    let mut target = dir.join(relative);
    if !print {
        let mut name = target.clone().into_os_string();
        name.push(".json");
        target = PathBuf::from(name);
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_stays_inside_dir() {
        let dir = Path::new("/out");
        assert_eq!(
            output_path(dir, "src/a.php", true),
            PathBuf::from("/out/src/a.php")
        );
        assert_eq!(
            output_path(dir, "/abs/../b.php", true),
            PathBuf::from("/out/abs/b.php")
        );
        assert_eq!(
            output_path(dir, "src/a.php", false),
            PathBuf::from("/out/src/a.php.json")
        );
    }
}
