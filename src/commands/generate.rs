//! `generate` subcommand: shell completions and man pages.
use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write the completion script for `shell` to `writer`.
pub fn write_completions<W: Write>(shell: Shell, cmd: &mut clap::Command, writer: &mut W) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, writer);
}

/// Write a man page for `cmd` and one per (nested) subcommand, named
/// `jps.1`, `jps-repl.1`, ... into `output_dir`, or the current directory.
/// Returns the paths written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or a page cannot be
/// written.
pub fn generate_man_pages(
    cmd: &clap::Command,
    output_dir: Option<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let output_dir = match output_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Opening current directory")?,
    };
    std::fs::create_dir_all(&output_dir).with_context(|| {
        format!("Failed to create {}", output_dir.display())
    })?;

    let mut written = Vec::new();
    let mut pending = vec![(cmd.get_name().to_string(), cmd.clone())];
    while let Some((page_name, command)) = pending.pop() {
        for sub in command.get_subcommands() {
            pending.push((format!("{page_name}-{}", sub.get_name()), sub.clone()));
        }
        // clap_mangen takes the page title from the command name; the leak
        // lasts only as long as this one-shot process.
        let title: &'static str = Box::leak(page_name.clone().into_boxed_str());
        let page = clap_mangen::Man::new(
            command.name(title).disable_help_subcommand(true),
        );
        let path = output_dir.join(format!("{page_name}.1"));
        write_page(&page, &path)?;
        log::info!("generated {}", path.display());
        written.push(path);
    }
    written.sort();
    Ok(written)
}

fn write_page(page: &clap_mangen::Man, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    page.render(&mut file)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::{Arg, Command};

    fn command() -> Command {
        Command::new("jps")
            .arg(Arg::new("query"))
            .subcommand(Command::new("repl").arg(Arg::new("file")))
            .subcommand(
                Command::new("generate")
                    .subcommand(Command::new("shell"))
                    .subcommand(Command::new("man")),
            )
    }

    #[test]
    fn man_pages_for_every_subcommand() {
        let dir = tempfile::tempdir().unwrap();
        let written =
            generate_man_pages(&command(), Some(dir.path().to_path_buf()))
                .unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "jps-generate-man.1",
                "jps-generate-shell.1",
                "jps-generate.1",
                "jps-repl.1",
                "jps.1",
            ]
        );
        assert!(written.iter().all(|p| p.metadata().unwrap().len() > 0));
    }

    #[test]
    fn bash_completions_mention_binary() {
        let mut out = Vec::new();
        write_completions(Shell::Bash, &mut command(), &mut out);
        assert!(String::from_utf8(out).unwrap().contains("jps"));
    }
}
