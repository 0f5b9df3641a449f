use crate::batch::entry_path;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;

pub const USAGE: &str = "\
Convert Stanford Encyclopedia of Philosophy entries to Markdown

Usage:
  sep2md <URL> [-o FILE | -d DIR] [options]
  sep2md --all -d DIR [options]

Options:
  -o, --output FILE     Write the Markdown to FILE
  -d, --directory DIR   Write to DIR/<entry>.md (required with --all)
      --all             Scrape every entry listed in the table of contents
  -v, --verbose         Enable debug logging
      --config FILE     Read scraper settings from a JSON file
      --log-file FILE   Write logs to FILE instead of stderr
  -h, --help            Show this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Single { url: String },
    All,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Stdout,
    File(PathBuf),
    Directory(PathBuf),
}

impl Output {
    /// Writes `markdown` for the entry at `url`, creating parent directories.
    /// Returns the written path, or `None` when printing to stdout.
    pub fn write(&self, url: &str, markdown: &str) -> Result<Option<PathBuf>> {
        let path = match self {
            Output::Stdout => {
                print!("{markdown}");
                return Ok(None);
            }
            Output::File(path) => path.clone(),
            Output::Directory(dir) => entry_path(dir, url),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, markdown).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Some(path))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub mode: Mode,
    pub output: Output,
    pub verbose: bool,
    pub config: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    /// Parses arguments, not including the program name.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut url = None;
        let mut all = false;
        let mut help = false;
        let mut output_file = None;
        let mut directory = None;
        let mut verbose = false;
        let mut config = None;
        let mut log_file = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-o" | "--output" => output_file = Some(value(&mut args, &arg)?),
                "-d" | "--directory" => directory = Some(value(&mut args, &arg)?),
                "--all" => all = true,
                "-v" | "--verbose" => verbose = true,
                "--config" => config = Some(value(&mut args, &arg)?),
                "--log-file" => log_file = Some(PathBuf::from(value(&mut args, &arg)?)),
                "-h" | "--help" => help = true,
                flag if flag.starts_with('-') => bail!("Unknown option: {flag}"),
                _ if url.is_some() => bail!("Unexpected argument: {arg}"),
                _ => url = Some(arg),
            }
        }

        let output = match (output_file, directory) {
            (Some(_), Some(_)) => bail!("-o and -d cannot be used together"),
            (Some(file), None) => Output::File(PathBuf::from(file)),
            (None, Some(dir)) => Output::Directory(PathBuf::from(dir)),
            (None, None) => Output::Stdout,
        };

        let mode = match (help, all, url) {
            (true, _, _) => Mode::Help,
            (false, true, Some(_)) => bail!("--all does not take a URL"),
            (false, true, None) => {
                if !matches!(output, Output::Directory(_)) {
                    bail!("--all requires -d DIR");
                }
                Mode::All
            }
            (false, false, Some(url)) => Mode::Single { url },
            (false, false, None) => bail!("Missing article URL\n\n{USAGE}"),
        };

        Ok(CliArgs {
            mode,
            output,
            verbose,
            config,
            log_file,
        })
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .with_context(|| format!("Missing value for {flag}\n\n{USAGE}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<CliArgs> {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_single_url_to_stdout() {
        let args = parse(&["https://plato.stanford.edu/entries/kant/"]).unwrap();
        assert_eq!(
            args.mode,
            Mode::Single {
                url: "https://plato.stanford.edu/entries/kant/".to_string()
            }
        );
        assert_eq!(args.output, Output::Stdout);
        assert!(!args.verbose);
    }

    #[test]
    fn test_all_options() {
        let args = parse(&[
            "-v", "--config", "c.json", "--log-file", "run.log", "-d", "out", "https://x/entries/y/",
        ])
        .unwrap();
        assert!(args.verbose);
        assert_eq!(args.config.as_deref(), Some("c.json"));
        assert_eq!(args.log_file, Some(PathBuf::from("run.log")));
        assert_eq!(args.output, Output::Directory(PathBuf::from("out")));
    }

    #[test]
    fn test_batch_mode_needs_directory() {
        assert_eq!(parse(&["--all", "-d", "out"]).unwrap().mode, Mode::All);
        assert!(parse(&["--all"]).is_err());
        assert!(parse(&["--all", "-o", "x.md"]).is_err());
        assert!(parse(&["--all", "-d", "out", "https://x/entries/y/"]).is_err());
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-o"]).is_err());
        assert!(parse(&["--frobnicate", "u"]).is_err());
        assert!(parse(&["u1", "u2"]).is_err());
        assert!(parse(&["u", "-o", "a.md", "-d", "dir"]).is_err());
        assert_eq!(parse(&["--help"]).unwrap().mode, Mode::Help);
    }

    #[test]
    fn test_write_to_directory_names_file_after_entry() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested");
        let written = Output::Directory(out.clone())
            .write("https://plato.stanford.edu/entries/kant/", "# Kant\n")
            .unwrap();
        assert_eq!(written, Some(out.join("kant.md")));
        assert_eq!(fs::read_to_string(out.join("kant.md")).unwrap(), "# Kant\n");
    }

    #[test]
    fn test_write_to_file_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c.md");
        Output::File(path.clone()).write("u", "body").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "body");
    }
}
