use bumpspec::{plan_bump, BumpTarget, Clock, Config, DateError, Error, DEFAULT_CONFIG_FILE};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    LibraryError(#[from] Error),

    #[error("{0}")]
    UnparseableDate(#[from] DateError),
}

/// Selects the clock that calendar components and `{now}` read from.
#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct DateArg {
    /// [DATE PROVIDER] Use the current UTC date (the default). Exclusive with other date
    /// providers.
    #[arg(long)]
    utc: bool,

    /// [DATE PROVIDER] Use the current local date. Exclusive with other date providers.
    #[arg(long)]
    local: bool,

    /// [DATE PROVIDER] Use a fixed date, `YYYY-MM-DD` or RFC 3339. Exclusive with other date
    /// providers.
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<String>,
}

impl DateArg {
    fn to_clock(&self) -> Result<Clock, CliError> {
        // at most one of these is set
        if self.utc {
            return Ok(Clock::Utc);
        }
        if self.local {
            return Ok(Clock::Local);
        }
        if let Some(date) = &self.date {
            return Ok(date.parse()?);
        }
        Ok(Clock::Utc)
    }
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// The configuration file. Defaults to `.bumpspec.toml`, then `pyproject.toml`, in the
    /// current directory.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the current version of the configuration.
    #[arg(long, value_name = "VERSION")]
    current_version: Option<String>,
}

impl ConfigArgs {
    fn load(&self, env: &[(String, String)]) -> Result<Config, CliError> {
        let mut config = match self.config.clone().or_else(default_config_path) {
            Some(path) => Config::load(&path).map_err(Error::from)?,
            None => {
                tracing::debug!("no configuration file found, using defaults");
                Config::default()
            }
        };
        config.apply_env(env_pairs(env));
        if let Some(current_version) = &self.current_version {
            config.current_version = Some(current_version.clone());
        }
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, "pyproject.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
}

fn env_pairs(env: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    env.iter().map(|(key, value)| (key.as_str(), value.as_str()))
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum, Debug, Default)]
enum PrintArg {
    /// The new version
    #[default]
    Version,
    /// The rendered tag name
    Tag,
    /// The rendered commit message
    Message,
    /// Every value, as `key=value` lines
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increases logging verbosity. Ignored when `RUST_LOG` is set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
#[command(arg_required_else_help(true))]
enum Commands {
    /// Bumps a component of the current version and prints the result.
    ///
    /// Nothing is written: the new version, tag name and commit message are printed for other
    /// tools to use.
    ///
    /// # Date Providers
    ///
    /// Use one of `--utc`, `--local`, or `--date YYYY-MM-DD` to choose the date used by calendar
    /// components and `{now}`.
    Bump {
        /// The component to bump
        #[arg(required_unless_present = "new_version")]
        part: Option<String>,

        /// Use this version instead of bumping a component
        #[arg(long, value_name = "VERSION", conflicts_with = "part")]
        new_version: Option<String>,

        /// What to print
        #[arg(short, long, value_enum, default_value_t = PrintArg::Version)]
        print: PrintArg,

        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        date: DateArg,
    },

    /// Prints each component of the current version as `name=value`
    Show {
        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        date: DateArg,
    },
}

type Output = (String, i32);

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    // stdout is reserved for results
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let env: Vec<(String, String)> = std::env::vars().collect();
    match do_work(cli, &env) {
        Ok((output, exit_code)) => {
            println!("{output}");
            std::process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn do_work(cli: Cli, env: &[(String, String)]) -> Result<Output, CliError> {
    match cli.command {
        Some(Commands::Bump {
            part,
            new_version,
            print,
            config,
            date,
        }) => {
            let config = config.load(env)?;
            let clock = date.to_clock()?;
            let target = match (new_version, part) {
                (Some(version), _) => BumpTarget::NewVersion(version),
                (None, Some(part)) => BumpTarget::Part(part),
                (None, None) => unreachable!("clap requires a part or a new version"),
            };

            let outcome = plan_bump(&config, &target, clock, env_pairs(env), None)?;
            let output = match print {
                PrintArg::Version => outcome.new_version,
                PrintArg::Tag => outcome.tag_name,
                PrintArg::Message => outcome.message,
                PrintArg::All => format!(
                    "current_version={}\nnew_version={}\ntag_name={}\nmessage={}",
                    outcome.current_version, outcome.new_version, outcome.tag_name, outcome.message
                ),
            };
            Ok((output, 0))
        }
        Some(Commands::Show { config, date }) => {
            let config = config.load(env)?;
            let clock = date.to_clock()?;

            let current = config.current_version().map_err(Error::from)?;
            let regex = config.parse_regex().map_err(Error::from)?;
            let spec = config.version_spec(clock).map_err(Error::from)?;
            let version = spec.parse_version(current, &regex).map_err(Error::from)?;

            let output = version
                .values()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("\n");
            Ok((output, 0))
        }
        None => unreachable!("clap should catch this no-subcommand case"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
        current_version = "1.0b1"
        parse = '(?P<major>\d+)\.(?P<minor>\d+)((?P<prerel>[a-z]+)(?P<prerelversion>\d+))?'
        serialize = ["{major}.{minor}{prerel}{prerelversion}", "{major}.{minor}"]
        tag_name = "release-{new_version}"
        message = "Release {new_version} on {now:%Y-%m-%d}"

        [parts.prerel]
        values = ["dev", "a", "b", "c", "rc", "d"]
        optional_value = "d"
    "#;

    fn config_file() -> (TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, CONFIG).unwrap();
        (dir, path.display().to_string())
    }

    fn run(args: &[&str]) -> Result<Output, CliError> {
        run_with_env(args, &[])
    }

    fn run_with_env(args: &[&str], env: &[(&str, &str)]) -> Result<Output, CliError> {
        let cli = Cli::try_parse_from(args).unwrap();
        let env: Vec<(String, String)> = env
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        do_work(cli, &env)
    }

    #[rstest]
    #[case(&["prerelversion"], "1.0b2")]
    #[case(&["prerel"], "1.0c0")]
    #[case(&["major", "--print", "tag"], "release-2.0dev0")]
    #[case(&["minor", "--print", "message"], "Release 1.1dev0 on 2020-05-01")]
    #[case(&["--new-version", "4.2b3", "--print", "tag"], "release-4.2b3")]
    #[case(&["prerel", "--current-version", "1.0rc2"], "1.0")]
    fn test_bump(#[case] args: &[&str], #[case] expected: &str) {
        let (_dir, path) = config_file();
        let mut argv = vec!["bumpspec", "bump", "--config", path.as_str(), "--date", "2020-05-01"];
        argv.extend_from_slice(args);

        assert_eq!(expected.to_string(), run(&argv).unwrap().0);
    }

    #[test]
    fn test_bump_print_all() {
        let (_dir, path) = config_file();
        let (output, exit_code) = run(&[
            "bumpspec", "bump", "minor", "--config", &path, "--date", "2020-05-01", "--print",
            "all",
        ])
        .unwrap();

        assert_eq!(0, exit_code);
        assert_eq!(
            "current_version=1.0b1\nnew_version=1.1dev0\ntag_name=release-1.1dev0\nmessage=Release 1.1dev0 on 2020-05-01",
            output
        );
    }

    #[rstest]
    #[case(&[], "release-1.0b2")]
    #[case(&[("BUMPSPEC_CURRENT_VERSION", "2.0b1")], "release-2.0b2")]
    #[case(&[("BUMPSPEC_TAG_NAME", "{$USER}/{new_version}"), ("USER", "ci")], "ci/1.0b2")]
    #[case(
        &[
            ("BUMPSPEC_TAG_NAME", "{$USER}/{new_version}"),
            ("USER", "ci"),
            ("BUMPSPEC_CURRENT_VERSION", "3.1a4"),
        ],
        "ci/3.1a5"
    )]
    fn test_bump_env(#[case] env: &[(&str, &str)], #[case] expected: &str) {
        let (_dir, path) = config_file();
        let args = ["bumpspec", "bump", "prerelversion", "--config", &path, "--print", "tag"];

        assert_eq!(expected.to_string(), run_with_env(&args, env).unwrap().0);
    }

    #[test]
    fn test_show() {
        let (_dir, path) = config_file();
        let (output, _) = run(&["bumpspec", "show", "--config", &path]).unwrap();
        assert_eq!("major=1\nminor=0\nprerel=b\nprerelversion=1", output);
    }

    #[test]
    fn test_bump_errors() {
        let (_dir, path) = config_file();
        assert!(matches!(
            run(&["bumpspec", "bump", "build", "--config", &path]),
            Err(CliError::LibraryError(Error::Bump(_)))
        ));
        assert!(matches!(
            run(&["bumpspec", "bump", "major", "--config", &path, "--date", "2020-13-01"]),
            Err(CliError::UnparseableDate(_))
        ));
        assert!(matches!(
            run(&["bumpspec", "bump", "major", "--config", "/nonexistent/.bumpspec.toml"]),
            Err(CliError::LibraryError(Error::Config(_)))
        ));
    }

    #[test]
    fn test_argument_parsing() {
        assert!(Cli::try_parse_from(["bumpspec", "bump"]).is_err());
        assert!(Cli::try_parse_from(["bumpspec", "bump", "major", "--utc", "--local"]).is_err());
        assert!(
            Cli::try_parse_from(["bumpspec", "bump", "major", "--new-version", "1.0"]).is_err()
        );

        let cli = Cli::try_parse_from(["bumpspec", "-vv", "bump", "patch", "--local"]).unwrap();
        assert_eq!(2, cli.verbose);
        let Some(Commands::Bump { part, date, print, .. }) = cli.command else {
            panic!("expected the bump command");
        };
        assert_eq!(Some("patch".to_string()), part);
        assert_eq!(PrintArg::Version, print);
        assert!(matches!(date.to_clock(), Ok(Clock::Local)));

        let args = [
            (vec!["bumpspec", "bump", "patch"], Clock::Utc),
            (vec!["bumpspec", "bump", "patch", "--utc"], Clock::Utc),
            (vec!["bumpspec", "bump", "patch", "--local"], Clock::Local),
            (
                vec!["bumpspec", "bump", "patch", "--date", "2020-05-01"],
                Clock::fixed(2020, 5, 1).unwrap(),
            ),
        ];
        for (argv, expected) in args {
            let cli = Cli::try_parse_from(&argv).unwrap();
            let Some(Commands::Bump { date, .. }) = cli.command else {
                panic!("expected the bump command");
            };
            assert_eq!(expected, date.to_clock().unwrap(), "{argv:?}");
        }
    }
}
