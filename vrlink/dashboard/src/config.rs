use pico_args::Arguments;
use std::path::PathBuf;
use vrlink_common::{anyhow::Result, bail};

pub const DEFAULT_HOST: &str = "127.0.0.1:8082";
pub const DEFAULT_TRANSLATIONS_DIR: &str = "translations";

pub const HELP: &str = r#"
vrlink_dashboard
Settings and telemetry dashboard for the vrlink streamer.

USAGE:
    vrlink_dashboard [FLAGS]

FLAGS:
    --host <HOST:PORT>      Streamer web server address [default: 127.0.0.1:8082]
    --translations <DIR>    Directory containing <locale>/settings.json and
                            <locale>/notifications.json [default: translations]
    --locale <CODE>         Override the locale stored in the session
    --help                  Print this text
"#;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub host: String,
    pub translations_dir: PathBuf,
    pub locale: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            translations_dir: DEFAULT_TRANSLATIONS_DIR.into(),
            locale: None,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Invocation {
    Run(Config),
    Help,
}

pub fn parse_args(mut args: Arguments) -> Result<Invocation> {
    if args.contains(["-h", "--help"]) {
        return Ok(Invocation::Help);
    }

    let default = Config::default();
    let config = Config {
        host: args.opt_value_from_str("--host")?.unwrap_or(default.host),
        translations_dir: args
            .opt_value_from_str("--translations")?
            .unwrap_or(default.translations_dir),
        locale: args.opt_value_from_str("--locale")?,
    };

    let remaining = args.finish();
    if !remaining.is_empty() {
        bail!("Unrecognized arguments: {remaining:?}");
    }

    Ok(Invocation::Run(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    #[test]
    fn defaults() {
        assert_eq!(
            parse_args(args(&[])).unwrap(),
            Invocation::Run(Config::default())
        );
    }

    #[test]
    fn flags() {
        let invocation = parse_args(args(&[
            "--host",
            "192.168.1.5:9000",
            "--locale",
            "it",
            "--translations",
            "/opt/vrlink/translations",
        ]))
        .unwrap();

        assert_eq!(
            invocation,
            Invocation::Run(Config {
                host: "192.168.1.5:9000".into(),
                translations_dir: "/opt/vrlink/translations".into(),
                locale: Some("it".into()),
            })
        );
    }

    #[test]
    fn help_and_unknown_flags() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), Invocation::Help);
        assert!(parse_args(args(&["--verbose"])).is_err());
    }
}
