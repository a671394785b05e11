//! Trains the sentiment pipeline, predicts the sample sentences and reports
//! held-out quality metrics.

use std::path::PathBuf;

use sentiment_analysis::config::{self, AppConfig};
use sentiment_analysis::{logging, tutorial};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let mut config =
        config::load_or_default(options.config.as_deref()).map_err(|err| err.to_string())?;
    apply_overrides(&mut config, options);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    tutorial::run(&config, &mut out).map_err(|err| err.to_string())?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    config: Option<PathBuf>,
    train: Option<PathBuf>,
    test: Option<PathBuf>,
    save_model: Option<PathBuf>,
}

fn apply_overrides(config: &mut AppConfig, options: CliOptions) {
    if let Some(path) = options.train {
        config.data.train_path = path;
    }
    if let Some(path) = options.test {
        config.data.test_path = path;
    }
    if let Some(path) = options.save_model {
        config.output.model_path = Some(path);
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        let slot = match flag {
            "-h" | "--help" => return Err(help_text()),
            "--config" => &mut options.config,
            "--train" => &mut options.train,
            "--test" => &mut options.test,
            "--save-model" => &mut options.save_model,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        };
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        *slot = Some(PathBuf::from(value));
        idx += 1;
    }
    Ok(options)
}

fn help_text() -> String {
    [
        "sentiment-analysis",
        "",
        "Trains a boosted-tree sentiment classifier, predicts sample sentences and",
        "reports accuracy, AUC and F1 on a held-out file.",
        "",
        "Usage:",
        "  sentiment-analysis [options]",
        "",
        "Options:",
        "  --config <file>      TOML config (default: sentiment.toml in the app dir, if present).",
        "  --train <file>       Training data, text<TAB>label per line.",
        "  --test <file>        Evaluation data, text<TAB>label per line.",
        "  --save-model <file>  Write the trained model as JSON.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_path_flags() {
        let options = parse_args(args(&["--train", "a.txt", "--save-model", "m.json"])).unwrap();
        assert_eq!(options.train, Some(PathBuf::from("a.txt")));
        assert_eq!(options.save_model, Some(PathBuf::from("m.json")));
        assert!(options.test.is_none());
    }

    #[test]
    fn rejects_missing_values_and_unknown_flags() {
        assert_eq!(
            parse_args(args(&["--test"])).unwrap_err(),
            "--test requires a value"
        );
        assert!(parse_args(args(&["--bogus"])).unwrap_err().starts_with("Unknown argument"));
    }

    #[test]
    fn overrides_replace_config_paths() {
        let mut config = AppConfig::default();
        apply_overrides(
            &mut config,
            CliOptions {
                test: Some(PathBuf::from("held_out.txt")),
                ..CliOptions::default()
            },
        );
        assert_eq!(config.data.test_path, PathBuf::from("held_out.txt"));
        assert!(config.data.train_path.ends_with("imdb_labelled.txt"));
    }
}
