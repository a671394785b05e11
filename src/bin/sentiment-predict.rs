//! Developer utility to classify texts with a saved sentiment model.

use std::io::BufRead;
use std::path::PathBuf;

use sentiment_analysis::data::UnlabeledRecord;
use sentiment_analysis::pipeline::PredictionModel;
use sentiment_analysis::report::sentiment_label;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let model = PredictionModel::load_json(&options.model_path).map_err(|err| err.to_string())?;

    let records: Vec<UnlabeledRecord> = if options.texts.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .map(|line| line.map(UnlabeledRecord::new))
            .filter(|line| !matches!(line, Ok(record) if record.text.trim().is_empty()))
            .collect::<Result<_, _>>()
            .map_err(|err| format!("Failed to read stdin: {err}"))?
    } else {
        options.texts.into_iter().map(UnlabeledRecord::new).collect()
    };

    let predictions = model.predict(&records);
    for (record, prediction) in records.iter().zip(&predictions) {
        println!(
            "{}\t{:.3}\t{}",
            sentiment_label(prediction.sentiment),
            prediction.probability,
            record.text
        );
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: PathBuf,
    texts: Vec<String>,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model_path: Option<PathBuf> = None;
    let mut texts = Vec::new();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            text => texts.push(text.to_string()),
        }
        idx += 1;
    }

    let model_path = model_path.ok_or_else(|| "--model is required".to_string())?;
    Ok(CliOptions { model_path, texts })
}

fn help_text() -> String {
    [
        "sentiment-predict",
        "",
        "Usage:",
        "  sentiment-predict --model <model.json> [text...]",
        "",
        "Classifies each text argument, or each non-empty stdin line when no text is given.",
        "Output: <Positive|Negative><TAB><probability><TAB><text>",
    ]
    .join("\n")
}
