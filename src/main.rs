use clap::Parser;
use enki_search::kernel::services::adapters::{
    compile_pattern, ensure_settings_file, load_settings, load_settings_from, ReplaceCoordinator, SearchCoordinator,
    SearchOptions, SearchRequest, SearchScope,
};
use enki_search::kernel::services::ports::{ReplaceMessage, SearchMessage};
use enki_search::kernel::SearchResultsModel;
use enki_search::models::OpenDocuments;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;

mod logging;

/// Search (and optionally replace) a pattern across the files of a directory.
#[derive(Parser, Debug)]
#[command(name = "enki-search", version)]
struct Cli {
    /// Text to look for
    pattern: String,

    /// Directory to search, or a single file
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Treat PATTERN as a regular expression
    #[arg(short = 'e', long)]
    regex: bool,

    #[arg(short, long)]
    ignore_case: bool,

    /// Match whole words only
    #[arg(short, long)]
    word: bool,

    /// File name glob(s) to search, e.g. "*.rs *.toml"
    #[arg(short, long = "mask", value_name = "GLOB")]
    masks: Vec<String>,

    /// Replace every match with TEMPLATE ($1, ${name}, \1 back-references)
    #[arg(short, long, value_name = "TEMPLATE")]
    replace: Option<String>,

    /// Settings file to use instead of the default one
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Also write log output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let logging_guard = logging::init(cli.verbose);
    if let (true, Some(guard)) = (cli.verbose, logging_guard.as_ref()) {
        eprintln!("logging to {}", guard.log_dir().display());
    }

    match run(cli) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("enki-search: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, String> {
    let settings = match &cli.settings {
        Some(path) => load_settings_from(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => {
            // 首次运行时写出默认配置，便于用户修改
            if let Err(e) = ensure_settings_file() {
                tracing::debug!(error = %e, "settings file not created");
            }
            load_settings().unwrap_or_default()
        }
    };

    let options = SearchOptions {
        case_sensitive: !cli.ignore_case,
        whole_word: cli.word,
        regex: cli.regex,
    };
    let regex = compile_pattern(&cli.pattern, options).map_err(|e| e.to_string())?;
    let mask = settings
        .search
        .file_mask(&cli.masks)
        .map_err(|e| e.to_string())?;
    let filter = settings
        .search
        .exclusion_filter()
        .map_err(|e| e.to_string())?;

    // 单个文件按已打开文档处理
    let mut documents = OpenDocuments::new();
    let scope = if cli.path.is_file() {
        documents
            .open_file(&cli.path)
            .map_err(|e| format!("{}: {}", cli.path.display(), e))?;
        SearchScope::OpenDocuments
    } else {
        SearchScope::Directory(cli.path.clone())
    };

    let request = SearchRequest::new(regex, scope)
        .with_mask(mask)
        .with_filter(Arc::new(filter));

    let model = search(request, &documents, cli.verbose)?;
    if model.total_matches == 0 {
        return Ok(ExitCode::FAILURE);
    }

    if let Some(template) = &cli.replace {
        replace(&model, template, &mut documents, cli.verbose)?;
    }
    Ok(ExitCode::SUCCESS)
}

fn search(
    request: SearchRequest,
    documents: &OpenDocuments,
    verbose: bool,
) -> Result<SearchResultsModel, String> {
    let (tx, rx) = mpsc::channel();
    let mut coordinator = SearchCoordinator::new(tx);
    let mut model = SearchResultsModel::default();

    let search_id = coordinator
        .search(request, documents)
        .map_err(|e| format!("failed to start search: {}", e))?;
    model.begin_search(search_id);

    while let Ok(msg) = rx.recv() {
        match &msg {
            SearchMessage::Results { results, .. } => {
                for file in results {
                    for m in &file.matches {
                        println!("{}:{}:{}: {}", m.path.display(), m.line, m.col, m.line_text);
                    }
                }
            }
            SearchMessage::Progress {
                current: Some(current),
                total,
                ..
            } if verbose => eprintln!("searched {}/{} files", current, total),
            SearchMessage::Error { message, .. } => eprintln!("{}", message),
            _ => {}
        }

        let finished = matches!(msg, SearchMessage::Finished { .. });
        model.apply_message(msg);
        if finished {
            break;
        }
    }
    coordinator.wait();

    if let Some(status) = &model.status {
        eprintln!("{}", status);
    }
    Ok(model)
}

fn replace(
    model: &SearchResultsModel,
    template: &str,
    documents: &mut OpenDocuments,
    verbose: bool,
) -> Result<(), String> {
    let batch = model.replace_batch();
    if verbose {
        eprintln!(
            "replacing {} matches in {} files",
            batch.match_count(),
            batch.file_count()
        );
    }
    let paths: Vec<PathBuf> = batch.iter().map(|(path, _)| path.clone()).collect();

    let (tx, rx) = mpsc::channel();
    let mut coordinator = ReplaceCoordinator::new(tx);
    coordinator
        .replace(batch, template, documents)
        .map_err(|e| format!("failed to start replace: {}", e))?;

    while let Ok(msg) = rx.recv() {
        match &msg {
            ReplaceMessage::Error { message, .. } => eprintln!("{}", message),
            ReplaceMessage::Finished { .. } => {
                if let Some(summary) = msg.summary() {
                    eprintln!("{}", summary);
                }
                break;
            }
            ReplaceMessage::Applied { .. } => {}
        }
    }
    coordinator.wait();

    // 已打开文档的修改只在内存中，写回磁盘
    for path in paths {
        if documents.is_dirty(&path) {
            documents
                .save(&path)
                .map_err(|e| format!("{}: {}", path.display(), e))?;
        }
    }
    Ok(())
}
