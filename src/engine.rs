use crate::attr::{clear_many, open_store, set_many, AttributeStore, BatchReport, Outcome};
use crate::config::{Args, BatchOptions, Command, ScanTarget};
use crate::scanner::{Match, ScanCoordinator, ScanRequest};
use crate::{Result, SkipperError};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const NO_MATCHES: &str = "No files found.";

pub struct SkipperEngine {
    args: Args,
    store: Arc<dyn AttributeStore>,
    coordinator: ScanCoordinator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKind {
    Ignore,
    Unignore,
}

impl SkipperEngine {
    /// Resolves the attribute mechanism once for the whole run.
    pub fn new(args: Args) -> Self {
        let mechanism = args.mechanism.resolve();
        let store: Arc<dyn AttributeStore> = Arc::from(open_store(mechanism, args.helper.as_deref()));
        Self::with_store(args, store)
    }

    pub fn with_store(args: Args, store: Arc<dyn AttributeStore>) -> Self {
        debug!("Using {} attribute mechanism", store.mechanism());
        let coordinator = ScanCoordinator::new(Arc::clone(&store));
        Self { args, store, coordinator }
    }

    /// Handle for cancelling the running scan from another thread.
    pub fn coordinator(&self) -> &ScanCoordinator {
        &self.coordinator
    }

    pub fn run(&self) -> Result<()> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out)
    }

    /// Run the command, writing results and batch outcomes to `out`.
    pub fn run_to(&self, out: &mut dyn Write) -> Result<()> {
        match &self.args.command {
            Command::Scan { target, json } => {
                let matches = self.scan(target)?;
                if *json {
                    let body = serde_json::to_string_pretty(&matches).map_err(std::io::Error::from)?;
                    writeln!(out, "{}", body)?;
                } else {
                    write_matches(out, &matches)?;
                }
                Ok(())
            }
            Command::Ignore { target, batch } => self.scan_and_apply(out, target, batch, BatchKind::Ignore),
            Command::Unignore { target, batch } => self.scan_and_apply(out, target, batch, BatchKind::Unignore),
            Command::Set { paths } => self.apply(out, paths, BatchKind::Ignore),
            Command::Clear { paths } => self.apply(out, paths, BatchKind::Unignore),
            Command::Status { paths } => {
                for path in paths {
                    let state = if self.store.get(path) { "ignored" } else { "not ignored" };
                    writeln!(out, "{}\t{}", state, path.display())?;
                }
                Ok(())
            }
        }
    }

    fn scan(&self, target: &ScanTarget) -> Result<Vec<Match>> {
        let request = ScanRequest::parse(&target.root, &target.keywords)?;

        let pb = if self.args.no_progress || self.args.quiet {
            ProgressBar::hidden()
        } else {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
                pb.set_style(style);
            }
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        };

        let ticker = pb.clone();
        let handle = self
            .coordinator
            .spawn(request, move |count| ticker.set_message(format!("Searching... {}", count)))?;
        let result = handle.join();
        pb.finish_and_clear();
        result
    }

    fn scan_and_apply(
        &self,
        out: &mut dyn Write,
        target: &ScanTarget,
        options: &BatchOptions,
        kind: BatchKind,
    ) -> Result<()> {
        let matches = self.scan(target)?;
        if matches.is_empty() {
            writeln!(out, "{}", NO_MATCHES)?;
            return Ok(());
        }

        let paths: Vec<PathBuf> = select_targets(&matches, options.all, kind)
            .into_iter()
            .map(PathBuf::from)
            .collect();

        if matches.len() > paths.len() {
            info!("{} match(es) already in the requested state", matches.len() - paths.len());
        }

        if options.dry_run {
            let verb = match kind {
                BatchKind::Ignore => "Would ignore",
                BatchKind::Unignore => "Would unignore",
            };
            for path in &paths {
                writeln!(out, "{}: {}", verb, path.display())?;
            }
            return Ok(());
        }

        self.apply(out, &paths, kind)
    }

    fn apply(&self, out: &mut dyn Write, paths: &[PathBuf], kind: BatchKind) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }

        let outcomes = match kind {
            BatchKind::Ignore => set_many(self.store.as_ref(), paths),
            BatchKind::Unignore => clear_many(self.store.as_ref(), paths),
        };
        write_outcomes(out, &outcomes)?;

        let report = BatchReport::from_outcomes(&outcomes);
        let verb = match kind {
            BatchKind::Ignore => "ignored",
            BatchKind::Unignore => "unignored",
        };
        writeln!(out, "{} files (or folders) {}.", report.succeeded, verb)?;

        if !report.all_succeeded() {
            return Err(SkipperError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("{} of {} paths failed", report.failed, outcomes.len()),
            )));
        }
        Ok(())
    }
}

/// Matches a batch should touch: all of them with `all`, otherwise only
/// those not already in the target state.
fn select_targets(matches: &[Match], all: bool, kind: BatchKind) -> Vec<&str> {
    matches
        .iter()
        .filter(|m| all || (m.is_ignored == (kind == BatchKind::Unignore)))
        .map(|m| m.path.as_str())
        .collect()
}

fn write_matches(out: &mut dyn Write, matches: &[Match]) -> std::io::Result<()> {
    if matches.is_empty() {
        return writeln!(out, "{}", NO_MATCHES);
    }
    for m in matches {
        let marker = if m.is_ignored { "[ignored]" } else { "         " };
        writeln!(out, "{} {}", marker, Path::new(&m.path).display())?;
    }
    Ok(())
}

fn write_outcomes(out: &mut dyn Write, outcomes: &[Outcome]) -> std::io::Result<()> {
    for outcome in outcomes {
        writeln!(out, "{}", outcome.message)?;
    }
    Ok(())
}
