//! Live progress rendering and the end-of-run summary.

use curator_core::{ItemResult, ItemStatus, RunSnapshot, RunSummary};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{oneshot, watch};

/// Create a progress bar for a curation run.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Mirror pipeline snapshots onto the progress bar until `done` fires or the
/// channel closes. Each finalized result is printed once, and the latest
/// snapshot is always drawn before returning.
pub async fn render_progress(
    mut rx: watch::Receiver<RunSnapshot>,
    pb: ProgressBar,
    mut done: oneshot::Receiver<()>,
) {
    let mut printed = 0;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let update = ProgressUpdate::from_snapshot(&rx.borrow_and_update(), printed);
                printed = update.draw(&pb);
            }
            _ = &mut done => break,
        }
    }

    let update = ProgressUpdate::from_snapshot(&rx.borrow_and_update(), printed);
    update.draw(&pb);
}

/// What changed since the last draw, copied out of the snapshot so the
/// channel is not held while printing.
struct ProgressUpdate {
    progress: String,
    new_lines: Vec<String>,
    printed: usize,
}

impl ProgressUpdate {
    fn from_snapshot(snapshot: &RunSnapshot, printed: usize) -> Self {
        Self {
            progress: snapshot.progress.clone(),
            new_lines: snapshot
                .results
                .iter()
                .skip(printed)
                .map(format_result_line)
                .collect(),
            printed: snapshot.results.len(),
        }
    }

    fn draw(self, pb: &ProgressBar) -> usize {
        for line in self.new_lines {
            pb.println(line);
        }
        pb.set_position(self.printed as u64);
        if !self.progress.is_empty() {
            pb.set_message(self.progress);
        }
        self.printed
    }
}

/// One line per finalized image.
pub fn format_result_line(result: &ItemResult) -> String {
    let name = &result.image().file_name;
    match result.status() {
        ItemStatus::Accepted => format!(
            "  ✓ {name} ({:.2}): {}",
            result.score().unwrap_or_default(),
            result.annotation().unwrap_or_default()
        ),
        ItemStatus::Rejected => format!(
            "  ✗ {name} ({:.2}): {}",
            result.score().unwrap_or_default(),
            result.reason().unwrap_or_default()
        ),
        ItemStatus::Error => format!(
            "  ! {name}: {}",
            result.reason().unwrap_or("unknown error")
        ),
        ItemStatus::Pending => format!("  … {name}"),
    }
}

/// Print a formatted summary table after a run.
pub fn print_summary(summary: &RunSummary, elapsed: std::time::Duration) {
    let rate = if elapsed.as_secs_f64() > 0.0 {
        summary.processed as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    if summary.stopped {
        eprintln!("          Summary (stopped)");
    } else {
        eprintln!("               Summary");
    }
    eprintln!("  ====================================");
    eprintln!("    Accepted:     {:>8}", summary.accepted);
    eprintln!("    Rejected:     {:>8}", summary.rejected);
    if summary.errored > 0 {
        eprintln!("    Errors:       {:>8}", summary.errored);
    }
    if summary.processed < summary.total {
        eprintln!(
            "    Not reached:  {:>8}",
            summary.total - summary.processed
        );
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", summary.total);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.2} img/sec", rate);
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::{ImageItem, ScoreOutcome};
    use std::time::UNIX_EPOCH;

    fn image(name: &str) -> ImageItem {
        ImageItem::new(format!("/in/{name}"), "image/jpeg", UNIX_EPOCH, vec![0xFF])
    }

    #[test]
    fn test_format_result_lines() {
        let accepted = ItemResult::accepted(
            image("bus.jpg"),
            ScoreOutcome {
                score: 0.912,
                reason: "clear".into(),
            },
            "street, dusk".into(),
        );
        assert_eq!(format_result_line(&accepted), "  ✓ bus.jpg (0.91): street, dusk");

        let rejected = ItemResult::rejected(
            image("cat.jpg"),
            ScoreOutcome {
                score: 0.1,
                reason: "no bus".into(),
            },
        );
        assert_eq!(format_result_line(&rejected), "  ✗ cat.jpg (0.10): no bus");

        let errored = ItemResult::error(image("x.jpg"), "status 500");
        assert_eq!(format_result_line(&errored), "  ! x.jpg: status 500");
    }

    #[tokio::test]
    async fn test_renderer_draws_final_snapshot_before_exit() {
        for _ in 0..20 {
            let (tx, rx) = watch::channel(RunSnapshot::default());
            let (done_tx, done_rx) = oneshot::channel();
            let pb = ProgressBar::hidden();
            pb.set_length(1);
            let render = tokio::spawn(render_progress(rx, pb.clone(), done_rx));

            // Last result and cleared progress land just before the run returns
            tx.send_modify(|s| {
                s.results.push(ItemResult::error(image("last.jpg"), "status 500"));
            });
            tx.send_modify(|s| s.progress.clear());
            done_tx.send(()).unwrap();
            render.await.unwrap();

            assert_eq!(pb.position(), 1);
        }
    }

    #[tokio::test]
    async fn test_renderer_exits_when_channel_closes() {
        let (tx, rx) = watch::channel(RunSnapshot::default());
        let (_done_tx, done_rx) = oneshot::channel();
        let pb = ProgressBar::hidden();
        let render = tokio::spawn(render_progress(rx, pb.clone(), done_rx));

        tx.send_modify(|s| s.results.push(ItemResult::error(image("a.jpg"), "boom")));
        drop(tx);
        render.await.unwrap();
        assert_eq!(pb.position(), 1);
    }

    #[test]
    fn test_progress_bar_length() {
        let pb = create_progress_bar(7);
        assert_eq!(pb.length(), Some(7));
    }
}
