//! Interface de terminal do huntdesk: saída colorida e barra de progresso.
//!
//! Usa a crate `console` para estilização com cores e `indicatif` para a
//! barra de progresso do backfill.

use std::collections::BTreeMap;

use chrono::Duration;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use huntdesk::audit::{AuditEntry, BackfillReport};
use huntdesk::hooks::Notification;
use huntdesk::stats::{DurationReport, EditorWorkload, Inbox, StatusBreakdown, StatusTimeline};
use huntdesk::testsolve::GuessOutcome;
use huntdesk::tracker::TransitionOutcome;
use huntdesk::workflow::{Role, Status, TransitionOption, WorkflowEngine};

/// Estilos usados em toda a saída do terminal.
pub struct Painter {
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    dim: Style,
    bold: Style,
}

impl Default for Painter {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

fn hours(d: Duration) -> String {
    format!("{:.1}h", d.num_minutes() as f64 / 60.0)
}

impl Painter {
    /// Lista os status com código, nome e responsável.
    pub fn statuses(&self, engine: &WorkflowEngine) {
        for status in huntdesk::workflow::STATUSES {
            println!(
                "{:>3}  {:<2}  {:<34} {}",
                status.rank(),
                self.cyan.apply_to(status.code()),
                status.display_name(),
                self.dim.apply_to(engine.blocker(*status))
            );
        }
    }

    /// Mostra o responsável e as transições oferecidas para um código.
    pub fn transitions(&self, code: &str, engine: &WorkflowEngine) {
        let display = huntdesk::workflow::status::display_of(code);
        println!(
            "{} ({}) is blocked on {}",
            self.bold.apply_to(display),
            code,
            self.yellow.apply_to(engine.blocker_of(code))
        );
        let offered = engine.transitions_of(code);
        if offered.is_empty() {
            println!("  {}", self.dim.apply_to("no transitions"));
        }
        for t in offered {
            println!("  → {:<2} {}", self.cyan.apply_to(t.to.code()), t.label);
        }
    }

    pub fn options(&self, options: &[TransitionOption]) {
        for option in options {
            println!(
                "  → {:<2} {} ({})",
                self.cyan.apply_to(option.status.code()),
                option.description,
                self.dim.apply_to(option.status_display)
            );
        }
    }

    pub fn created(&self, id: u64, name: &str) {
        println!("  {} Created puzzle {id}: {name}", self.green.apply_to("✓"));
    }

    /// Exibe o resultado de uma mudança de status e as notificações geradas.
    pub fn outcome(&self, outcome: &TransitionOutcome) {
        match &outcome.change {
            Some(change) => println!(
                "  {} {} → {}",
                self.green.apply_to("✓"),
                change.from.display_name(),
                self.bold.apply_to(change.to.display_name())
            ),
            None => println!("  {} Status unchanged", self.dim.apply_to("·")),
        }
        for notification in &outcome.notifications {
            self.notification(notification);
        }
    }

    fn notification(&self, notification: &Notification) {
        println!(
            "  {} {} → {}",
            self.yellow.apply_to("✉"),
            notification.subject,
            notification.recipients.join(", ")
        );
    }

    /// Imprime o histórico de um puzzle, destacando mudanças de status.
    pub fn history(&self, entries: &[&AuditEntry]) {
        for entry in entries {
            let when = entry.timestamp.format("%Y-%m-%d %H:%M");
            let who = if entry.is_system {
                self.dim.apply_to(entry.author.as_str())
            } else {
                self.bold.apply_to(entry.author.as_str())
            };
            print!("{when}  {who}");
            if let Some(tag) = &entry.status_change {
                print!("  [{}]", self.cyan.apply_to(tag.display_name()));
            }
            if let Some(session) = entry.testsolve_session {
                print!("  {}", self.dim.apply_to(format!("session #{session}")));
            }
            if !entry.content.is_empty() {
                print!("  {}", entry.content);
            }
            println!();
        }
    }

    pub fn inbox(&self, user: &str, inbox: &Inbox) {
        if inbox.is_empty() {
            println!("  {} Nothing is blocked on {user}", self.green.apply_to("✓"));
            return;
        }
        let groups = [
            (Role::Authors, &inbox.authoring),
            (Role::Editors, &inbox.editing),
            (Role::Factcheckers, &inbox.factchecking),
            (Role::Postprodders, &inbox.postprodding),
        ];
        for (role, ids) in groups {
            if !ids.is_empty() {
                let ids: Vec<String> = ids.iter().map(|id| format!("#{id}")).collect();
                println!("  {:<13} {}", self.yellow.apply_to(role), ids.join(" "));
            }
        }
    }

    /// Tabela de contagem por status e tag, seguida dos totais de progresso.
    pub fn breakdown(&self, breakdown: &StatusBreakdown, tags: &[String]) {
        print!("{:<34} {:>5}", self.bold.apply_to("Status"), "All");
        for tag in tags {
            print!(" {tag:>10}");
        }
        println!(" {:>5}", "Rest");

        for row in &breakdown.rows {
            print!("{:<34} {:>5}", row.display, row.count);
            for tag in tags {
                print!(" {:>10}", row.tag_counts.get(tag).copied().unwrap_or(0));
            }
            println!(" {:>5}", row.rest);
        }

        println!();
        println!("Past writing:     {}", self.green.apply_to(breakdown.past_writing));
        println!("Past testsolving: {}", self.green.apply_to(breakdown.past_testsolving));
        for violation in &breakdown.violations {
            println!("  {} {violation}", self.red.apply_to("!"));
        }
    }

    /// Resumo textual do gráfico: a última amostra por status.
    pub fn timeline(&self, timeline: &StatusTimeline) {
        let Some(last) = timeline.samples.last() else {
            println!("  {}", self.dim.apply_to("no status history yet"));
            return;
        };
        let first = timeline.samples[0].at.format("%Y-%m-%d");
        println!(
            "{} samples from {first} to {}",
            timeline.samples.len(),
            last.at.format("%Y-%m-%d")
        );
        for (label, count) in timeline.labels.iter().zip(&last.counts) {
            if *count > 0 {
                println!("  {label:<34} {count:>5}");
            }
        }
        match timeline.target_count {
            Some(target) => println!(
                "  {:<34} {:>5} / {target}",
                self.bold.apply_to("Total"),
                last.total()
            ),
            None => println!("  {:<34} {:>5}", self.bold.apply_to("Total"), last.total()),
        }
    }

    pub fn durations(&self, report: &DurationReport) {
        for d in &report.per_status {
            println!(
                "{:<34} {:>10}  {}",
                d.status.display_name(),
                hours(d.total),
                self.dim.apply_to(format!("{} puzzles", d.puzzles))
            );
        }
        println!();
        println!("Pre-testsolving:  {}", self.cyan.apply_to(hours(report.pre_testsolving)));
        println!("Post-testsolving: {}", self.cyan.apply_to(hours(report.post_testsolving)));
        for violation in &report.violations {
            println!("  {} {violation}", self.red.apply_to("!"));
        }
    }

    pub fn workload(&self, workload: &BTreeMap<String, EditorWorkload>) {
        println!(
            "{:<16} {:>4} {:>5} {:>5} {:>5} {:>5} {:>5}",
            self.bold.apply_to("Editor"),
            "All",
            "Pre",
            "Post",
            "Done",
            "Def",
            "Dead"
        );
        for (editor, w) in workload {
            println!(
                "{editor:<16} {:>4} {:>5} {:>5} {:>5} {:>5} {:>5}",
                w.all, w.pre_testsolving, w.post_testsolving, w.done, w.deferred, w.dead
            );
        }
    }

    pub fn guess(&self, outcome: &GuessOutcome) {
        let mark = if outcome.correct {
            self.green.apply_to("✓")
        } else {
            self.red.apply_to("✗")
        };
        println!("  {mark} {}", outcome.comment);
    }

    pub fn subscribed(&self, status: Status, added: bool) {
        if added {
            println!(
                "  {} Subscribed to {}",
                self.green.apply_to("✓"),
                status.display_name()
            );
        } else {
            println!(
                "  {} Already subscribed to {}",
                self.dim.apply_to("·"),
                status.display_name()
            );
        }
    }

    pub fn ok(&self, message: &str) {
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    pub fn backfill_report(&self, report: &BackfillReport) {
        for update in &report.updated {
            println!(
                "  {} Puzzle #{}: {} → {}",
                self.yellow.apply_to("↻"),
                update.puzzle_id,
                update.old.to_rfc3339(),
                update.new.to_rfc3339()
            );
        }
        for failure in &report.failures {
            println!(
                "  {} Puzzle #{}: {}",
                self.red.apply_to("✗"),
                failure.puzzle_id,
                failure.reason
            );
        }
        println!(
            "  {} updated, {} unchanged, {} failed",
            self.green.apply_to(report.updated.len()),
            report.unchanged.len(),
            self.red.apply_to(report.failures.len())
        );
    }
}

/// Barra de progresso do backfill, um passo por puzzle.
pub struct BackfillProgress {
    // Barra do indicatif.
    pb: ProgressBar,
}

impl BackfillProgress {
    /// Cria a barra com o total de puzzles a verificar.
    pub fn start(total: usize) -> Self {
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Self { pb }
    }

    /// Avança um puzzle.
    pub fn tick(&self, puzzle_id: u64) {
        self.pb.set_message(format!("puzzle #{puzzle_id}"));
        self.pb.inc(1);
    }

    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
