//! Terminal rendering
//!
//! Every view is rendered to a `String`; the caller decides where it goes.

use chrono::{DateTime, NaiveDate, Utc};
use dre_core::{
    Dispute, DisputeStats, DisputeView, Invoice, InvoiceComparison, TotalsCheck,
};
use dre_playback::{PlaybackFrame, ResolutionStep, StepStatus};
use std::fmt::Write;

const NARRATION_INDENT: &str = "      ";

/// Glyph shown next to a step
pub(crate) fn glyph(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "○",
        StepStatus::InProgress => "▸",
        StepStatus::Complete => "✓",
    }
}

/// `Jan 15, 2024`
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// `5 minutes ago`, falling back to the date after a week
pub(crate) fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    let plural = |n: i64| if n == 1 { "" } else { "s" };
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes} minute{} ago", plural(minutes))
    } else if hours < 24 {
        format!("{hours} hour{} ago", plural(hours))
    } else if days < 7 {
        format!("{days} day{} ago", plural(days))
    } else {
        format_date(then.date_naive())
    }
}

/// One line per dispute
pub(crate) fn dispute_list<'a>(disputes: impl IntoIterator<Item = &'a Dispute>) -> String {
    let mut out = String::new();
    for d in disputes {
        let _ = writeln!(
            out,
            "{:<9} {:<10} {:<18} {:<28} {}",
            d.id,
            d.status,
            d.dispute_type.label(),
            d.customer_email,
            d.subject
        );
    }
    if out.is_empty() {
        out.push_str("No disputes\n");
    }
    out
}

pub(crate) fn stats(stats: DisputeStats) -> String {
    format!(
        "Total: {}  Open: {}  In progress: {}  Resolved: {}\n",
        stats.total, stats.open, stats.in_progress, stats.resolved
    )
}

/// Dispute header, customer message, and invoice
pub(crate) fn dispute_detail(view: &DisputeView<'_>, now: DateTime<Utc>) -> String {
    let d = view.dispute;
    let mut out = String::new();

    let _ = writeln!(out, "{}  [{}]  {}", d.id, d.status, d.dispute_type.label());
    let _ = writeln!(out, "{}", d.subject);
    let _ = writeln!(
        out,
        "From {}, {}",
        d.customer_email,
        relative_time(d.timestamp, now)
    );
    out.push('\n');
    for line in d.message.lines() {
        let _ = writeln!(out, "  {line}");
    }
    out.push('\n');

    out.push_str(&invoice(view.invoice));
    if let TotalsCheck::Mismatch { stated, computed } = view.totals() {
        let _ = writeln!(
            out,
            "  ! Stated amount {stated} does not match line items {computed}"
        );
    }

    if let Some(analysis) = &d.ai_analysis {
        let _ = writeln!(out, "\nAnalysis: {analysis}");
    }
    out
}

pub(crate) fn invoice(invoice: &Invoice) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Invoice {} ({})  {}  [{}]",
        invoice.invoice_number, invoice.id, invoice.customer_name, invoice.status
    );
    let _ = writeln!(
        out,
        "  Issued {}  Due {}  PO {}",
        format_date(invoice.issue_date),
        format_date(invoice.due_date),
        invoice.po_number.as_deref().unwrap_or("(none)")
    );
    for item in &invoice.line_items {
        let _ = writeln!(
            out,
            "  {:<32} {:>4} × {:>12} = {:>12}",
            item.description,
            item.quantity,
            item.unit_price.to_string(),
            item.total.to_string()
        );
    }
    let _ = writeln!(out, "  {:>66}", format!("Total {}", invoice.amount));
    out
}

/// Original vs corrected invoice with the change list
pub(crate) fn comparison(cmp: &InvoiceComparison) -> String {
    let mut out = String::from("Original\n");
    out.push_str(&invoice(&cmp.original));
    out.push_str("\nCorrected\n");
    out.push_str(&invoice(&cmp.corrected));

    out.push_str("\nChanges\n");
    for change in &cmp.changes {
        let _ = writeln!(out, "  • {change}");
    }
    if let Some(credit) = cmp.credit_memo() {
        let _ = writeln!(out, "\nCredit memo: {credit}");
    } else if cmp.amount_changed() {
        let _ = writeln!(out, "\nAdditional charge: {}", cmp.delta());
    }
    out
}

fn step_line(step: &ResolutionStep) -> String {
    match (&step.status, &step.detail) {
        (StepStatus::Complete, Some(detail)) => {
            format!("  {} {} ({detail})\n", glyph(step.status), step.label)
        }
        _ => format!("  {} {}\n", glyph(step.status), step.label),
    }
}

/// Incremental renderer for playback frames
///
/// Prints a line whenever a step changes status and types the narration as
/// it grows, indented under the active step.
#[derive(Debug, Default)]
pub(crate) struct FrameRenderer {
    steps: Vec<ResolutionStep>,
    typed: String,
    mid_line: bool,
}

impl FrameRenderer {
    /// Output for `frame` given everything rendered so far
    pub(crate) fn render(&mut self, frame: &PlaybackFrame) -> String {
        let mut out = String::new();

        for (index, step) in frame.steps.iter().enumerate() {
            let changed = self
                .steps
                .get(index)
                .map_or(step.status != StepStatus::Pending, |prev| prev.status != step.status);
            if changed {
                self.break_line(&mut out);
                out.push_str(&step_line(step));
            }
        }
        self.steps.clone_from(&frame.steps);

        let next = frame.narration.as_str();
        if let Some(delta) = next.strip_prefix(self.typed.as_str()) {
            self.type_out(&mut out, delta);
        } else {
            self.break_line(&mut out);
            self.type_out(&mut out, next);
        }
        self.typed = next.to_string();

        if frame.complete {
            self.break_line(&mut out);
            out.push_str("\nResolution complete.\n");
        }
        out
    }

    fn type_out(&mut self, out: &mut String, text: &str) {
        for ch in text.chars() {
            if !self.mid_line && ch != '\n' {
                out.push_str(NARRATION_INDENT);
                self.mid_line = true;
            }
            out.push(ch);
            if ch == '\n' {
                self.mid_line = false;
            }
        }
    }

    fn break_line(&mut self, out: &mut String) {
        if self.mid_line {
            out.push('\n');
            self.mid_line = false;
        }
    }
}
