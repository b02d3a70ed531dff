//! Terminal output for the CLI

use colored::*;

use medrag_core::{IndexStats, IngestionReport, QueryOutcome};
use medrag_llm::SelectorStatus;

/// Startup banner shown by `medrag serve`
pub fn display_banner(url: &str) {
    let width = 60;
    let border = "─".repeat(width - 2);

    println!();
    println!("{}", format!("┌{}┐", border).blue());
    println!(
        "{}  {}{}{}",
        "│".blue(),
        "MedGPT".blue().bold(),
        " ".repeat(width - 10),
        "│".blue()
    );
    for line in [
        "Answers from your medical documents, with sources",
        "",
        "Upload PDF, DOCX, TXT or MD files in the browser",
    ] {
        println!(
            "{}",
            format!("│  {}{}│", line, " ".repeat(width - line.chars().count() - 4)).blue()
        );
    }
    println!("{}", format!("└{}┘", border).blue());
    println!();
    println!("{} Open {}", "🌐".cyan(), url.bold());
    println!();
}

pub fn print_report(report: &IngestionReport) {
    println!(
        "{} Indexed {} files into {} chunks",
        "✅".green(),
        report.files_indexed,
        report.chunks
    );
    if report.files_skipped > 0 {
        println!("{} Skipped {} files:", "⚠️".yellow(), report.files_skipped);
        for skipped in &report.skipped {
            println!("  {} {} ({})", "•".yellow(), skipped.path, skipped.reason.dimmed());
        }
    }
}

pub fn print_outcome(outcome: &QueryOutcome, show_context: bool) {
    if let Some(notice) = &outcome.answer.notice {
        println!("{} {}", "⚠️".yellow(), notice.yellow());
        println!();
    }

    println!("{}", outcome.answer.text);
    println!();
    println!(
        "{}",
        format!(
            "{} · {} · retrieval {} ms · generation {} ms",
            outcome.answer.backend,
            outcome.answer.model,
            outcome.retrieval_ms,
            outcome.generation_ms
        )
        .dimmed()
    );

    if !outcome.sources.is_empty() {
        println!();
        println!("{}", "Sources:".bold());
        for source in &outcome.sources {
            println!(
                "  {} {} p.{} {}",
                "📄".cyan(),
                source.chunk.source,
                source.chunk.display_page(),
                format!("({:.3})", source.score).dimmed()
            );
        }
    }

    if show_context {
        println!();
        println!("{}", "Context:".bold());
        println!("{}", outcome.context);
    }
}

pub fn print_stats(stats: &IndexStats, status: &SelectorStatus) {
    println!("{}", "📊 Knowledge base".bold());
    if stats.loaded {
        println!("   Chunks: {}", stats.total_chunks);
        println!("   Dimension: {}", stats.dimension);
        println!("   Embedding model: {}", stats.embedding_model);
    } else {
        println!("   {}", "Empty. Run `medrag ingest` first.".yellow());
    }

    println!("{}", "🤖 Answer backends".bold());
    if status.backends.is_empty() {
        println!("   {}", "None configured, answers fall back to retrieved context".yellow());
    }
    for (i, backend) in status.backends.iter().enumerate() {
        println!("   {}. {} ({})", i + 1, backend.label.green(), backend.model);
    }
}
