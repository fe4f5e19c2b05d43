//! Human-readable output for the `doclens` CLI.
//!
//! Each function prints one command's result to stdout. With `--json` the
//! binary serializes the same values with `serde_json` instead.

use crate::analyzer::{Answer, Comparison, DocumentInsights, RankedChunk, Summary};
use crate::insights::TextStats;
use crate::models::{Document, DocumentChunk, KeywordBundle};

/// Maximum characters of chunk text shown per line.
const PREVIEW_CHARS: usize = 72;

pub fn print_document_header(doc: &Document) {
    println!("{}", doc.metadata.filename);
    println!("{}", "=".repeat(doc.metadata.filename.chars().count().max(8)));
    println!("  Type:        {}", doc.metadata.file_type);
    println!("  Size:        {}", format_bytes(doc.metadata.size_bytes));
    println!(
        "  Chunks:      {}",
        doc.metadata.chunk_count.unwrap_or_default()
    );
    println!();
}

pub fn print_chunks(chunks: &[DocumentChunk]) {
    println!("  {:>5} {:>8} {:>8}   {}", "INDEX", "START", "END", "TEXT");
    println!("  {}", "-".repeat(76));
    for c in chunks {
        println!(
            "  {:>5} {:>8} {:>8}   {}",
            c.chunk_index,
            c.start,
            c.end,
            preview(&c.text)
        );
    }
}

pub fn print_stats(stats: &TextStats) {
    println!("  Words:       {}", stats.word_count);
    println!("  Sentences:   {}", stats.sentence_count);
    println!("  Avg/sent:    {:.1}", stats.avg_words_per_sentence);
    println!("  Reading:     {} min", stats.reading_time_minutes);
    println!("  Language:    {}", stats.language);
    println!(
        "  Readability: {:.1} ({} complexity)",
        stats.readability_score, stats.complexity
    );
}

pub fn print_summary(summary: &Summary) {
    if summary.degraded {
        println!("(no language model available, summary unavailable)");
    } else {
        println!("{}", summary.text);
    }
}

pub fn print_insights(insights: &DocumentInsights) {
    print_stats(&insights.stats);
    println!();
    let b = &insights.bundle;
    println!("  Sentiment:   {}", b.sentiment);
    println!("  Complexity:  {}", b.complexity);
    println!("  Score:       {:.1}", b.readability_score);
    print_list("Topics", &b.topics);
    print_list("Key insights", &b.key_insights);
    print_list("Recommendations", &b.recommendations);
    if insights.degraded {
        println!();
        println!("(no language model available, showing local estimates only)");
    }
}

pub fn print_keywords(keywords: &KeywordBundle) {
    if keywords.is_empty() {
        println!("No keywords extracted.");
        return;
    }
    print_list("Keywords", &keywords.keywords);
    print_list("Entities", &keywords.entities);
    print_list("Topics", &keywords.topics);
    print_list("Concepts", &keywords.concepts);
}

pub fn print_questions(questions: &[String]) {
    if questions.is_empty() {
        println!("No questions generated.");
        return;
    }
    for (i, q) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, q);
    }
}

pub fn print_answer(answer: &Answer) {
    if answer.text.is_empty() {
        println!("No answer found.");
    } else {
        println!("{}", answer.text);
    }
    if !answer.sources.is_empty() {
        let sources: Vec<String> = answer.sources.iter().map(|i| i.to_string()).collect();
        println!();
        println!("  Sources: chunks {}", sources.join(", "));
    }
    if answer.degraded {
        println!("  (no language model available, answered from matching sentences)");
    }
}

pub fn print_ranked(ranked: &[RankedChunk]) {
    if ranked.is_empty() {
        println!("No matching chunks.");
        return;
    }
    println!("  {:>5} {:>6}   {}", "INDEX", "SCORE", "TEXT");
    println!("  {}", "-".repeat(76));
    for r in ranked {
        println!(
            "  {:>5} {:>6}   {}",
            r.chunk.chunk_index,
            r.score,
            preview(&r.chunk.text)
        );
    }
}

pub fn print_comparison(cmp: &Comparison, first_name: &str, second_name: &str) {
    println!("{}", first_name);
    print_stats(&cmp.first.stats);
    println!();
    println!("{}", second_name);
    print_stats(&cmp.second.stats);
    println!();
    print_list("Shared topics", &cmp.shared_topics);
    print_list("Shared keywords", &cmp.shared_keywords);
}

fn print_list(label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("  {}:", label);
    for item in items {
        println!("    - {}", item);
    }
}

/// One-line preview of chunk text, whitespace collapsed.
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1_048_576), "3.0 MB");
    }

    #[test]
    fn test_preview_collapses_and_truncates() {
        assert_eq!(preview("a\n\n b\tc"), "a b c");
        let long = "x".repeat(100);
        let p = preview(&long);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }
}
