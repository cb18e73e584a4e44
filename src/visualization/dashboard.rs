use crate::AlignmentResult;

fn fmt_offset(offset: Option<crate::Point>) -> String {
    match offset {
        Some(o) => format!("({:.2}, {:.2})", o.x, o.y),
        None => "none".to_string(),
    }
}

pub fn print_result(result: &AlignmentResult) {
    println!("=== Alignment Result ===");
    println!("  Rotation: {}° (index {})", result.rotation_degrees, result.rotation_index);
    println!("  Offset: {}", fmt_offset(result.offset));
    println!("  Score: {:.2}", result.score);
    println!("  Processing Time: {:.2}ms", result.processing_time_ms);
    println!();
    print_hypothesis_table(result);
}

pub fn print_hypothesis_table(result: &AlignmentResult) {
    println!("| Angle (°) | Matched | Rough offset | Refined | Offset | Score |");
    println!("|-----------|---------|--------------|---------|--------|-------|");

    for (i, h) in result.hypotheses.iter().enumerate() {
        let marker = if i == result.rotation_index { " *" } else { "" };
        println!(
            "| {}{} | {} | {} | {} | {} | {:.2} |",
            h.angle,
            marker,
            h.rough.matched,
            fmt_offset(Some(h.rough.offset)),
            h.refined,
            fmt_offset(h.offset),
            h.score
        );
    }
}
