//! Plain-text rendering of the ranked ahead/behind board.

use std::fmt::Write;

use contracts::{GapSource, SaOutputs, Slot};

fn source_tag(source: GapSource) -> &'static str {
    match source {
        GapSource::Truth => "T",
        GapSource::Filtered => "F",
        GapSource::Track => "K",
        GapSource::StickyHold => "H",
        GapSource::Invalid => "-",
    }
}

fn fmt_gap(gap: f64) -> String {
    if gap.is_finite() {
        format!("{gap:+7.2}")
    } else {
        "    ---".to_string()
    }
}

fn fmt_rate(rate: f64) -> String {
    if rate.is_finite() {
        format!("{rate:+6.3}")
    } else {
        "   ---".to_string()
    }
}

fn write_slot(out: &mut String, label: &str, slot: &Slot) {
    let Some(idx) = slot.car_idx else {
        let _ = writeln!(out, "  {label:<3} (empty)");
        return;
    };
    let number = if slot.car_number.is_empty() {
        idx.to_string()
    } else {
        slot.car_number.clone()
    };
    let status = if slot.status_short.is_empty() {
        format!("{:?}", slot.status)
    } else {
        slot.status_short.clone()
    };
    let _ = writeln!(
        out,
        "  {label:<3} #{number:<4} {gap} {src} {rate} L{lap:+} {status}{stale}",
        gap = fmt_gap(slot.gap_rel_sec),
        src = source_tag(slot.gap_source),
        rate = fmt_rate(slot.closing_rate_smoothed),
        lap = slot.lap_delta,
        stale = if slot.relevant { "" } else { " (far)" },
    );
}

/// Render ahead slots farthest first, the player, then behind slots nearest first
pub fn format_board(outputs: &SaOutputs) -> String {
    let mut out = String::new();
    let debug = &outputs.debug;
    let _ = writeln!(
        out,
        "t={:.2}s tick={} gate={} lap={:.2}s{}",
        debug.session_time_sec,
        debug.tick,
        debug.session_gate,
        debug.lap_time_used_sec,
        outputs
            .irating_sof
            .map(|sof| format!(" sof={sof:.0}"))
            .unwrap_or_default(),
    );

    for (i, slot) in outputs.ahead.iter().enumerate().rev() {
        write_slot(&mut out, &format!("A{}", i + 1), slot);
    }
    write_slot(&mut out, "P", &outputs.player);
    for (i, slot) in outputs.behind.iter().enumerate() {
        write_slot(&mut out, &format!("B{}", i + 1), slot);
    }
    out
}
