//! Static HTML rendering of a resolved week.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use weekboard_engine::{DaySegment, WeekView};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:0;padding:1.5rem;background:#f5f6f8;color:#1d2330}
header{display:flex;justify-content:space-between;align-items:baseline;margin-bottom:1rem}
h1{font-size:1.4rem;margin:0}
.week{display:grid;grid-template-columns:repeat(5,1fr);gap:.75rem}
.day{background:#fff;border-radius:8px;padding:.75rem;min-height:8rem}
.day.today{outline:2px solid #2f6fde}
.day h2{font-size:1rem;margin:0 0 .5rem}
.day h2 small{font-weight:normal;color:#667}
.event{border-left:3px solid #2f6fde;padding:.25rem .5rem;margin-bottom:.5rem}
.event.all-day{border-color:#e08a1e;background:#fdf4e8}
.time{font-size:.8rem;color:#556}
.location{font-size:.8rem;color:#778}
.empty{color:#aab}
footer{margin-top:1rem;font-size:.75rem;color:#889}";

/// Render `view` as a complete HTML page. `now` marks today and stamps the footer.
pub fn html(view: &WeekView, now: DateTime<Tz>) -> String {
    let today = now.date_naive();
    let first = view.window_start.date_naive();
    let last = view.window_end.date_naive();

    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    out.push_str(&format!("<title>Week {}</title>\n", view.iso_week));
    out.push_str(&format!("<style>\n{STYLE}\n</style>\n</head>\n<body>\n"));
    out.push_str(&format!(
        "<header><h1>Week {}</h1><span>{} – {}</span></header>\n",
        view.iso_week,
        first.format("%b %-d"),
        last.format("%b %-d, %Y"),
    ));

    out.push_str("<main class=\"week\">\n");
    for (date, segments) in &view.days {
        render_day(&mut out, *date, segments, *date == today);
    }
    out.push_str("</main>\n");

    out.push_str(&format!(
        "<footer>Generated {}</footer>\n</body>\n</html>\n",
        now.format("%Y-%m-%d %H:%M %Z"),
    ));
    out
}

fn render_day(out: &mut String, date: NaiveDate, segments: &[DaySegment], is_today: bool) {
    let class = if is_today { "day today" } else { "day" };
    out.push_str(&format!(
        "<section class=\"{class}\"><h2>{} <small>{}</small></h2>\n",
        date.format("%A"),
        date.format("%b %-d"),
    ));
    if segments.is_empty() {
        out.push_str("<p class=\"empty\">–</p>\n");
    }
    for segment in segments {
        let class = if segment.all_day { "event all-day" } else { "event" };
        out.push_str(&format!(
            "<div class=\"{class}\"><div class=\"time\">{}</div><div class=\"summary\">{}</div>",
            escape(&segment.label.to_string()),
            escape(&segment.summary),
        ));
        if !segment.location.is_empty() {
            out.push_str(&format!(
                "<div class=\"location\">{}</div>",
                escape(&segment.location)
            ));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>\n");
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
